//! Fluent SQL statement builder.
//!
//! Statements ([`Select`], [`Insert`], [`Update`], [`Delete`], [`Sql`], [`BatchSql`]) are
//! rendered against a [`QueryContext`], which carries the [`Dialect`], the table prefix and the
//! sharding key. Conditions and other fragments ([`Cond`], [`Where`], [`Join`], [`OrderBy`],
//! [`GroupBy`]) are context free and take the quoting of the statement that owns them.
//! Execution goes through sqlx; see [`SqlQuery`] and [`EntitySql`].

pub use sqlx;

pub mod batch;
pub mod cond;
pub mod config;
pub mod delete;
pub mod dialect;
pub mod entity;
pub mod entity_sql;
pub mod error;
pub mod executor;
pub mod fields;
pub mod func;
pub mod group_by;
pub mod insert;
pub mod join;
pub mod metrics;
pub mod order_by;
pub mod page;
pub mod params;
pub mod query;
pub mod select;
pub mod slot;
pub mod sql;
pub mod table;
pub mod test_utils;
pub mod update;
pub mod where_clause;

pub(crate) use self::metrics::record_query_metrics;

pub use batch::BatchSql;
pub use cond::{Cond, CondPart, FieldCond, LogicalOpt, Opt, Presence};
pub use config::DataSourceConfig;
pub use delete::Delete;
pub use dialect::{
    DatabaseType, Dialect, GenericDialect, MySqlDialect, OracleDialect, PostgreSqlDialect,
    SqlDialect, SqlServerDialect, SqliteDialect,
};
pub use entity::{
    Entity, EntityMeta, FieldType, IndexMeta, ModuloShardingRule, PropertyMeta, ShardingRule,
};
pub use entity_sql::EntitySql;
pub use error::{QueryError, QueryResult};
pub use executor::{Executor, IntoExecutor};
pub use fields::Fields;
pub use func::Func;
pub use group_by::GroupBy;
pub use insert::Insert;
pub use join::{Join, JoinType};
pub use order_by::OrderBy;
pub use page::Page;
pub use params::{BindValue, Params};
pub use query::{QueryContext, TableRef};
pub use select::{DbLocker, Select, SqlServerLock, Union};
pub use slot::Slot;
pub use sql::{PageResult, Sql, SqlQuery};
pub use table::Table;
pub use update::Update;
pub use where_clause::Where;

pub mod prelude {
    pub use crate::func;
    pub use crate::params;
    pub use crate::{
        BatchSql, BindValue, Cond, DatabaseType, Delete, Dialect, Entity, EntityMeta, EntitySql,
        Executor, FieldCond, FieldType, Fields, Func, GroupBy, IndexMeta, Insert, IntoExecutor,
        Join, JoinType, LogicalOpt, Opt, OrderBy, Page, PageResult, Params, PropertyMeta,
        QueryContext, QueryError, QueryResult, Select, Sql, SqlDialect, Table, Update, Where,
    };
}
