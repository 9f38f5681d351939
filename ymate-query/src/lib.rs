//! # YMate Query
//!
//! Fluent SQL statement builder for Rust. Build `SELECT`, `INSERT`, `UPDATE` and `DELETE`
//! statements from small composable fragments, render them for MySQL, PostgreSQL, SQLite, Oracle
//! or SQL Server, and run them through sqlx with positional params bound in render order.
//!
//! ## Key Features
//!
//! - **Composable conditions**: [`Cond`], [`Where`], [`GroupBy`], [`OrderBy`] and [`Join`] render
//!   against the dialect of the statement that owns them.
//! - **Dialects**: identifier quoting, paging rewrites and entity CRUD SQL per database.
//! - **Entity metadata**: `#[derive(Entity)]` describes the table; [`Table`] renders its DDL and
//!   [`EntitySql`] its CRUD statements.
//! - **Execution**: [`SqlQuery`] runs statements on a pool, connection or transaction with
//!   paging, counting and streaming.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ymate_query::prelude::*;
//!
//! #[derive(Entity)]
//! #[entity(name = "user")]
//! struct User {
//!     #[column(primary_key, autoincrement)]
//!     id: Option<i64>,
//!     #[column(length = 64)]
//!     email: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = ymate_query::sqlx::SqlitePool::connect("sqlite::memory:").await?;
//! let ctx = QueryContext::for_database(DatabaseType::Sqlite);
//! ymate_query::sqlx::query(&ctx.table(User::entity_meta()).to_create_sql())
//!     .execute(&pool)
//!     .await?;
//!
//! let user = User { id: None, email: "ann@example.com".to_owned() };
//! EntitySql::<User>::new(ctx.clone()).insert(&user)?.on(&pool).execute().await?;
//!
//! let total = ctx
//!     .select_from("user")
//!     .where_(Cond::new().like("email").param("%@example.com").build_where())
//!     .to_sql()
//!     .on(&pool)
//!     .count()
//!     .await?;
//! assert_eq!(total, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! ymate-query = { version = "0.3", features = ["sqlite"] }
//! ```

pub use ymate_query_core::*;
pub use ymate_query_macros::Entity;

pub mod prelude {
    pub use ymate_query_core::prelude::*;

    pub use crate::Entity; // The derive macro and the trait
}
