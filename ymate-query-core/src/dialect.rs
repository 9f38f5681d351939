use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::Database;

use crate::entity::{EntityMeta, PropertyMeta, ShardingRule};
use crate::error::{QueryError, QueryResult};
use crate::fields::Fields;
use crate::params::BindValue;
use crate::table::Table;

/// Database vendors known to the dialect layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatabaseType {
    Mysql,
    Oracle,
    Sqlserver,
    Db2,
    Sqlite,
    Postgresql,
    Hsqldb,
    H2,
    #[default]
    Unknown,
}

impl DatabaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "MYSQL",
            Self::Oracle => "ORACLE",
            Self::Sqlserver => "SQLSERVER",
            Self::Db2 => "DB2",
            Self::Sqlite => "SQLITE",
            Self::Postgresql => "POSTGRESQL",
            Self::Hsqldb => "HSQLDB",
            Self::H2 => "H2",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Guesses the vendor from a connection URL scheme (`mysql://`, `postgres://`, `sqlite:` ...).
    pub fn from_url(url: &str) -> Self {
        let url = url.trim().to_ascii_lowercase();
        let url = url.strip_prefix("jdbc:").unwrap_or(&url);
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "mysql" | "mariadb" => Self::Mysql,
            "postgres" | "postgresql" => Self::Postgresql,
            "sqlite" => Self::Sqlite,
            "oracle" => Self::Oracle,
            "sqlserver" | "mssql" => Self::Sqlserver,
            "db2" => Self::Db2,
            "hsqldb" => Self::Hsqldb,
            "h2" => Self::H2,
            _ => Self::Unknown,
        }
    }

    /// The built-in dialect for this vendor.
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::Mysql => Arc::new(MySqlDialect),
            Self::Oracle => Arc::new(OracleDialect),
            Self::Sqlserver => Arc::new(SqlServerDialect),
            Self::Postgresql => Arc::new(PostgreSqlDialect),
            Self::Sqlite => Arc::new(SqliteDialect),
            other => Arc::new(GenericDialect::new(other)),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MYSQL" | "MARIADB" => Ok(Self::Mysql),
            "ORACLE" => Ok(Self::Oracle),
            "SQLSERVER" | "MSSQL" => Ok(Self::Sqlserver),
            "DB2" => Ok(Self::Db2),
            "SQLITE" => Ok(Self::Sqlite),
            "POSTGRESQL" | "POSTGRES" | "PG" => Ok(Self::Postgresql),
            "HSQLDB" => Ok(Self::Hsqldb),
            "H2" => Ok(Self::H2),
            "UNKNOWN" | "" => Ok(Self::Unknown),
            other => Err(QueryError::Config(format!("unknown database type '{}'", other))),
        }
    }
}

/// Vendor specific SQL generation: identifier quoting, paging, table naming and entity statements.
///
/// Apart from `name` and `to_shared`, every method has a default, so a dialect only overrides
/// what differs from the generic behavior.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    fn name(&self) -> DatabaseType;

    /// An owned handle to this dialect, for builders such as [`Table`] that keep one.
    fn to_shared(&self) -> Arc<dyn Dialect>;

    /// Opening and closing identifier quote.
    fn identifier_quote(&self) -> (&str, &str) {
        ("", "")
    }

    fn wrap_identifier_quote(&self, origin: &str) -> String {
        let (begin, end) = self.identifier_quote();
        let (begin, end) = (begin.trim(), end.trim());
        let mut out = String::with_capacity(origin.len() + begin.len() + end.len());
        out.push_str(begin);
        out.push_str(origin);
        out.push_str(end);
        out
    }

    /// Quotes a column reference; `alias.column` keeps the alias bare.
    fn wrap_identifier_field(&self, field: &str) -> String {
        let parts: Vec<&str> = field.split('.').filter(|p| !p.is_empty()).collect();
        if parts.len() == 2 {
            format!("{}.{}", parts[0], self.wrap_identifier_quote(parts[1]))
        } else {
            self.wrap_identifier_quote(field)
        }
    }

    /// Rewrites `origin_sql` to return one page. `page` is 1-based.
    fn build_paged_query_sql(&self, origin_sql: &str, page: u32, page_size: u32) -> String {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        if page_size == 0 {
            format!("{} limit {}", origin_sql, offset)
        } else {
            format!("{} limit {}, {}", origin_sql, offset, page_size)
        }
    }

    fn sequence_next_val_sql(&self, sequence_name: &str) -> QueryResult<String> {
        Err(QueryError::Unsupported(format!(
            "sequence '{}' on {}",
            sequence_name,
            self.name()
        )))
    }

    /// Value expression used for `property` in entity inserts; `None` leaves the column out.
    fn insert_value_expr(&self, _property: &PropertyMeta) -> QueryResult<Option<String>> {
        Ok(Some("?".to_owned()))
    }

    fn build_table_name(
        &self,
        prefix: Option<&str>,
        table_name: &str,
        sharding_rule: Option<&dyn ShardingRule>,
        sharding_param: Option<&BindValue>,
    ) -> String {
        let name = match (sharding_rule, sharding_param) {
            (Some(rule), Some(param)) => rule.shard_name(table_name, param),
            _ => table_name.to_owned(),
        };
        let prefix = prefix.map(str::trim).unwrap_or_default();
        self.wrap_identifier_quote(&format!("{}{}", prefix, name))
    }

    fn build_entity_table_name(
        &self,
        prefix: Option<&str>,
        meta: &EntityMeta,
        sharding_param: Option<&BindValue>,
    ) -> String {
        self.build_table_name(
            prefix,
            &meta.entity_name,
            meta.sharding_rule.as_deref(),
            sharding_param,
        )
    }

    fn build_insert_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
        fields: Option<&Fields>,
    ) -> QueryResult<String> {
        let names = requested_fields(meta, fields)?;
        let mut columns = Vec::with_capacity(names.len());
        let mut values = Vec::with_capacity(names.len());
        for name in &names {
            let property = meta
                .get_property(name)
                .ok_or_else(|| QueryError::InvalidField(name.clone()))?;
            if let Some(value) = self.insert_value_expr(property)? {
                columns.push(self.wrap_identifier_quote(name));
                values.push(value);
            }
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.build_entity_table_name(prefix, meta, sharding_param),
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn build_delete_by_pk_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
        pk_fields: Option<&Fields>,
    ) -> QueryResult<String> {
        let pks = requested_primary_keys(meta, pk_fields)?;
        Ok(format!(
            "DELETE FROM {} WHERE {}",
            self.build_entity_table_name(prefix, meta, sharding_param),
            format_fields(self, &pks, " = ?", " and ")
        ))
    }

    /// Primary keys and read-only columns never appear in the SET list.
    fn build_update_by_pk_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
        pk_fields: Option<&Fields>,
        fields: Option<&Fields>,
    ) -> QueryResult<String> {
        let columns = update_columns(meta, fields)?;
        let pks = requested_primary_keys(meta, pk_fields)?;
        Ok(format!(
            "UPDATE {} SET {} WHERE {}",
            self.build_entity_table_name(prefix, meta, sharding_param),
            format_fields(self, &columns, " = ?", ", "),
            format_fields(self, &pks, " = ?", " and ")
        ))
    }

    fn build_select_by_pk_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
        pk_fields: Option<&Fields>,
        fields: Option<&Fields>,
    ) -> QueryResult<String> {
        let select = self.build_select_sql(meta, prefix, sharding_param, fields)?;
        let pks = requested_primary_keys(meta, pk_fields)?;
        Ok(format!(
            "{} WHERE {}",
            select,
            format_fields(self, &pks, " = ?", " and ")
        ))
    }

    fn build_select_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
        fields: Option<&Fields>,
    ) -> QueryResult<String> {
        let names = requested_fields(meta, fields)?;
        Ok(format!(
            "SELECT {} FROM {}",
            format_fields(self, &names, "", ", "),
            self.build_entity_table_name(prefix, meta, sharding_param)
        ))
    }

    fn build_create_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
    ) -> String {
        Table::from_entity(self.to_shared(), prefix, meta)
            .sharding_param(sharding_param.cloned())
            .to_create_sql()
    }

    fn build_drop_sql(
        &self,
        meta: &EntityMeta,
        prefix: Option<&str>,
        sharding_param: Option<&BindValue>,
    ) -> String {
        Table::from_entity(self.to_shared(), prefix, meta)
            .sharding_param(sharding_param.cloned())
            .to_drop_sql()
    }
}

fn requested_fields(meta: &EntityMeta, fields: Option<&Fields>) -> QueryResult<Vec<String>> {
    match fields {
        Some(fields) if !fields.is_empty() => {
            if let Some(unknown) = fields.iter().find(|f| !meta.contains_property(f)) {
                return Err(QueryError::InvalidField(unknown.clone()));
            }
            Ok(fields.to_vec())
        }
        _ => Ok(meta.property_names()),
    }
}

fn requested_primary_keys(
    meta: &EntityMeta,
    pk_fields: Option<&Fields>,
) -> QueryResult<Vec<String>> {
    match pk_fields {
        Some(pks) if !pks.is_empty() => {
            if let Some(unknown) = pks.iter().find(|f| !meta.is_primary_key(f)) {
                return Err(QueryError::InvalidPrimaryKey(unknown.clone()));
            }
            Ok(pks.to_vec())
        }
        _ => Ok(meta.primary_keys.clone()),
    }
}

pub(crate) fn update_columns(meta: &EntityMeta, fields: Option<&Fields>) -> QueryResult<Vec<String>> {
    let requested = match fields {
        Some(fields) if !fields.is_empty() => fields.to_vec(),
        _ => meta.property_names(),
    };
    let mut columns = Vec::with_capacity(requested.len());
    for field in requested {
        let property = meta
            .get_property(&field)
            .ok_or_else(|| QueryError::InvalidField(field.clone()))?;
        if meta.is_primary_key(&field) || property.readonly {
            continue;
        }
        columns.push(field);
    }
    Ok(columns)
}

fn format_fields<D: Dialect + ?Sized>(
    dialect: &D,
    fields: &[String],
    suffix: &str,
    separator: &str,
) -> String {
    fields
        .iter()
        .map(|f| format!("{}{}", dialect.wrap_identifier_quote(f), suffix))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Behavior shared by DB2, HSQLDB, H2 and unknown databases: no quoting, `limit off, size` paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericDialect {
    database: DatabaseType,
}

impl GenericDialect {
    pub fn new(database: DatabaseType) -> Self {
        Self { database }
    }
}

impl Default for GenericDialect {
    fn default() -> Self {
        Self::new(DatabaseType::Unknown)
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> DatabaseType {
        self.database
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(*self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> DatabaseType {
        DatabaseType::Mysql
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(*self)
    }

    fn identifier_quote(&self) -> (&str, &str) {
        ("`", "`")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> DatabaseType {
        DatabaseType::Oracle
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(*self)
    }

    fn sequence_next_val_sql(&self, sequence_name: &str) -> QueryResult<String> {
        Ok(format!("{}.nextval", sequence_name))
    }

    /// Auto-increment columns are filled from their sequence or left out.
    fn insert_value_expr(&self, property: &PropertyMeta) -> QueryResult<Option<String>> {
        if !property.autoincrement {
            return Ok(Some("?".to_owned()));
        }
        match property
            .sequence_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(sequence) => self.sequence_next_val_sql(sequence).map(Some),
            None => Ok(None),
        }
    }

    fn build_paged_query_sql(&self, origin_sql: &str, page: u32, page_size: u32) -> String {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        if page_size == 0 {
            format!("SELECT * FROM ( {} ) WHERE rownum <= {}", origin_sql, offset)
        } else {
            format!(
                "SELECT * FROM ( SELECT row_.*, rownum rownum_ FROM ( {} ) row_ ) WHERE rownum_ > {} AND rownum_ <= {}",
                origin_sql,
                offset,
                offset + u64::from(page_size)
            )
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> DatabaseType {
        DatabaseType::Sqlserver
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(*self)
    }

    fn identifier_quote(&self) -> (&str, &str) {
        ("[", "]")
    }

    /// `OFFSET .. FETCH` requires an ORDER BY; one is added when missing.
    fn build_paged_query_sql(&self, origin_sql: &str, page: u32, page_size: u32) -> String {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let order = if origin_sql.to_ascii_uppercase().contains("ORDER BY") {
            ""
        } else {
            " ORDER BY (SELECT NULL)"
        };
        if page_size == 0 {
            format!("{}{} OFFSET {} ROWS", origin_sql, order, offset)
        } else {
            format!(
                "{}{} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                origin_sql, order, offset, page_size
            )
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgreSqlDialect;

impl Dialect for PostgreSqlDialect {
    fn name(&self) -> DatabaseType {
        DatabaseType::Postgresql
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(*self)
    }

    fn identifier_quote(&self) -> (&str, &str) {
        ("\"", "\"")
    }

    fn sequence_next_val_sql(&self, sequence_name: &str) -> QueryResult<String> {
        Ok(format!("nextval('{}')", sequence_name))
    }

    fn build_paged_query_sql(&self, origin_sql: &str, page: u32, page_size: u32) -> String {
        limit_offset(origin_sql, page, page_size, "ALL")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(*self)
    }

    fn identifier_quote(&self) -> (&str, &str) {
        ("\"", "\"")
    }

    fn build_paged_query_sql(&self, origin_sql: &str, page: u32, page_size: u32) -> String {
        limit_offset(origin_sql, page, page_size, "-1")
    }
}

/// `unbounded` is the LIMIT value meaning "no limit": `ALL` on PostgreSQL, `-1` on SQLite.
fn limit_offset(origin_sql: &str, page: u32, page_size: u32, unbounded: &str) -> String {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    if page_size == 0 {
        format!("{} LIMIT {} OFFSET {}", origin_sql, unbounded, offset)
    } else {
        format!("{} LIMIT {} OFFSET {}", origin_sql, page_size, offset)
    }
}

/// Binds a sqlx driver to the runtime [`Dialect`] and to its placeholder style.
pub trait SqlDialect: Database + Sized + Send + Sync
where
    Self::Connection: Send,
{
    /// Returns the placeholder for the `n`-th parameter in a query (e.g., "?" or "$1").
    fn placeholder(n: usize) -> String;
    /// Returns the number of rows affected by a query result.
    fn rows_affected(res: &Self::QueryResult) -> u64;
    /// Returns the ID of the last inserted row.
    fn last_insert_id(res: &Self::QueryResult) -> i64;
    fn database_type() -> DatabaseType;

    fn dialect() -> Arc<dyn Dialect> {
        Self::database_type().dialect()
    }

    /// Rewrites `?` placeholders into the driver's style, leaving quoted text alone.
    fn prepare_sql(sql: &str) -> Cow<'_, str> {
        if Self::placeholder(1) == "?" || !sql.contains('?') {
            return Cow::Borrowed(sql);
        }
        let mut out = String::with_capacity(sql.len() + 8);
        let mut index = 0;
        let mut quote: Option<char> = None;
        for ch in sql.chars() {
            match quote {
                Some(q) if ch == q => {
                    quote = None;
                    out.push(ch);
                }
                Some(_) => out.push(ch),
                None if ch == '\'' || ch == '"' || ch == '`' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                None if ch == '?' => {
                    index += 1;
                    out.push_str(&Self::placeholder(index));
                }
                None => out.push(ch),
            }
        }
        Cow::Owned(out)
    }
}

#[cfg(feature = "sqlite")]
impl SqlDialect for sqlx::Sqlite {
    fn placeholder(_n: usize) -> String {
        "?".to_owned()
    }
    fn rows_affected(res: &sqlx::sqlite::SqliteQueryResult) -> u64 {
        res.rows_affected()
    }
    fn last_insert_id(res: &sqlx::sqlite::SqliteQueryResult) -> i64 {
        res.last_insert_rowid()
    }
    fn database_type() -> DatabaseType {
        DatabaseType::Sqlite
    }
}

#[cfg(feature = "postgres")]
impl SqlDialect for sqlx::Postgres {
    fn placeholder(n: usize) -> String {
        format!("${}", n)
    }
    fn rows_affected(res: &sqlx::postgres::PgQueryResult) -> u64 {
        res.rows_affected()
    }
    fn last_insert_id(_res: &sqlx::postgres::PgQueryResult) -> i64 {
        0
    }
    fn database_type() -> DatabaseType {
        DatabaseType::Postgresql
    }
}

#[cfg(feature = "mysql")]
impl SqlDialect for sqlx::MySql {
    fn placeholder(_n: usize) -> String {
        "?".to_owned()
    }
    fn rows_affected(res: &sqlx::mysql::MySqlQueryResult) -> u64 {
        res.rows_affected()
    }
    fn last_insert_id(res: &sqlx::mysql::MySqlQueryResult) -> i64 {
        res.last_insert_id() as i64
    }
    fn database_type() -> DatabaseType {
        DatabaseType::Mysql
    }
}
