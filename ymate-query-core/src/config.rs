use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dialect::{DatabaseType, Dialect};
use crate::entity::PropertyMeta;
use crate::error::{QueryError, QueryResult};
use crate::query::QueryContext;

pub const ENV_DATABASE_URL: &str = "YMQ_DATABASE_URL";
pub const ENV_FALLBACK_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_TABLE_PREFIX: &str = "YMQ_TABLE_PREFIX";
pub const ENV_DIALECT: &str = "YMQ_DIALECT";
pub const ENV_SHOW_SQL: &str = "YMQ_SHOW_SQL";
pub const ENV_MAX_CONNECTIONS: &str = "YMQ_MAX_CONNECTIONS";

fn default_name() -> String {
    "default".to_owned()
}

fn default_max_connections() -> u32 {
    10
}

/// One data source: connection URL plus the rendering options of its statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub url: String,
    /// Overrides the dialect detected from `url`.
    #[serde(default)]
    pub dialect: Option<DatabaseType>,
    #[serde(default)]
    pub table_prefix: Option<String>,
    /// `"q"` for the same quote on both sides, `"begin,end"` otherwise.
    #[serde(default)]
    pub identifier_quote: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub show_sql: bool,
}

impl DataSourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            url: url.into(),
            dialect: None,
            table_prefix: None,
            identifier_quote: None,
            max_connections: default_max_connections(),
            show_sql: false,
        }
    }

    pub fn from_json_str(json: &str) -> QueryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Reads `YMQ_DATABASE_URL` (or `DATABASE_URL`) and the optional `YMQ_*` settings.
    ///
    /// Unparseable optional values are logged and ignored.
    pub fn from_env() -> QueryResult<Self> {
        let url = std::env::var(ENV_DATABASE_URL)
            .or_else(|_| std::env::var(ENV_FALLBACK_DATABASE_URL))
            .map_err(|_| {
                QueryError::Config(format!(
                    "neither {} nor {} is set",
                    ENV_DATABASE_URL, ENV_FALLBACK_DATABASE_URL
                ))
            })?;
        let mut config = Self::new(url);
        config.table_prefix = std::env::var(ENV_TABLE_PREFIX)
            .ok()
            .filter(|p| !p.trim().is_empty());
        if let Ok(dialect) = std::env::var(ENV_DIALECT) {
            match dialect.parse::<DatabaseType>() {
                Ok(database) => config.dialect = Some(database),
                Err(err) => tracing::warn!(value = %dialect, error = %err, "ignoring {}", ENV_DIALECT),
            }
        }
        if let Ok(show_sql) = std::env::var(ENV_SHOW_SQL) {
            match show_sql.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.show_sql = true,
                "0" | "false" | "no" | "off" | "" => config.show_sql = false,
                other => tracing::warn!(value = other, "ignoring {}", ENV_SHOW_SQL),
            }
        }
        if let Ok(max) = std::env::var(ENV_MAX_CONNECTIONS) {
            match max.trim().parse::<u32>() {
                Ok(max) if max > 0 => config.max_connections = max,
                _ => tracing::warn!(value = %max, "ignoring {}", ENV_MAX_CONNECTIONS),
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> QueryResult<()> {
        if self.url.trim().is_empty() {
            return Err(QueryError::Config(format!(
                "data source '{}' has no url",
                self.name
            )));
        }
        if self.max_connections == 0 {
            return Err(QueryError::Config(format!(
                "data source '{}' needs at least one connection",
                self.name
            )));
        }
        Ok(())
    }

    /// Explicit dialect, otherwise the one detected from the URL scheme.
    pub fn database_type(&self) -> DatabaseType {
        self.dialect.unwrap_or_else(|| DatabaseType::from_url(&self.url))
    }

    fn quote_pair(&self) -> Option<(String, String)> {
        let quote = self.identifier_quote.as_deref()?.trim();
        if quote.is_empty() {
            return None;
        }
        match quote.split_once(',') {
            Some((begin, end)) => Some((begin.trim().to_owned(), end.trim().to_owned())),
            None => Some((quote.to_owned(), quote.to_owned())),
        }
    }

    /// Rendering context for statements against this data source.
    pub fn to_context(&self) -> QueryContext {
        let dialect = self.database_type().dialect();
        let dialect: Arc<dyn Dialect> = match self.quote_pair() {
            Some((begin, end)) => Arc::new(QuotedDialect {
                inner: dialect,
                begin,
                end,
            }),
            None => dialect,
        };
        let ctx = QueryContext::new(dialect).show_sql(self.show_sql);
        match self.table_prefix.as_deref() {
            Some(prefix) => ctx.table_prefix(prefix),
            None => ctx,
        }
    }

    /// Pool options sized by `max_connections`.
    pub fn pool_options<DB: sqlx::Database>(&self) -> sqlx::pool::PoolOptions<DB> {
        sqlx::pool::PoolOptions::new().max_connections(self.max_connections)
    }
}

/// A dialect with configured identifier quotes; everything else comes from `inner`.
#[derive(Debug, Clone)]
struct QuotedDialect {
    inner: Arc<dyn Dialect>,
    begin: String,
    end: String,
}

impl Dialect for QuotedDialect {
    fn name(&self) -> DatabaseType {
        self.inner.name()
    }

    fn to_shared(&self) -> Arc<dyn Dialect> {
        Arc::new(self.clone())
    }

    fn identifier_quote(&self) -> (&str, &str) {
        (&self.begin, &self.end)
    }

    fn build_paged_query_sql(&self, origin_sql: &str, page: u32, page_size: u32) -> String {
        self.inner.build_paged_query_sql(origin_sql, page, page_size)
    }

    fn sequence_next_val_sql(&self, sequence_name: &str) -> QueryResult<String> {
        self.inner.sequence_next_val_sql(sequence_name)
    }

    fn insert_value_expr(&self, property: &PropertyMeta) -> QueryResult<Option<String>> {
        self.inner.insert_value_expr(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_config_fills_defaults() {
        let config =
            DataSourceConfig::from_json_str(r#"{"url": "mysql://root@localhost/demo", "table_prefix": "ym_"}"#)
                .unwrap();
        assert_eq!(config.name, "default");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.database_type(), DatabaseType::Mysql);
        let ctx = config.to_context();
        assert_eq!(ctx.get_table_prefix(), Some("ym_"));
        assert_eq!(ctx.build_safe_table_name(None, "user", true), "`ym_user`");
    }

    #[test]
    fn explicit_dialect_and_quotes_win() {
        let config = DataSourceConfig::from_json_str(
            r#"{"url": "sqlite::memory:", "dialect": "SQLSERVER", "identifier_quote": "[,]"}"#,
        )
        .unwrap();
        let ctx = config.to_context();
        assert_eq!(ctx.dialect().name(), DatabaseType::Sqlserver);
        assert_eq!(ctx.wrap_identifier_quote("id"), "[id]");
        assert!(ctx.dialect().build_paged_query_sql("SELECT 1 ORDER BY a", 1, 5).contains("FETCH NEXT 5 ROWS ONLY"));

        let mut config = DataSourceConfig::new("h2:mem");
        config.identifier_quote = Some("\"".to_owned());
        assert_eq!(config.to_context().wrap_identifier_field("t.id"), "t.\"id\"");
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            DataSourceConfig::from_json_str(r#"{"url": " "}"#),
            Err(QueryError::Config(_))
        ));
        assert!(matches!(
            DataSourceConfig::from_json_str(r#"{"url": "sqlite::memory:", "max_connections": 0}"#),
            Err(QueryError::Config(_))
        ));
        assert!(matches!(
            DataSourceConfig::from_json_str("{"),
            Err(QueryError::Json(_))
        ));
    }
}
