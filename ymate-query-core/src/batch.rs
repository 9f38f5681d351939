use std::io::Read;
use std::path::Path;
use std::time::Instant;

use sqlx::{Database, IntoArguments};

use crate::delete::Delete;
use crate::dialect::SqlDialect;
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, IntoExecutor};
use crate::insert::Insert;
use crate::params::{Params, bind_value_query};
use crate::query::QueryContext;
use crate::record_query_metrics;
use crate::update::Update;

/// A templated statement run once per parameter set, plus standalone statements.
#[derive(Debug, Clone, Default)]
pub struct BatchSql {
    ctx: QueryContext,
    batch_sql: Option<String>,
    params: Vec<Params>,
    sqls: Vec<String>,
}

impl BatchSql {
    pub fn new(batch_sql: Option<&str>) -> Self {
        Self {
            batch_sql: batch_sql
                .filter(|sql| !sql.trim().is_empty())
                .map(str::to_owned),
            ..Self::default()
        }
    }

    pub fn from_insert(insert: &Insert) -> Self {
        Self::new(Some(&insert.to_string()))
    }

    pub fn from_update(update: &Update) -> Self {
        Self::new(Some(&update.to_string()))
    }

    pub fn from_delete(delete: &Delete) -> Self {
        Self::new(Some(&delete.to_string()))
    }

    pub fn context(mut self, ctx: QueryContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Adds one parameter set for the template.
    ///
    /// # Errors
    /// Returns [`QueryError::Unsupported`] when the batch was created without a template.
    pub fn add_parameter(mut self, params: Params) -> QueryResult<Self> {
        if self.batch_sql.is_none() {
            return Err(QueryError::Unsupported(
                "batch parameters need a batch statement".to_owned(),
            ));
        }
        self.params.push(params);
        Ok(self)
    }

    pub fn add_sql(mut self, sql: impl Into<String>) -> Self {
        self.sqls.push(sql.into());
        self
    }

    pub fn get_sql(&self) -> Option<&str> {
        self.batch_sql.as_deref()
    }

    pub fn get_params(&self) -> &[Params] {
        &self.params
    }

    pub fn get_sqls(&self) -> &[String] {
        &self.sqls
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.sqls.is_empty()
    }

    /// Splits a script on `;`, dropping `--` comment lines and blank statements.
    pub fn load_sql(script: &str) -> Vec<String> {
        let cleaned: Vec<&str> = script
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect();
        cleaned
            .join("\n")
            .split(';')
            .map(str::trim)
            .filter(|statement| !statement.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// A missing file yields no statements.
    pub fn load_sql_file(path: impl AsRef<Path>) -> QueryResult<Vec<String>> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "sql script not found");
            return Ok(Vec::new());
        }
        Ok(Self::load_sql(&std::fs::read_to_string(path)?))
    }

    pub fn load_sql_reader<R: Read>(mut reader: R) -> QueryResult<Vec<String>> {
        let mut script = String::new();
        reader.read_to_string(&mut script)?;
        Ok(Self::load_sql(&script))
    }
}

impl BatchSql {
    /// Runs every statement and returns one count per statement: template runs first, then the
    /// standalone statements. A pool runs the whole batch in one transaction.
    #[tracing::instrument(skip(self, executor), fields(operation = "batch", size = self.params.len() + self.sqls.len()))]
    pub async fn execute<'a, E>(&self, executor: E) -> QueryResult<Vec<u64>>
    where
        E: IntoExecutor<'a>,
        for<'q> <E::DB as Database>::Arguments<'q>: IntoArguments<'q, E::DB>,
        for<'c> &'c mut <E::DB as Database>::Connection: sqlx::Executor<'c, Database = E::DB>,
        String: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        i64: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        f64: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        bool: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        Option<String>: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        uuid::Uuid: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        chrono::DateTime<chrono::Utc>: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        Vec<u8>: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
    {
        let start = Instant::now();
        let counts = match executor.into_executor() {
            Executor::Pool(pool) => {
                let mut tx = pool.begin().await?;
                let counts = self.run::<E::DB>(&mut Executor::Conn(&mut *tx)).await?;
                tx.commit().await?;
                counts
            }
            mut conn => self.run::<E::DB>(&mut conn).await?,
        };
        record_query_metrics("batch", <E::DB as SqlDialect>::database_type().as_str(), start.elapsed());
        Ok(counts)
    }

    async fn run<DB>(&self, executor: &mut Executor<'_, DB>) -> QueryResult<Vec<u64>>
    where
        DB: SqlDialect,
        for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB>,
        for<'c> &'c mut <DB as Database>::Connection: sqlx::Executor<'c, Database = DB>,
        String: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        i64: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        f64: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        bool: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        Option<String>: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        uuid::Uuid: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        chrono::DateTime<chrono::Utc>: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
        Vec<u8>: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    {
        let mut counts = Vec::with_capacity(self.params.len() + self.sqls.len());
        if let Some(batch_sql) = &self.batch_sql {
            let sql = DB::prepare_sql(batch_sql).into_owned();
            for params in &self.params {
                #[cfg(debug_assertions)]
                tracing::debug!(operation = "batch", sql = %sql, params = %params.to_log_string(), "ymate batch");
                let query = params
                    .clone()
                    .into_iter()
                    .fold(sqlx::query::<DB>(&sql), bind_value_query);
                let result = executor.execute(query).await?;
                counts.push(DB::rows_affected(&result));
            }
        }
        for sql in &self.sqls {
            if self.ctx.is_show_sql() {
                tracing::info!(operation = "batch", sql = %sql, "ymate batch");
            }
            let result = executor.execute(sqlx::query::<DB>(sql)).await?;
            counts.push(DB::rows_affected(&result));
        }
        tracing::info!(statements = counts.len(), "batch executed");
        Ok(counts)
    }

    /// Runs script statements as one batch and returns the summed effect count.
    pub async fn exec_sql<'a, E>(executor: E, scripts: &[String]) -> QueryResult<u64>
    where
        E: IntoExecutor<'a>,
        for<'q> <E::DB as Database>::Arguments<'q>: IntoArguments<'q, E::DB>,
        for<'c> &'c mut <E::DB as Database>::Connection: sqlx::Executor<'c, Database = E::DB>,
        String: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        i64: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        f64: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        bool: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        Option<String>: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        uuid::Uuid: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        chrono::DateTime<chrono::Utc>: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
        Vec<u8>: for<'q> sqlx::Encode<'q, E::DB> + sqlx::Type<E::DB>,
    {
        if scripts.is_empty() {
            return Ok(0);
        }
        let batch = scripts
            .iter()
            .fold(BatchSql::new(None), |batch, sql| batch.add_sql(sql.as_str()));
        Ok(batch.execute(executor).await?.into_iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn add_parameter_requires_template() {
        let err = BatchSql::new(None).add_parameter(params![1]).unwrap_err();
        assert!(matches!(err, QueryError::Unsupported(_)));
        let batch = BatchSql::new(Some("  ")).add_sql("DELETE FROM t");
        assert!(batch.get_sql().is_none());
        assert_eq!(batch.get_sqls().len(), 1);
    }

    #[test]
    fn template_comes_from_statement() {
        let insert = Insert::into("t").field("a").field("b").param(1).param(2);
        let batch = BatchSql::from_insert(&insert)
            .add_parameter(params![3, 4])
            .unwrap()
            .add_parameter(params![5, 6])
            .unwrap();
        assert_eq!(batch.get_sql(), Some("INSERT INTO t (a, b) VALUES (?, ?)"));
        assert_eq!(batch.get_params().len(), 2);
    }

    #[test]
    fn load_sql_splits_and_skips_comments() {
        let script = "-- schema\nCREATE TABLE a (id INT);\n\n  ;\n-- seed; ignored\nINSERT INTO a VALUES (1);\nINSERT INTO a VALUES (2)";
        assert_eq!(
            BatchSql::load_sql(script),
            vec![
                "CREATE TABLE a (id INT)",
                "INSERT INTO a VALUES (1)",
                "INSERT INTO a VALUES (2)"
            ]
        );
    }

    #[test]
    fn load_sql_reader_and_missing_file() {
        let statements = BatchSql::load_sql_reader("SELECT 1; SELECT 2;".as_bytes()).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(BatchSql::load_sql_file("/definitely/not/here.sql").unwrap().is_empty());
    }
}
