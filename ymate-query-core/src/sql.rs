use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Instant;

use futures_util::StreamExt;
use regex::Regex;
use serde::Serialize;
use sqlx::{Database, IntoArguments};

use crate::delete::Delete;
use crate::dialect::{DatabaseType, Dialect, SqlDialect};
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, IntoExecutor};
use crate::insert::Insert;
use crate::page::Page;
use crate::params::{BindValue, Params, bind_value_query, bind_value_query_as};
use crate::query::QueryContext;
use crate::record_query_metrics;
use crate::select::Select;
use crate::update::Update;

static VARIABLE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn variable_regex() -> QueryResult<&'static Regex> {
    VARIABLE
        .get_or_init(|| Regex::new(r"\$\{\s*([A-Za-z_][\w.]*)\s*\}"))
        .as_ref()
        .map_err(|err| QueryError::Message(err.to_string()))
}

/// A finished SQL statement with its positional params.
#[derive(Debug, Clone, Default)]
pub struct Sql {
    sql: String,
    params: Params,
    ctx: QueryContext,
}

impl Sql {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
            ctx: QueryContext::default(),
        }
    }

    pub fn from_select(select: &Select) -> Self {
        Self::new(select.to_string(), select.params()).context(select.get_context().clone())
    }

    pub fn from_insert(insert: &Insert) -> Self {
        insert.to_sql()
    }

    pub fn from_update(update: &Update) -> Self {
        update.to_sql()
    }

    pub fn from_delete(delete: &Delete) -> Self {
        delete.to_sql()
    }

    /// Replaces each `${name}` with `?` and binds the named values in order of appearance.
    ///
    /// A variable may appear more than once; it is bound once per occurrence.
    pub fn from_expression(expression: &str, variables: &HashMap<String, BindValue>) -> QueryResult<Self> {
        let regex = variable_regex()?;
        let mut sql = String::with_capacity(expression.len());
        let mut params = Params::new();
        let mut last = 0;
        for captures in regex.captures_iter(expression) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = variables
                .get(name.as_str())
                .ok_or_else(|| QueryError::MissingVariable(name.as_str().to_owned()))?;
            sql.push_str(&expression[last..whole.start()]);
            sql.push('?');
            params.push(value.clone());
            last = whole.end();
        }
        sql.push_str(&expression[last..]);
        Ok(Self::new(sql, params))
    }

    pub fn context(mut self, ctx: QueryContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn get_context(&self) -> &QueryContext {
        &self.ctx
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.append(&params);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// `SELECT count(*) FROM (sql) c_t`, sharing this statement's params.
    pub fn to_count_sql(&self) -> Sql {
        Self {
            sql: format!("SELECT count(*) FROM ({}) c_t", self.sql),
            params: self.params.clone(),
            ctx: self.ctx.clone(),
        }
    }

    /// Rewrites the statement for one page with the context's dialect.
    pub fn to_paged_sql(&self, page: &Page) -> Sql {
        self.paged_with(self.ctx.dialect(), page)
    }

    /// Like [`Sql::to_paged_sql`], but a context without a known database pages with the
    /// dialect of `database`, the driver the statement runs on.
    pub fn to_paged_sql_for(&self, page: &Page, database: DatabaseType) -> Sql {
        if self.ctx.dialect().name() == DatabaseType::Unknown && database != DatabaseType::Unknown {
            self.paged_with(database.dialect().as_ref(), page)
        } else {
            self.to_paged_sql(page)
        }
    }

    fn paged_with(&self, dialect: &dyn Dialect, page: &Page) -> Sql {
        Self {
            sql: dialect.build_paged_query_sql(&self.sql, page.get_page(), page.get_page_size()),
            params: self.params.clone(),
            ctx: self.ctx.clone(),
        }
    }

    /// Attaches an executor (pool, connection or transaction) to run this statement.
    pub fn on<'a, E>(self, executor: E) -> SqlQuery<'a, E::DB>
    where
        E: IntoExecutor<'a>,
    {
        SqlQuery {
            executor: executor.into_executor(),
            sql: self,
        }
    }

    fn log(&self, operation: &'static str) {
        if self.ctx.is_show_sql() {
            tracing::info!(
                operation,
                sql = %self.sql,
                params = %self.params.to_log_string(),
                "ymate query"
            );
        } else {
            #[cfg(debug_assertions)]
            tracing::debug!(
                operation,
                sql = %self.sql,
                params = %self.params.to_log_string(),
                "ymate query"
            );
        }
    }
}

impl std::fmt::Display for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// One page of rows and the paging totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    /// Total rows, `None` when the page was fetched without counting.
    pub record_count: Option<u64>,
    pub page_count: Option<u64>,
}

impl<T> PageResult<T> {
    pub fn new(rows: Vec<T>, page: &Page, record_count: Option<u64>) -> Self {
        let page_size = page.get_page_size();
        Self {
            rows,
            page: page.get_page(),
            page_size,
            record_count,
            page_count: record_count.map(|count| count.div_ceil(u64::from(page_size.max(1)))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A [`Sql`] bound to an [`Executor`].
pub struct SqlQuery<'a, DB: Database> {
    executor: Executor<'a, DB>,
    sql: Sql,
}

impl<'a, DB: Database> std::fmt::Debug for SqlQuery<'a, DB> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlQuery")
            .field("executor", &self.executor)
            .field("sql", &self.sql.sql)
            .finish()
    }
}

impl<'a, DB> SqlQuery<'a, DB>
where
    DB: SqlDialect,
    for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c mut <DB as Database>::Connection: sqlx::Executor<'c, Database = DB>,
    DB::Connection: Send,
    String: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    i64: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    f64: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    bool: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Option<String>: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    uuid::Uuid: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    chrono::DateTime<chrono::Utc>: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Vec<u8>: for<'q> sqlx::Encode<'q, DB> + sqlx::Type<DB>,
{
    /// Runs the statement and returns the affected row count.
    #[tracing::instrument(skip(self), fields(operation = "execute"))]
    pub async fn execute(mut self) -> QueryResult<u64> {
        let result = self.run_execute().await?;
        Ok(DB::rows_affected(&result))
    }

    /// Runs an insert and returns the generated id (0 where the driver reports none).
    #[tracing::instrument(skip(self), fields(operation = "insert"))]
    pub async fn execute_insert_id(mut self) -> QueryResult<i64> {
        let result = self.run_execute().await?;
        Ok(DB::last_insert_id(&result))
    }

    async fn run_execute(&mut self) -> QueryResult<DB::QueryResult> {
        self.sql.log("execute");
        let sql = DB::prepare_sql(&self.sql.sql).into_owned();
        let start = Instant::now();
        let query = self
            .sql
            .params
            .clone()
            .into_iter()
            .fold(sqlx::query::<DB>(&sql), bind_value_query);
        let result = self.executor.execute(query).await?;
        record_query_metrics("execute", DB::database_type().as_str(), start.elapsed());
        Ok(result)
    }

    #[tracing::instrument(skip(self), fields(operation = "find_all"))]
    pub async fn find_all<T>(mut self) -> QueryResult<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
    {
        let sql = self.sql.clone();
        Self::fetch_all_with(&mut self.executor, &sql).await
    }

    /// First row, with the dialect limiting the query to one row.
    #[tracing::instrument(skip(self), fields(operation = "find_first"))]
    pub async fn find_first<T>(mut self) -> QueryResult<Option<T>>
    where
        T: for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
    {
        let paged = self.sql.to_paged_sql_for(&Page::limit_one(), DB::database_type());
        paged.log("find_first");
        let sql = DB::prepare_sql(&paged.sql).into_owned();
        let start = Instant::now();
        let query = paged
            .params
            .into_iter()
            .fold(sqlx::query_as::<DB, T>(&sql), bind_value_query_as);
        let row = self.executor.fetch_optional(query).await?;
        record_query_metrics("find_first", DB::database_type().as_str(), start.elapsed());
        Ok(row)
    }

    /// Counts the rows first when the page asks for it, then fetches the page.
    #[tracing::instrument(skip(self), fields(operation = "find_page", page = page.get_page()))]
    pub async fn find_page<T>(mut self, page: Page) -> QueryResult<PageResult<T>>
    where
        T: for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
        (i64,): for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
    {
        let record_count = if page.is_count() {
            let count = Self::count_with(&mut self.executor, &self.sql.to_count_sql()).await?;
            if count == 0 {
                return Ok(PageResult::new(Vec::new(), &page, Some(0)));
            }
            Some(count)
        } else {
            None
        };
        let paged = self.sql.to_paged_sql_for(&page, DB::database_type());
        let rows = Self::fetch_all_with(&mut self.executor, &paged).await?;
        Ok(PageResult::new(rows, &page, record_count))
    }

    /// Number of rows the statement would return.
    #[tracing::instrument(skip(self), fields(operation = "count"))]
    pub async fn count(mut self) -> QueryResult<u64>
    where
        (i64,): for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
    {
        let count_sql = self.sql.to_count_sql();
        Self::count_with(&mut self.executor, &count_sql).await
    }

    /// Streams rows without buffering the whole result.
    pub fn fetch_stream<T>(self) -> futures_util::stream::BoxStream<'a, QueryResult<T>>
    where
        T: for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin + 'a,
    {
        self.sql.log("stream");
        let sql = DB::prepare_sql(&self.sql.sql).into_owned();
        let params = self.sql.params;
        let executor = self.executor;
        Box::pin(async_stream::try_stream! {
            let mut query = sqlx::query_as::<DB, T>(&sql);
            for bind in params {
                query = bind_value_query_as(query, bind);
            }
            let mut rows = executor.fetch_stream(query);
            while let Some(row) = rows.next().await {
                yield row?;
            }
        })
    }

    async fn fetch_all_with<T>(executor: &mut Executor<'a, DB>, statement: &Sql) -> QueryResult<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
    {
        statement.log("find_all");
        let sql = DB::prepare_sql(&statement.sql).into_owned();
        let start = Instant::now();
        let query = statement
            .params
            .clone()
            .into_iter()
            .fold(sqlx::query_as::<DB, T>(&sql), bind_value_query_as);
        let rows = executor.fetch_all(query).await?;
        record_query_metrics("find_all", DB::database_type().as_str(), start.elapsed());
        Ok(rows)
    }

    async fn count_with(executor: &mut Executor<'a, DB>, statement: &Sql) -> QueryResult<u64>
    where
        (i64,): for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
    {
        statement.log("count");
        let sql = DB::prepare_sql(&statement.sql).into_owned();
        let start = Instant::now();
        let query = statement
            .params
            .clone()
            .into_iter()
            .fold(sqlx::query_as::<DB, (i64,)>(&sql), bind_value_query_as);
        let row = executor.fetch_optional(query).await?;
        record_query_metrics("count", DB::database_type().as_str(), start.elapsed());
        Ok(row.map_or(0, |(count,)| u64::try_from(count).unwrap_or(0)))
    }
}
