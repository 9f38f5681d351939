use std::sync::Arc;

use crate::batch::BatchSql;
use crate::cond::Cond;
use crate::delete::Delete;
use crate::dialect::{DatabaseType, Dialect, GenericDialect};
use crate::entity::{EntityMeta, ShardingRule};
use crate::fields::Fields;
use crate::insert::Insert;
use crate::params::{BindValue, Params};
use crate::select::Select;
use crate::sql::Sql;
use crate::table::Table;
use crate::update::Update;

/// Rendering environment shared by every statement: dialect, table prefix and sharding key.
///
/// Fragments (`Cond`, `Where`, `Join`, ...) are context free; identifiers inside them are
/// quoted when the owning statement renders against its context.
#[derive(Debug, Clone)]
pub struct QueryContext {
    dialect: Arc<dyn Dialect>,
    table_prefix: Option<String>,
    sharding_param: Option<BindValue>,
    show_sql: bool,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new(Arc::new(GenericDialect::default()))
    }
}

impl QueryContext {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            table_prefix: None,
            sharding_param: None,
            show_sql: false,
        }
    }

    pub fn for_database(database: DatabaseType) -> Self {
        Self::new(database.dialect())
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.table_prefix = if prefix.trim().is_empty() {
            None
        } else {
            Some(prefix)
        };
        self
    }

    /// Sharding key handed to the sharding rule of entity tables.
    pub fn sharding_param(mut self, param: impl Into<BindValue>) -> Self {
        let param = param.into();
        self.sharding_param = if param.is_null() { None } else { Some(param) };
        self
    }

    /// Logs executed SQL at info level instead of debug.
    pub fn show_sql(mut self, show_sql: bool) -> Self {
        self.show_sql = show_sql;
        self
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn dialect_arc(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    pub fn get_table_prefix(&self) -> Option<&str> {
        self.table_prefix.as_deref()
    }

    pub fn get_sharding_param(&self) -> Option<&BindValue> {
        self.sharding_param.as_ref()
    }

    pub fn is_show_sql(&self) -> bool {
        self.show_sql
    }

    /// No known database, prefix or sharding key: what a bare `Select::new()` carries.
    pub fn is_default(&self) -> bool {
        self.dialect.name() == DatabaseType::Unknown
            && self.table_prefix.is_none()
            && self.sharding_param.is_none()
    }

    /// `safe` quotes `prefix + name` (falling back to the context prefix); otherwise the two are
    /// concatenated verbatim.
    pub fn build_safe_table_name(&self, prefix: Option<&str>, name: &str, safe: bool) -> String {
        if safe {
            let prefix = non_blank(prefix).or(self.get_table_prefix()).unwrap_or_default();
            self.dialect
                .wrap_identifier_quote(&format!("{}{}", prefix.trim(), name))
        } else {
            format!("{}{}", prefix.map(str::trim).unwrap_or_default(), name)
        }
    }

    pub fn build_safe_entity_name(
        &self,
        prefix: Option<&str>,
        meta: &EntityMeta,
        safe: bool,
    ) -> String {
        self.build_sharded_name(prefix, &meta.entity_name, meta.sharding_rule.as_deref(), safe)
    }

    fn build_sharded_name(
        &self,
        prefix: Option<&str>,
        name: &str,
        rule: Option<&dyn ShardingRule>,
        safe: bool,
    ) -> String {
        if safe {
            let prefix = non_blank(prefix).or(self.get_table_prefix());
            self.dialect
                .build_table_name(prefix, name, rule, self.sharding_param.as_ref())
        } else {
            format!("{}{}", prefix.map(str::trim).unwrap_or_default(), name)
        }
    }

    pub fn wrap_identifier_field(&self, field: &str) -> String {
        self.dialect.wrap_identifier_field(field)
    }

    pub fn wrap_identifier_quote(&self, origin: &str) -> String {
        self.dialect.wrap_identifier_quote(origin)
    }

    /// Conditions are rendered by the statement that owns them, so no context is attached here.
    pub fn cond(&self) -> Cond {
        Cond::new()
    }

    pub fn select(&self) -> Select {
        Select::new().context(self.clone())
    }

    pub fn select_from(&self, table: &str) -> Select {
        self.select().from(table)
    }

    pub fn insert(&self, table: &str) -> Insert {
        Insert::into(table).context(self.clone())
    }

    pub fn update(&self, table: &str) -> Update {
        Update::table(table).context(self.clone())
    }

    pub fn delete(&self, table: &str) -> Delete {
        Delete::from(table).context(self.clone())
    }

    pub fn sql(&self, sql: impl Into<String>, params: Params) -> Sql {
        Sql::new(sql, params).context(self.clone())
    }

    pub fn batch(&self, batch_sql: Option<&str>) -> BatchSql {
        BatchSql::new(batch_sql).context(self.clone())
    }

    pub fn table(&self, meta: &EntityMeta) -> Table {
        Table::from_entity(self.dialect_arc(), self.get_table_prefix(), meta)
            .sharding_param(self.sharding_param.clone())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A table reference whose final spelling depends on the rendering context.
#[derive(Debug, Clone)]
pub enum TableRef {
    /// Quoted, prefixed with the given or the context prefix.
    Safe { prefix: Option<String>, name: String },
    /// Entity table: prefix, sharding rule and quoting applied.
    Entity {
        prefix: Option<String>,
        name: String,
        sharding_rule: Option<Arc<dyn ShardingRule>>,
    },
    /// Emitted verbatim.
    Raw(String),
    /// A sub-select, rendered against the enclosing statement's context.
    Select(Box<Select>),
}

impl TableRef {
    pub fn safe(prefix: Option<&str>, name: &str) -> Self {
        Self::Safe {
            prefix: prefix.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    pub fn entity(prefix: Option<&str>, meta: &EntityMeta) -> Self {
        Self::Entity {
            prefix: prefix.map(str::to_owned),
            name: meta.entity_name.clone(),
            sharding_rule: meta.sharding_rule.clone(),
        }
    }

    pub fn raw(prefix: Option<&str>, name: &str) -> Self {
        Self::Raw(format!("{}{}", prefix.map(str::trim).unwrap_or_default(), name))
    }

    pub fn select(select: &Select) -> Self {
        Self::Select(Box::new(select.clone()))
    }

    pub fn render(&self, ctx: &QueryContext) -> String {
        match self {
            Self::Safe { prefix, name } => ctx.build_safe_table_name(prefix.as_deref(), name, true),
            Self::Entity {
                prefix,
                name,
                sharding_rule,
            } => ctx.build_sharded_name(prefix.as_deref(), name, sharding_rule.as_deref(), true),
            Self::Raw(text) => text.clone(),
            Self::Select(select) => select.render_within(ctx),
        }
    }
}

/// A column reference, optionally prefixed, quoted and aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Column {
    pub prefix: Option<String>,
    pub name: String,
    pub wrap: bool,
    pub alias: Option<String>,
}

impl Column {
    pub fn new(prefix: Option<&str>, name: &str, wrap: bool) -> Self {
        Self {
            prefix: prefix.map(str::to_owned),
            name: name.to_owned(),
            wrap,
            alias: None,
        }
    }

    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
            wrap: false,
            alias: None,
        }
    }

    pub fn alias(mut self, alias: Option<&str>) -> Self {
        self.alias = alias.map(str::to_owned);
        self
    }

    pub fn render(&self, ctx: &QueryContext) -> String {
        let name = if self.wrap {
            ctx.wrap_identifier_field(&self.name)
        } else {
            self.name.clone()
        };
        Fields::field(self.prefix.as_deref(), &name, self.alias.as_deref())
    }
}

/// One piece of a deferred SQL fragment.
#[derive(Debug, Clone)]
pub(crate) enum Token {
    Raw(String),
    Column(Column),
    Table(TableRef),
}

impl Token {
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    fn render(&self, ctx: &QueryContext) -> String {
        match self {
            Self::Raw(text) => text.clone(),
            Self::Column(column) => column.render(ctx),
            Self::Table(table) => table.render(ctx),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Raw(text) => text.trim().is_empty(),
            Self::Column(column) => column.name.trim().is_empty(),
            Self::Table(_) => false,
        }
    }
}

/// Joins rendered tokens with single spaces, without padding inside parentheses or before commas.
pub(crate) fn render_tokens(tokens: &[Token], ctx: &QueryContext) -> String {
    let mut out = String::with_capacity(tokens.len() * 8);
    for token in tokens {
        push_token(&mut out, &token.render(ctx));
    }
    out
}

pub(crate) fn push_token(out: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !out.is_empty() && !out.ends_with('(') && !text.starts_with(')') && !text.starts_with(',')
    {
        out.push(' ');
    }
    out.push_str(text);
}

/// Joins non-blank parts with single spaces.
pub(crate) fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        push_token(&mut out, part.as_ref());
    }
    out
}
