use crate::entity::{Entity, EntityMeta};
use crate::fields::Fields;
use crate::func::Func;
use crate::join::Join;
use crate::page::Page;
use crate::params::Params;
use crate::query::{Column, QueryContext, TableRef, join_parts};
use crate::sql::Sql;
use crate::where_clause::Where;

/// Row lock appended to a `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocker {
    /// `FOR UPDATE`
    Default,
    /// `FOR UPDATE NOWAIT`
    NoWait,
    /// SQL Server table hint `WITH (..)`.
    SqlServer(SqlServerLock),
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlServerLock {
    NoLock,
    HoldLock,
    UpdLock,
    TabLock,
    PagLock,
    TabLockX,
}

impl SqlServerLock {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoLock => "NOLOCK",
            Self::HoldLock => "HOLDLOCK",
            Self::UpdLock => "UPDLOCK",
            Self::TabLock => "TABLOCK",
            Self::PagLock => "PAGLOCK",
            Self::TabLockX => "TABLOCKX",
        }
    }
}

impl DbLocker {
    pub fn to_sql(&self) -> String {
        match self {
            Self::Default => "FOR UPDATE".to_owned(),
            Self::NoWait => "FOR UPDATE NOWAIT".to_owned(),
            Self::SqlServer(lock) => format!("WITH ({})", lock.as_str()),
            Self::Custom(sql) => sql.trim().to_owned(),
        }
    }
}

/// `UNION [ALL] select`.
#[derive(Debug, Clone)]
pub struct Union {
    select: Select,
    all: bool,
}

impl Union {
    pub fn new(select: Select) -> Self {
        Self { select, all: false }
    }

    pub fn all(select: Select) -> Self {
        Self { select, all: true }
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn is_all(&self) -> bool {
        self.all
    }
}

#[derive(Debug, Clone)]
struct FromItem {
    table: TableRef,
    alias: Option<String>,
}

#[derive(Debug, Clone)]
enum Projection {
    Column(Column),
    /// Function text and alias.
    Func(String, Option<String>),
}

#[derive(Debug, Clone, Default)]
pub struct Select {
    ctx: QueryContext,
    froms: Vec<FromItem>,
    from_params: Params,
    projections: Vec<Projection>,
    projection_params: Params,
    entity_properties: Option<Vec<String>>,
    joins: Vec<Join>,
    where_clause: Option<Where>,
    unions: Vec<Union>,
    alias: Option<String>,
    distinct: bool,
    locker: Option<DbLocker>,
    page: Option<Page>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SELECT .. FROM` the quoted, prefixed table.
    pub fn create(table: &str) -> Self {
        Self::new().from(table)
    }

    pub fn create_entity<T: Entity>(alias: Option<&str>) -> Self {
        Self::new().from_entity::<T>(alias)
    }

    /// Selects from another select, rendered verbatim.
    pub fn create_select(select: &Select) -> Self {
        Self::new().from_select(select)
    }

    pub fn context(mut self, ctx: QueryContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn get_context(&self) -> &QueryContext {
        &self.ctx
    }

    fn push_from(mut self, table: TableRef, alias: Option<&str>) -> Self {
        self.froms.push(FromItem {
            table,
            alias: alias.map(str::trim).filter(|a| !a.is_empty()).map(str::to_owned),
        });
        self
    }

    pub fn from(self, table: &str) -> Self {
        self.push_from(TableRef::safe(None, table), None)
    }

    pub fn from_alias(self, table: &str, alias: &str) -> Self {
        self.push_from(TableRef::safe(None, table), Some(alias))
    }

    pub fn from_prefixed(self, prefix: &str, table: &str, alias: Option<&str>) -> Self {
        self.push_from(TableRef::safe(Some(prefix), table), alias)
    }

    /// `prefix + from` emitted verbatim.
    pub fn from_raw(self, prefix: Option<&str>, from: &str, alias: Option<&str>) -> Self {
        self.push_from(TableRef::raw(prefix, from), alias)
    }

    pub fn from_entity<T: Entity>(self, alias: Option<&str>) -> Self {
        self.from_meta(T::entity_meta(), alias)
    }

    pub fn from_meta(mut self, meta: &EntityMeta, alias: Option<&str>) -> Self {
        if self.entity_properties.is_none() {
            self.entity_properties = Some(meta.property_names());
        }
        self.push_from(TableRef::entity(None, meta), alias)
    }

    pub fn from_select(mut self, select: &Select) -> Self {
        self.from_params.append(&select.params());
        self.push_from(TableRef::select(select), None)
    }

    fn push_column(mut self, column: Column) -> Self {
        if !column.name.trim().is_empty() {
            self.projections.push(Projection::Column(column));
        }
        self
    }

    /// Quoted column.
    pub fn field(self, field: &str) -> Self {
        self.push_column(Column::new(None, field, true))
    }

    pub fn field_raw(self, field: &str) -> Self {
        self.push_column(Column::new(None, field, false))
    }

    pub fn field_prefixed(self, prefix: &str, field: &str) -> Self {
        self.push_column(Column::new(Some(prefix), field, true))
    }

    pub fn field_alias(self, prefix: Option<&str>, field: &str, alias: &str) -> Self {
        self.push_column(Column::new(prefix, field, true).alias(Some(alias)))
    }

    pub fn field_with(
        self,
        prefix: Option<&str>,
        field: &str,
        alias: Option<&str>,
        wrap_identifier: bool,
    ) -> Self {
        self.push_column(Column::new(prefix, field, wrap_identifier).alias(alias))
    }

    /// Adds quoted columns. An excluded list selects the entity's remaining columns instead,
    /// or nothing when the select has no entity source.
    pub fn fields(self, fields: &Fields) -> Self {
        self.fields_with(None, fields, true)
    }

    pub fn fields_with(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        let names: Vec<String> = if fields.is_excluded() {
            self.entity_properties
                .iter()
                .flatten()
                .filter(|p| !fields.contains(p))
                .cloned()
                .collect()
        } else {
            fields.to_vec()
        };
        for name in names {
            self = self.push_column(Column::new(prefix, &name, wrap_identifier));
        }
        self
    }

    pub fn field_func(mut self, func: &Func, alias: Option<&str>) -> Self {
        self.projection_params.append(func.params());
        self.projections.push(Projection::Func(
            func.build(),
            alias.map(str::trim).filter(|a| !a.is_empty()).map(str::to_owned),
        ));
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn union(mut self, union: Union) -> Self {
        self.unions.push(union);
        self
    }

    /// Merges `where_clause` into the current one.
    pub fn where_(mut self, where_clause: Where) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.merge(where_clause),
            None => where_clause,
        });
        self
    }

    pub fn get_where(&self) -> Option<&Where> {
        self.where_clause.as_ref()
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.trim().to_owned()).filter(|a| !a.is_empty());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn for_update(mut self, locker: DbLocker) -> Self {
        self.locker = Some(locker);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn get_page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// Params in placeholder order: projections, from sub-selects, joins, where, unions.
    pub fn params(&self) -> Params {
        let mut params = self.projection_params.clone();
        params.append(&self.from_params);
        for join in &self.joins {
            params.append(&join.params());
        }
        if let Some(where_clause) = &self.where_clause {
            params.append(&where_clause.params());
        }
        for union in &self.unions {
            params.append(&union.select.params());
        }
        params
    }

    /// Statement text without paging, alias or lock.
    pub(crate) fn render_body(&self) -> String {
        let ctx = &self.ctx;
        let mut parts: Vec<String> = Vec::with_capacity(8 + self.joins.len());
        parts.push("SELECT".to_owned());
        if self.distinct {
            parts.push("DISTINCT".to_owned());
        }
        if self.projections.is_empty() {
            parts.push("*".to_owned());
        } else {
            let columns: Vec<String> = self
                .projections
                .iter()
                .map(|p| match p {
                    Projection::Column(column) => column.render(ctx),
                    Projection::Func(text, alias) => Fields::field(None, text, alias.as_deref()),
                })
                .collect();
            parts.push(columns.join(", "));
        }
        let froms: Vec<String> = self
            .froms
            .iter()
            .map(|f| Fields::field(None, &f.table.render(ctx), f.alias.as_deref()))
            .collect();
        if !froms.is_empty() {
            parts.push(format!("FROM {}", froms.join(", ")));
        }
        parts.extend(self.joins.iter().map(|j| j.render(ctx)));
        if let Some(where_clause) = &self.where_clause {
            parts.push(where_clause.render(ctx));
        }
        for union in &self.unions {
            parts.push(if union.all {
                "UNION ALL".to_owned()
            } else {
                "UNION".to_owned()
            });
            parts.push(union.select.render_within(ctx));
        }
        join_parts(parts)
    }

    pub fn to_sql(&self) -> Sql {
        Sql::from_select(self)
    }

    /// Renders as part of a statement built on `outer`. A select still on the default context
    /// takes the outer one, so prefix and quoting match the enclosing statement.
    pub(crate) fn render_within(&self, outer: &QueryContext) -> String {
        if self.ctx.is_default() && !outer.is_default() {
            self.clone().context(outer.clone()).to_string()
        } else {
            self.to_string()
        }
    }
}

impl std::fmt::Display for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sql = self.render_body();
        if let Some(page) = &self.page {
            sql = self.ctx.dialect().build_paged_query_sql(
                &sql,
                page.get_page(),
                page.get_page_size(),
            );
        }
        if let Some(alias) = &self.alias {
            return write!(f, "({}) {}", sql, alias);
        }
        if let Some(locker) = &self.locker {
            sql = join_parts([sql, locker.to_sql()]);
        }
        f.write_str(&sql)
    }
}
