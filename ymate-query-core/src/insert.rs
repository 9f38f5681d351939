use crate::entity::{Entity, EntityMeta};
use crate::fields::Fields;
use crate::params::{BindValue, Params};
use crate::query::{Column, QueryContext, TableRef};
use crate::select::Select;
use crate::sql::Sql;

/// `INSERT INTO t (cols) VALUES (?, ..)` or `INSERT INTO t (cols) SELECT ..`.
///
/// One `?` is rendered per param; columns and params are not checked against each other.
#[derive(Debug, Clone)]
pub struct Insert {
    ctx: QueryContext,
    table: TableRef,
    columns: Vec<Column>,
    params: Params,
    select: Option<Box<Select>>,
}

impl Insert {
    fn with_table(table: TableRef) -> Self {
        Self {
            ctx: QueryContext::default(),
            table,
            columns: Vec::new(),
            params: Params::new(),
            select: None,
        }
    }

    /// Quoted, prefixed table.
    pub fn into(table: &str) -> Self {
        Self::with_table(TableRef::safe(None, table))
    }

    pub fn into_prefixed(prefix: &str, table: &str) -> Self {
        Self::with_table(TableRef::safe(Some(prefix), table))
    }

    pub fn into_raw(table: &str) -> Self {
        Self::with_table(TableRef::raw(None, table))
    }

    pub fn into_entity<T: Entity>() -> Self {
        Self::into_meta(None, T::entity_meta())
    }

    pub fn into_meta(prefix: Option<&str>, meta: &EntityMeta) -> Self {
        Self::with_table(TableRef::entity(prefix, meta))
    }

    pub fn context(mut self, ctx: QueryContext) -> Self {
        self.ctx = ctx;
        self
    }

    fn push_column(mut self, column: Column) -> Self {
        if !column.name.trim().is_empty() {
            self.columns.push(column);
        }
        self
    }

    pub fn field(self, field: &str) -> Self {
        self.push_column(Column::new(None, field, true))
    }

    pub fn field_with(self, prefix: Option<&str>, field: &str, wrap_identifier: bool) -> Self {
        self.push_column(Column::new(prefix, field, wrap_identifier))
    }

    pub fn fields(self, fields: &Fields) -> Self {
        self.fields_with(None, fields, true)
    }

    pub fn fields_with(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        for field in fields {
            self = self.push_column(Column::new(prefix, field, wrap_identifier));
        }
        self
    }

    /// Column and its value in one call.
    pub fn field_value(self, field: &str, value: impl Into<BindValue>) -> Self {
        self.field(field).param(value)
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Inserts the rows of `select` instead of `VALUES`.
    pub fn select(mut self, select: Select) -> Self {
        self.select = Some(Box::new(select));
        self
    }

    pub fn fields_len(&self) -> usize {
        self.columns.len()
    }

    /// The select's params when inserting from a select, the values otherwise.
    pub fn params(&self) -> Params {
        match &self.select {
            Some(select) => select.params(),
            None => self.params.clone(),
        }
    }

    pub fn to_sql(&self) -> Sql {
        Sql::new(self.to_string(), self.params()).context(self.ctx.clone())
    }
}

impl std::fmt::Display for Insert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let columns: Vec<String> = self.columns.iter().map(|c| c.render(&self.ctx)).collect();
        write!(
            f,
            "INSERT INTO {} ({})",
            self.table.render(&self.ctx),
            columns.join(", ")
        )?;
        match &self.select {
            Some(select) => write!(f, " {}", select.render_within(&self.ctx)),
            None => {
                let count = if self.params.is_empty() {
                    self.columns.len()
                } else {
                    self.params.len()
                };
                write!(f, " VALUES ({})", vec!["?"; count].join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cond::Cond;
    use crate::dialect::PostgreSqlDialect;

    #[test]
    fn renders_one_placeholder_per_param() {
        let insert = Insert::into("tbl")
            .fields(&Fields::new().add("x").add("y"))
            .param(1)
            .param("two");
        assert_eq!(insert.to_string(), "INSERT INTO tbl (x, y) VALUES (?, ?)");
        assert_eq!(insert.params().len(), 2);
    }

    #[test]
    fn postgres_quotes_table_and_columns() {
        let ctx = QueryContext::new(Arc::new(PostgreSqlDialect)).table_prefix("app_");
        let insert = ctx.insert("user").field_value("name", "ann").field_value("age", 31);
        assert_eq!(
            insert.to_string(),
            r#"INSERT INTO "app_user" ("name", "age") VALUES (?, ?)"#
        );
    }

    #[test]
    fn insert_select_uses_select_params() {
        let source = Select::create("staging")
            .field("a")
            .field("b")
            .where_(Cond::new().eq("batch").param(7).build_where());
        let insert = Insert::into("target").field("a").field("b").select(source);
        assert_eq!(
            insert.to_string(),
            "INSERT INTO target (a, b) SELECT a, b FROM staging WHERE batch = ?"
        );
        assert_eq!(insert.params().len(), 1);
    }

    #[test]
    fn template_without_params_gets_one_placeholder_per_column() {
        let insert = Insert::into("log").field("level").field("message");
        assert_eq!(insert.to_string(), "INSERT INTO log (level, message) VALUES (?, ?)");
        assert!(insert.params().is_empty());
    }
}
