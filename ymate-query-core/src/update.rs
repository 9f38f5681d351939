use crate::entity::{Entity, EntityMeta};
use crate::fields::Fields;
use crate::join::Join;
use crate::params::{BindValue, Params};
use crate::query::{Column, QueryContext, TableRef, join_parts};
use crate::sql::Sql;
use crate::where_clause::Where;

#[derive(Debug, Clone)]
struct UpdateTable {
    table: TableRef,
    alias: Option<String>,
}

/// `UPDATE t [joins] SET a = ?, .. [WHERE ..]`.
///
/// A set term that already contains `=` (such as `count = count + 1`) is emitted as-is.
#[derive(Debug, Clone, Default)]
pub struct Update {
    ctx: QueryContext,
    tables: Vec<UpdateTable>,
    columns: Vec<Column>,
    params: Params,
    joins: Vec<Join>,
    where_clause: Option<Where>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(table: &str) -> Self {
        Self::new().add_table(TableRef::safe(None, table), None)
    }

    pub fn table_alias(table: &str, alias: &str) -> Self {
        Self::new().add_table(TableRef::safe(None, table), Some(alias))
    }

    pub fn entity<T: Entity>(alias: Option<&str>) -> Self {
        Self::new().and_meta(T::entity_meta(), alias)
    }

    pub fn context(mut self, ctx: QueryContext) -> Self {
        self.ctx = ctx;
        self
    }

    fn add_table(mut self, table: TableRef, alias: Option<&str>) -> Self {
        self.tables.push(UpdateTable {
            table,
            alias: alias.map(str::trim).filter(|a| !a.is_empty()).map(str::to_owned),
        });
        self
    }

    /// Adds another quoted table for multi-table updates.
    pub fn and_table(self, table: &str, alias: Option<&str>) -> Self {
        self.add_table(TableRef::safe(None, table), alias)
    }

    pub fn and_table_raw(self, prefix: Option<&str>, table: &str, alias: Option<&str>) -> Self {
        self.add_table(TableRef::raw(prefix, table), alias)
    }

    pub fn and_meta(self, meta: &EntityMeta, alias: Option<&str>) -> Self {
        self.add_table(TableRef::entity(None, meta), alias)
    }

    fn push_column(mut self, column: Column) -> Self {
        if !column.name.trim().is_empty() {
            self.columns.push(column);
        }
        self
    }

    pub fn field(self, field: &str) -> Self {
        let wrap = !field.contains('=');
        self.push_column(Column::new(None, field, wrap))
    }

    pub fn field_with(self, prefix: Option<&str>, field: &str, wrap_identifier: bool) -> Self {
        self.push_column(Column::new(prefix, field, wrap_identifier))
    }

    pub fn fields(mut self, fields: &Fields) -> Self {
        for field in fields {
            self = self.field(field);
        }
        self
    }

    /// `field = ?` bound to `value`.
    pub fn set(self, field: &str, value: impl Into<BindValue>) -> Self {
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

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn where_(mut self, where_clause: Where) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.merge(where_clause),
            None => where_clause,
        });
        self
    }

    /// Join params, then set values, then where params.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        for join in &self.joins {
            params.append(&join.params());
        }
        params.append(&self.params);
        if let Some(where_clause) = &self.where_clause {
            params.append(&where_clause.params());
        }
        params
    }

    pub fn to_sql(&self) -> Sql {
        Sql::new(self.to_string(), self.params()).context(self.ctx.clone())
    }
}

impl std::fmt::Display for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ctx = &self.ctx;
        let tables: Vec<String> = self
            .tables
            .iter()
            .map(|t| Fields::field(None, &t.table.render(ctx), t.alias.as_deref()))
            .collect();
        let sets: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let column = c.render(ctx);
                if column.contains('=') {
                    column
                } else {
                    format!("{} = ?", column)
                }
            })
            .collect();
        let mut parts = vec![format!("UPDATE {}", tables.join(", "))];
        parts.extend(self.joins.iter().map(|j| j.render(ctx)));
        parts.push(format!("SET {}", sets.join(", ")));
        if let Some(where_clause) = &self.where_clause {
            parts.push(where_clause.render(ctx));
        }
        f.write_str(&join_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cond::Cond;
    use crate::dialect::MySqlDialect;

    #[test]
    fn renders_set_list_and_where() {
        let update = Update::table("user")
            .set("name", "bob")
            .field("login_count = login_count + 1")
            .where_(Cond::new().eq("id").param(9).build_where());
        assert_eq!(
            update.to_string(),
            "UPDATE user SET name = ?, login_count = login_count + 1 WHERE id = ?"
        );
        assert_eq!(update.params().len(), 2);
    }

    #[test]
    fn joins_render_before_set() {
        let ctx = QueryContext::new(Arc::new(MySqlDialect));
        let update = Update::table_alias("orders", "o")
            .context(ctx)
            .join(Join::inner("user").alias("u").on(Cond::new().eq_field("u.id", "o.uid").and().eq("u.vip").param(true)))
            .field_with(Some("o"), "discount", true)
            .param(0.9);
        assert_eq!(
            update.to_string(),
            "UPDATE `orders` o INNER JOIN `user` u ON u.id = o.uid AND u.vip = ? SET o.`discount` = ?"
        );
        assert_eq!(
            update.params().values(),
            &[BindValue::Bool(true), BindValue::F64(0.9)]
        );
    }
}
