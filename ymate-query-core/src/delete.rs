use crate::entity::{Entity, EntityMeta};
use crate::fields::Fields;
use crate::join::Join;
use crate::params::{BindValue, Params};
use crate::query::{QueryContext, TableRef, join_parts};
use crate::select::Select;
use crate::sql::Sql;
use crate::where_clause::Where;

#[derive(Debug, Clone)]
struct DeleteFrom {
    table: TableRef,
    alias: Option<String>,
}

/// `DELETE [targets] FROM t [joins] [WHERE ..]`.
#[derive(Debug, Clone, Default)]
pub struct Delete {
    ctx: QueryContext,
    targets: Vec<String>,
    froms: Vec<DeleteFrom>,
    from_params: Params,
    joins: Vec<Join>,
    where_clause: Option<Where>,
}

impl Delete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(table: &str) -> Self {
        Self::new().and_from(table, None)
    }

    pub fn from_alias(table: &str, alias: &str) -> Self {
        Self::new().and_from(table, Some(alias))
    }

    pub fn entity<T: Entity>(alias: Option<&str>) -> Self {
        Self::new().and_meta(T::entity_meta(), alias)
    }

    pub fn context(mut self, ctx: QueryContext) -> Self {
        self.ctx = ctx;
        self
    }

    fn push_from(mut self, table: TableRef, alias: Option<&str>) -> Self {
        self.froms.push(DeleteFrom {
            table,
            alias: alias.map(str::trim).filter(|a| !a.is_empty()).map(str::to_owned),
        });
        self
    }

    pub fn and_from(self, table: &str, alias: Option<&str>) -> Self {
        self.push_from(TableRef::safe(None, table), alias)
    }

    pub fn and_from_raw(self, prefix: Option<&str>, table: &str, alias: Option<&str>) -> Self {
        self.push_from(TableRef::raw(prefix, table), alias)
    }

    pub fn and_meta(self, meta: &EntityMeta, alias: Option<&str>) -> Self {
        self.push_from(TableRef::entity(None, meta), alias)
    }

    pub fn and_select(mut self, select: &Select) -> Self {
        self.from_params.append(&select.params());
        self.push_from(TableRef::select(select), None)
    }

    /// Names a table (or alias) to delete from in a multi-table delete.
    pub fn target(mut self, prefix: Option<&str>, table: &str) -> Self {
        if !table.trim().is_empty() {
            self.targets.push(Fields::field(prefix, table, None));
        }
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

    /// Appends a value to the where params.
    pub fn param(self, value: impl Into<BindValue>) -> Self {
        let where_clause = self.where_clause.clone().unwrap_or_default().param(value);
        Self {
            where_clause: Some(where_clause),
            ..self
        }
    }

    pub fn params(&self) -> Params {
        let mut params = self.from_params.clone();
        for join in &self.joins {
            params.append(&join.params());
        }
        if let Some(where_clause) = &self.where_clause {
            params.append(&where_clause.params());
        }
        params
    }

    pub fn to_sql(&self) -> Sql {
        Sql::new(self.to_string(), self.params()).context(self.ctx.clone())
    }
}

impl std::fmt::Display for Delete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ctx = &self.ctx;
        let froms: Vec<String> = self
            .froms
            .iter()
            .map(|t| Fields::field(None, &t.table.render(ctx), t.alias.as_deref()))
            .collect();
        let mut parts = vec![
            "DELETE".to_owned(),
            self.targets.join(", "),
            format!("FROM {}", froms.join(", ")),
        ];
        parts.extend(self.joins.iter().map(|j| j.render(ctx)));
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
    fn renders_single_table_delete() {
        let delete = Delete::from("session").where_(Cond::new().lt("expires_at").param(100).build_where());
        assert_eq!(delete.to_string(), "DELETE FROM session WHERE expires_at < ?");
        assert_eq!(delete.params().len(), 1);
    }

    #[test]
    fn multi_table_delete_names_targets() {
        let ctx = QueryContext::new(Arc::new(MySqlDialect));
        let delete = Delete::from_alias("orders", "o")
            .context(ctx)
            .target(None, "o")
            .join(Join::left("user").alias("u").on(Cond::new().eq_field("u.id", "o.uid")))
            .where_(Cond::new().is_null("u.id").build_where());
        assert_eq!(
            delete.to_string(),
            "DELETE o FROM `orders` o LEFT JOIN `user` u ON u.id = o.uid WHERE u.id IS NULL"
        );
    }
}
