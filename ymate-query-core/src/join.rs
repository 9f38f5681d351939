use crate::cond::Cond;
use crate::entity::Entity;
use crate::params::Params;
use crate::query::{QueryContext, TableRef, join_parts};
use crate::select::Select;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

/// `INNER|LEFT|RIGHT JOIN source [alias] ON cond`.
#[derive(Debug, Clone)]
pub struct Join {
    join_type: JoinType,
    from: TableRef,
    alias: Option<String>,
    on: Cond,
    params: Params,
}

impl Join {
    pub fn new(join_type: JoinType, from: TableRef) -> Self {
        Self {
            join_type,
            from,
            alias: None,
            on: Cond::new(),
            params: Params::new(),
        }
    }

    /// Joins a sub-select; give it an alias with [`Select::alias`].
    pub fn select(join_type: JoinType, select: &Select) -> Self {
        let mut join = Self::new(join_type, TableRef::select(select));
        join.params = select.params();
        join
    }

    pub fn inner(table: &str) -> Self {
        Self::new(JoinType::Inner, TableRef::safe(None, table))
    }

    pub fn inner_prefixed(prefix: &str, table: &str) -> Self {
        Self::new(JoinType::Inner, TableRef::safe(Some(prefix), table))
    }

    pub fn inner_raw(from: &str) -> Self {
        Self::new(JoinType::Inner, TableRef::raw(None, from))
    }

    pub fn inner_select(select: &Select) -> Self {
        Self::select(JoinType::Inner, select)
    }

    pub fn inner_entity<T: Entity>() -> Self {
        Self::new(JoinType::Inner, TableRef::entity(None, T::entity_meta()))
    }

    pub fn left(table: &str) -> Self {
        Self::new(JoinType::Left, TableRef::safe(None, table))
    }

    pub fn left_prefixed(prefix: &str, table: &str) -> Self {
        Self::new(JoinType::Left, TableRef::safe(Some(prefix), table))
    }

    pub fn left_raw(from: &str) -> Self {
        Self::new(JoinType::Left, TableRef::raw(None, from))
    }

    pub fn left_select(select: &Select) -> Self {
        Self::select(JoinType::Left, select)
    }

    pub fn left_entity<T: Entity>() -> Self {
        Self::new(JoinType::Left, TableRef::entity(None, T::entity_meta()))
    }

    pub fn right(table: &str) -> Self {
        Self::new(JoinType::Right, TableRef::safe(None, table))
    }

    pub fn right_prefixed(prefix: &str, table: &str) -> Self {
        Self::new(JoinType::Right, TableRef::safe(Some(prefix), table))
    }

    pub fn right_raw(from: &str) -> Self {
        Self::new(JoinType::Right, TableRef::raw(None, from))
    }

    pub fn right_select(select: &Select) -> Self {
        Self::select(JoinType::Right, select)
    }

    pub fn right_entity<T: Entity>() -> Self {
        Self::new(JoinType::Right, TableRef::entity(None, T::entity_meta()))
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.trim().to_owned()).filter(|a| !a.is_empty());
        self
    }

    /// Appends to the `ON` condition.
    pub fn on(mut self, cond: Cond) -> Self {
        self.on = self.on.cond_of(cond);
        self
    }

    /// Sub-select params followed by the `ON` params.
    pub fn params(&self) -> Params {
        let mut params = self.params.clone();
        params.append(self.on.params());
        params
    }

    pub fn render(&self, ctx: &QueryContext) -> String {
        let on = self.on.render(ctx);
        join_parts([
            self.join_type.as_str().to_owned(),
            self.from.render(ctx),
            self.alias.clone().unwrap_or_default(),
            if on.is_empty() {
                String::new()
            } else {
                format!("ON {}", on)
            },
        ])
    }
}

impl std::fmt::Display for Join {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&QueryContext::default()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialect::MySqlDialect;

    #[test]
    fn join_renders_type_alias_and_on() {
        let ctx = QueryContext::new(Arc::new(MySqlDialect)).table_prefix("ym_");
        let join = Join::left("role")
            .alias("r")
            .on(Cond::new().eq_field_wrap("r.id", "u.role_id").and().eq("r.state").param(1));
        assert_eq!(
            join.render(&ctx),
            "LEFT JOIN `ym_role` r ON r.`id` = u.`role_id` AND r.state = ?"
        );
        assert_eq!(join.params().len(), 1);
    }

    #[test]
    fn raw_join_skips_quoting() {
        let join = Join::inner_raw("user_ext").on(Cond::new().cond("user_ext.uid = u.id"));
        assert_eq!(join.to_string(), "INNER JOIN user_ext ON user_ext.uid = u.id");
    }

    #[test]
    fn select_join_carries_sub_params() {
        let sub = Select::create("orders")
            .field("uid")
            .where_(Cond::new().gt("amount").param(100).build_where())
            .alias("o");
        let join = Join::inner_select(&sub).on(Cond::new().eq_field("o.uid", "u.id"));
        assert_eq!(
            join.to_string(),
            "INNER JOIN (SELECT uid FROM orders WHERE amount > ?) o ON o.uid = u.id"
        );
        assert_eq!(join.params().len(), 1);
    }
}
