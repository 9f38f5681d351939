use crate::cond::Cond;
use crate::fields::Fields;
use crate::func::Func;
use crate::group_by::GroupBy;
use crate::order_by::OrderBy;
use crate::params::{BindValue, Params};
use crate::query::{QueryContext, join_parts};
use crate::slot::Slot;

/// `WHERE` condition plus slot, `GROUP BY`/`HAVING` and `ORDER BY`.
#[derive(Debug, Clone, Default)]
pub struct Where {
    cond: Cond,
    group_by: GroupBy,
    order_by: OrderBy,
    slot: Slot,
}

impl From<Cond> for Where {
    fn from(cond: Cond) -> Self {
        Self {
            cond,
            ..Self::default()
        }
    }
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// A where clause holding raw condition text.
    pub fn of(cond: &str) -> Self {
        Self::from(Cond::new().cond(cond))
    }

    /// Appends the other clause's condition, group and order terms. Nothing is deduplicated.
    pub fn merge(mut self, other: Where) -> Self {
        let slot_contents = other.slot_contents();
        self.group_by = self.group_by.group_by(&other.group_by);
        self.order_by = self.order_by.order_by(&other.order_by);
        self.cond = self.cond.cond_of(other.cond);
        for content in slot_contents {
            self.slot.add_slot_content(content);
        }
        self
    }

    fn slot_contents(&self) -> Vec<String> {
        if self.slot.has_slot_content() {
            vec![self.slot.build_slot()]
        } else {
            Vec::new()
        }
    }

    pub fn cond(&self) -> &Cond {
        &self.cond
    }

    /// Replaces the condition through `f`.
    pub fn map_cond<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Cond) -> Cond,
    {
        self.cond = f(std::mem::take(&mut self.cond));
        self
    }

    pub fn get_group_by(&self) -> &GroupBy {
        &self.group_by
    }

    pub fn get_order_by(&self) -> &OrderBy {
        &self.order_by
    }

    pub fn slot(mut self, content: impl Into<String>) -> Self {
        self.slot.add_slot_content(content);
        self
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.cond = self.cond.param(value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.cond = self.cond.with_params(params);
        self
    }

    /// Condition params, then group/having params, then order-by params: the order in which
    /// their placeholders render.
    pub fn params(&self) -> Params {
        let mut params = self.cond.params().clone();
        if !self.group_by.is_empty() {
            params.append(&self.group_by.params());
        }
        params.append(self.order_by.params());
        params
    }

    pub fn group_by(mut self, group_by: &GroupBy) -> Self {
        self.group_by = self.group_by.group_by(group_by);
        self
    }

    pub fn group_by_rollup(mut self) -> Self {
        self.group_by = self.group_by.rollup();
        self
    }

    pub fn group_by_field(mut self, field: &str) -> Self {
        self.group_by = self.group_by.field(field);
        self
    }

    pub fn group_by_field_with(
        mut self,
        prefix: Option<&str>,
        field: &str,
        desc: bool,
        wrap_identifier: bool,
    ) -> Self {
        self.group_by = self.group_by.field_with(prefix, field, desc, wrap_identifier);
        self
    }

    pub fn group_by_fields(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        self.group_by = self.group_by.fields(prefix, fields, false, wrap_identifier);
        self
    }

    pub fn group_by_desc(mut self, field: &str) -> Self {
        self.group_by = self.group_by.field_with(None, field, true, true);
        self
    }

    pub fn group_by_desc_fields(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        self.group_by = self.group_by.fields(prefix, fields, true, wrap_identifier);
        self
    }

    pub fn group_by_func(mut self, func: &Func, desc: bool) -> Self {
        self.group_by = self.group_by.field_func(func, desc);
        self
    }

    pub fn having(mut self, cond: Cond) -> Self {
        self.group_by = self.group_by.having(cond);
        self
    }

    pub fn order_by(mut self, order_by: &OrderBy) -> Self {
        self.order_by = self.order_by.order_by(order_by);
        self
    }

    /// See [`OrderBy::parse`].
    pub fn order_by_str(mut self, fields: &str, separator: Option<&str>, wrap_identifier: bool) -> Self {
        self.order_by = self.order_by.order_by_str(fields, separator, wrap_identifier);
        self
    }

    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = self.order_by.asc(field);
        self
    }

    pub fn order_by_asc_with(mut self, prefix: Option<&str>, field: &str, wrap_identifier: bool) -> Self {
        self.order_by = self.order_by.asc_with(prefix, field, wrap_identifier);
        self
    }

    pub fn order_by_asc_fields(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        self.order_by = self.order_by.asc_fields(prefix, fields, wrap_identifier);
        self
    }

    pub fn order_by_asc_func(mut self, func: &Func) -> Self {
        self.order_by = self.order_by.asc_func(func);
        self
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = self.order_by.desc(field);
        self
    }

    pub fn order_by_desc_with(mut self, prefix: Option<&str>, field: &str, wrap_identifier: bool) -> Self {
        self.order_by = self.order_by.desc_with(prefix, field, wrap_identifier);
        self
    }

    pub fn order_by_desc_fields(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        self.order_by = self.order_by.desc_fields(prefix, fields, wrap_identifier);
        self
    }

    pub fn order_by_desc_func(mut self, func: &Func) -> Self {
        self.order_by = self.order_by.desc_func(func);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cond.is_empty()
            && self.group_by.is_empty()
            && self.order_by.is_empty()
            && !self.slot.has_slot_content()
    }

    /// `WHERE cond slot GROUP BY ...` without the `ORDER BY` part.
    pub fn render_sql(&self, ctx: &QueryContext) -> String {
        let cond = self.cond.render(ctx);
        let where_cond = if cond.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", cond)
        };
        join_parts([
            where_cond,
            self.slot.build_slot(),
            self.group_by.render(ctx),
        ])
    }

    /// Full clause including `ORDER BY`.
    pub fn render(&self, ctx: &QueryContext) -> String {
        join_parts([self.render_sql(ctx), self.order_by.render(ctx)])
    }

    pub fn to_sql(&self) -> String {
        self.render_sql(&QueryContext::default())
    }
}

impl std::fmt::Display for Where {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&QueryContext::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_sql_omits_order_by() {
        let w = Where::from(Cond::new().eq("a").param(1))
            .group_by_field("b")
            .order_by_desc("c");
        assert_eq!(w.to_sql(), "WHERE a = ? GROUP BY b");
        assert_eq!(w.to_string(), "WHERE a = ? GROUP BY b ORDER BY c DESC");
    }

    #[test]
    fn empty_condition_leaves_no_keyword() {
        let w = Where::new().order_by_asc("id");
        assert_eq!(w.to_sql(), "");
        assert_eq!(w.to_string(), "ORDER BY id");
    }

    #[test]
    fn slot_sits_between_condition_and_group() {
        let w = Where::of("a > 1").slot("AND b < 2").group_by_field("c");
        assert_eq!(w.to_sql(), "WHERE a > 1 AND b < 2 GROUP BY c");
    }

    #[test]
    fn merge_unions_group_fields_without_dedup() {
        let left = Where::from(Cond::new().eq("a").param(1)).group_by_field("x");
        let right = Where::from(Cond::new().and().eq("b").param(2))
            .group_by_field("x")
            .group_by_field("y")
            .having(Cond::new().gt("n").param(3));
        let merged = left.merge(right);
        assert_eq!(
            merged.to_sql(),
            "WHERE a = ? AND b = ? GROUP BY x, x, y HAVING n > ?"
        );
        assert_eq!(merged.get_group_by().len(), 3);
        let values: Vec<i64> = merged.params().iter().filter_map(BindValue::as_i64).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn having_without_group_binds_nothing() {
        let w = Where::new().having(Cond::new().eq("a").param(1));
        assert!(w.params().is_empty());
    }
}
