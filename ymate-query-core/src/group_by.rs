use crate::cond::Cond;
use crate::fields::Fields;
use crate::func::Func;
use crate::params::{BindValue, Params};
use crate::query::{Column, QueryContext};

#[derive(Debug, Clone, PartialEq)]
struct GroupItem {
    column: Column,
    desc: bool,
}

/// `GROUP BY` terms with optional `WITH ROLLUP` and `HAVING`.
#[derive(Debug, Clone, Default)]
pub struct GroupBy {
    items: Vec<GroupItem>,
    rollup: bool,
    having: Option<Cond>,
    params: Params,
}

impl GroupBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_having(having: Cond) -> Self {
        Self::new().having(having)
    }

    fn push(&mut self, column: Column, desc: bool) {
        if !column.name.trim().is_empty() {
            self.items.push(GroupItem { column, desc });
        }
    }

    /// Quoted field.
    pub fn field(mut self, field: &str) -> Self {
        self.push(Column::new(None, field, true), false);
        self
    }

    pub fn field_with(
        mut self,
        prefix: Option<&str>,
        field: &str,
        desc: bool,
        wrap_identifier: bool,
    ) -> Self {
        self.push(Column::new(prefix, field, wrap_identifier), desc);
        self
    }

    pub fn fields(
        mut self,
        prefix: Option<&str>,
        fields: &Fields,
        desc: bool,
        wrap_identifier: bool,
    ) -> Self {
        for field in fields {
            self.push(Column::new(prefix, field, wrap_identifier), desc);
        }
        self
    }

    pub fn field_func(mut self, func: &Func, desc: bool) -> Self {
        self.push(Column::raw(func.build()), desc);
        self.params.append(func.params());
        self
    }

    pub fn rollup(mut self) -> Self {
        self.rollup = true;
        self
    }

    /// Adds a `HAVING` predicate, joined with `AND` to an existing one.
    pub fn having(mut self, cond: Cond) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and_if_need_cond(cond),
            None => cond,
        });
        self
    }

    /// Appends the other clause's terms, params and `HAVING` predicate without deduplication.
    pub fn group_by(mut self, other: &GroupBy) -> Self {
        self.items.extend(other.items.iter().cloned());
        self.params.append(&other.params);
        self.rollup |= other.rollup;
        if let Some(having) = &other.having {
            self = self.having(having.clone());
        }
        self
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value);
        self
    }

    pub fn get_having(&self) -> Option<&Cond> {
        self.having.as_ref()
    }

    /// Term params followed by the `HAVING` params.
    pub fn params(&self) -> Params {
        let mut params = self.params.clone();
        if let Some(having) = &self.having {
            params.append(having.params());
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn render(&self, ctx: &QueryContext) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let terms: Vec<String> = self
            .items
            .iter()
            .map(|item| {
                let column = item.column.render(ctx);
                if item.desc {
                    format!("{} DESC", column)
                } else {
                    column
                }
            })
            .collect();
        let mut sql = format!("GROUP BY {}", terms.join(", "));
        if self.rollup {
            sql.push_str(" WITH ROLLUP");
        }
        if let Some(having) = self.having.as_ref().filter(|h| !h.is_empty()) {
            sql.push_str(" HAVING ");
            sql.push_str(&having.render(ctx));
        }
        sql
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&QueryContext::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func;

    #[test]
    fn renders_rollup_and_having() {
        let group = GroupBy::new()
            .field("dept")
            .field_with(Some("u"), "role", true, false)
            .rollup()
            .having(Cond::new().gt_func(&func::count("*")).param(2));
        assert_eq!(
            group.to_string(),
            "GROUP BY dept, u.role DESC WITH ROLLUP HAVING COUNT(*) > ?"
        );
        assert_eq!(group.params().len(), 1);
    }

    #[test]
    fn merge_keeps_duplicates() {
        let a = GroupBy::new().field("dept").field("role");
        let b = GroupBy::new().field("role").having(Cond::new().eq("x").param(1));
        let merged = a.group_by(&b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.to_string(), "GROUP BY dept, role, role HAVING x = ?");
    }

    #[test]
    fn empty_group_renders_nothing() {
        let group = GroupBy::with_having(Cond::new().eq("a").param(1));
        assert!(group.is_empty());
        assert_eq!(group.to_string(), "");
        assert_eq!(group.params().len(), 1);
    }
}
