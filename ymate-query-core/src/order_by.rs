use crate::fields::Fields;
use crate::func::Func;
use crate::params::{BindValue, Params};
use crate::query::{Column, QueryContext};

#[derive(Debug, Clone, PartialEq)]
struct OrderItem {
    column: Column,
    desc: bool,
}

/// `ORDER BY` terms in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy {
    items: Vec<OrderItem>,
    params: Params,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `"f1:desc|f2"`: items split on `separator` (default `|`), an item ending in `:`
    /// or `:desc` sorts descending.
    pub fn parse(fields: &str, separator: Option<&str>, wrap_identifier: bool) -> Self {
        Self::new().order_by_str(fields, separator, wrap_identifier)
    }

    pub fn order_by_str(mut self, fields: &str, separator: Option<&str>, wrap_identifier: bool) -> Self {
        let separator = separator.filter(|s| !s.trim().is_empty()).unwrap_or("|");
        for item in fields.split(separator).filter(|i| !i.trim().is_empty()) {
            let (field, direction) = match item.split_once(':') {
                Some((field, direction)) => (field.trim(), Some(direction.trim())),
                None => (item.trim(), None),
            };
            if field.is_empty() {
                continue;
            }
            let desc = direction.is_some_and(|d| d.is_empty() || d.eq_ignore_ascii_case("desc"));
            self.push(Column::new(None, field, wrap_identifier), desc);
        }
        self
    }

    /// Appends the terms and params of `other`.
    pub fn order_by(mut self, other: &OrderBy) -> Self {
        self.items.extend(other.items.iter().cloned());
        self.params.append(&other.params);
        self
    }

    fn push(&mut self, column: Column, desc: bool) {
        if !column.name.trim().is_empty() {
            self.items.push(OrderItem { column, desc });
        }
    }

    pub fn asc(mut self, field: &str) -> Self {
        self.push(Column::new(None, field, true), false);
        self
    }

    pub fn asc_with(mut self, prefix: Option<&str>, field: &str, wrap_identifier: bool) -> Self {
        self.push(Column::new(prefix, field, wrap_identifier), false);
        self
    }

    pub fn asc_fields(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        for field in fields {
            self.push(Column::new(prefix, field, wrap_identifier), false);
        }
        self
    }

    pub fn asc_func(mut self, func: &Func) -> Self {
        self.push(Column::raw(func.build()), false);
        self.params.append(func.params());
        self
    }

    pub fn desc(mut self, field: &str) -> Self {
        self.push(Column::new(None, field, true), true);
        self
    }

    pub fn desc_with(mut self, prefix: Option<&str>, field: &str, wrap_identifier: bool) -> Self {
        self.push(Column::new(prefix, field, wrap_identifier), true);
        self
    }

    pub fn desc_fields(mut self, prefix: Option<&str>, fields: &Fields, wrap_identifier: bool) -> Self {
        for field in fields {
            self.push(Column::new(prefix, field, wrap_identifier), true);
        }
        self
    }

    pub fn desc_func(mut self, func: &Func) -> Self {
        self.push(Column::raw(func.build()), true);
        self.params.append(func.params());
        self
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `ORDER BY a, b DESC`, or an empty string without terms.
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
        format!("ORDER BY {}", terms.join(", "))
    }

    pub fn to_sql(&self) -> String {
        self.render(&QueryContext::default())
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}
