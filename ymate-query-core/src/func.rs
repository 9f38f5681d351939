//! SQL function expressions usable as fields, conditions and order/group terms.
//!
//! A [`Func`] is assembled from raw text parts and optional bind values:
//!
//! ```
//! use ymate_query_core::func::{self, Func};
//!
//! assert_eq!(func::count("id").build(), "COUNT(id)");
//! let expr = Func::new("ROUND").arg("price").separator().value(2);
//! assert_eq!(expr.build(), "ROUND(price, ?)");
//! assert_eq!(expr.params().len(), 1);
//! ```

use crate::params::{BindValue, Params};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Func {
    name: Option<String>,
    parts: Vec<String>,
    params: Params,
}

impl Func {
    /// A named function; `build` renders `NAME(parts)`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// An anonymous expression; `build` renders the parts as-is.
    pub fn expr() -> Self {
        Self::default()
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.parts.push(arg.into());
        self
    }

    pub fn arg_prefixed(self, prefix: &str, field: &str) -> Self {
        self.arg(crate::fields::Fields::field(Some(prefix), field, None))
    }

    /// Appends the arguments separated by `, `.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                self = self.separator();
            }
            self = self.arg(arg);
        }
        self
    }

    /// Nests another function, taking over its params.
    pub fn arg_func(mut self, func: &Func) -> Self {
        self.parts.push(func.build());
        self.params.append(&func.params);
        self
    }

    /// Appends a `?` placeholder bound to `value`.
    pub fn value(mut self, value: impl Into<BindValue>) -> Self {
        self.parts.push("?".to_owned());
        self.params.push(value);
        self
    }

    pub fn separator(mut self) -> Self {
        self.parts.push(", ".to_owned());
        self
    }

    pub fn space(mut self) -> Self {
        self.parts.push(" ".to_owned());
        self
    }

    pub fn bracket_begin(mut self) -> Self {
        self.parts.push("(".to_owned());
        self
    }

    pub fn bracket_end(mut self) -> Self {
        self.parts.push(")".to_owned());
        self
    }

    /// Appends ` op param`.
    pub fn operate(self, op: &str, param: impl Into<String>) -> Self {
        self.space().arg(op).space().arg(param)
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn build(&self) -> String {
        let body = self.parts.concat();
        match &self.name {
            Some(name) => format!("{}({})", name, body),
            None => body,
        }
    }
}

impl std::fmt::Display for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

/// `a op b` as an anonymous expression.
pub fn operate(a: &str, op: &str, b: &str) -> Func {
    Func::expr().arg(a).operate(op, b)
}

pub fn count(field: &str) -> Func {
    Func::new("COUNT").arg(field)
}

pub fn count_distinct(field: &str) -> Func {
    Func::new("COUNT").arg("DISTINCT ").arg(field)
}

pub fn max(field: &str) -> Func {
    Func::new("MAX").arg(field)
}

pub fn min(field: &str) -> Func {
    Func::new("MIN").arg(field)
}

pub fn sum(field: &str) -> Func {
    Func::new("SUM").arg(field)
}

pub fn avg(field: &str) -> Func {
    Func::new("AVG").arg(field)
}

pub fn abs(field: &str) -> Func {
    Func::new("ABS").arg(field)
}

pub fn round(field: &str, decimals: u32) -> Func {
    Func::new("ROUND").arg(field).separator().arg(decimals.to_string())
}

pub fn upper(field: &str) -> Func {
    Func::new("UPPER").arg(field)
}

pub fn lower(field: &str) -> Func {
    Func::new("LOWER").arg(field)
}

pub fn length(field: &str) -> Func {
    Func::new("LENGTH").arg(field)
}

pub fn concat<I, S>(args: I) -> Func
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Func::new("CONCAT").args(args)
}

pub fn coalesce<I, S>(args: I) -> Func
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Func::new("COALESCE").args(args)
}

pub fn if_null(field: &str, fallback: &str) -> Func {
    Func::new("IFNULL").arg(field).separator().arg(fallback)
}

pub fn now() -> Func {
    Func::new("NOW")
}
