//! Incremental predicate builder.
//!
//! Every value-bearing call appends a `?` placeholder and the caller supplies the value with
//! [`Cond::param`] (or the call takes it directly, as `between` does). Placeholders and params
//! stay in call order, including those spliced in from sub-selects.

use crate::func::Func;
use crate::params::{BindValue, Params};
use crate::query::{Column, QueryContext, TableRef, Token, render_tokens};
use crate::select::Select;
use crate::sql::Sql;
use crate::where_clause::Where;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opt {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
}

impl Opt {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
        }
    }
}

impl std::fmt::Display for Opt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOpt {
    And,
    Or,
    Not,
}

impl LogicalOpt {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

/// An item accepted by [`Cond::cond_list`].
#[derive(Debug, Clone)]
pub enum CondPart {
    Raw(String),
    Func(Func),
    Cond(Cond),
}

impl From<&str> for CondPart {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_owned())
    }
}

impl From<String> for CondPart {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<Func> for CondPart {
    fn from(value: Func) -> Self {
        Self::Func(value)
    }
}

impl From<Cond> for CondPart {
    fn from(value: Cond) -> Self {
        Self::Cond(value)
    }
}

impl From<FieldCond> for CondPart {
    fn from(value: FieldCond) -> Self {
        Self::Cond(value.build())
    }
}

/// Values checked by [`Cond::expr_not_empty`].
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        self.as_str().is_present()
    }
}

impl<T> Presence for [T] {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

impl Presence for Params {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for BindValue {
    fn is_present(&self) -> bool {
        match self {
            BindValue::Null => false,
            BindValue::String(s) => s.is_present(),
            _ => true,
        }
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cond {
    tokens: Vec<Token>,
    params: Params,
    brackets: bool,
}

macro_rules! comparisons {
    ($($opt:ident => $plain:ident, $prefixed:ident, $wrap:ident, $wrap_prefixed:ident,
        $field:ident, $field_wrap:ident, $func:ident, $funcs:ident;)+) => {
        $(
            pub fn $plain(self, field: &str) -> Self {
                self.opt(field, Opt::$opt)
            }

            pub fn $prefixed(self, prefix: &str, field: &str) -> Self {
                self.opt_column(Column::new(Some(prefix), field, false), Opt::$opt)
            }

            pub fn $wrap(self, field: &str) -> Self {
                self.opt_wrap(field, Opt::$opt)
            }

            pub fn $wrap_prefixed(self, prefix: &str, field: &str) -> Self {
                self.opt_column(Column::new(Some(prefix), field, true), Opt::$opt)
            }

            pub fn $field(self, field_one: &str, field_two: &str) -> Self {
                self.opt_field(field_one, Opt::$opt, field_two)
            }

            pub fn $field_wrap(self, field_one: &str, field_two: &str) -> Self {
                self.opt_field_wrap(field_one, Opt::$opt, field_two)
            }

            pub fn $func(self, func: &Func) -> Self {
                self.opt_func(func, Opt::$opt)
            }

            pub fn $funcs(self, func_one: &Func, func_two: &Func) -> Self {
                self.opt_funcs(func_one, Opt::$opt, func_two)
            }
        )+
    };
}

macro_rules! null_checks {
    ($($keyword:literal => $plain:ident, $prefixed:ident, $wrap:ident, $wrap_prefixed:ident, $func:ident;)+) => {
        $(
            pub fn $plain(self, field: &str) -> Self {
                self.column_then(Column::new(None, field, false), $keyword)
            }

            pub fn $prefixed(self, prefix: &str, field: &str) -> Self {
                self.column_then(Column::new(Some(prefix), field, false), $keyword)
            }

            pub fn $wrap(self, field: &str) -> Self {
                self.column_then(Column::new(None, field, true), $keyword)
            }

            pub fn $wrap_prefixed(self, prefix: &str, field: &str) -> Self {
                self.column_then(Column::new(Some(prefix), field, true), $keyword)
            }

            pub fn $func(self, func: &Func) -> Self {
                self.cond(&format!("{} {}", func.build(), $keyword))
                    .with_params(func.params().clone())
            }
        )+
    };
}

impl Cond {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value);
        self
    }

    /// Appends every value of `params` in order.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Appends raw SQL text; blank text is ignored.
    pub fn cond(mut self, cond: &str) -> Self {
        if !cond.trim().is_empty() {
            self.tokens.push(Token::raw(cond));
        }
        self
    }

    pub fn cond_func(self, func: &Func) -> Self {
        self.cond(&func.build()).with_params(func.params().clone())
    }

    /// Appends another condition with its params; its brackets flag is honored.
    pub fn cond_of(mut self, other: impl Into<Cond>) -> Self {
        let other = other.into();
        if other.brackets {
            self.tokens.push(Token::raw("("));
            self.tokens.extend(other.tokens);
            self.tokens.push(Token::raw(")"));
        } else {
            self.tokens.extend(other.tokens);
        }
        self.params.extend(other.params);
        self
    }

    /// Appends each non-empty item preceded by `opt`.
    pub fn cond_list<I, P>(mut self, opt: LogicalOpt, items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<CondPart>,
    {
        for item in items {
            self = match item.into() {
                CondPart::Raw(text) if text.trim().is_empty() => self,
                CondPart::Raw(text) => self.opt_logical(opt).cond(&text),
                CondPart::Func(func) => {
                    let built = func.build();
                    if built.trim().is_empty() {
                        self
                    } else {
                        self.opt_logical(opt).cond(&built)
                    }
                }
                CondPart::Cond(cond) if cond.is_empty() => self,
                CondPart::Cond(cond) => self.opt_logical(opt).cond_of(cond),
            };
        }
        self
    }

    /// `field op ?`
    pub fn opt(self, field: &str, opt: Opt) -> Self {
        self.opt_column(Column::new(None, field, false), opt)
    }

    /// `field op ?` with the field quoted.
    pub fn opt_wrap(self, field: &str, opt: Opt) -> Self {
        self.opt_column(Column::new(None, field, true), opt)
    }

    fn opt_column(self, column: Column, opt: Opt) -> Self {
        self.column_then(column, &format!("{} ?", opt))
    }

    fn column_then(mut self, column: Column, tail: &str) -> Self {
        self.tokens.push(Token::Column(column));
        self.tokens.push(Token::raw(tail));
        self
    }

    /// `field_one op field_two`
    pub fn opt_field(self, field_one: &str, opt: Opt, field_two: &str) -> Self {
        self.cond(&format!("{} {} {}", field_one, opt, field_two))
    }

    pub fn opt_field_wrap(mut self, field_one: &str, opt: Opt, field_two: &str) -> Self {
        self.tokens.push(Token::Column(Column::new(None, field_one, true)));
        self.tokens.push(Token::raw(opt.as_str()));
        self.tokens.push(Token::Column(Column::new(None, field_two, true)));
        self
    }

    pub fn opt_func(self, func: &Func, opt: Opt) -> Self {
        self.cond(&format!("{} {} ?", func.build(), opt))
            .with_params(func.params().clone())
    }

    pub fn opt_funcs(self, func_one: &Func, opt: Opt, func_two: &Func) -> Self {
        self.cond(&format!("{} {} {}", func_one.build(), opt, func_two.build()))
            .with_params(func_one.params().clone())
            .with_params(func_two.params().clone())
    }

    pub fn opt_logical(self, opt: LogicalOpt) -> Self {
        self.cond(opt.as_str())
    }

    /// Appends `opt` only when something precedes it.
    pub fn opt_if_need(self, opt: LogicalOpt) -> Self {
        if self.is_empty() {
            self
        } else {
            self.opt_logical(opt)
        }
    }

    /// `1 = 1`, a neutral head for dynamically appended `AND` terms.
    pub fn eq_one(self) -> Self {
        self.cond("1 = 1")
    }

    comparisons! {
        Eq => eq, eq_prefixed, eq_wrap, eq_wrap_prefixed, eq_field, eq_field_wrap, eq_func, eq_funcs;
        NotEq => not_eq, not_eq_prefixed, not_eq_wrap, not_eq_wrap_prefixed, not_eq_field, not_eq_field_wrap, not_eq_func, not_eq_funcs;
        Gt => gt, gt_prefixed, gt_wrap, gt_wrap_prefixed, gt_field, gt_field_wrap, gt_func, gt_funcs;
        GtEq => gt_eq, gt_eq_prefixed, gt_eq_wrap, gt_eq_wrap_prefixed, gt_eq_field, gt_eq_field_wrap, gt_eq_func, gt_eq_funcs;
        Lt => lt, lt_prefixed, lt_wrap, lt_wrap_prefixed, lt_field, lt_field_wrap, lt_func, lt_funcs;
        LtEq => lt_eq, lt_eq_prefixed, lt_eq_wrap, lt_eq_wrap_prefixed, lt_eq_field, lt_eq_field_wrap, lt_eq_func, lt_eq_funcs;
        Like => like, like_prefixed, like_wrap, like_wrap_prefixed, like_field, like_field_wrap, like_func, like_funcs;
    }

    /// `ESCAPE ?` bound to `escape_char`, following a `like`.
    pub fn escape(self, escape_char: char) -> Self {
        self.cond("ESCAPE ?").param(escape_char.to_string())
    }

    pub fn between(
        self,
        field: &str,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
    ) -> Self {
        self.between_column(Column::new(None, field, false), value_one, value_two)
    }

    pub fn between_prefixed(
        self,
        prefix: &str,
        field: &str,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
    ) -> Self {
        self.between_column(Column::new(Some(prefix), field, false), value_one, value_two)
    }

    pub fn between_wrap(
        self,
        field: &str,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
    ) -> Self {
        self.between_column(Column::new(None, field, true), value_one, value_two)
    }

    /// Function params bind ahead of the two range values.
    pub fn between_func(
        self,
        func: &Func,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
    ) -> Self {
        self.with_params(func.params().clone())
            .between_column(Column::raw(func.build()), value_one, value_two)
    }

    fn between_column(
        self,
        column: Column,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
    ) -> Self {
        self.column_then(column, "BETWEEN ? AND ?")
            .param(value_one)
            .param(value_two)
    }

    /// `BETWEEN` when both bounds are given, `>=`/`<=` for a single bound, nothing otherwise.
    /// `opt` is prepended only when a term is emitted. Null values count as missing.
    pub fn range(
        self,
        field: &str,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
        opt: Option<LogicalOpt>,
    ) -> Self {
        self.range_column(Column::new(None, field, false), value_one, value_two, opt)
    }

    pub fn range_prefixed(
        self,
        prefix: &str,
        field: &str,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
        opt: Option<LogicalOpt>,
    ) -> Self {
        self.range_column(Column::new(Some(prefix), field, false), value_one, value_two, opt)
    }

    pub fn range_wrap(
        self,
        field: &str,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
        opt: Option<LogicalOpt>,
    ) -> Self {
        self.range_column(Column::new(None, field, true), value_one, value_two, opt)
    }

    pub fn range_func(
        self,
        func: &Func,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
        opt: Option<LogicalOpt>,
    ) -> Self {
        let value_one = value_one.into();
        let value_two = value_two.into();
        if value_one.is_null() && value_two.is_null() {
            return self;
        }
        self.with_params(func.params().clone())
            .range_column(Column::raw(func.build()), value_one, value_two, opt)
    }

    fn range_column(
        mut self,
        column: Column,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
        opt: Option<LogicalOpt>,
    ) -> Self {
        let value_one = value_one.into();
        let value_two = value_two.into();
        let tail = match (value_one.is_null(), value_two.is_null()) {
            (true, true) => return self,
            (false, false) => "BETWEEN ? AND ?",
            (false, true) => ">= ?",
            (true, false) => "<= ?",
        };
        if let Some(opt) = opt {
            self = self.opt_logical(opt);
        }
        self = self.column_then(column, tail);
        for value in [value_one, value_two] {
            if !value.is_null() {
                self.params.push(value);
            }
        }
        self
    }

    null_checks! {
        "IS NULL" => is_null, is_null_prefixed, is_null_wrap, is_null_wrap_prefixed, is_null_func;
        "IS NOT NULL" => is_not_null, is_not_null_prefixed, is_not_null_wrap, is_not_null_wrap_prefixed, is_not_null_func;
    }

    pub fn and(self) -> Self {
        self.opt_logical(LogicalOpt::And)
    }

    pub fn and_cond(self, cond: impl Into<Cond>) -> Self {
        self.and().cond_of(cond)
    }

    pub fn and_if_need(self) -> Self {
        self.opt_if_need(LogicalOpt::And)
    }

    pub fn and_if_need_cond(self, cond: impl Into<Cond>) -> Self {
        self.and_if_need().cond_of(cond)
    }

    pub fn or(self) -> Self {
        self.opt_logical(LogicalOpt::Or)
    }

    pub fn or_cond(self, cond: impl Into<Cond>) -> Self {
        self.or().cond_of(cond)
    }

    pub fn or_if_need(self) -> Self {
        self.opt_if_need(LogicalOpt::Or)
    }

    pub fn or_if_need_cond(self, cond: impl Into<Cond>) -> Self {
        self.or_if_need().cond_of(cond)
    }

    pub fn not(self) -> Self {
        self.opt_logical(LogicalOpt::Not)
    }

    pub fn not_cond(self, cond: impl Into<Cond>) -> Self {
        self.not().cond_of(cond)
    }

    pub fn not_if_need(self) -> Self {
        self.opt_if_need(LogicalOpt::Not)
    }

    pub fn not_if_need_cond(self, cond: impl Into<Cond>) -> Self {
        self.not_if_need().cond_of(cond)
    }

    pub fn bracket_begin(mut self) -> Self {
        self.tokens.push(Token::raw("("));
        self
    }

    pub fn bracket_end(mut self) -> Self {
        self.tokens.push(Token::raw(")"));
        self
    }

    /// `( cond )`
    pub fn bracket(self, cond: impl Into<Cond>) -> Self {
        self.bracket_begin().cond_of(cond).bracket_end()
    }

    /// Wraps the whole condition in parentheses when rendered.
    pub fn brackets(mut self) -> Self {
        self.brackets = true;
        self
    }

    pub fn exists(mut self, sub_select: &Select) -> Self {
        self.params.extend(sub_select.params());
        self.tokens.push(Token::raw("EXISTS ("));
        self.tokens.push(Token::Table(TableRef::select(sub_select)));
        self.tokens.push(Token::raw(")"));
        self
    }

    pub fn exists_sql(self, sub_sql: &Sql) -> Self {
        self.with_params(sub_sql.params().clone())
            .cond(&format!("EXISTS ({})", sub_sql.sql()))
    }

    /// `field IN (sub-select)`; the sub-select's params follow the ones already collected.
    pub fn in_select(self, field: &str, sub_select: &Select) -> Self {
        self.in_sub_select(Column::new(None, field, false), sub_select)
    }

    pub fn in_select_wrap(self, field: &str, sub_select: &Select) -> Self {
        self.in_sub_select(Column::new(None, field, true), sub_select)
    }

    pub fn in_sql(self, field: &str, sub_sql: &Sql) -> Self {
        self.in_text(Column::new(None, field, false), sub_sql.sql(), sub_sql.params().clone())
    }

    pub fn in_sql_wrap(self, field: &str, sub_sql: &Sql) -> Self {
        self.in_text(Column::new(None, field, true), sub_sql.sql(), sub_sql.params().clone())
    }

    /// `field IN (?, ?, ...)`, one placeholder per value. An empty list renders `IN ()`,
    /// which databases reject.
    pub fn in_params(self, field: &str, params: Params) -> Self {
        self.in_values(Column::new(None, field, false), params)
    }

    pub fn in_params_wrap(self, field: &str, params: Params) -> Self {
        self.in_values(Column::new(None, field, true), params)
    }

    fn in_values(self, column: Column, params: Params) -> Self {
        let placeholders = vec!["?"; params.len()].join(", ");
        self.in_text(column, &placeholders, params)
    }

    fn in_sub_select(mut self, column: Column, sub_select: &Select) -> Self {
        self.params.extend(sub_select.params());
        self.tokens.push(Token::Column(column));
        self.tokens.push(Token::raw("IN ("));
        self.tokens.push(Token::Table(TableRef::select(sub_select)));
        self.tokens.push(Token::raw(")"));
        self
    }

    fn in_text(mut self, column: Column, body: &str, params: Params) -> Self {
        self.params.extend(params);
        self.column_then(column, &format!("IN ({})", body))
    }

    /// Lets `appender` extend the condition when `expression` holds.
    pub fn expr<F>(self, expression: bool, appender: F) -> Self
    where
        F: FnOnce(Cond) -> Cond,
    {
        if expression { appender(self) } else { self }
    }

    /// Appends `cond` when `expression` holds.
    pub fn expr_with(self, expression: bool, cond: impl Into<Cond>) -> Self {
        if expression { self.cond_of(cond) } else { self }
    }

    /// Lets `appender` extend the condition when `target` holds a non-blank value.
    pub fn expr_not_empty<T, F>(self, target: &T, appender: F) -> Self
    where
        T: Presence + ?Sized,
        F: FnOnce(Cond) -> Cond,
    {
        self.expr(target.is_present(), appender)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(Token::is_blank)
    }

    pub fn build_where(self) -> Where {
        Where::from(self)
    }

    pub fn render(&self, ctx: &QueryContext) -> String {
        let body = render_tokens(&self.tokens, ctx);
        if self.brackets && !body.is_empty() {
            format!("({})", body)
        } else {
            body
        }
    }

    /// Renders against the default context.
    pub fn build(&self) -> String {
        self.render(&QueryContext::default())
    }
}

impl std::fmt::Display for Cond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

/// Field-centric condition: every call compares the same column.
#[derive(Debug, Clone)]
pub struct FieldCond {
    column: Column,
    cond: Cond,
}

macro_rules! field_comparisons {
    ($($opt:ident => $with:ident, $other:ident, $func:ident, $value:ident;)+) => {
        $(
            /// `field op ?`; bind the value with [`FieldCond::param`].
            pub fn $with(mut self) -> Self {
                self.push(Opt::$opt, "?");
                self
            }

            /// `field op other_field`
            pub fn $other(mut self, other_field: &str) -> Self {
                self.push(Opt::$opt, other_field);
                self
            }

            pub fn $func(mut self, func: &Func) -> Self {
                self.push(Opt::$opt, &func.build());
                self.cond = self.cond.with_params(func.params().clone());
                self
            }

            /// `field op ?` bound to `value`.
            pub fn $value(mut self, value: impl Into<BindValue>) -> Self {
                self.push(Opt::$opt, "?");
                self.cond = self.cond.param(value);
                self
            }
        )+
    };
}

impl FieldCond {
    pub fn new(field: &str) -> Self {
        Self {
            column: Column::new(None, field, false),
            cond: Cond::new(),
        }
    }

    pub fn prefixed(prefix: &str, field: &str) -> Self {
        Self {
            column: Column::new(Some(prefix), field, false),
            cond: Cond::new(),
        }
    }

    /// Quotes the field when rendered.
    pub fn wrap(mut self) -> Self {
        self.column.wrap = true;
        self
    }

    fn push(&mut self, opt: Opt, rhs: &str) {
        let cond = std::mem::take(&mut self.cond);
        self.cond = cond.column_then(self.column.clone(), &format!("{} {}", opt, rhs));
    }

    field_comparisons! {
        Eq => eq, eq_field, eq_func, eq_value;
        NotEq => not_eq, not_eq_field, not_eq_func, not_eq_value;
        Gt => gt, gt_field, gt_func, gt_value;
        GtEq => gt_eq, gt_eq_field, gt_eq_func, gt_eq_value;
        Lt => lt, lt_field, lt_func, lt_value;
        LtEq => lt_eq, lt_eq_field, lt_eq_func, lt_eq_value;
        Like => like, like_field, like_func, like_value;
    }

    pub fn between(
        mut self,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
    ) -> Self {
        self.cond = self.cond.between_column(self.column.clone(), value_one, value_two);
        self
    }

    pub fn range(
        mut self,
        value_one: impl Into<BindValue>,
        value_two: impl Into<BindValue>,
        opt: Option<LogicalOpt>,
    ) -> Self {
        self.cond = self
            .cond
            .range_column(self.column.clone(), value_one, value_two, opt);
        self
    }

    pub fn in_values(mut self, params: Params) -> Self {
        self.cond = self.cond.in_values(self.column.clone(), params);
        self
    }

    pub fn in_select(mut self, sub_select: &Select) -> Self {
        self.cond = self.cond.in_sub_select(self.column.clone(), sub_select);
        self
    }

    pub fn is_null(mut self) -> Self {
        self.cond = self.cond.column_then(self.column.clone(), "IS NULL");
        self
    }

    pub fn is_not_null(mut self) -> Self {
        self.cond = self.cond.column_then(self.column.clone(), "IS NOT NULL");
        self
    }

    pub fn and(mut self) -> Self {
        self.cond = self.cond.and();
        self
    }

    pub fn or(mut self) -> Self {
        self.cond = self.cond.or();
        self
    }

    pub fn param(mut self, value: impl Into<BindValue>) -> Self {
        self.cond = self.cond.param(value);
        self
    }

    pub fn build(self) -> Cond {
        self.cond
    }
}

impl From<FieldCond> for Cond {
    fn from(value: FieldCond) -> Self {
        value.build()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialect::MySqlDialect;
    use crate::params;

    fn mysql() -> QueryContext {
        QueryContext::new(Arc::new(MySqlDialect))
    }

    #[test]
    fn comparisons_render_placeholders() {
        let cond = Cond::new()
            .eq("a")
            .param(1)
            .and()
            .gt_eq_prefixed("u", "age")
            .param(18)
            .or()
            .like_wrap("name")
            .param("jo%")
            .escape('\\');
        assert_eq!(
            cond.render(&mysql()),
            "a = ? AND u.age >= ? OR `name` LIKE ? ESCAPE ?"
        );
        assert_eq!(cond.params().len(), 4);
        assert_eq!(cond.build(), "a = ? AND u.age >= ? OR name LIKE ? ESCAPE ?");
    }

    #[test]
    fn field_comparisons_take_no_params() {
        let cond = Cond::new().eq_field("a.id", "b.a_id").and().not_eq_field_wrap("a.x", "b.y");
        assert_eq!(cond.render(&mysql()), "a.id = b.a_id AND a.`x` != b.`y`");
        assert!(cond.params().is_empty());
    }

    #[test]
    fn range_emits_only_given_bounds() {
        let both = Cond::new().range("age", 18, 30, Some(LogicalOpt::And));
        assert_eq!(both.build(), "AND age BETWEEN ? AND ?");
        assert_eq!(both.params().values(), &[BindValue::I64(18), BindValue::I64(30)]);

        let lower = Cond::new().eq_one().range("age", 18, Option::<i32>::None, Some(LogicalOpt::And));
        assert_eq!(lower.build(), "1 = 1 AND age >= ?");
        assert_eq!(lower.params().len(), 1);

        let upper = Cond::new().range("age", Option::<i32>::None, 30, None);
        assert_eq!(upper.build(), "age <= ?");

        let none = Cond::new().range("age", Option::<i32>::None, Option::<i32>::None, Some(LogicalOpt::Or));
        assert!(none.is_empty());
    }

    #[test]
    fn in_params_repeats_placeholders() {
        let cond = Cond::new().in_params("id", params![1, 2, 3]);
        assert_eq!(cond.build(), "id IN (?, ?, ?)");
        assert_eq!(cond.params().len(), 3);
    }

    #[test]
    fn nested_conditions_keep_param_order() {
        let inner = Cond::new().eq("b").param(2).or().eq("c").param(3).brackets();
        let cond = Cond::new().eq("a").param(1).and_cond(inner).and().lt("d").param(4);
        assert_eq!(cond.build(), "a = ? AND (b = ? OR c = ?) AND d < ?");
        let values: Vec<i64> = cond.params().iter().filter_map(BindValue::as_i64).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
    }

    #[test]
    fn if_need_skips_leading_connector() {
        let cond = Cond::new().and_if_need().eq("a").param(1).and_if_need().eq("b").param(2);
        assert_eq!(cond.build(), "a = ? AND b = ?");
    }

    #[test]
    fn cond_list_skips_empty_items() {
        let cond = Cond::new().eq_one().cond_list(
            LogicalOpt::And,
            [
                CondPart::from("x > 1"),
                CondPart::from(" "),
                CondPart::from(Cond::new()),
                CondPart::from(Cond::new().is_null("y")),
            ],
        );
        assert_eq!(cond.build(), "1 = 1 AND x > 1 AND y IS NULL");
    }

    #[test]
    fn expressions_apply_conditionally() {
        let name = String::from("  ");
        let cond = Cond::new()
            .eq_one()
            .expr(true, |c| c.and().eq("a").param(1))
            .expr(false, |c| c.and().eq("b").param(2))
            .expr_not_empty(&name, |c| c.and().eq("name").param(name.clone()))
            .expr_with(true, Cond::new().and().is_not_null("c"));
        assert_eq!(cond.build(), "1 = 1 AND a = ? AND c IS NOT NULL");
        assert_eq!(cond.params().len(), 1);
    }

    #[test]
    fn field_cond_compares_one_column() {
        let cond: Cond = FieldCond::prefixed("u", "age")
            .wrap()
            .gt_value(18)
            .and()
            .lt_value(60)
            .into();
        assert_eq!(cond.render(&mysql()), "u.`age` > ? AND u.`age` < ?");
        assert_eq!(cond.params().len(), 2);

        let between = FieldCond::new("score").between(1, 9).build();
        assert_eq!(between.build(), "score BETWEEN ? AND ?");
    }

    #[test]
    fn function_params_precede_between_values() {
        let func = Func::new("LEFT").arg("code").separator().value(2);
        let cond = Cond::new().between_func(&func, "A", "C");
        assert_eq!(cond.build(), "LEFT(code, ?) BETWEEN ? AND ?");
        assert_eq!(cond.params().values()[0], BindValue::I64(2));
    }

    #[test]
    fn null_checks_support_functions() {
        let cond = Cond::new().is_null_func(&crate::func::if_null("a", "b")).or().is_not_null_wrap_prefixed("t", "c");
        assert_eq!(cond.render(&mysql()), "IFNULL(a, b) IS NULL OR t.`c` IS NOT NULL");
    }
}
