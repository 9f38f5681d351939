use smallvec::SmallVec;
use sqlx::Database;

/// A single positional bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Bytes(Vec<u8>),
    Null,
}

impl BindValue {
    /// Renders the value for log output.
    pub fn to_log_string(&self) -> String {
        match self {
            BindValue::String(v) => v.clone(),
            BindValue::I64(v) => v.to_string(),
            BindValue::F64(v) => v.to_string(),
            BindValue::Bool(v) => v.to_string(),
            BindValue::Uuid(v) => v.to_string(),
            BindValue::DateTime(v) => v.to_rfc3339(),
            BindValue::Bytes(v) => format!("<{} bytes>", v.len()),
            BindValue::Null => "NULL".to_owned(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }

    /// Integer view used by sharding rules.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BindValue::I64(v) => Some(*v),
            BindValue::F64(v) => Some(*v as i64),
            BindValue::Bool(v) => Some(i64::from(*v)),
            BindValue::String(v) => v.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for BindValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_log_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<&String> for BindValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

macro_rules! widen_to_i64 {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for BindValue {
                fn from(value: $ty) -> Self {
                    Self::I64(i64::from(value))
                }
            }
        )+
    };
}

widen_to_i64!(i8, i16, i32, u8, u16, u32);

impl From<f32> for BindValue {
    fn from(value: f32) -> Self {
        Self::F64(f64::from(value))
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<uuid::Uuid> for BindValue {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for BindValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<u8>> for BindValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl From<&serde_json::Value> for BindValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Self::I64(v),
                None => Self::F64(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }
}

/// Ordered list of bind values, matched positionally with `?` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: SmallVec<[BindValue; 8]>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value.
    pub fn add(mut self, value: impl Into<BindValue>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Appends every value of `other`, keeping its order.
    pub fn add_params(mut self, other: Params) -> Self {
        self.values.extend(other.values);
        self
    }

    pub fn push(&mut self, value: impl Into<BindValue>) {
        self.values.push(value.into());
    }

    pub fn append(&mut self, other: &Params) {
        self.values.extend(other.values.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[BindValue] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BindValue> {
        self.values.iter()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn into_vec(self) -> Vec<BindValue> {
        self.values.into_vec()
    }

    /// Comma separated rendering for tracing fields.
    pub fn to_log_string(&self) -> String {
        self.values
            .iter()
            .map(BindValue::to_log_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl IntoIterator for Params {
    type Item = BindValue;
    type IntoIter = smallvec::IntoIter<[BindValue; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a BindValue;
    type IntoIter = std::slice::Iter<'a, BindValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<V: Into<BindValue>> FromIterator<V> for Params {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<V: Into<BindValue>> Extend<V> for Params {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.values.extend(iter.into_iter().map(Into::into));
    }
}

/// Builds [`Params`] from a list of values.
#[macro_export]
macro_rules! params {
    () => {
        $crate::params::Params::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::params::Params::new()$(.add($value))+
    };
}

#[inline(always)]
pub(crate) fn bind_value_query<'q, DB>(
    query: sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>,
    value: BindValue,
) -> sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    String: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    i64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    f64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    bool: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    uuid::Uuid: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    chrono::DateTime<chrono::Utc>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Vec<u8>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Option<String>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
{
    match value {
        BindValue::String(v) => query.bind(v),
        BindValue::I64(v) => query.bind(v),
        BindValue::F64(v) => query.bind(v),
        BindValue::Bool(v) => query.bind(v),
        BindValue::Uuid(v) => query.bind(v),
        BindValue::DateTime(v) => query.bind(v),
        BindValue::Bytes(v) => query.bind(v),
        BindValue::Null => query.bind(Option::<String>::None),
    }
}

#[inline(always)]
pub(crate) fn bind_value_query_as<'q, DB, T>(
    query: sqlx::query::QueryAs<'q, DB, T, <DB as Database>::Arguments<'q>>,
    value: BindValue,
) -> sqlx::query::QueryAs<'q, DB, T, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    String: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    i64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    f64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    bool: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    uuid::Uuid: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    chrono::DateTime<chrono::Utc>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Vec<u8>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Option<String>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
{
    match value {
        BindValue::String(v) => query.bind(v),
        BindValue::I64(v) => query.bind(v),
        BindValue::F64(v) => query.bind(v),
        BindValue::Bool(v) => query.bind(v),
        BindValue::Uuid(v) => query.bind(v),
        BindValue::DateTime(v) => query.bind(v),
        BindValue::Bytes(v) => query.bind(v),
        BindValue::Null => query.bind(Option::<String>::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_params_flattens_in_order() {
        let inner = Params::new().add(2).add("three");
        let params = Params::new().add(1).add_params(inner).add(4.5);
        assert_eq!(
            params.values(),
            &[
                BindValue::I64(1),
                BindValue::I64(2),
                BindValue::String("three".to_owned()),
                BindValue::F64(4.5),
            ]
        );
    }

    #[test]
    fn option_none_binds_null() {
        let params = crate::params![Some(5), Option::<i32>::None];
        assert_eq!(params.values(), &[BindValue::I64(5), BindValue::Null]);
        assert_eq!(params.to_log_string(), "5, NULL");
    }

    #[test]
    fn sharding_view_parses_numeric_strings() {
        assert_eq!(BindValue::from(" 42 ").as_i64(), Some(42));
        assert_eq!(BindValue::from(true).as_i64(), Some(1));
        assert_eq!(BindValue::Null.as_i64(), None);
    }
}
