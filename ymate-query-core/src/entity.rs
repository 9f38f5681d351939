use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::QueryResult;
use crate::params::BindValue;

/// Column types understood by the DDL builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Varchar,
    Char,
    Text,
    Boolean,
    Bool,
    Binary,
    Timestamp,
    Date,
    Time,
    Int,
    Long,
    Float,
    Double,
    Number,
    Smallint,
    Tinyint,
    Bit,
    Blob,
    Clob,
    #[default]
    Unknown,
}

impl FieldType {
    /// SQL type keyword rendered in column definitions.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Varchar | Self::Unknown => "VARCHAR",
            Self::Char => "CHAR",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Bool => "BOOL",
            Self::Binary => "BINARY",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Int => "INT",
            Self::Long => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Number => "NUMERIC",
            Self::Smallint => "SMALLINT",
            Self::Tinyint => "TINYINT",
            Self::Bit => "BIT",
            Self::Blob => "BLOB",
            Self::Clob => "CLOB",
        }
    }

    /// Maps a Rust type path (as written in a struct field) to a column type.
    ///
    /// `Option<T>` maps like `T`; anything unrecognized is `VARCHAR`.
    pub fn from_rust_type(ty: &str) -> Self {
        let ty: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
        let ty = ty
            .strip_prefix("Option<")
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(&ty);
        let (base, generics) = match ty.find('<') {
            Some(at) => (&ty[..at], &ty[at..]),
            None => (ty, ""),
        };
        let last = base.rsplit("::").next().unwrap_or(base);
        match last {
            "Vec" if generics == "<u8>" => Self::Binary,
            "DateTime" | "NaiveDateTime" => Self::Timestamp,
            "Decimal" | "BigDecimal" => Self::Number,
            "bool" => Self::Tinyint,
            "u8" | "i8" => Self::Bit,
            "i16" | "u16" => Self::Smallint,
            "i32" | "u32" => Self::Int,
            "i64" | "u64" | "isize" | "usize" => Self::Long,
            "f32" => Self::Float,
            "f64" => Self::Double,
            "NaiveDate" => Self::Date,
            "NaiveTime" => Self::Time,
            _ => Self::Varchar,
        }
    }

    /// Whether a `(length[, decimals])` suffix is rendered in DDL.
    pub fn takes_length(self) -> bool {
        !matches!(
            self,
            Self::Date
                | Self::Time
                | Self::Timestamp
                | Self::Text
                | Self::Long
                | Self::Float
                | Self::Smallint
                | Self::Tinyint
                | Self::Double
                | Self::Bit
                | Self::Boolean
                | Self::Bool
                | Self::Int
        )
    }

    /// Whether MySQL accepts `unsigned` for this type.
    pub fn supports_unsigned(self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::Long
                | Self::Float
                | Self::Smallint
                | Self::Tinyint
                | Self::Double
                | Self::Int
        )
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyMeta {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Length for sized types; `0` leaves the length out.
    pub length: u32,
    /// Decimal places for numeric types.
    pub decimals: u32,
    pub nullable: bool,
    pub unsigned: bool,
    pub autoincrement: bool,
    /// Sequence feeding the column on dialects without auto-increment.
    pub sequence_name: Option<String>,
    /// Default value; [`PropertyMeta::NULL`] renders `DEFAULT NULL`.
    pub default_value: Option<String>,
    pub comment: Option<String>,
    /// Read-only columns are skipped by entity updates.
    pub readonly: bool,
}

impl Default for PropertyMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            field_type: FieldType::Varchar,
            length: 0,
            decimals: 0,
            nullable: true,
            unsigned: false,
            autoincrement: false,
            sequence_name: None,
            default_value: None,
            comment: None,
            readonly: false,
        }
    }
}

impl PropertyMeta {
    pub const NULL: &'static str = "@NULL";

    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Self::default()
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    pub fn autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = autoincrement;
        self
    }

    pub fn sequence_name(mut self, sequence_name: impl Into<String>) -> Self {
        self.sequence_name = Some(sequence_name.into());
        self
    }

    pub fn default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexMeta {
    pub name: String,
    pub unique: bool,
    pub fields: Vec<String>,
}

impl IndexMeta {
    pub fn new<I, S>(name: impl Into<String>, unique: bool, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            unique,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Blank names and empty field lists are not rendered.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.fields.is_empty()
    }
}

/// Chooses the physical table for a logical table name.
pub trait ShardingRule: Send + Sync + std::fmt::Debug {
    fn shard_name(&self, origin_name: &str, sharding_param: &BindValue) -> String;
}

/// `origin_<param mod count>` for integer sharding keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuloShardingRule {
    pub count: u32,
}

impl ShardingRule for ModuloShardingRule {
    fn shard_name(&self, origin_name: &str, sharding_param: &BindValue) -> String {
        match sharding_param.as_i64() {
            Some(key) if self.count > 0 => {
                format!("{}_{}", origin_name, key.rem_euclid(i64::from(self.count)))
            }
            _ => origin_name.to_owned(),
        }
    }
}

/// Table mapping of an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityMeta {
    #[serde(alias = "name")]
    pub entity_name: String,
    pub comment: Option<String>,
    pub primary_keys: Vec<String>,
    pub properties: Vec<PropertyMeta>,
    pub indexes: Vec<IndexMeta>,
    #[serde(skip)]
    pub sharding_rule: Option<Arc<dyn ShardingRule>>,
}

impl EntityMeta {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> QueryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> QueryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn property(mut self, property: PropertyMeta) -> Self {
        self.properties.push(property);
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_keys.push(name.into());
        self
    }

    pub fn index(mut self, index: IndexMeta) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn sharding_rule(mut self, rule: Arc<dyn ShardingRule>) -> Self {
        self.sharding_rule = Some(rule);
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn contains_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk == name)
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }

    pub fn autoincrement_keys(&self) -> Vec<String> {
        self.properties
            .iter()
            .filter(|p| p.autoincrement)
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Types that describe their own table mapping, usually through `#[derive(Entity)]`.
pub trait Entity {
    fn entity_meta() -> &'static EntityMeta;

    /// Current value of the column `name`, or `None` for unknown columns.
    fn field_value(&self, name: &str) -> Option<BindValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_types_map_to_column_types() {
        assert_eq!(FieldType::from_rust_type("bool"), FieldType::Tinyint);
        assert_eq!(FieldType::from_rust_type("Option<i64>"), FieldType::Long);
        assert_eq!(FieldType::from_rust_type("Vec < u8 >"), FieldType::Binary);
        assert_eq!(
            FieldType::from_rust_type("chrono::DateTime<chrono::Utc>"),
            FieldType::Timestamp
        );
        assert_eq!(FieldType::from_rust_type("rust_decimal::Decimal"), FieldType::Number);
        assert_eq!(FieldType::from_rust_type("String"), FieldType::Varchar);
    }

    #[test]
    fn modulo_rule_picks_shard_suffix() {
        let rule = ModuloShardingRule { count: 4 };
        assert_eq!(rule.shard_name("orders", &BindValue::I64(10)), "orders_2");
        assert_eq!(rule.shard_name("orders", &BindValue::I64(-1)), "orders_3");
        assert_eq!(rule.shard_name("orders", &BindValue::Null), "orders");
    }

    #[test]
    fn entity_meta_loads_from_json() {
        let meta = EntityMeta::from_json_str(
            r#"{
                "entity_name": "user",
                "primary_keys": ["id"],
                "properties": [
                    {"name": "id", "type": "LONG", "autoincrement": true, "nullable": false},
                    {"name": "email", "type": "VARCHAR", "length": 120}
                ],
                "indexes": [{"name": "uk_email", "unique": true, "fields": ["email"]}]
            }"#,
        )
        .unwrap();
        assert_eq!(meta.property_names(), vec!["id", "email"]);
        assert!(meta.is_primary_key("id"));
        assert_eq!(meta.autoincrement_keys(), vec!["id"]);
        assert!(meta.get_property("email").unwrap().nullable);
        assert_eq!(meta.get_property("email").unwrap().length, 120);
    }
}
