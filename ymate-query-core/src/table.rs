use std::sync::Arc;

use indexmap::IndexMap;

use crate::dialect::{DatabaseType, Dialect};
use crate::entity::{EntityMeta, IndexMeta, PropertyMeta, ShardingRule};
use crate::params::BindValue;
use crate::query::join_parts;
use crate::slot::Slot;

pub const IF_NOT_EXISTS: &str = "IF NOT EXISTS";
pub const IF_EXISTS: &str = "IF EXISTS";

const MYSQL_TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

/// DDL builder for one table: `CREATE TABLE`, `DROP TABLE` and `TRUNCATE TABLE`.
///
/// Columns and indexes render in insertion order; re-adding a name replaces the earlier entry
/// in place.
#[derive(Debug, Clone)]
pub struct Table {
    dialect: Arc<dyn Dialect>,
    prefix: Option<String>,
    table_name: String,
    comment: Option<String>,
    primary_keys: Vec<String>,
    properties: IndexMap<String, PropertyMeta>,
    indexes: IndexMap<String, IndexMeta>,
    sharding_rule: Option<Arc<dyn ShardingRule>>,
    sharding_param: Option<BindValue>,
    if_exists_or_not: bool,
    slot: Slot,
}

impl Table {
    pub fn new(dialect: Arc<dyn Dialect>, prefix: Option<&str>, table_name: &str) -> Self {
        Self {
            dialect,
            prefix: prefix.map(str::to_owned),
            table_name: table_name.to_owned(),
            comment: None,
            primary_keys: Vec::new(),
            properties: IndexMap::new(),
            indexes: IndexMap::new(),
            sharding_rule: None,
            sharding_param: None,
            if_exists_or_not: false,
            slot: Slot::new(),
        }
    }

    pub fn from_entity(dialect: Arc<dyn Dialect>, prefix: Option<&str>, meta: &EntityMeta) -> Self {
        let mut table = Self::new(dialect, prefix, &meta.entity_name);
        for property in &meta.properties {
            table = table.add_property(property.clone(), false);
        }
        for index in &meta.indexes {
            table = table.add_index(index.clone());
        }
        table.primary_keys = meta.primary_keys.clone();
        table.comment = meta.comment.clone();
        table.sharding_rule = meta.sharding_rule.clone();
        table
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into()).filter(|c: &String| !c.trim().is_empty());
        self
    }

    /// Properties with a blank name are skipped.
    pub fn add_property(mut self, property: PropertyMeta, primary_key: bool) -> Self {
        if property.name.trim().is_empty() {
            return self;
        }
        if primary_key && !self.primary_keys.contains(&property.name) {
            self.primary_keys.push(property.name.clone());
        }
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Indexes without a name or without fields are skipped.
    pub fn add_index(mut self, index: IndexMeta) -> Self {
        if index.is_valid() {
            self.indexes.insert(index.name.clone(), index);
        }
        self
    }

    pub fn sharding_rule(mut self, rule: Option<Arc<dyn ShardingRule>>) -> Self {
        self.sharding_rule = rule;
        self
    }

    pub fn sharding_param(mut self, param: Option<BindValue>) -> Self {
        self.sharding_param = param;
        self
    }

    /// Adds `IF NOT EXISTS` / `IF EXISTS` for dialects that do not always emit it.
    pub fn if_exists_or_not(mut self, if_exists_or_not: bool) -> Self {
        self.if_exists_or_not = if_exists_or_not;
        self
    }

    /// Extra table options appended after the column list.
    pub fn slot(mut self, content: impl Into<String>) -> Self {
        self.slot.add_slot_content(content);
        self
    }

    pub fn table_name(&self) -> String {
        self.dialect.build_table_name(
            self.prefix.as_deref(),
            &self.table_name,
            self.sharding_rule.as_deref(),
            self.sharding_param.as_ref(),
        )
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.wrap_identifier_quote(name)
    }

    fn quote_all(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|name| self.quote(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One column definition: `name TYPE(len) [unsigned] [NOT NULL | DEFAULT ..] [auto] [COMMENT]`.
    pub fn column_definition(&self, property: &PropertyMeta) -> String {
        let database = self.dialect.name();
        // SQLite only assigns row ids to columns declared exactly `INTEGER`.
        let sqlite_row_id = database == DatabaseType::Sqlite && property.autoincrement;
        let mut column_type = if sqlite_row_id {
            "INTEGER".to_owned()
        } else {
            property.field_type.sql_name().to_owned()
        };
        if !sqlite_row_id && property.field_type.takes_length() && property.length > 0 {
            if property.decimals > 0 {
                column_type.push_str(&format!("({}, {})", property.length, property.decimals));
            } else {
                column_type.push_str(&format!("({})", property.length));
            }
        }
        let mut parts = vec![self.quote(&property.name), column_type];
        if database == DatabaseType::Mysql && property.unsigned && property.field_type.supports_unsigned() {
            parts.push("unsigned".to_owned());
        }
        if !property.nullable {
            parts.push("NOT NULL".to_owned());
        } else if let Some(default_value) = property
            .default_value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
        {
            if default_value == PropertyMeta::NULL {
                parts.push("DEFAULT NULL".to_owned());
            } else {
                parts.push(format!("DEFAULT '{}'", default_value));
            }
        }
        if property.autoincrement {
            match database {
                DatabaseType::Mysql => parts.push("AUTO_INCREMENT".to_owned()),
                DatabaseType::Sqlserver => parts.push("IDENTITY(1,1)".to_owned()),
                DatabaseType::Postgresql => {
                    let sequence = property
                        .sequence_name
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty());
                    match sequence {
                        Some(sequence) => parts.push(format!("DEFAULT nextval('{}')", sequence)),
                        None => parts.push("GENERATED BY DEFAULT AS IDENTITY".to_owned()),
                    }
                }
                _ => {}
            }
        }
        if database == DatabaseType::Mysql {
            if let Some(comment) = property.comment.as_deref().filter(|c| !c.trim().is_empty()) {
                parts.push(format!("COMMENT '{}'", comment));
            }
        }
        join_parts(parts)
    }

    fn inline_index(&self, index: &IndexMeta) -> String {
        let kind = if index.unique { "UNIQUE KEY" } else { "INDEX" };
        format!("{} {} ({})", kind, self.quote(&index.name), self.quote_all(&index.fields))
    }

    fn create_index(&self, table_name: &str, index: &IndexMeta) -> String {
        let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
        format!(
            "CREATE {} {} ON {} ({})",
            kind,
            self.quote(&index.name),
            table_name,
            self.quote_all(&index.fields)
        )
    }

    /// `CREATE TABLE` statement.
    ///
    /// MySQL always adds `IF NOT EXISTS`, inline `UNIQUE KEY`/`INDEX` clauses, table options and
    /// the table comment. SQL Server and the other dialects emit indexes as separate
    /// `CREATE INDEX` statements joined by `; `, except unique indexes outside SQL Server, which
    /// render inline as `CONSTRAINT name UNIQUE (..)`.
    pub fn to_create_sql(&self) -> String {
        let database = self.dialect.name();
        let table_name = self.table_name();
        let mut definitions: Vec<String> = self
            .properties
            .values()
            .map(|p| self.column_definition(p))
            .collect();
        if !self.primary_keys.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", self.quote_all(&self.primary_keys)));
        }
        let mut trailing = Vec::new();
        for index in self.indexes.values() {
            match database {
                DatabaseType::Mysql => definitions.push(self.inline_index(index)),
                DatabaseType::Sqlserver => trailing.push(self.create_index(&table_name, index)),
                _ if index.unique => definitions.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    self.quote(&index.name),
                    self.quote_all(&index.fields)
                )),
                _ => trailing.push(self.create_index(&table_name, index)),
            }
        }

        let if_not_exists = if database == DatabaseType::Mysql || self.if_exists_or_not {
            IF_NOT_EXISTS
        } else {
            ""
        };
        let mut slot = self.slot.clone();
        let mut comment = String::new();
        if database == DatabaseType::Mysql {
            slot.add_slot_content(MYSQL_TABLE_OPTIONS);
            if let Some(text) = self.comment.as_deref().filter(|c| !c.trim().is_empty()) {
                comment = format!("COMMENT='{}'", text);
            }
        }
        let create = join_parts([
            "CREATE TABLE".to_owned(),
            if_not_exists.to_owned(),
            table_name,
            format!("({})", definitions.join(", ")),
            slot.build_slot(),
            comment,
        ]);
        if trailing.is_empty() {
            create
        } else {
            format!("{}; {}", create, trailing.join("; "))
        }
    }

    /// `DROP TABLE`, with `IF EXISTS` for MySQL or when requested.
    pub fn to_drop_sql(&self) -> String {
        let if_exists = if self.dialect.name() == DatabaseType::Mysql || self.if_exists_or_not {
            IF_EXISTS
        } else {
            ""
        };
        let table_name = self.table_name();
        join_parts(["DROP TABLE", if_exists, table_name.as_str()])
    }

    pub fn to_truncate_sql(&self) -> String {
        format!("TRUNCATE TABLE {}", self.table_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect, SqlServerDialect, SqliteDialect};
    use crate::entity::{FieldType, ModuloShardingRule};

    fn user_meta() -> EntityMeta {
        EntityMeta::new("user")
            .comment("users")
            .primary_key("id")
            .property(PropertyMeta::new("id", FieldType::Long).nullable(false).autoincrement(true).unsigned(true))
            .property(PropertyMeta::new("email", FieldType::Varchar).length(64).nullable(false))
            .property(
                PropertyMeta::new("nick", FieldType::Varchar)
                    .length(32)
                    .default_value(PropertyMeta::NULL)
                    .comment("display name"),
            )
            .index(IndexMeta::new("uk_email", true, ["email"]))
    }

    #[test]
    fn mysql_create_has_single_primary_and_unique_key() {
        let sql = Table::from_entity(Arc::new(MySqlDialect), None, &user_meta()).to_create_sql();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `user` (`id` BIGINT unsigned NOT NULL AUTO_INCREMENT, \
             `email` VARCHAR(64) NOT NULL, `nick` VARCHAR(32) DEFAULT NULL COMMENT 'display name', \
             PRIMARY KEY (`id`), UNIQUE KEY `uk_email` (`email`)) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='users'"
        );
        assert_eq!(sql.matches("PRIMARY KEY (").count(), 1);
        assert_eq!(sql.matches("UNIQUE KEY").count(), 1);
        assert!(sql.find("PRIMARY KEY (").unwrap() < sql.find("UNIQUE KEY").unwrap());
    }

    #[test]
    fn sqlserver_appends_index_statements() {
        let meta = user_meta().index(IndexMeta::new("idx_nick", false, ["nick"]));
        let sql = Table::from_entity(Arc::new(SqlServerDialect), Some("app_"), &meta).to_create_sql();
        assert!(sql.starts_with("CREATE TABLE [app_user] ([id] BIGINT NOT NULL IDENTITY(1,1),"));
        assert!(sql.ends_with(
            "; CREATE UNIQUE INDEX [uk_email] ON [app_user] ([email]); CREATE INDEX [idx_nick] ON [app_user] ([nick])"
        ));
    }

    #[test]
    fn other_dialects_only_add_if_not_exists_on_request() {
        let table = Table::from_entity(Arc::new(PostgreSqlDialect), None, &user_meta());
        let sql = table.to_create_sql();
        assert!(sql.starts_with(r#"CREATE TABLE "user" ("id" BIGINT NOT NULL GENERATED BY DEFAULT AS IDENTITY,"#));
        assert!(sql.contains(r#"CONSTRAINT "uk_email" UNIQUE ("email")"#));
        let sql = table.if_exists_or_not(true).to_create_sql();
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "user""#));
    }

    #[test]
    fn postgres_identity_columns_generate_their_keys() {
        let meta = EntityMeta::new("u")
            .primary_key("id")
            .property(PropertyMeta::new("id", FieldType::Long).autoincrement(true));
        assert_eq!(
            Table::from_entity(Arc::new(PostgreSqlDialect), None, &meta).to_create_sql(),
            r#"CREATE TABLE "u" ("id" BIGINT GENERATED BY DEFAULT AS IDENTITY, PRIMARY KEY ("id"))"#
        );

        let sequenced = EntityMeta::new("u").primary_key("id").property(
            PropertyMeta::new("id", FieldType::Long)
                .autoincrement(true)
                .sequence_name("seq_u"),
        );
        assert_eq!(
            Table::from_entity(Arc::new(PostgreSqlDialect), None, &sequenced).to_create_sql(),
            r#"CREATE TABLE "u" ("id" BIGINT DEFAULT nextval('seq_u'), PRIMARY KEY ("id"))"#
        );
    }

    #[test]
    fn sqlite_identity_columns_become_integer() {
        let sql = Table::from_entity(Arc::new(SqliteDialect), None, &user_meta()).to_create_sql();
        assert!(sql.starts_with(r#"CREATE TABLE "user" ("id" INTEGER NOT NULL, "email" VARCHAR(64) NOT NULL,"#));
        assert!(sql.contains(r#"PRIMARY KEY ("id")"#));
    }

    #[test]
    fn drop_and_truncate_use_sharded_names() {
        let meta = user_meta().sharding_rule(Arc::new(ModuloShardingRule { count: 4 }));
        let table = Table::from_entity(Arc::new(MySqlDialect), None, &meta)
            .sharding_param(Some(BindValue::I64(6)));
        assert_eq!(table.to_drop_sql(), "DROP TABLE IF EXISTS `user_2`");
        assert_eq!(table.to_truncate_sql(), "TRUNCATE TABLE `user_2`");
        let generic = Table::new(Arc::new(GenericDialect::default()), None, "log");
        assert_eq!(generic.to_drop_sql(), "DROP TABLE log");
    }

    #[test]
    fn invalid_indexes_and_blank_properties_are_skipped() {
        let table = Table::new(Arc::new(MySqlDialect), None, "t")
            .add_property(PropertyMeta::new(" ", FieldType::Int), true)
            .add_property(PropertyMeta::new("a", FieldType::Int).nullable(false), true)
            .add_index(IndexMeta::new("", true, ["a"]))
            .add_index(IndexMeta::new("idx_empty", false, Vec::<String>::new()));
        assert_eq!(
            table.to_create_sql(),
            "CREATE TABLE IF NOT EXISTS `t` (`a` INT NOT NULL, PRIMARY KEY (`a`)) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }
}
