use std::marker::PhantomData;

use crate::entity::{Entity, EntityMeta};
use crate::error::{QueryError, QueryResult};
use crate::fields::Fields;
use crate::params::{BindValue, Params};
use crate::query::QueryContext;
use crate::select::DbLocker;
use crate::sql::Sql;
use crate::where_clause::Where;

/// Entity-level statements built by the context's dialect, bound from the entity's values.
///
/// ```ignore
/// let sql = EntitySql::<User>::new(ctx).insert(&user)?;
/// sql.on(&pool).execute().await?;
/// ```
#[derive(Debug, Clone)]
pub struct EntitySql<T: Entity> {
    ctx: QueryContext,
    fields: Option<Fields>,
    locker: Option<DbLocker>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> EntitySql<T> {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            fields: None,
            locker: None,
            _marker: PhantomData,
        }
    }

    /// Restricts the selected, inserted or updated columns.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields).filter(|f| !f.is_empty());
        self
    }

    /// Row lock appended to selects.
    pub fn for_update(mut self, locker: DbLocker) -> Self {
        self.locker = Some(locker);
        self
    }

    fn meta(&self) -> &'static EntityMeta {
        T::entity_meta()
    }

    fn value_of(entity: &T, name: &str) -> QueryResult<BindValue> {
        entity
            .field_value(name)
            .ok_or_else(|| QueryError::InvalidField(name.to_owned()))
    }

    fn pk_params(&self, entity: &T) -> QueryResult<Params> {
        self.meta()
            .primary_keys
            .iter()
            .map(|pk| Self::value_of(entity, pk))
            .collect()
    }

    fn finish(&self, sql: String, params: Params) -> Sql {
        Sql::new(sql, params).context(self.ctx.clone())
    }

    fn with_locker(&self, sql: String) -> String {
        match &self.locker {
            Some(locker) => format!("{} {}", sql, locker.to_sql()),
            None => sql,
        }
    }

    /// Select by primary key values, given in primary key order.
    pub fn find_by_pk(&self, pk_values: Params) -> QueryResult<Sql> {
        let meta = self.meta();
        if pk_values.len() != meta.primary_keys.len() {
            return Err(QueryError::InvalidPrimaryKey(format!(
                "expected {} primary key values, got {}",
                meta.primary_keys.len(),
                pk_values.len()
            )));
        }
        let sql = self.ctx.dialect().build_select_by_pk_sql(
            meta,
            self.ctx.get_table_prefix(),
            self.ctx.get_sharding_param(),
            None,
            self.fields.as_ref(),
        )?;
        Ok(self.finish(self.with_locker(sql), pk_values))
    }

    /// Select of the entity's columns filtered by `where_clause`.
    pub fn find_all(&self, where_clause: Option<Where>) -> Sql {
        let fields = self
            .fields
            .clone()
            .unwrap_or_else(|| self.meta().property_names().into_iter().collect());
        let mut select = self
            .ctx
            .select()
            .from_meta(self.meta(), None)
            .fields(&fields);
        if let Some(where_clause) = where_clause {
            select = select.where_(where_clause);
        }
        if let Some(locker) = &self.locker {
            select = select.for_update(locker.clone());
        }
        Sql::from_select(&select)
    }

    /// Insert of the entity. Auto-increment columns holding `Null` are left to the database.
    pub fn insert(&self, entity: &T) -> QueryResult<Sql> {
        let meta = self.meta();
        let dialect = self.ctx.dialect();
        let requested: Vec<String> = match &self.fields {
            Some(fields) => fields.to_vec(),
            None => meta.property_names(),
        };
        let mut fields = Fields::new();
        let mut params = Params::new();
        for name in requested {
            let property = meta
                .get_property(&name)
                .ok_or_else(|| QueryError::InvalidField(name.clone()))?;
            let value = Self::value_of(entity, &name)?;
            if property.autoincrement && value.is_null() {
                continue;
            }
            if dialect.insert_value_expr(property)?.as_deref() == Some("?") {
                params.push(value);
            }
            fields.push(name);
        }
        let sql = dialect.build_insert_sql(
            meta,
            self.ctx.get_table_prefix(),
            self.ctx.get_sharding_param(),
            Some(&fields),
        )?;
        Ok(self.finish(sql, params))
    }

    /// Update of the non-key, writable columns, keyed by the entity's primary key values.
    pub fn update_by_pk(&self, entity: &T) -> QueryResult<Sql> {
        let meta = self.meta();
        let columns = crate::dialect::update_columns(meta, self.fields.as_ref())?;
        if columns.is_empty() {
            return Err(QueryError::Unsupported(format!(
                "entity '{}' has no updatable columns",
                meta.entity_name
            )));
        }
        let sql = self.ctx.dialect().build_update_by_pk_sql(
            meta,
            self.ctx.get_table_prefix(),
            self.ctx.get_sharding_param(),
            None,
            Some(&columns.iter().collect()),
        )?;
        let mut params = columns
            .iter()
            .map(|name| Self::value_of(entity, name))
            .collect::<QueryResult<Params>>()?;
        params.append(&self.pk_params(entity)?);
        Ok(self.finish(sql, params))
    }

    pub fn delete_by_pk(&self, entity: &T) -> QueryResult<Sql> {
        let params = self.pk_params(entity)?;
        self.delete_by_pk_values(params)
    }

    /// Delete by primary key values, given in primary key order.
    pub fn delete_by_pk_values(&self, pk_values: Params) -> QueryResult<Sql> {
        let meta = self.meta();
        let sql = self.ctx.dialect().build_delete_by_pk_sql(
            meta,
            self.ctx.get_table_prefix(),
            self.ctx.get_sharding_param(),
            None,
        )?;
        Ok(self.finish(sql, pk_values))
    }
}
