//! Query builder / CRUD engine
//!
//! [`Repo`] pairs a connection provider with one model descriptor and
//! translates high-level operations into parameterized SQL. Every operation
//! exists in two forms: the plain form acquires its own pool connection for
//! the duration of the call, the `*_on` form runs on an explicitly passed
//! connection so a sequence of statements can share one transaction
//! (see [`crate::database::Db::begin`]).
//!
//! Values always travel as bound parameters; table and column names are
//! always quoted identifiers. That asymmetry is the crate's defense against
//! value-based injection and is not negotiable anywhere in this module.

use crate::database::Db;
use crate::error::{OrmError, Result};
use crate::query::condition::{where_clause, Condition};
use crate::query::value::{bind_value, decode_row, Value};
use crate::schema::{quote_column, quote_ident, ModelDescriptor};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use std::collections::BTreeMap;

/// Column values for an insert or update, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(String, Value)>,
}

impl Values {
    /// Start an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one column value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((column.into(), value.into()));
        self
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Whether no values were supplied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of supplied values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

/// One row hydrated into memory
///
/// The attribute set always equals the owning model's field set; columns the
/// server did not return (or an insert did not supply) hold [`Value::Null`].
/// Join results instead carry the union of both tables' columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    values: BTreeMap<String, Value>,
}

impl Instance {
    /// Value of one column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// All column names present.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// All values keyed by column name.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    fn from_model_values(model: &ModelDescriptor, values: &Values) -> Self {
        let mut map: BTreeMap<String, Value> = model
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), Value::Null))
            .collect();
        for (column, value) in values.entries() {
            map.insert(column.clone(), value.clone());
        }
        Self { values: map }
    }

    fn from_model_row(model: &ModelDescriptor, row: &MySqlRow) -> Result<Self> {
        let mut map: BTreeMap<String, Value> = model
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), Value::Null))
            .collect();
        for (column, value) in decode_row(row)? {
            map.insert(column, value);
        }
        Ok(Self { values: map })
    }

    fn from_row(row: &MySqlRow) -> Result<Self> {
        Ok(Self {
            values: decode_row(row)?.into_iter().collect(),
        })
    }
}

/// Fetch modifiers: row cap and ordering
///
/// Ordering uses a bare column name for ascending and a `-` prefix for
/// descending (`order_by("-id")`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    limit: Option<u64>,
    order_by: Option<String>,
}

impl FetchOptions {
    /// No limit, server order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order by a column; prefix with `-` for descending.
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }
}

/// Render `ORDER BY` / `LIMIT` suffixes onto a select statement.
fn push_fetch_options(sql: &mut String, opts: &FetchOptions) {
    if let Some(order_by) = &opts.order_by {
        let (column, direction) = match order_by.strip_prefix('-') {
            Some(column) => (column, "DESC"),
            None => (order_by.as_str(), "ASC"),
        };
        sql.push_str(&format!(" ORDER BY {} {}", quote_column(column), direction));
    }
    if let Some(limit) = opts.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
}

pub(crate) fn build_insert(table: &str, values: &Values) -> (String, Vec<Value>) {
    let columns: Vec<String> = values
        .entries()
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect();
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders
    );
    let params = values.entries().iter().map(|(_, v)| v.clone()).collect();
    (sql, params)
}

pub(crate) fn build_select(
    table: &str,
    conditions: &[Condition],
    opts: &FetchOptions,
) -> (String, Vec<Value>) {
    let (where_sql, params) = where_clause(conditions);
    let mut sql = format!("SELECT * FROM {}{}", quote_ident(table), where_sql);
    push_fetch_options(&mut sql, opts);
    (sql, params)
}

pub(crate) fn build_count(table: &str, conditions: &[Condition]) -> (String, Vec<Value>) {
    let (where_sql, params) = where_clause(conditions);
    let sql = format!("SELECT COUNT(*) FROM {}{}", quote_ident(table), where_sql);
    (sql, params)
}

pub(crate) fn build_update(
    table: &str,
    updates: &Values,
    filters: &[Condition],
) -> (String, Vec<Value>) {
    let assignments: Vec<String> = updates
        .entries()
        .iter()
        .map(|(name, _)| format!("{} = ?", quote_ident(name)))
        .collect();
    let (where_sql, filter_params) = where_clause(filters);
    let sql = format!(
        "UPDATE {} SET {}{}",
        quote_ident(table),
        assignments.join(", "),
        where_sql
    );
    let mut params: Vec<Value> = updates.entries().iter().map(|(_, v)| v.clone()).collect();
    params.extend(filter_params);
    (sql, params)
}

pub(crate) fn build_delete(table: &str, conditions: &[Condition]) -> (String, Vec<Value>) {
    let (where_sql, params) = where_clause(conditions);
    let sql = format!("DELETE FROM {}{}", quote_ident(table), where_sql);
    (sql, params)
}

pub(crate) fn build_join(
    left_table: &str,
    right_table: &str,
    on: (&str, &str),
    conditions: &[Condition],
    opts: &FetchOptions,
) -> (String, Vec<Value>) {
    let (where_sql, params) = where_clause(conditions);
    let mut sql = format!(
        "SELECT * FROM {} JOIN {} ON {}.{} = {}.{}{}",
        quote_ident(left_table),
        quote_ident(right_table),
        quote_ident(left_table),
        quote_ident(on.0),
        quote_ident(right_table),
        quote_ident(on.1),
        where_sql
    );
    push_fetch_options(&mut sql, opts);
    (sql, params)
}

/// CRUD operations for one model over one connection provider
pub struct Repo<'a> {
    db: &'a Db,
    model: &'a ModelDescriptor,
}

impl<'a> Repo<'a> {
    /// Pair a connection provider with a model descriptor.
    pub fn new(db: &'a Db, model: &'a ModelDescriptor) -> Self {
        Self { db, model }
    }

    /// The model this repo operates on.
    pub fn model(&self) -> &ModelDescriptor {
        self.model
    }

    /// Insert one row and return a hydrated instance.
    ///
    /// Constraint violations (NOT NULL, UNIQUE, FOREIGN KEY) propagate
    /// verbatim; see [`OrmError::is_constraint_violation`].
    pub async fn create(&self, values: Values) -> Result<Instance> {
        let mut conn = self.db.acquire().await?;
        self.create_on(&mut conn, values).await
    }

    /// [`Repo::create`] on an explicitly passed connection.
    pub async fn create_on(
        &self,
        conn: &mut MySqlConnection,
        values: Values,
    ) -> Result<Instance> {
        let (sql, params) = build_insert(self.model.table_name(), &values);
        let query = params.into_iter().fold(sqlx::query(&sql), bind_value);
        let result = query.execute(&mut *conn).await?;

        let mut instance = Instance::from_model_values(self.model, &values);
        // Surface the generated key for auto-increment primary keys the
        // caller left unset.
        if let Some(pk) = self.model.primary_key() {
            let supplied = values.get(pk.name()).map(|v| !v.is_null()).unwrap_or(false);
            if pk.is_auto_increment() && !supplied && result.last_insert_id() > 0 {
                instance
                    .values
                    .insert(pk.name().to_string(), Value::Int(result.last_insert_id() as i64));
            }
        }
        Ok(instance)
    }

    /// Fetch every row, optionally capped and ordered.
    pub async fn all(&self, opts: FetchOptions) -> Result<Vec<Instance>> {
        self.filter(&[], opts).await
    }

    /// [`Repo::all`] on an explicitly passed connection.
    pub async fn all_on(
        &self,
        conn: &mut MySqlConnection,
        opts: FetchOptions,
    ) -> Result<Vec<Instance>> {
        self.filter_on(conn, &[], opts).await
    }

    /// Fetch rows matching a conjunction of conditions. Zero conditions
    /// behaves like [`Repo::all`].
    pub async fn filter(&self, conditions: &[Condition], opts: FetchOptions) -> Result<Vec<Instance>> {
        let mut conn = self.db.acquire().await?;
        self.filter_on(&mut conn, conditions, opts).await
    }

    /// [`Repo::filter`] on an explicitly passed connection.
    pub async fn filter_on(
        &self,
        conn: &mut MySqlConnection,
        conditions: &[Condition],
        opts: FetchOptions,
    ) -> Result<Vec<Instance>> {
        let (sql, params) = build_select(self.model.table_name(), conditions, &opts);
        let query = params.into_iter().fold(sqlx::query(&sql), bind_value);
        let rows = query.fetch_all(&mut *conn).await?;
        rows.iter()
            .map(|row| Instance::from_model_row(self.model, row))
            .collect()
    }

    /// Fetch the first row matching the conditions.
    ///
    /// Fails with [`OrmError::NotFound`] when zero rows match; more than one
    /// match is not an error, only the first row is returned.
    pub async fn get(&self, conditions: &[Condition]) -> Result<Instance> {
        let mut conn = self.db.acquire().await?;
        self.get_on(&mut conn, conditions).await
    }

    /// [`Repo::get`] on an explicitly passed connection.
    pub async fn get_on(
        &self,
        conn: &mut MySqlConnection,
        conditions: &[Condition],
    ) -> Result<Instance> {
        let rows = self
            .filter_on(conn, conditions, FetchOptions::new().limit(1))
            .await?;
        rows.into_iter().next().ok_or_else(|| {
            OrmError::NotFound(format!("{}: no rows match", self.model.name()))
        })
    }

    /// Fetch by exact match on every supplied value, creating the row when
    /// nothing matches. Returns the instance and whether it was inserted.
    ///
    /// The check and the insert are two separate statements; a concurrent
    /// duplicate insert can still violate a uniqueness constraint between
    /// them.
    pub async fn get_or_create(&self, values: Values) -> Result<(Instance, bool)> {
        let mut conn = self.db.acquire().await?;
        self.get_or_create_on(&mut conn, values).await
    }

    /// [`Repo::get_or_create`] on an explicitly passed connection.
    pub async fn get_or_create_on(
        &self,
        conn: &mut MySqlConnection,
        values: Values,
    ) -> Result<(Instance, bool)> {
        let conditions: Vec<Condition> = values
            .entries()
            .iter()
            .map(|(column, value)| Condition::eq(column.clone(), value.clone()))
            .collect();

        let found = self
            .filter_on(&mut *conn, &conditions, FetchOptions::new())
            .await?;
        if let Some(existing) = found.into_iter().next() {
            return Ok((existing, false));
        }

        let created = self.create_on(conn, values).await?;
        Ok((created, true))
    }

    /// Set columns on every row matching the filters. Zero matching rows is
    /// not an error.
    pub async fn update(&self, filters: &[Condition], updates: Values) -> Result<()> {
        let mut conn = self.db.acquire().await?;
        self.update_on(&mut conn, filters, updates).await
    }

    /// [`Repo::update`] on an explicitly passed connection.
    pub async fn update_on(
        &self,
        conn: &mut MySqlConnection,
        filters: &[Condition],
        updates: Values,
    ) -> Result<()> {
        let (sql, params) = build_update(self.model.table_name(), &updates, filters);
        let query = params.into_iter().fold(sqlx::query(&sql), bind_value);
        query.execute(&mut *conn).await?;
        Ok(())
    }

    /// Delete rows matching the conditions. Zero matching rows is not an
    /// error.
    pub async fn delete(&self, conditions: &[Condition]) -> Result<()> {
        let mut conn = self.db.acquire().await?;
        self.delete_on(&mut conn, conditions).await
    }

    /// [`Repo::delete`] on an explicitly passed connection.
    pub async fn delete_on(
        &self,
        conn: &mut MySqlConnection,
        conditions: &[Condition],
    ) -> Result<()> {
        let (sql, params) = build_delete(self.model.table_name(), conditions);
        let query = params.into_iter().fold(sqlx::query(&sql), bind_value);
        query.execute(&mut *conn).await?;
        Ok(())
    }

    /// Count rows matching the conditions.
    pub async fn count(&self, conditions: &[Condition]) -> Result<u64> {
        let mut conn = self.db.acquire().await?;
        self.count_on(&mut conn, conditions).await
    }

    /// [`Repo::count`] on an explicitly passed connection.
    pub async fn count_on(
        &self,
        conn: &mut MySqlConnection,
        conditions: &[Condition],
    ) -> Result<u64> {
        let (sql, params) = build_count(self.model.table_name(), conditions);
        let query = params.into_iter().fold(sqlx::query(&sql), bind_value);
        let row = query.fetch_one(&mut *conn).await?;
        let count: i64 = sqlx::Row::try_get(&row, 0)?;
        Ok(count as u64)
    }

    /// Whether any row matches the conditions.
    pub async fn exists(&self, conditions: &[Condition]) -> Result<bool> {
        Ok(self.count(conditions).await? > 0)
    }

    /// [`Repo::exists`] on an explicitly passed connection.
    pub async fn exists_on(
        &self,
        conn: &mut MySqlConnection,
        conditions: &[Condition],
    ) -> Result<bool> {
        Ok(self.count_on(conn, conditions).await? > 0)
    }

    /// Join this model's table with another on an equality between two named
    /// columns. Returned instances expose the union of both tables' columns;
    /// condition columns may be table-qualified (`"users.id"`).
    pub async fn join(
        &self,
        other: &ModelDescriptor,
        on: (&str, &str),
        conditions: &[Condition],
        opts: FetchOptions,
    ) -> Result<Vec<Instance>> {
        let mut conn = self.db.acquire().await?;
        self.join_on(&mut conn, other, on, conditions, opts).await
    }

    /// [`Repo::join`] on an explicitly passed connection.
    pub async fn join_on(
        &self,
        conn: &mut MySqlConnection,
        other: &ModelDescriptor,
        on: (&str, &str),
        conditions: &[Condition],
        opts: FetchOptions,
    ) -> Result<Vec<Instance>> {
        let (sql, params) = build_join(
            self.model.table_name(),
            other.table_name(),
            on,
            conditions,
            &opts,
        );
        let query = params.into_iter().fold(sqlx::query(&sql), bind_value);
        let rows = query.fetch_all(&mut *conn).await?;
        rows.iter().map(Instance::from_row).collect()
    }
}
