use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::store::{Row, Store, StoreError};
use super::table::Table;
use crate::auth::AuthUser;
use crate::filter::{Filter, Values};

/// Typed access to the store on behalf of one authenticated caller.
///
/// Cheap to clone; services borrow it for the duration of a request.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
    user: AuthUser,
}

impl Db {
    pub fn new(store: Arc<dyn Store>, user: AuthUser) -> Self {
        Self { store, user }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub async fn select_all<T: DeserializeOwned>(&self, filter: Filter) -> Result<Vec<T>, StoreError> {
        let rows = self.store.select(&self.user, &filter).await?;
        rows.into_iter().map(decode).collect()
    }

    /// Exactly one row; `NoRows` or `MultipleRows` otherwise
    pub async fn select_single<T: DeserializeOwned>(&self, filter: Filter) -> Result<T, StoreError> {
        let rows = self.store.select(&self.user, &filter).await?;
        single(rows).and_then(decode)
    }

    /// Zero or one row
    pub async fn select_maybe_single<T: DeserializeOwned>(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        match self.select_single(filter).await {
            Ok(row) => Ok(Some(row)),
            Err(StoreError::NoRows) => Ok(None),
            Err(other) => Err(other),
        }
    }

    pub async fn insert_single<T: DeserializeOwned>(&self, table: Table, values: Values) -> Result<T, StoreError> {
        let row = self.store.insert(&self.user, table, &values).await?;
        decode(row)
    }

    /// Update the single matching row and return it; `NoRows` when nothing matched
    pub async fn update_single<T: DeserializeOwned>(&self, filter: Filter, values: Values) -> Result<T, StoreError> {
        let rows = self.store.update(&self.user, &filter, &values).await?;
        single(rows).and_then(decode)
    }

    pub async fn delete(&self, filter: Filter) -> Result<u64, StoreError> {
        self.store.delete(&self.user, &filter).await
    }

    pub async fn count(&self, filter: Filter) -> Result<i64, StoreError> {
        self.store.count(&self.user, &filter).await
    }

    /// Whether `table` holds a row with this id owned by the caller
    pub async fn owns(&self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        let owner = table
            .owner_column()
            .ok_or_else(|| StoreError::Backend(format!("table {} has no owner column", table)))?;
        let filter = Filter::new(table).eq("id", id).eq(owner, self.user.id);
        Ok(self.count(filter).await? > 0)
    }
}

fn single(mut rows: Vec<Row>) -> Result<Row, StoreError> {
    match rows.len() {
        0 => Err(StoreError::NoRows),
        1 => Ok(rows.remove(0)),
        n => Err(StoreError::MultipleRows(n)),
    }
}

fn decode<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
