use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::table::Table;
use crate::auth::AuthUser;
use crate::filter::{Filter, FilterError, Values};

/// A decoded row, keyed by column name
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No rows returned")]
    NoRows,

    #[error("Expected a single row, got {0}")]
    MultipleRows(usize),

    #[error("New row violates row-level security policy for table \"{0}\"")]
    PolicyViolation(Table),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid query: {0}")]
    Filter(#[from] FilterError),

    #[error("Failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, StoreError::NoRows)
    }
}

/// Persistence and row-level access control. Every data operation runs on
/// behalf of `caller`; rows the caller does not own are invisible to it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, caller: &AuthUser, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    async fn count(&self, caller: &AuthUser, filter: &Filter) -> Result<i64, StoreError>;

    async fn insert(&self, caller: &AuthUser, table: Table, values: &Values) -> Result<Row, StoreError>;

    /// Returns the updated rows; an empty vector when nothing matched
    async fn update(&self, caller: &AuthUser, filter: &Filter, values: &Values) -> Result<Vec<Row>, StoreError>;

    /// Returns the number of deleted rows
    async fn delete(&self, caller: &AuthUser, filter: &Filter) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}
