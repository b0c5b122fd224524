// handlers/mod.rs - HTTP handlers grouped by access level
//
// public/     no session required (service info, health)
// protected/  session required; every data access runs as the caller
//
// Protected handlers follow a fixed order:
//   1. session (middleware)
//   2. path ids
//   3. parent ownership
//   4. body validation
//   5. service call
//   6. response shaping
// Ownership runs before the body is inspected, so a request against
// another user's resource never reports which fields were wrong.

pub mod protected;
pub mod public;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::validation::{self, Validated};

/// Parses a path id, failing with the route's "Invalid ... ID" message
pub(crate) fn path_id(raw: &str, message: &'static str) -> Result<Uuid, ApiError> {
    validation::uuid_field(raw).ok_or_else(|| ApiError::bad_request(message))
}

/// Parses the raw request body; empty bodies read as `{}`
pub(crate) fn json_body(body: &Bytes) -> Result<Value, ApiError> {
    validation::parse_body(body).ok_or_else(ApiError::invalid_json)
}

pub(crate) fn validated<T>(result: Validated<T>) -> Result<T, ApiError> {
    result.map_err(ApiError::validation_failed)
}

/// `Query` whose rejection renders as the JSON error body
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query flags are only set by the literal string `true`
pub(crate) fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}
