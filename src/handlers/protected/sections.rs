use axum::{
    body::Bytes,
    extract::Path,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::{json_body, path_id, validated, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthSession};
use crate::services::{NotesService, SectionsService};
use crate::validation::section;

const INVALID_SECTION_ID: &str = "Invalid section ID";
const SECTION_NOT_FOUND: &str = "Section not found";

#[derive(Debug, Deserialize)]
pub struct GetQuery {
    pub include: Option<String>,
}

impl GetQuery {
    fn with_pages(&self) -> bool {
        self.include
            .as_deref()
            .map(|raw| raw.split(',').any(|part| part.trim() == "pages"))
            .unwrap_or(false)
    }
}

/// GET /sections
pub async fn list(Extension(session): Extension<AuthSession>) -> ApiResult<Value> {
    let sections = SectionsService::new(&session.db).get_all_sections().await?;
    Ok(ApiResponse::success(json!({ "sections": sections })))
}

/// POST /sections
pub async fn create(Extension(session): Extension<AuthSession>, body: Bytes) -> ApiResult<Value> {
    let input = validated(section::create_section(&json_body(&body)?))?;
    let section = SectionsService::new(&session.db).create_section(input).await?;

    tracing::info!(section_id = %section.id, "section created");
    Ok(ApiResponse::created(json!({ "section": section })))
}

/// POST /sections/reorder - body is `[{id, order_index}]` or `{sections: [...]}`
pub async fn reorder(Extension(session): Extension<AuthSession>, body: Bytes) -> ApiResult<Value> {
    let orders = validated(section::reorder_sections(&json_body(&body)?))?;
    let service = SectionsService::new(&session.db);

    let ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    service.ensure_owned(ids).await?;
    service.reorder_sections(&orders).await?;

    tracing::debug!(sections = orders.len(), "sections reordered");
    Ok(ApiResponse::success(json!({ "success": true })))
}

/// GET /sections/:id - `?include=pages` embeds the active pages
pub async fn get(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<GetQuery>,
) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_SECTION_ID)?;
    let service = SectionsService::new(&session.db);

    let section = if query.with_pages() {
        service.get_section_with_pages(id).await?.map(|s| json!(s))
    } else {
        service.get_section_by_id(id).await?.map(|s| json!(s))
    };
    let section = section.ok_or_else(|| ApiError::not_found(SECTION_NOT_FOUND))?;
    Ok(ApiResponse::success(json!({ "section": section })))
}

/// PATCH /sections/:id
pub async fn update(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_SECTION_ID)?;
    let changes = validated(section::update_section(&json_body(&body)?))?;
    let section = SectionsService::new(&session.db).update_section(id, changes).await?;
    Ok(ApiResponse::success(json!({ "section": section })))
}

/// DELETE /sections/:id - pages in the section become unfiled
pub async fn delete(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_SECTION_ID)?;
    let service = SectionsService::new(&session.db);

    if service.get_section_by_id(id).await?.is_none() {
        return Err(ApiError::not_found(SECTION_NOT_FOUND));
    }
    service.delete_section(id).await?;

    tracing::info!(section_id = %id, "section deleted");
    Ok(ApiResponse::success(json!({ "success": true })))
}

/// GET /sections/:id/pages
pub async fn pages(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_SECTION_ID)?;
    let sections = SectionsService::new(&session.db);

    if sections.get_section_by_id(id).await?.is_none() {
        return Err(ApiError::not_found(SECTION_NOT_FOUND));
    }
    let notes = NotesService::new(&session.db).get_notes_by_section(id).await?;
    let count = sections.get_page_count(id).await?;
    Ok(ApiResponse::success(json!({ "notes": notes, "count": count })))
}
