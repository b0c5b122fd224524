use axum::{
    body::Bytes,
    extract::Path,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::{Db, Table};
use crate::error::ApiError;
use crate::handlers::{flag, json_body, path_id, validated, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthSession};
use crate::services::NotesService;
use crate::validation::{self, note, Field};

const INVALID_NOTE_ID: &str = "Invalid note ID";
const INVALID_SECTION_ID: &str = "Invalid section ID";
const NOTE_NOT_FOUND: &str = "Note not found";
const SECTION_NOT_FOUND: &str = "Section not found";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub deleted: Option<String>,
    pub section_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub permanent: Option<String>,
}

/// GET /notes - active notes; `?deleted=true` for the trash, `?section_id=` for one section
pub async fn list(Extension(session): Extension<AuthSession>, QueryParams(query): QueryParams<ListQuery>) -> ApiResult<Value> {
    let service = NotesService::new(&session.db);

    let notes = if flag(&query.deleted) {
        service.get_deleted_notes().await?
    } else if let Some(raw) = query.section_id.as_deref() {
        let section_id = validation::uuid_field(raw).ok_or_else(|| ApiError::bad_request(INVALID_SECTION_ID))?;
        service.get_notes_by_section(section_id).await?
    } else {
        service.get_all_notes().await?
    };
    Ok(ApiResponse::success(json!({ "notes": notes })))
}

/// POST /notes
pub async fn create(Extension(session): Extension<AuthSession>, body: Bytes) -> ApiResult<Value> {
    let input = validated(note::create_note(&json_body(&body)?))?;
    ensure_section(&session.db, &input.section_id).await?;

    let note = NotesService::new(&session.db).create_note(input).await?;
    tracing::info!(note_id = %note.id, "note created");
    Ok(ApiResponse::created(json!({ "note": note })))
}

/// GET /notes/:id - trashed notes read as not found
pub async fn get(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_NOTE_ID)?;
    let note = NotesService::new(&session.db)
        .get_note_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;
    Ok(ApiResponse::success(json!({ "note": note })))
}

/// PATCH /notes/:id
pub async fn update(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_NOTE_ID)?;
    let changes = validated(note::update_note(&json_body(&body)?))?;
    ensure_section(&session.db, &changes.section_id).await?;

    let note = NotesService::new(&session.db).update_note(id, changes).await?;
    Ok(ApiResponse::success(json!({ "note": note })))
}

/// DELETE /notes/:id - moves to trash; `?permanent=true` removes the row
pub async fn delete(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<DeleteQuery>,
) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_NOTE_ID)?;
    let service = NotesService::new(&session.db);

    if flag(&query.permanent) {
        // trashed notes can be purged too
        if !session.db.owns(Table::NotePages, id).await? {
            return Err(ApiError::not_found(NOTE_NOT_FOUND));
        }
        service.permanently_delete_note(id).await?;
        tracing::info!(note_id = %id, "note permanently deleted");
        return Ok(ApiResponse::success(json!({ "success": true })));
    }

    let note = service.soft_delete_note(id).await?;
    Ok(ApiResponse::success(json!({ "note": note })))
}

/// POST /notes/:id/restore
pub async fn restore(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_NOTE_ID)?;
    let note = NotesService::new(&session.db).restore_note(id).await?;
    Ok(ApiResponse::success(json!({ "note": note })))
}

/// A note may only be filed under one of the caller's own sections
async fn ensure_section(db: &Db, section_id: &Field<Uuid>) -> Result<(), ApiError> {
    if let Some(id) = section_id.as_value() {
        if !db.owns(Table::NoteSections, *id).await? {
            return Err(ApiError::not_found(SECTION_NOT_FOUND));
        }
    }
    Ok(())
}
