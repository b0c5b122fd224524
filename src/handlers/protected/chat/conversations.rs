use axum::{
    body::Bytes,
    extract::Path,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CONVERSATION_NOT_FOUND, INVALID_CONVERSATION_ID};
use crate::error::ApiError;
use crate::handlers::{flag, json_body, path_id, validated, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthSession};
use crate::services::ConversationsService;
use crate::validation::chat;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub archived: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub permanent: Option<String>,
}

/// GET /chat - active conversations, or archived ones with `?archived=true`
pub async fn list(Extension(session): Extension<AuthSession>, QueryParams(query): QueryParams<ListQuery>) -> ApiResult<Value> {
    let service = ConversationsService::new(&session.db);
    let conversations = if flag(&query.archived) {
        service.get_archived_conversations().await?
    } else {
        service.get_all_conversations().await?
    };
    Ok(ApiResponse::success(json!({ "conversations": conversations })))
}

/// POST /chat
pub async fn create(Extension(session): Extension<AuthSession>, body: Bytes) -> ApiResult<Value> {
    let input = validated(chat::create_conversation(&json_body(&body)?))?;
    let conversation = ConversationsService::new(&session.db).create_conversation(input).await?;

    tracing::info!(conversation_id = %conversation.id, "conversation created");
    Ok(ApiResponse::created(json!({ "conversation": conversation })))
}

/// GET /chat/:id
pub async fn get(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_CONVERSATION_ID)?;
    let conversation = ConversationsService::new(&session.db)
        .get_conversation_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(CONVERSATION_NOT_FOUND))?;
    Ok(ApiResponse::success(json!({ "conversation": conversation })))
}

/// PATCH /chat/:id
pub async fn update(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_CONVERSATION_ID)?;
    let changes = validated(chat::update_conversation(&json_body(&body)?))?;
    let conversation = ConversationsService::new(&session.db).update_conversation(id, changes).await?;
    Ok(ApiResponse::success(json!({ "conversation": conversation })))
}

/// DELETE /chat/:id - archives; `?permanent=true` removes the conversation and its messages
pub async fn delete(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<DeleteQuery>,
) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_CONVERSATION_ID)?;
    let service = ConversationsService::new(&session.db);

    if flag(&query.permanent) {
        if service.get_conversation_by_id(id).await?.is_none() {
            return Err(ApiError::not_found(CONVERSATION_NOT_FOUND));
        }
        service.delete_conversation(id).await?;
        tracing::info!(conversation_id = %id, "conversation deleted");
        return Ok(ApiResponse::success(json!({ "success": true })));
    }

    let conversation = service.archive_conversation(id).await?;
    Ok(ApiResponse::success(json!({ "success": true, "conversation": conversation })))
}

/// POST /chat/:id/unarchive
pub async fn unarchive(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = path_id(&id, INVALID_CONVERSATION_ID)?;
    let conversation = ConversationsService::new(&session.db).unarchive_conversation(id).await?;
    Ok(ApiResponse::success(json!({ "conversation": conversation })))
}
