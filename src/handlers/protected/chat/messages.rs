use axum::{
    body::Bytes,
    extract::Path,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ensure_conversation, INVALID_CONVERSATION_ID};
use crate::handlers::{json_body, path_id, validated, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthSession};
use crate::services::messages::{MessagesService, DEFAULT_RECENT_LIMIT};
use crate::validation::chat;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub recent: Option<String>,
}

impl ListQuery {
    /// `?recent=N`; anything that is not a positive integer falls back to the default window
    fn recent_limit(&self) -> Option<u32> {
        self.recent.as_deref().map(|raw| match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => DEFAULT_RECENT_LIMIT,
        })
    }
}

/// GET /chat/:id/messages
pub async fn list(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Value> {
    let conversation_id = path_id(&id, INVALID_CONVERSATION_ID)?;
    ensure_conversation(&session.db, conversation_id).await?;

    let service = MessagesService::new(&session.db);
    let messages = match query.recent_limit() {
        Some(limit) => service.get_recent_messages(conversation_id, limit).await?,
        None => service.get_conversation_messages(conversation_id).await?,
    };
    Ok(ApiResponse::success(json!({ "messages": messages })))
}

/// POST /chat/:id/messages
pub async fn create(
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    let conversation_id = path_id(&id, INVALID_CONVERSATION_ID)?;
    ensure_conversation(&session.db, conversation_id).await?;

    let input = validated(chat::create_message(&json_body(&body)?, conversation_id))?;
    let message = MessagesService::new(&session.db).create_message(input).await?;

    tracing::debug!(%conversation_id, message_id = %message.id, role = message.role.as_str(), "message appended");
    Ok(ApiResponse::created(json!({ "message": message })))
}

/// GET /chat/:id/messages/count
pub async fn count(Extension(session): Extension<AuthSession>, Path(id): Path<String>) -> ApiResult<Value> {
    let conversation_id = path_id(&id, INVALID_CONVERSATION_ID)?;
    ensure_conversation(&session.db, conversation_id).await?;

    let count = MessagesService::new(&session.db).get_message_count(conversation_id).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}
