pub mod conversations;
pub mod messages;

use uuid::Uuid;

use crate::database::{Db, Table};
use crate::error::ApiError;

pub(crate) const INVALID_CONVERSATION_ID: &str = "Invalid conversation ID";
pub(crate) const CONVERSATION_NOT_FOUND: &str = "Conversation not found";

/// Parent check for message routes
pub(crate) async fn ensure_conversation(db: &Db, id: Uuid) -> Result<(), ApiError> {
    if db.owns(Table::Conversations, id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found(CONVERSATION_NOT_FOUND))
    }
}
