use uuid::Uuid;

use super::{ServiceError, StoreResultExt};
use crate::database::models::Conversation;
use crate::database::{Db, Table};
use crate::filter::{Filter, Param, SortDirection, Values};
use crate::validation::chat::ConversationInput;

const NOT_FOUND: &str = "Conversation not found";

pub struct ConversationsService<'a> {
    db: &'a Db,
}

impl<'a> ConversationsService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Active conversations, most recently updated first
    pub async fn get_all_conversations(&self) -> Result<Vec<Conversation>, ServiceError> {
        let filter = Filter::new(Table::Conversations)
            .eq("archived", false)
            .order("updated_at", SortDirection::Desc);
        Ok(self.db.select_all(filter).await?)
    }

    pub async fn get_archived_conversations(&self) -> Result<Vec<Conversation>, ServiceError> {
        let filter = Filter::new(Table::Conversations)
            .eq("archived", true)
            .order("updated_at", SortDirection::Desc);
        Ok(self.db.select_all(filter).await?)
    }

    pub async fn get_conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>, ServiceError> {
        self.db.select_single::<Conversation>(by_id(id)).await.optional()
    }

    /// The owner is always the caller, whatever the client sent
    pub async fn create_conversation(&self, input: ConversationInput) -> Result<Conversation, ServiceError> {
        let values = values(input).set("user_id", self.db.user_id());
        Ok(self.db.insert_single(Table::Conversations, values).await?)
    }

    pub async fn update_conversation(&self, id: Uuid, changes: ConversationInput) -> Result<Conversation, ServiceError> {
        self.db
            .update_single::<Conversation>(by_id(id), values(changes))
            .await
            .or_not_found(NOT_FOUND)
    }

    pub async fn archive_conversation(&self, id: Uuid) -> Result<Conversation, ServiceError> {
        self.set_archived(id, true).await
    }

    pub async fn unarchive_conversation(&self, id: Uuid) -> Result<Conversation, ServiceError> {
        self.set_archived(id, false).await
    }

    /// Hard delete; messages go with it
    pub async fn delete_conversation(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db.delete(by_id(id)).await?;
        Ok(())
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> Result<Conversation, ServiceError> {
        let values = Values::new().set("archived", archived);
        self.db
            .update_single::<Conversation>(by_id(id), values)
            .await
            .or_not_found(NOT_FOUND)
    }
}

fn by_id(id: Uuid) -> Filter {
    Filter::new(Table::Conversations).eq("id", id)
}

fn values(input: ConversationInput) -> Values {
    Values::new()
        .set_opt("title", input.title.into_patch().map(Param::Text))
        .set_opt("archived", input.archived)
}
