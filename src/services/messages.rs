use serde_json::json;
use uuid::Uuid;

use super::{ServiceError, StoreResultExt};
use crate::database::models::Message;
use crate::database::{Db, Table};
use crate::filter::{Filter, Param, SortDirection, Values};
use crate::validation::chat::CreateMessage;

pub const DEFAULT_RECENT_LIMIT: u32 = 10;

pub struct MessagesService<'a> {
    db: &'a Db,
}

impl<'a> MessagesService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Full history in chronological order
    pub async fn get_conversation_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, ServiceError> {
        let filter = Filter::new(Table::Messages)
            .eq("conversation_id", conversation_id)
            .order("created_at", SortDirection::Asc);
        Ok(self.db.select_all(filter).await?)
    }

    pub async fn get_message_by_id(&self, id: Uuid) -> Result<Option<Message>, ServiceError> {
        let filter = Filter::new(Table::Messages).eq("id", id);
        self.db.select_single::<Message>(filter).await.optional()
    }

    pub async fn create_message(&self, input: CreateMessage) -> Result<Message, ServiceError> {
        let values = Values::new()
            .set("conversation_id", input.conversation_id)
            .set("role", input.role.as_str())
            .set("content", input.content)
            .set("ayah_references", Param::Json(json!(input.ayah_references)))
            .set("tafsir_used", Param::Json(json!(input.tafsir_used)));
        Ok(self.db.insert_single(Table::Messages, values).await?)
    }

    /// The newest `limit` messages, oldest first
    pub async fn get_recent_messages(&self, conversation_id: Uuid, limit: u32) -> Result<Vec<Message>, ServiceError> {
        let filter = Filter::new(Table::Messages)
            .eq("conversation_id", conversation_id)
            .order("created_at", SortDirection::Desc)
            .limit(limit);
        let mut messages: Vec<Message> = self.db.select_all(filter).await?;
        messages.reverse();
        Ok(messages)
    }

    pub async fn get_message_count(&self, conversation_id: Uuid) -> Result<i64, ServiceError> {
        let filter = Filter::new(Table::Messages).eq("conversation_id", conversation_id);
        Ok(self.db.count(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{MessageRole, TafsirExcerpt};
    use crate::services::ConversationsService;
    use crate::testing::{db_for, memory_store};
    use crate::validation::chat::ConversationInput;

    fn message(conversation_id: Uuid, content: &str) -> CreateMessage {
        CreateMessage {
            conversation_id,
            role: MessageRole::User,
            content: content.to_string(),
            ayah_references: vec![],
            tafsir_used: vec![],
        }
    }

    #[tokio::test]
    async fn recent_messages_are_newest_in_chronological_order() {
        let store = memory_store();
        let db = db_for(&store, Uuid::new_v4());
        let conversation = ConversationsService::new(&db)
            .create_conversation(ConversationInput::default())
            .await
            .unwrap();
        let service = MessagesService::new(&db);
        for i in 0..5 {
            service.create_message(message(conversation.id, &format!("m{}", i))).await.unwrap();
        }

        let recent: Vec<_> = service
            .get_recent_messages(conversation.id, 3)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(recent, vec!["m2", "m3", "m4"]);

        let all = service.get_conversation_messages(conversation.id).await.unwrap();
        assert_eq!(all.first().map(|m| m.content.as_str()), Some("m0"));
        assert_eq!(service.get_message_count(conversation.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn citations_round_trip() {
        let store = memory_store();
        let db = db_for(&store, Uuid::new_v4());
        let conversation = ConversationsService::new(&db)
            .create_conversation(ConversationInput::default())
            .await
            .unwrap();
        let service = MessagesService::new(&db);

        let mut input = message(conversation.id, "Ayat al-Kursi");
        input.role = MessageRole::Assistant;
        input.ayah_references = vec!["2:255".to_string()];
        input.tafsir_used = vec![TafsirExcerpt {
            source: "Ibn Kathir".to_string(),
            excerpt: "...".to_string(),
        }];
        let created = service.create_message(input).await.unwrap();

        let fetched = service.get_message_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.role, MessageRole::Assistant);
        assert_eq!(fetched.ayah_references, vec!["2:255"]);
        assert_eq!(fetched.tafsir_used[0].source, "Ibn Kathir");
    }

    #[tokio::test]
    async fn foreign_messages_are_invisible() {
        let store = memory_store();
        let owner = db_for(&store, Uuid::new_v4());
        let conversation = ConversationsService::new(&owner)
            .create_conversation(ConversationInput::default())
            .await
            .unwrap();
        MessagesService::new(&owner)
            .create_message(message(conversation.id, "private"))
            .await
            .unwrap();

        let stranger = db_for(&store, Uuid::new_v4());
        let service = MessagesService::new(&stranger);
        assert!(service.get_conversation_messages(conversation.id).await.unwrap().is_empty());
        assert_eq!(service.get_message_count(conversation.id).await.unwrap(), 0);
        assert!(service.create_message(message(conversation.id, "intrusion")).await.is_err());
    }
}
