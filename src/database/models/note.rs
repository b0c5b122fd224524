use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotePage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub section_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order_index: i32,
    /// Set when the page is in the trash
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotePage {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
