use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::note::NotePage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// A section together with its active pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionWithPages {
    #[serde(flatten)]
    pub section: NoteSection,
    pub note_pages: Vec<NotePage>,
}
