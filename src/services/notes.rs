use chrono::Utc;
use uuid::Uuid;

use super::{ServiceError, StoreResultExt};
use crate::database::models::NotePage;
use crate::database::{Db, Table};
use crate::filter::{Filter, Param, SortDirection, Values};
use crate::validation::note::NoteInput;

const NOT_FOUND: &str = "Note not found";

pub struct NotesService<'a> {
    db: &'a Db,
}

impl<'a> NotesService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Active notes, newest first
    pub async fn get_all_notes(&self) -> Result<Vec<NotePage>, ServiceError> {
        let filter = Filter::new(Table::NotePages)
            .is_null("deleted_at")
            .order("created_at", SortDirection::Desc);
        Ok(self.db.select_all(filter).await?)
    }

    /// Active notes only; trashed notes read as absent
    pub async fn get_note_by_id(&self, id: Uuid) -> Result<Option<NotePage>, ServiceError> {
        let filter = by_id(id).is_null("deleted_at");
        self.db.select_single::<NotePage>(filter).await.optional()
    }

    pub async fn create_note(&self, input: NoteInput) -> Result<NotePage, ServiceError> {
        let values = values(input).set("user_id", self.db.user_id());
        Ok(self.db.insert_single(Table::NotePages, values).await?)
    }

    pub async fn update_note(&self, id: Uuid, changes: NoteInput) -> Result<NotePage, ServiceError> {
        self.db
            .update_single::<NotePage>(by_id(id), values(changes))
            .await
            .or_not_found(NOT_FOUND)
    }

    pub async fn soft_delete_note(&self, id: Uuid) -> Result<NotePage, ServiceError> {
        let values = Values::new().set("deleted_at", Utc::now());
        self.db
            .update_single::<NotePage>(by_id(id), values)
            .await
            .or_not_found(NOT_FOUND)
    }

    pub async fn restore_note(&self, id: Uuid) -> Result<NotePage, ServiceError> {
        let values = Values::new().set("deleted_at", Param::Timestamp(None));
        self.db
            .update_single::<NotePage>(by_id(id), values)
            .await
            .or_not_found(NOT_FOUND)
    }

    pub async fn permanently_delete_note(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db.delete(by_id(id)).await?;
        Ok(())
    }

    /// Active notes in a section, in display order
    pub async fn get_notes_by_section(&self, section_id: Uuid) -> Result<Vec<NotePage>, ServiceError> {
        let filter = Filter::new(Table::NotePages)
            .eq("section_id", section_id)
            .is_null("deleted_at")
            .order("order_index", SortDirection::Asc);
        Ok(self.db.select_all(filter).await?)
    }

    /// Trash, most recently deleted first
    pub async fn get_deleted_notes(&self) -> Result<Vec<NotePage>, ServiceError> {
        let filter = Filter::new(Table::NotePages)
            .not_null("deleted_at")
            .order("deleted_at", SortDirection::Desc);
        Ok(self.db.select_all(filter).await?)
    }
}

fn by_id(id: Uuid) -> Filter {
    Filter::new(Table::NotePages).eq("id", id)
}

fn values(input: NoteInput) -> Values {
    Values::new()
        .set_opt("section_id", input.section_id.into_patch().map(Param::Uuid))
        .set_opt("title", input.title)
        .set_opt("content", input.content)
        .set_opt("order_index", input.order_index)
}
