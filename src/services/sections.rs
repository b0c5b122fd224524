use futures::future::join_all;
use uuid::Uuid;

use super::{ServiceError, StoreResultExt};
use crate::database::models::{NotePage, NoteSection, SectionWithPages};
use crate::database::{Db, Table};
use crate::filter::{Filter, Param, SortDirection, Values};
use crate::validation::section::{SectionInput, SectionOrder};

const NOT_FOUND: &str = "Section not found";

pub struct SectionsService<'a> {
    db: &'a Db,
}

impl<'a> SectionsService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Sections in tab order
    pub async fn get_all_sections(&self) -> Result<Vec<NoteSection>, ServiceError> {
        let filter = Filter::new(Table::NoteSections).order("order_index", SortDirection::Asc);
        Ok(self.db.select_all(filter).await?)
    }

    pub async fn get_section_by_id(&self, id: Uuid) -> Result<Option<NoteSection>, ServiceError> {
        Ok(self.db.select_maybe_single(by_id(id)).await?)
    }

    pub async fn create_section(&self, input: SectionInput) -> Result<NoteSection, ServiceError> {
        let values = values(input).set("user_id", self.db.user_id());
        Ok(self.db.insert_single(Table::NoteSections, values).await?)
    }

    pub async fn update_section(&self, id: Uuid, changes: SectionInput) -> Result<NoteSection, ServiceError> {
        self.db
            .update_single::<NoteSection>(by_id(id), values(changes))
            .await
            .or_not_found(NOT_FOUND)
    }

    /// Hard delete; pages in the section survive with `section_id` cleared
    pub async fn delete_section(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db.delete(by_id(id)).await?;
        Ok(())
    }

    /// One update per section, issued concurrently. Not atomic across rows:
    /// sections that updated before a failure keep their new index.
    pub async fn reorder_sections(&self, orders: &[SectionOrder]) -> Result<(), ServiceError> {
        let updates = orders.iter().map(|order| async move {
            let values = Values::new().set("order_index", order.order_index);
            let result = self.db.update_single::<NoteSection>(by_id(order.id), values).await;
            (order.id, result)
        });

        let failed: Vec<Uuid> = join_all(updates)
            .await
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(_) => None,
                Err(err) => {
                    tracing::error!(section_id = %id, "reorder update failed: {}", err);
                    Some(id)
                }
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Reorder { failed })
        }
    }

    /// Section plus its active pages, in display order
    pub async fn get_section_with_pages(&self, id: Uuid) -> Result<Option<SectionWithPages>, ServiceError> {
        let section = match self.get_section_by_id(id).await? {
            Some(section) => section,
            None => return Ok(None),
        };
        let pages = Filter::new(Table::NotePages)
            .eq("section_id", id)
            .is_null("deleted_at")
            .order("order_index", SortDirection::Asc);
        let note_pages: Vec<NotePage> = self.db.select_all(pages).await?;
        Ok(Some(SectionWithPages { section, note_pages }))
    }

    /// Number of active pages in the section
    pub async fn get_page_count(&self, section_id: Uuid) -> Result<i64, ServiceError> {
        let filter = Filter::new(Table::NotePages)
            .eq("section_id", section_id)
            .is_null("deleted_at");
        Ok(self.db.count(filter).await?)
    }

    /// Fails with `NotFound` unless every id is a section the caller owns
    pub async fn ensure_owned(&self, ids: impl IntoIterator<Item = Uuid>) -> Result<(), ServiceError> {
        for id in ids {
            if !self.db.owns(Table::NoteSections, id).await? {
                return Err(ServiceError::NotFound(NOT_FOUND));
            }
        }
        Ok(())
    }
}

fn by_id(id: Uuid) -> Filter {
    Filter::new(Table::NoteSections).eq("id", id)
}

fn values(input: SectionInput) -> Values {
    Values::new()
        .set_opt("name", input.name)
        .set_opt("color", input.color.into_patch().map(Param::Text))
        .set_opt("order_index", input.order_index)
}
