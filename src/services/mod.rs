pub mod conversations;
pub mod messages;
pub mod notes;
pub mod sections;

pub use conversations::ConversationsService;
pub use messages::MessagesService;
pub use notes::NotesService;
pub use sections::SectionsService;

use uuid::Uuid;

use crate::database::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to reorder sections ({} failed)", failed.len())]
    Reorder { failed: Vec<Uuid> },
}

/// Normalizes the store's "no row matched" outcome
pub(crate) trait StoreResultExt<T> {
    /// Reads: no row becomes `None`
    fn optional(self) -> Result<Option<T>, ServiceError>;

    /// Mutations: no row becomes `NotFound`
    fn or_not_found(self, message: &'static str) -> Result<T, ServiceError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn optional(self) -> Result<Option<T>, ServiceError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::NoRows) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn or_not_found(self, message: &'static str) -> Result<T, ServiceError> {
        match self {
            Ok(value) => Ok(value),
            Err(StoreError::NoRows) => Err(ServiceError::NotFound(message)),
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_is_none_for_reads_and_not_found_for_writes() {
        let read: Result<u8, StoreError> = Err(StoreError::NoRows);
        assert!(matches!(read.optional(), Ok(None)));

        let write: Result<u8, StoreError> = Err(StoreError::NoRows);
        assert!(matches!(write.or_not_found("Note not found"), Err(ServiceError::NotFound("Note not found"))));
    }

    #[test]
    fn other_store_errors_propagate() {
        let result: Result<u8, StoreError> = Err(StoreError::Backend("down".to_string()));
        assert!(matches!(result.optional(), Err(ServiceError::Store(_))));
    }
}
