pub mod conversation;
pub mod message;
pub mod note;
pub mod section;

pub use conversation::Conversation;
pub use message::{Message, MessageRole, TafsirExcerpt};
pub use note::NotePage;
pub use section::{NoteSection, SectionWithPages};
