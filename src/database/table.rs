use std::fmt;

/// Persisted tables and their column sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Conversations,
    Messages,
    NotePages,
    NoteSections,
}

const CONVERSATION_COLUMNS: &[&str] = &["id", "user_id", "title", "archived", "created_at", "updated_at"];

const MESSAGE_COLUMNS: &[&str] = &[
    "id",
    "conversation_id",
    "role",
    "content",
    "ayah_references",
    "tafsir_used",
    "created_at",
];

const NOTE_PAGE_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "section_id",
    "title",
    "content",
    "order_index",
    "deleted_at",
    "created_at",
    "updated_at",
];

const NOTE_SECTION_COLUMNS: &[&str] = &["id", "user_id", "name", "color", "order_index", "created_at"];

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Conversations,
        Table::Messages,
        Table::NotePages,
        Table::NoteSections,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Conversations => "conversations",
            Table::Messages => "messages",
            Table::NotePages => "note_pages",
            Table::NoteSections => "note_sections",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Conversations => CONVERSATION_COLUMNS,
            Table::Messages => MESSAGE_COLUMNS,
            Table::NotePages => NOTE_PAGE_COLUMNS,
            Table::NoteSections => NOTE_SECTION_COLUMNS,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Tables whose `updated_at` is refreshed on every update
    pub fn has_updated_at(&self) -> bool {
        self.has_column("updated_at")
    }

    /// Column holding the owning user, if the table carries one directly.
    /// Messages are owned through their conversation.
    pub fn owner_column(&self) -> Option<&'static str> {
        match self {
            Table::Messages => None,
            _ => Some("user_id"),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
