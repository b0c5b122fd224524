use serde_json::Value;
use uuid::Uuid;

use super::{Field, IssueCode, ObjectReader, Validated};

pub const TITLE_MAX: usize = 255;
pub const CONTENT_MAX: usize = 100_000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteInput {
    pub section_id: Field<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order_index: Option<i32>,
}

impl NoteInput {
    pub fn is_empty(&self) -> bool {
        self.section_id.is_absent() && self.title.is_none() && self.content.is_none() && self.order_index.is_none()
    }
}

pub fn create_note(body: &Value) -> Validated<NoteInput> {
    let mut reader = ObjectReader::new(body)?;
    let input = fields(&mut reader);
    if input.title.is_none() && input.content.is_none() && !reader.has_issues() {
        reader.push(Vec::new(), IssueCode::Custom, "Either title or content must be provided");
    }
    reader.finish(input)
}

pub fn update_note(body: &Value) -> Validated<NoteInput> {
    let mut reader = ObjectReader::new(body)?;
    let input = fields(&mut reader);
    reader.finish(input)
}

fn fields(reader: &mut ObjectReader<'_>) -> NoteInput {
    NoteInput {
        section_id: reader.optional_uuid("section_id", true),
        title: reader.optional_string("title", TITLE_MAX, false).into_patch().flatten(),
        content: reader.optional_string("content", CONTENT_MAX, false).into_patch().flatten(),
        order_index: reader.optional_order_index("order_index"),
    }
}
