use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::{type_name, Field, Issue, IssueCode, ObjectReader, PathSegment, Validated};
use crate::database::models::{MessageRole, TafsirExcerpt};

static AYAH_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\d+$").expect("valid ayah regex"));

pub const TITLE_MAX: usize = 255;
pub const CONTENT_MAX: usize = 10_000;

/// Conversation fields accepted on both create and update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationInput {
    pub title: Field<String>,
    pub archived: Option<bool>,
}

impl ConversationInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_absent() && self.archived.is_none()
    }
}

pub fn create_conversation(body: &Value) -> Validated<ConversationInput> {
    conversation(body)
}

pub fn update_conversation(body: &Value) -> Validated<ConversationInput> {
    conversation(body)
}

fn conversation(body: &Value) -> Validated<ConversationInput> {
    let mut reader = ObjectReader::new(body)?;
    let input = ConversationInput {
        title: reader.optional_string("title", TITLE_MAX, true),
        archived: reader.optional_bool("archived"),
    };
    reader.finish(input)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMessage {
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub ayah_references: Vec<String>,
    pub tafsir_used: Vec<TafsirExcerpt>,
}

/// Validate a new message; the parent id comes from the route, never the body
pub fn create_message(body: &Value, conversation_id: Uuid) -> Validated<CreateMessage> {
    let mut reader = ObjectReader::new(body)?;

    let role = match reader.get("role") {
        None => {
            reader.push_field("role", IssueCode::InvalidType, "Required");
            None
        }
        Some(Value::String(raw)) => {
            let parsed = MessageRole::parse(raw);
            if parsed.is_none() {
                reader.push_field(
                    "role",
                    IssueCode::InvalidEnumValue,
                    format!(
                        "Invalid enum value. Expected 'user' | 'assistant' | 'system', received '{}'",
                        raw
                    ),
                );
            }
            parsed
        }
        Some(other) => {
            reader.push_field(
                "role",
                IssueCode::InvalidType,
                format!("Expected 'user' | 'assistant' | 'system', received {}", type_name(other)),
            );
            None
        }
    };

    let content = reader.required_string("content", CONTENT_MAX);

    let ayah_references = reader.array_or_default("ayah_references", |value, path, issues| match value {
        Value::String(s) if AYAH_REFERENCE_RE.is_match(s) => Some(s.clone()),
        Value::String(_) => {
            issues.push(Issue {
                code: IssueCode::InvalidString,
                path,
                message: "Ayah reference must be in format \"surah:ayah\" (e.g., \"2:255\")".to_string(),
            });
            None
        }
        other => {
            super::item_issue(
                issues,
                &path,
                IssueCode::InvalidType,
                format!("Expected string, received {}", type_name(other)),
            );
            None
        }
    });

    let tafsir_used = reader.array_or_default("tafsir_used", tafsir_excerpt);

    match (role, content) {
        (Some(role), Some(content)) => reader.finish(CreateMessage {
            conversation_id,
            role,
            content,
            ayah_references,
            tafsir_used,
        }),
        _ => Err(reader.finish(()).err().unwrap_or_default()),
    }
}

fn tafsir_excerpt(value: &Value, path: Vec<PathSegment>, issues: &mut Vec<Issue>) -> Option<TafsirExcerpt> {
    let object = match value {
        Value::Object(map) => map,
        other => {
            super::item_issue(
                issues,
                &path,
                IssueCode::InvalidType,
                format!("Expected object, received {}", type_name(other)),
            );
            return None;
        }
    };

    let mut text = |key: &str| -> Option<String> {
        let mut field_path = path.clone();
        field_path.push(PathSegment::Key(key.to_string()));
        match object.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            None => {
                super::item_issue(issues, &field_path, IssueCode::InvalidType, "Required");
                None
            }
            Some(other) => {
                super::item_issue(
                    issues,
                    &field_path,
                    IssueCode::InvalidType,
                    format!("Expected string, received {}", type_name(other)),
                );
                None
            }
        }
    };

    let source = text("source");
    let excerpt = text("excerpt");
    Some(TafsirExcerpt {
        source: source?,
        excerpt: excerpt?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conversation_id() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn conversation_accepts_empty_body() {
        let input = create_conversation(&json!({})).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn conversation_title_is_trimmed_and_nullable() {
        let input = create_conversation(&json!({ "title": "  Study notes " })).unwrap();
        assert_eq!(input.title, Field::Value("Study notes".to_string()));

        let input = update_conversation(&json!({ "title": null })).unwrap();
        assert_eq!(input.title, Field::Null);
    }

    #[test]
    fn conversation_rejects_blank_title_and_non_bool_archived() {
        let issues = update_conversation(&json!({ "title": "   ", "archived": "yes" })).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "Cannot be empty or whitespace");
        assert_eq!(issues[1].path, vec![PathSegment::from("archived")]);
    }

    #[test]
    fn conversation_ignores_client_owner() {
        let input = create_conversation(&json!({ "title": "x", "user_id": "someone-else" })).unwrap();
        assert_eq!(input.title, Field::Value("x".to_string()));
    }

    #[test]
    fn message_defaults_arrays() {
        let id = conversation_id();
        let message = create_message(&json!({ "role": "user", "content": "Hello" }), id).unwrap();
        assert_eq!(message.conversation_id, id);
        assert_eq!(message.role, MessageRole::User);
        assert!(message.ayah_references.is_empty());
        assert!(message.tafsir_used.is_empty());
    }

    #[test]
    fn message_requires_content() {
        let issues = create_message(&json!({ "role": "user" }), conversation_id()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec![PathSegment::from("content")]);
        assert_eq!(issues[0].message, "Required");
    }

    #[test]
    fn message_rejects_unknown_role() {
        let issues = create_message(&json!({ "role": "moderator", "content": "x" }), conversation_id()).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::InvalidEnumValue);
    }

    #[test]
    fn message_body_conversation_id_is_ignored() {
        let id = conversation_id();
        let body = json!({ "role": "assistant", "content": "x", "conversation_id": Uuid::new_v4() });
        assert_eq!(create_message(&body, id).unwrap().conversation_id, id);
    }

    #[test]
    fn message_checks_ayah_reference_format() {
        let body = json!({
            "role": "assistant",
            "content": "See the verse",
            "ayah_references": ["2:255", "two:5"]
        });
        let issues = create_message(&body, conversation_id()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec![PathSegment::from("ayah_references"), PathSegment::from(1usize)]);
    }

    #[test]
    fn message_checks_tafsir_shape() {
        let body = json!({
            "role": "assistant",
            "content": "x",
            "tafsir_used": [{ "source": "Ibn Kathir", "excerpt": "..." }, { "source": 3 }]
        });
        let issues = create_message(&body, conversation_id()).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert_eq!(
            issues[0].path,
            vec![PathSegment::from("tafsir_used"), PathSegment::from(1usize), PathSegment::from("source")]
        );
        assert_eq!(issues[1].message, "Required");
    }

    #[test]
    fn message_content_limit() {
        let body = json!({ "role": "user", "content": "a".repeat(CONTENT_MAX + 1) });
        let issues = create_message(&body, conversation_id()).unwrap_err();
        assert_eq!(issues[0].message, "Must be 10000 characters or less");
    }
}
