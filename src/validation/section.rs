use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::{type_name, Field, IssueCode, ObjectReader, PathSegment, Validated};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

pub const NAME_MAX: usize = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionInput {
    pub name: Option<String>,
    pub color: Field<String>,
    pub order_index: Option<i32>,
}

impl SectionInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_absent() && self.order_index.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOrder {
    pub id: Uuid,
    pub order_index: i32,
}

pub fn create_section(body: &Value) -> Validated<SectionInput> {
    let mut reader = ObjectReader::new(body)?;
    let input = SectionInput {
        name: reader.required_string("name", NAME_MAX),
        color: color(&mut reader),
        order_index: reader.optional_order_index("order_index"),
    };
    reader.finish(input)
}

pub fn update_section(body: &Value) -> Validated<SectionInput> {
    let mut reader = ObjectReader::new(body)?;
    let input = SectionInput {
        name: reader.optional_string("name", NAME_MAX, false).into_patch().flatten(),
        color: color(&mut reader),
        order_index: reader.optional_order_index("order_index"),
    };
    reader.finish(input)
}

fn color(reader: &mut ObjectReader<'_>) -> Field<String> {
    match reader.get("color") {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(Value::String(s)) if HEX_COLOR_RE.is_match(s) => Field::Value(s.clone()),
        Some(Value::String(_)) => {
            reader.push_field(
                "color",
                IssueCode::InvalidString,
                "Color must be a valid hex code (e.g., #3B82F6)",
            );
            Field::Absent
        }
        Some(other) => {
            reader.push_field(
                "color",
                IssueCode::InvalidType,
                format!("Expected string, received {}", type_name(other)),
            );
            Field::Absent
        }
    }
}

/// Accepts `[{id, order_index}, ...]` or `{ "sections": [...] }`
pub fn reorder_sections(body: &Value) -> Validated<Vec<SectionOrder>> {
    let (entries, root): (&Vec<Value>, Vec<PathSegment>) = match body {
        Value::Array(entries) => (entries, Vec::new()),
        Value::Object(map) => match map.get("sections") {
            Some(Value::Array(entries)) => (entries, vec![PathSegment::from("sections")]),
            Some(other) => {
                return Err(vec![super::Issue::new(
                    IssueCode::InvalidType,
                    vec!["sections"],
                    format!("Expected array, received {}", type_name(other)),
                )])
            }
            None => {
                return Err(vec![super::Issue::new(IssueCode::InvalidType, vec!["sections"], "Required")]);
            }
        },
        other => {
            return Err(vec![super::Issue::new::<PathSegment>(
                IssueCode::InvalidType,
                Vec::new(),
                format!("Expected array, received {}", type_name(other)),
            )])
        }
    };

    if entries.is_empty() {
        return Err(vec![super::Issue {
            code: IssueCode::TooSmall,
            path: root,
            message: "At least one section is required".to_string(),
        }]);
    }

    let mut orders = Vec::with_capacity(entries.len());
    let mut issues = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let mut path = root.clone();
        path.push(PathSegment::Index(index));
        let mut reader = match ObjectReader::nested(entry, path) {
            Ok(reader) => reader,
            Err(mut entry_issues) => {
                issues.append(&mut entry_issues);
                continue;
            }
        };

        let id = match reader.optional_uuid("id", false) {
            Field::Value(id) => Some(id),
            _ => {
                if reader.get("id").is_none() {
                    reader.push_field("id", IssueCode::InvalidType, "Required");
                }
                None
            }
        };
        let order_index = reader.optional_order_index("order_index");
        if reader.get("order_index").is_none() {
            reader.push_field("order_index", IssueCode::InvalidType, "Required");
        }

        match reader.finish(()) {
            Ok(()) => {
                if let (Some(id), Some(order_index)) = (id, order_index) {
                    orders.push(SectionOrder { id, order_index });
                }
            }
            Err(mut entry_issues) => issues.append(&mut entry_issues),
        }
    }

    if issues.is_empty() {
        Ok(orders)
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_requires_name() {
        let issues = create_section(&json!({ "color": "#3B82F6" })).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec![PathSegment::from("name")]);
    }

    #[test]
    fn name_limit_is_100() {
        let issues = create_section(&json!({ "name": "n".repeat(101) })).unwrap_err();
        assert_eq!(issues[0].message, "Must be 100 characters or less");
    }

    #[test]
    fn color_must_be_hex() {
        let issues = create_section(&json!({ "name": "Tafsir", "color": "blue" })).unwrap_err();
        assert_eq!(issues[0].message, "Color must be a valid hex code (e.g., #3B82F6)");

        let input = create_section(&json!({ "name": "Tafsir", "color": "#3b82f6" })).unwrap();
        assert_eq!(input.color, Field::Value("#3b82f6".to_string()));
    }

    #[test]
    fn update_can_clear_color() {
        let input = update_section(&json!({ "color": null })).unwrap();
        assert_eq!(input.color, Field::Null);
        assert!(input.name.is_none());
    }

    #[test]
    fn reorder_accepts_both_shapes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let plain = json!([{ "id": a, "order_index": 1 }, { "id": b, "order_index": 0 }]);
        let wrapped = json!({ "sections": plain.clone() });
        let expected = vec![
            SectionOrder { id: a, order_index: 1 },
            SectionOrder { id: b, order_index: 0 },
        ];
        assert_eq!(reorder_sections(&plain).unwrap(), expected);
        assert_eq!(reorder_sections(&wrapped).unwrap(), expected);
    }

    #[test]
    fn reorder_rejects_empty_and_malformed_entries() {
        assert_eq!(
            reorder_sections(&json!([])).unwrap_err()[0].message,
            "At least one section is required"
        );

        let issues = reorder_sections(&json!([{ "id": "nope", "order_index": 0 }, { "order_index": -1 }])).unwrap_err();
        let paths: Vec<_> = issues.iter().map(|i| i.path.clone()).collect();
        assert!(paths.contains(&vec![PathSegment::from(0usize), PathSegment::from("id")]));
        assert!(paths.contains(&vec![PathSegment::from(1usize), PathSegment::from("id")]));
        assert!(paths.contains(&vec![PathSegment::from(1usize), PathSegment::from("order_index")]));
    }
}
