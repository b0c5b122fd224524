//! Request body and path validation.
//!
//! Validators take an arbitrary `serde_json::Value` and either return typed,
//! trimmed input or a non-empty list of field-level [`Issue`]s. They never
//! panic; the handler decides how to turn issues into a response.

pub mod chat;
pub mod note;
pub mod section;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Canonical textual UUID (versions 1-5, RFC 4122 variant), any case
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("valid uuid regex")
});

pub type Validated<T> = Result<T, Vec<Issue>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidString,
    InvalidEnumValue,
    TooBig,
    TooSmall,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new<P: Into<PathSegment>>(code: IssueCode, path: Vec<P>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    fn at(path: &[PathSegment], code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

/// Optional field that distinguishes "not sent" from an explicit `null`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` when absent, `Some(None)` for null, `Some(Some(v))` otherwise
    pub fn into_patch(self) -> Option<Option<T>> {
        match self {
            Field::Absent => None,
            Field::Null => Some(None),
            Field::Value(v) => Some(Some(v)),
        }
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn is_uuid(raw: &str) -> bool {
    UUID_RE.is_match(raw)
}

/// Validate an identifier taken from a path segment or body field
pub fn uuid_field(raw: &str) -> Option<Uuid> {
    if !is_uuid(raw) {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// Required string that is not blank, at most `max` characters, trimmed on success
pub fn non_blank_string(value: &Value, max: usize) -> Result<String, (IssueCode, String)> {
    let s = value.as_str().ok_or_else(|| {
        (
            IssueCode::InvalidType,
            format!("Expected string, received {}", type_name(value)),
        )
    })?;
    if s.chars().count() > max {
        return Err((IssueCode::TooBig, format!("Must be {} characters or less", max)));
    }
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err((IssueCode::Custom, "Cannot be empty or whitespace".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Non-negative integer that fits an `int4` column
pub fn order_index(value: &Value) -> Result<i32, (IssueCode, String)> {
    let n = match value {
        Value::Number(n) => n,
        other => {
            return Err((
                IssueCode::InvalidType,
                format!("Expected number, received {}", type_name(other)),
            ))
        }
    };
    let int = match (n.as_i64(), n.as_f64()) {
        (Some(i), _) => i,
        (None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => f as i64,
        (None, Some(f)) if f.fract() == 0.0 && f > 0.0 => i64::MAX,
        (None, Some(f)) if f.fract() == 0.0 && f < 0.0 => i64::MIN,
        _ => {
            return Err((IssueCode::InvalidType, "Order index must be an integer".to_string()));
        }
    };
    if int < 0 {
        return Err((IssueCode::TooSmall, "Order index must be zero or positive".to_string()));
    }
    i32::try_from(int).map_err(|_| (IssueCode::TooBig, format!("Order index must be at most {}", i32::MAX)))
}

/// Walks a JSON object and collects issues while extracting fields.
/// Unknown keys are ignored.
pub struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a Value) -> Result<Self, Vec<Issue>> {
        Self::nested(value, Vec::new())
    }

    fn nested(value: &'a Value, path: Vec<PathSegment>) -> Result<Self, Vec<Issue>> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                path,
                issues: Vec::new(),
            }),
            other => Err(vec![Issue::at(
                &path,
                IssueCode::InvalidType,
                format!("Expected object, received {}", type_name(other)),
            )]),
        }
    }

    fn field_path(&self, key: &str) -> Vec<PathSegment> {
        let mut path = self.path.clone();
        path.push(PathSegment::Key(key.to_string()));
        path
    }

    pub fn push(&mut self, path: Vec<PathSegment>, code: IssueCode, message: impl Into<String>) {
        self.issues.push(Issue::at(&path, code, message));
    }

    pub fn push_field(&mut self, key: &str, code: IssueCode, message: impl Into<String>) {
        let path = self.field_path(key);
        self.push(path, code, message);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Raw access for fields with bespoke rules
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    /// Present-and-not-null value, or record the right issue for absent/null
    fn present(&mut self, key: &str, nullable: bool) -> Field<&'a Value> {
        match self.map.get(key) {
            None => Field::Absent,
            Some(Value::Null) if nullable => Field::Null,
            Some(Value::Null) => {
                self.push_field(key, IssueCode::InvalidType, "Expected value, received null");
                Field::Absent
            }
            Some(v) => Field::Value(v),
        }
    }

    pub fn required_string(&mut self, key: &str, max: usize) -> Option<String> {
        match self.map.get(key) {
            None => {
                self.push_field(key, IssueCode::InvalidType, "Required");
                None
            }
            Some(value) => self.check_string(key, value, max),
        }
    }

    pub fn optional_string(&mut self, key: &str, max: usize, nullable: bool) -> Field<String> {
        match self.present(key, nullable) {
            Field::Value(value) => match self.check_string(key, value, max) {
                Some(s) => Field::Value(s),
                None => Field::Absent,
            },
            Field::Null => Field::Null,
            Field::Absent => Field::Absent,
        }
    }

    fn check_string(&mut self, key: &str, value: &Value, max: usize) -> Option<String> {
        match non_blank_string(value, max) {
            Ok(s) => Some(s),
            Err((code, message)) => {
                self.push_field(key, code, message);
                None
            }
        }
    }

    pub fn optional_uuid(&mut self, key: &str, nullable: bool) -> Field<Uuid> {
        match self.present(key, nullable) {
            Field::Value(Value::String(raw)) => match uuid_field(raw) {
                Some(id) => Field::Value(id),
                None => {
                    self.push_field(key, IssueCode::InvalidString, "Invalid UUID format");
                    Field::Absent
                }
            },
            Field::Value(other) => {
                self.push_field(
                    key,
                    IssueCode::InvalidType,
                    format!("Expected string, received {}", type_name(other)),
                );
                Field::Absent
            }
            Field::Null => Field::Null,
            Field::Absent => Field::Absent,
        }
    }

    pub fn optional_bool(&mut self, key: &str) -> Option<bool> {
        match self.present(key, false) {
            Field::Value(Value::Bool(b)) => Some(*b),
            Field::Value(other) => {
                self.push_field(
                    key,
                    IssueCode::InvalidType,
                    format!("Expected boolean, received {}", type_name(other)),
                );
                None
            }
            _ => None,
        }
    }

    pub fn optional_order_index(&mut self, key: &str) -> Option<i32> {
        match self.present(key, false) {
            Field::Value(value) => match order_index(value) {
                Ok(i) => Some(i),
                Err((code, message)) => {
                    self.push_field(key, code, message);
                    None
                }
            },
            _ => None,
        }
    }

    /// Optional array (defaults to empty) whose items are checked by `item`
    pub fn array_or_default<T>(
        &mut self,
        key: &str,
        mut item: impl FnMut(&Value, Vec<PathSegment>, &mut Vec<Issue>) -> Option<T>,
    ) -> Vec<T> {
        match self.present(key, false) {
            Field::Value(Value::Array(values)) => {
                let mut out = Vec::with_capacity(values.len());
                for (index, value) in values.iter().enumerate() {
                    let mut path = self.field_path(key);
                    path.push(PathSegment::Index(index));
                    if let Some(parsed) = item(value, path, &mut self.issues) {
                        out.push(parsed);
                    }
                }
                out
            }
            Field::Value(other) => {
                self.push_field(
                    key,
                    IssueCode::InvalidType,
                    format!("Expected array, received {}", type_name(other)),
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Return `value` if nothing was recorded, otherwise all issues
    pub fn finish<T>(self, value: T) -> Validated<T> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(self.issues)
        }
    }
}

/// Parse a request body that arrived as raw bytes. An empty body counts as `{}`
/// so that partial updates without fields are accepted.
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Some(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).ok()
}

fn item_issue(issues: &mut Vec<Issue>, path: &[PathSegment], code: IssueCode, message: impl Into<String>) {
    issues.push(Issue::at(path, code, message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_canonical_uuids_in_any_case() {
        assert!(is_uuid("3f2504e0-4f89-41d3-9a0c-0305e82c3301"));
        assert!(is_uuid("3F2504E0-4F89-41D3-9A0C-0305E82C3301"));
        assert_eq!(
            uuid_field("3F2504E0-4F89-41D3-9A0C-0305E82C3301").map(|u| u.to_string()),
            Some("3f2504e0-4f89-41d3-9a0c-0305e82c3301".to_string())
        );
    }

    #[test]
    fn rejects_non_canonical_uuids() {
        assert!(!is_uuid("not-a-uuid"));
        assert!(!is_uuid("3f2504e04f8941d39a0c0305e82c3301"));
        assert!(!is_uuid("{3f2504e0-4f89-41d3-9a0c-0305e82c3301}"));
        // version nibble must be 1-5, variant nibble 8-b
        assert!(!is_uuid("3f2504e0-4f89-61d3-9a0c-0305e82c3301"));
        assert!(!is_uuid("3f2504e0-4f89-41d3-7a0c-0305e82c3301"));
        assert!(!is_uuid(" 3f2504e0-4f89-41d3-9a0c-0305e82c3301"));
    }

    #[test]
    fn non_blank_string_trims_and_bounds() {
        assert_eq!(non_blank_string(&json!("  hi  "), 10).unwrap(), "hi");
        assert_eq!(non_blank_string(&json!("   "), 10).unwrap_err().0, IssueCode::Custom);
        assert_eq!(non_blank_string(&json!("abcdef"), 5).unwrap_err().0, IssueCode::TooBig);
        assert_eq!(non_blank_string(&json!(42), 5).unwrap_err().0, IssueCode::InvalidType);
    }

    #[test]
    fn length_is_counted_in_characters() {
        let arabic = "بِسْمِ"; // 6 chars, 12 bytes
        assert!(non_blank_string(&json!(arabic), 6).is_ok());
    }

    #[test]
    fn order_index_bounds() {
        assert_eq!(order_index(&json!(0)).unwrap(), 0);
        assert_eq!(order_index(&json!(3.0)).unwrap(), 3);
        assert_eq!(order_index(&json!(-1)).unwrap_err().1, "Order index must be zero or positive");
        assert_eq!(order_index(&json!(1.5)).unwrap_err().1, "Order index must be an integer");
        assert_eq!(order_index(&json!("1")).unwrap_err().0, IssueCode::InvalidType);
        assert_eq!(order_index(&json!(4_294_967_296u64)).unwrap_err().0, IssueCode::TooBig);
    }

    #[test]
    fn huge_negative_floats_are_too_small() {
        let (code, message) = order_index(&json!(-1.0e16)).unwrap_err();
        assert_eq!(code, IssueCode::TooSmall);
        assert_eq!(message, "Order index must be zero or positive");
        assert_eq!(order_index(&json!(-9.0e15)).unwrap_err().0, IssueCode::TooSmall);
    }

    #[test]
    fn reader_rejects_non_objects() {
        let issues = ObjectReader::new(&json!([1, 2])).err().unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].path.is_empty());
        assert_eq!(issues[0].message, "Expected object, received array");
    }

    #[test]
    fn reader_distinguishes_absent_and_null() {
        let body = json!({ "a": null });
        let mut reader = ObjectReader::new(&body).unwrap();
        assert_eq!(reader.optional_string("a", 10, true), Field::Null);
        assert_eq!(reader.optional_string("b", 10, true), Field::Absent);
        assert!(reader.finish(()).is_ok());

        let mut reader = ObjectReader::new(&body).unwrap();
        assert_eq!(reader.optional_string("a", 10, false), Field::Absent);
        assert!(reader.finish(()).is_err());
    }

    #[test]
    fn issue_paths_serialize_keys_and_indexes() {
        let issue = Issue {
            code: IssueCode::InvalidString,
            path: vec!["tafsir_used".into(), 2usize.into(), "source".into()],
            message: "x".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({ "code": "invalid_string", "path": ["tafsir_used", 2, "source"], "message": "x" })
        );
    }

    #[test]
    fn empty_body_parses_as_empty_object() {
        assert_eq!(parse_body(b""), Some(json!({})));
        assert_eq!(parse_body(b"  \n"), Some(json!({})));
        assert_eq!(parse_body(b"{\"a\":1}"), Some(json!({ "a": 1 })));
        assert_eq!(parse_body(b"{oops"), None);
    }
}
