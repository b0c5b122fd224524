use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A typed statement parameter. Postgres binds each variant with its native
/// type; the in-memory store compares through [`Param::to_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Uuid(Option<Uuid>),
    Text(Option<String>),
    Bool(bool),
    Int(i32),
    Timestamp(Option<DateTime<Utc>>),
    Json(Value),
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Param::Uuid(None) | Param::Text(None) | Param::Timestamp(None) | Param::Json(Value::Null)
        )
    }

    pub fn to_json(&self) -> Value {
        match self {
            Param::Uuid(v) => v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null),
            Param::Text(v) => v.clone().map(Value::String).unwrap_or(Value::Null),
            Param::Bool(b) => Value::Bool(*b),
            Param::Int(i) => Value::from(*i),
            Param::Timestamp(v) => v.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null),
            Param::Json(v) => v.clone(),
        }
    }
}

impl From<Uuid> for Param {
    fn from(v: Uuid) -> Self {
        Param::Uuid(Some(v))
    }
}

impl From<Option<Uuid>> for Param {
    fn from(v: Option<Uuid>) -> Self {
        Param::Uuid(v)
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(Some(v))
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for Param {
    fn from(v: Option<String>) -> Self {
        Param::Text(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(v: DateTime<Utc>) -> Self {
        Param::Timestamp(Some(v))
    }
}

impl From<Option<DateTime<Utc>>> for Param {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        Param::Timestamp(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq,
    IsNull,
    NotNull,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: &'static str,
    pub operator: FilterOp,
    pub data: Option<Param>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Param>,
}

/// Column assignments for inserts and updates, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(Vec<(&'static str, Param)>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing an earlier assignment to the same column
    pub fn set(mut self, column: &'static str, value: impl Into<Param>) -> Self {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
        self
    }

    pub fn set_opt(self, column: &'static str, value: Option<impl Into<Param>>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn get(&self, column: &str) -> Option<&Param> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, p)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Param)> {
        self.0.iter().map(|(c, p)| (*c, p))
    }
}
