use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::types::{FilterOrderInfo, SortDirection};
use crate::database::Row;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Row comparator matching Postgres defaults (NULLS LAST ascending, FIRST descending)
    pub fn compare(infos: &[FilterOrderInfo], a: &Row, b: &Row) -> Ordering {
        for info in infos {
            let left = a.get(info.column).unwrap_or(&Value::Null);
            let right = b.get(info.column).unwrap_or(&Value::Null);
            let ordering = compare_values(left, right);
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order over column values. Nulls sort after everything else.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => compare_strings(x, y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_strings(x: &str, y: &str) -> Ordering {
    if let (Ok(x), Ok(y)) = (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
        return x.cmp(&y);
    }
    if let (Ok(x), Ok(y)) = (Uuid::parse_str(x), Uuid::parse_str(y)) {
        return x.cmp(&y);
    }
    x.cmp(y)
}
