use serde_json::Value;

use super::filter_order::compare_values;
use super::types::{FilterOp, FilterWhereInfo, Param, SqlResult};
use crate::database::Row;

pub struct FilterWhere {
    param_values: Vec<Param>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions joined by AND; placeholders continue after `starting_param_index`
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> SqlResult {
        let mut filter_where = Self::new(starting_param_index);
        let parts: Vec<String> = conditions.iter().map(|c| filter_where.build_sql_condition(c)).collect();
        let query = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
        SqlResult {
            query,
            params: filter_where.param_values,
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let quoted_column = format!("\"{}\"", condition.column);
        match (&condition.operator, &condition.data) {
            (FilterOp::Eq, Some(param)) if !param.is_null() => {
                format!("{} = {}", quoted_column, self.param(param.clone()))
            }
            (FilterOp::Eq, _) | (FilterOp::IsNull, _) => format!("{} IS NULL", quoted_column),
            (FilterOp::NotNull, _) => format!("{} IS NOT NULL", quoted_column),
        }
    }

    fn param(&mut self, value: Param) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    /// Evaluate conditions against a decoded row, mirroring the SQL semantics
    pub fn matches(conditions: &[FilterWhereInfo], row: &Row) -> bool {
        conditions.iter().all(|condition| {
            let value = row.get(condition.column).unwrap_or(&Value::Null);
            match (&condition.operator, &condition.data) {
                (FilterOp::Eq, Some(param)) if !param.is_null() => {
                    !value.is_null() && compare_values(value, &param.to_json()).is_eq()
                }
                (FilterOp::Eq, _) | (FilterOp::IsNull, _) => value.is_null(),
                (FilterOp::NotNull, _) => !value.is_null(),
            }
        })
    }
}
