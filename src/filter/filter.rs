use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, Param, SortDirection, SqlResult, Values};
use crate::database::{Row, Table};

/// Alias used for the row being read so `row_to_json` can reference it
const ROW_ALIAS: &str = "t";

#[derive(Debug, Clone)]
pub struct Filter {
    table: Table,
    where_data: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<u32>,
}

impl Filter {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            where_data: vec![],
            order_data: vec![],
            limit: None,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Param>) -> Self {
        self.where_data.push(FilterWhereInfo {
            column,
            operator: FilterOp::Eq,
            data: Some(value.into()),
        });
        self
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.where_data.push(FilterWhereInfo {
            column,
            operator: FilterOp::IsNull,
            data: None,
        });
        self
    }

    pub fn not_null(mut self, column: &'static str) -> Self {
        self.where_data.push(FilterWhereInfo {
            column,
            operator: FilterOp::NotNull,
            data: None,
        });
        self
    }

    pub fn order(mut self, column: &'static str, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo { column, sort });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `SELECT row_to_json(t) AS row FROM <table> AS t WHERE .. ORDER BY .. LIMIT ..`
    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        self.validate()?;
        let where_result = FilterWhere::generate(&self.where_data, 0);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();

        let query = [
            format!("SELECT row_to_json(\"{}\") AS \"row\"", ROW_ALIAS),
            format!("FROM \"{}\" AS \"{}\"", self.table.name(), ROW_ALIAS),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult {
            query,
            params: where_result.params,
        })
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        self.validate()?;
        Ok(FilterWhere::generate(&self.where_data, starting_param_index))
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
            self.table.name(),
            where_result.query
        );
        Ok(SqlResult {
            query,
            params: where_result.params,
        })
    }

    /// `UPDATE .. SET .. WHERE .. RETURNING row_to_json(t)`
    pub fn to_update_sql(&self, values: &Values) -> Result<SqlResult, FilterError> {
        if values.is_empty() {
            return Err(FilterError::EmptyAssignment);
        }
        self.validate_columns(values.iter().map(|(c, _)| c))?;

        let mut params = Vec::with_capacity(values.len());
        let assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (column, value))| {
                params.push(value.clone());
                format!("\"{}\" = ${}", column, i + 1)
            })
            .collect();

        let where_result = self.to_where_sql(params.len())?;
        params.extend(where_result.params);

        let query = format!(
            "UPDATE \"{table}\" AS \"{alias}\" SET {set} WHERE {cond} RETURNING row_to_json(\"{alias}\") AS \"row\"",
            table = self.table.name(),
            alias = ROW_ALIAS,
            set = assignments.join(", "),
            cond = where_result.query,
        );
        Ok(SqlResult { query, params })
    }

    /// `DELETE .. WHERE .. RETURNING id`
    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        let query = format!(
            "DELETE FROM \"{}\" WHERE {} RETURNING \"id\"",
            self.table.name(),
            where_result.query
        );
        Ok(SqlResult {
            query,
            params: where_result.params,
        })
    }

    /// Evaluate against a single in-memory row
    pub fn matches(&self, row: &Row) -> bool {
        FilterWhere::matches(&self.where_data, row)
    }

    /// Filter, sort (stable) and limit in-memory rows
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Result<Vec<Row>, FilterError> {
        self.validate()?;
        let mut selected: Vec<Row> = rows.into_iter().filter(|row| self.matches(row)).cloned().collect();
        if !self.order_data.is_empty() {
            selected.sort_by(|a, b| FilterOrder::compare(&self.order_data, a, b));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit as usize);
        }
        Ok(selected)
    }

    fn validate(&self) -> Result<(), FilterError> {
        self.validate_columns(
            self.where_data
                .iter()
                .map(|w| w.column)
                .chain(self.order_data.iter().map(|o| o.column)),
        )
    }

    fn validate_columns<'a>(&self, columns: impl Iterator<Item = &'a str>) -> Result<(), FilterError> {
        for column in columns {
            if !self.table.has_column(column) {
                return Err(FilterError::InvalidColumn(format!("{}.{}", self.table.name(), column)));
            }
        }
        Ok(())
    }
}

/// `INSERT INTO .. (..) VALUES (..) RETURNING row_to_json(t)`
pub fn insert_sql(table: Table, values: &Values) -> Result<SqlResult, FilterError> {
    for (column, _) in values.iter() {
        if !table.has_column(column) {
            return Err(FilterError::InvalidColumn(format!("{}.{}", table.name(), column)));
        }
    }

    let (columns, params): (Vec<String>, Vec<Param>) = values
        .iter()
        .map(|(column, value)| (format!("\"{}\"", column), value.clone()))
        .unzip();

    let body = if columns.is_empty() {
        "DEFAULT VALUES".to_string()
    } else {
        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${}", i)).collect();
        format!("({}) VALUES ({})", columns.join(", "), placeholders.join(", "))
    };

    let query = format!(
        "INSERT INTO \"{table}\" AS \"{alias}\" {body} RETURNING row_to_json(\"{alias}\") AS \"row\"",
        table = table.name(),
        alias = ROW_ALIAS,
        body = body,
    );
    Ok(SqlResult { query, params })
}
