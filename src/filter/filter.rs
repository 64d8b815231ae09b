use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::{FilterData, SqlResult};

/// Renders a `FilterData` descriptor as a parameterized Postgres SELECT
pub struct Filter {
    table_name: String,
    data: FilterData,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_identifier(&table_name).map_err(|_| FilterError::InvalidTableName(table_name.clone()))?;
        Ok(Self {
            table_name,
            data: FilterData::default(),
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        for column in data.where_clause.keys().chain(data.order.iter().map(|o| &o.column)) {
            Self::validate_identifier(column)?;
        }
        if let Some(limit) = data.limit {
            if limit < 0 {
                return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
            }
        }
        if let Some(offset) = data.offset {
            if offset < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.data = data;
        Ok(self)
    }

    /// Full-row SELECT; field selection is applied after loading so rows
    /// always decode into the entity type.
    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = self.build_where_clause();
        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            FilterOrder::generate(&self.data.order),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    fn build_where_clause(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut conditions = Vec::new();
        for (column, value) in &self.data.where_clause {
            if value.is_null() {
                conditions.push(format!("\"{}\" IS NULL", column));
            } else {
                params.push(value.clone());
                conditions.push(format!("\"{}\" = ${}", column, params.len()));
            }
        }
        (conditions.join(" AND "), params)
    }

    fn build_limit_clause(&self) -> String {
        match (self.data.limit, self.data.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }

    fn validate_identifier(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", name)));
        }
        Ok(())
    }
}
