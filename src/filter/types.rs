use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Structured, store-independent filter descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    /// Field selection; empty means every field
    pub select: Vec<String>,
    /// Field equality conditions, AND-ed together
    pub where_clause: BTreeMap<String, Value>,
    pub order: Vec<FilterOrderInfo>,
    /// Relations to expand on each returned record
    pub include: Vec<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterData {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::default().scoped_to(id)
    }

    /// Pin the descriptor to one record; overrides any `id` condition already present.
    pub fn scoped_to(mut self, id: impl Into<String>) -> Self {
        self.where_clause.insert("id".to_string(), Value::String(id.into()));
        self
    }

    pub fn includes(&self, relation: &str) -> bool {
        self.include.iter().any(|r| r == relation)
    }

    /// Cap the page size at the configured maximum
    pub fn with_max_limit(mut self, max_limit: Option<i64>) -> Self {
        if let (Some(limit), Some(max)) = (self.limit, max_limit) {
            if limit > max {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
                self.limit = Some(max);
            }
        }
        self
    }

    /// Apply the field selection to a serialized record. `id` and expanded
    /// relations are always kept.
    pub fn project(&self, record: Value) -> Value {
        if self.select.is_empty() {
            return record;
        }
        match record {
            Value::Object(map) => {
                let projected: Map<String, Value> = map
                    .into_iter()
                    .filter(|(key, _)| key == "id" || self.select.contains(key) || self.includes(key))
                    .collect();
                Value::Object(projected)
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scoping_overrides_query_id() {
        let mut filter = FilterData::default();
        filter.where_clause.insert("id".into(), json!("from-query"));
        let filter = filter.scoped_to("from-path");
        assert_eq!(filter.where_clause["id"], json!("from-path"));
    }

    #[test]
    fn projection_keeps_id_and_relations() {
        let filter = FilterData {
            select: vec!["profit_or_loss".into()],
            include: vec!["business".into()],
            ..Default::default()
        };
        let projected = filter.project(json!({
            "id": "t1",
            "profit_or_loss": 5,
            "trade_date": "2024-01-01",
            "business": { "id": "b1" }
        }));
        assert_eq!(projected, json!({ "id": "t1", "profit_or_loss": 5, "business": { "id": "b1" } }));
    }

    #[test]
    fn limit_is_capped() {
        let filter = FilterData { limit: Some(5000), ..Default::default() }.with_max_limit(Some(100));
        assert_eq!(filter.limit, Some(100));
    }
}
