use serde::{Deserialize, Serialize};

/// Generic query options shared by every resource route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// e.g. `created_at desc,profit_or_loss asc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Comma separated relation names to expand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations: Option<String>,
    /// Comma separated field selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

/// Collection filters for `/api/trades`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeQuery {
    #[serde(flatten)]
    pub base: GetQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
}

impl TradeQuery {
    pub fn for_business(business_id: impl Into<String>) -> Self {
        Self {
            business_id: Some(business_id.into()),
            ..Default::default()
        }
    }
}
