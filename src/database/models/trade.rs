use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::business::Business;

/// Entity name used for authorization and relation lookups
pub const TRADE_ENTITY: &str = "trade";

/// Columns a caller may filter, order or select on
pub const TRADE_FIELDS: &[&str] = &["id", "trade_date", "profit_or_loss", "business_id", "created_at", "updated_at"];

/// Relations a caller may ask to expand
pub const TRADE_RELATIONS: &[&str] = &["business", "_count"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: String,
    pub trade_date: NaiveDate,
    pub profit_or_loss: i64,
    #[serde(default)]
    pub business_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<Business>,

    #[sqlx(skip)]
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
}

impl Trade {
    /// Build a fresh record from validated input; id and timestamps are assigned here.
    pub fn from_input(input: TradeInput) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            trade_date: input.trade_date,
            profit_or_loss: input.profit_or_loss,
            business_id: input.business_id,
            created_at: now,
            updated_at: now,
            business: None,
            count: None,
        }
    }
}

/// Validated create payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInput {
    pub trade_date: NaiveDate,
    pub profit_or_loss: i64,
    #[serde(default)]
    pub business_id: Option<String>,
}

/// Validated update payload. `business_id: Some(None)` clears the relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradePatch {
    pub trade_date: Option<NaiveDate>,
    pub profit_or_loss: Option<i64>,
    pub business_id: Option<Option<String>>,
}

impl TradePatch {
    pub fn is_empty(&self) -> bool {
        self.trade_date.is_none() && self.profit_or_loss.is_none() && self.business_id.is_none()
    }

    /// Blind merge onto an existing record (last write wins)
    pub fn apply(&self, trade: &mut Trade) {
        if let Some(date) = self.trade_date {
            trade.trade_date = date;
        }
        if let Some(pnl) = self.profit_or_loss {
            trade.profit_or_loss = pnl;
        }
        if let Some(business_id) = &self.business_id {
            trade.business_id = business_id.clone();
        }
        trade.updated_at = Utc::now();
    }
}
