use async_trait::async_trait;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{Business, Trade, TradeInput, TradePatch};
use super::store::{delete_not_found, missing_business, update_not_found, TenantContext, TradeStore};
use crate::filter::{FilterData, SortDirection};

#[derive(Debug, Default)]
struct Partition {
    /// Insertion order doubles as the default ordering
    trades: Vec<Trade>,
    businesses: HashMap<String, Business>,
}

/// In-process store partitioned by tenant id. Used for local development
/// (`STORE_BACKEND=memory`) and tests.
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_business(&self, tenant_id: &str, business: Business) {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(tenant_id.to_string())
            .or_default()
            .businesses
            .insert(business.id.clone(), business);
    }

    /// Every trade of a tenant, in insertion order
    pub async fn snapshot(&self, tenant_id: &str) -> Vec<Trade> {
        let partitions = self.partitions.read().await;
        partitions.get(tenant_id).map(|p| p.trades.clone()).unwrap_or_default()
    }

    fn select(partition: &Partition, filter: &FilterData) -> Result<Vec<Trade>, DatabaseError> {
        let mut rows: Vec<(Trade, Value)> = Vec::new();
        for trade in &partition.trades {
            let value = serde_json::to_value(trade).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
            if filter.where_clause.iter().all(|(column, expected)| field_matches(value.get(column), expected)) {
                rows.push((trade.clone(), value));
            }
        }

        if !filter.order.is_empty() {
            rows.sort_by(|(_, a), (_, b)| {
                filter
                    .order
                    .iter()
                    .map(|info| {
                        let ord = compare_values(a.get(&info.column), b.get(&info.column));
                        match info.sort {
                            SortDirection::Asc => ord,
                            SortDirection::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(trade, _)| Self::with_relations(partition, trade, filter))
            .collect())
    }

    fn with_relations(partition: &Partition, mut trade: Trade, filter: &FilterData) -> Trade {
        if filter.includes("business") {
            trade.business = trade.business_id.as_ref().and_then(|id| partition.businesses.get(id).cloned());
        }
        if filter.includes("_count") {
            // trades own no child collections
            trade.count = Some(json!({}));
        }
        trade
    }

    fn check_business(partition: &Partition, business_id: Option<&String>) -> Result<(), DatabaseError> {
        match business_id {
            Some(id) if !partition.businesses.contains_key(id) => Err(missing_business(id)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn find_many(&self, tenant: &TenantContext, filter: &FilterData) -> Result<Vec<Trade>, DatabaseError> {
        let partitions = self.partitions.read().await;
        match partitions.get(&tenant.tenant_id) {
            Some(partition) => Self::select(partition, filter),
            None => Ok(vec![]),
        }
    }

    async fn find_first(&self, tenant: &TenantContext, filter: &FilterData) -> Result<Option<Trade>, DatabaseError> {
        let first = FilterData { limit: Some(1), ..filter.clone() };
        Ok(self.find_many(tenant, &first).await?.into_iter().next())
    }

    async fn create(&self, tenant: &TenantContext, input: TradeInput) -> Result<Trade, DatabaseError> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(tenant.tenant_id.clone()).or_default();
        Self::check_business(partition, input.business_id.as_ref())?;

        let trade = Trade::from_input(input);
        partition.trades.push(trade.clone());
        Ok(trade)
    }

    async fn update(&self, tenant: &TenantContext, id: &str, patch: &TradePatch) -> Result<Trade, DatabaseError> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.get_mut(&tenant.tenant_id).ok_or_else(update_not_found)?;
        let index = partition.trades.iter().position(|t| t.id == id).ok_or_else(update_not_found)?;
        if let Some(business_id) = &patch.business_id {
            Self::check_business(partition, business_id.as_ref())?;
        }

        let trade = &mut partition.trades[index];
        patch.apply(trade);
        Ok(trade.clone())
    }

    async fn delete(&self, tenant: &TenantContext, id: &str) -> Result<Trade, DatabaseError> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.get_mut(&tenant.tenant_id).ok_or_else(delete_not_found)?;
        let index = partition.trades.iter().position(|t| t.id == id).ok_or_else(delete_not_found)?;
        Ok(partition.trades.remove(index))
    }
}

/// Query-string values arrive as strings; compare numbers by their text form.
fn field_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual.unwrap_or(&Value::Null), expected) {
        (Value::Null, Value::Null) => true,
        (a, Value::String(e)) => match a {
            Value::String(s) => s == e,
            Value::Number(n) => n.to_string() == *e,
            _ => false,
        },
        (a, e) => a == e,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.unwrap_or(&Value::Null), b.unwrap_or(&Value::Null)) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        // dates and RFC 3339 timestamps sort lexicographically
        (Value::String(x), Value::String(y)) => x.cmp(y),
        // nulls last, as Postgres does for ASC
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterOrderInfo, SortDirection};
    use chrono::NaiveDate;

    fn tenant(id: &str) -> TenantContext {
        TenantContext { tenant_id: id.to_string(), database: format!("tenant_{}", id) }
    }

    fn input(day: u32, pnl: i64, business_id: Option<&str>) -> TradeInput {
        TradeInput {
            trade_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            profit_or_loss: pnl,
            business_id: business_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_id() {
        let store = MemoryTradeStore::new();
        let t = tenant("acme");
        let created = store.create(&t, input(1, 500, None)).await.unwrap();

        let found = store.find_first(&t, &FilterData::by_id(&created.id)).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let store = MemoryTradeStore::new();
        let created = store.create(&tenant("acme"), input(1, 500, None)).await.unwrap();

        let other = tenant("globex");
        assert_eq!(store.find_first(&other, &FilterData::by_id(&created.id)).await.unwrap(), None);
        assert!(matches!(
            store.delete(&other, &created.id).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn filters_orders_and_pages() {
        let store = MemoryTradeStore::new();
        let t = tenant("acme");
        let business = Business::new("Desk A");
        store.insert_business("acme", business.clone()).await;
        store.create(&t, input(3, 30, Some(business.id.as_str()))).await.unwrap();
        store.create(&t, input(1, -10, Some(business.id.as_str()))).await.unwrap();
        store.create(&t, input(2, 20, None)).await.unwrap();

        let mut filter = FilterData::default();
        filter.where_clause.insert("business_id".into(), Value::String(business.id.clone()));
        filter.order.push(FilterOrderInfo { column: "trade_date".into(), sort: SortDirection::Asc });
        let rows = store.find_many(&t, &filter).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.profit_or_loss).collect::<Vec<_>>(), vec![-10, 30]);

        let page = FilterData {
            order: vec![FilterOrderInfo { column: "profit_or_loss".into(), sort: SortDirection::Desc }],
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        };
        let rows = store.find_many(&t, &page).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].profit_or_loss, 20);
    }

    #[tokio::test]
    async fn expands_business_relation() {
        let store = MemoryTradeStore::new();
        let t = tenant("acme");
        let business = Business::new("Desk A");
        store.insert_business("acme", business.clone()).await;
        let created = store.create(&t, input(1, 1, Some(business.id.as_str()))).await.unwrap();

        let filter = FilterData { include: vec!["business".into()], ..FilterData::by_id(&created.id) };
        let found = store.find_first(&t, &filter).await.unwrap().unwrap();
        assert_eq!(found.business, Some(business));
    }

    #[tokio::test]
    async fn unknown_business_is_a_constraint_error() {
        let store = MemoryTradeStore::new();
        let err = store.create(&tenant("acme"), input(1, 1, Some("nope"))).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
        assert!(store.snapshot("acme").await.is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let store = MemoryTradeStore::new();
        let t = tenant("acme");
        store.create(&t, input(1, 1, None)).await.unwrap();

        let patch = TradePatch { profit_or_loss: Some(2), ..Default::default() };
        assert!(matches!(store.update(&t, "missing", &patch).await, Err(DatabaseError::NotFound(_))));

        // a missing record wins over a dangling business reference
        let patch = TradePatch { business_id: Some(Some("nope".into())), ..Default::default() };
        assert!(matches!(store.update(&t, "missing", &patch).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(store.delete(&t, "missing").await, Err(DatabaseError::NotFound(_))));
    }
}
