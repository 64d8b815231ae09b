use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{postgres::PgArguments, PgPool};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{Business, Trade, TradeInput, TradePatch};
use super::schema;
use super::store::{delete_not_found, missing_business, update_not_found, TenantContext, TradeStore};
use crate::filter::{Filter, FilterData};

const TRADES_TABLE: &str = "trades";

/// Runs the schema install at most once per tenant database. Concurrent first
/// callers wait on the same install; a failed install is retried by the next caller.
#[derive(Default)]
struct SchemaGate {
    cells: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

impl SchemaGate {
    async fn ensure<F, Fut>(&self, database: &str, install: F) -> Result<(), DatabaseError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), DatabaseError>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(database.to_string()).or_default().clone()
        };
        cell.get_or_try_init(install).await.map(|_| ())
    }
}

/// Postgres-backed store; one database per tenant, pools from `DatabaseManager`.
#[derive(Default)]
pub struct PgTradeStore {
    schema: SchemaGate,
}

impl PgTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn pool(&self, tenant: &TenantContext) -> Result<PgPool, DatabaseError> {
        let pool = DatabaseManager::tenant_pool(&tenant.database).await?;
        self.schema.ensure(&tenant.database, || schema::install(&pool)).await?;
        Ok(pool)
    }

    async fn load_relations(pool: &PgPool, trades: &mut [Trade], filter: &FilterData) -> Result<(), DatabaseError> {
        if filter.includes("business") {
            let ids: Vec<String> = trades.iter().filter_map(|t| t.business_id.clone()).collect();
            if !ids.is_empty() {
                let businesses = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = ANY($1)")
                    .bind(&ids)
                    .fetch_all(pool)
                    .await?;
                for trade in trades.iter_mut() {
                    trade.business = trade
                        .business_id
                        .as_ref()
                        .and_then(|id| businesses.iter().find(|b| &b.id == id).cloned());
                }
            }
        }
        if filter.includes("_count") {
            for trade in trades.iter_mut() {
                trade.count = Some(json!({}));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TradeStore for PgTradeStore {
    async fn find_many(&self, tenant: &TenantContext, filter: &FilterData) -> Result<Vec<Trade>, DatabaseError> {
        let pool = self.pool(tenant).await?;

        let mut builder = Filter::new(TRADES_TABLE).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        builder
            .assign(filter.clone())
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let sql_result = builder.to_sql();

        let mut q = sqlx::query_as::<_, Trade>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let mut trades = q.fetch_all(&pool).await?;

        Self::load_relations(&pool, &mut trades, filter).await?;
        Ok(trades)
    }

    async fn find_first(&self, tenant: &TenantContext, filter: &FilterData) -> Result<Option<Trade>, DatabaseError> {
        let first = FilterData { limit: Some(1), ..filter.clone() };
        Ok(self.find_many(tenant, &first).await?.into_iter().next())
    }

    async fn create(&self, tenant: &TenantContext, input: TradeInput) -> Result<Trade, DatabaseError> {
        let pool = self.pool(tenant).await?;
        let trade = Trade::from_input(input);

        sqlx::query_as::<_, Trade>(
            "INSERT INTO trades (id, trade_date, profit_or_loss, business_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&trade.id)
        .bind(trade.trade_date)
        .bind(trade.profit_or_loss)
        .bind(&trade.business_id)
        .bind(trade.created_at)
        .bind(trade.updated_at)
        .fetch_one(&pool)
        .await
        .map_err(|e| map_constraint(e, trade.business_id.as_deref()))
    }

    async fn update(&self, tenant: &TenantContext, id: &str, patch: &TradePatch) -> Result<Trade, DatabaseError> {
        let pool = self.pool(tenant).await?;
        let (set_business, business_id) = match &patch.business_id {
            Some(value) => (true, value.clone()),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, Trade>(
            "UPDATE trades SET
                trade_date = COALESCE($2, trade_date),
                profit_or_loss = COALESCE($3, profit_or_loss),
                business_id = CASE WHEN $4 THEN $5 ELSE business_id END,
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(patch.trade_date)
        .bind(patch.profit_or_loss)
        .bind(set_business)
        .bind(&business_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| map_constraint(e, business_id.as_deref()))?;

        row.ok_or_else(update_not_found)
    }

    async fn delete(&self, tenant: &TenantContext, id: &str) -> Result<Trade, DatabaseError> {
        let pool = self.pool(tenant).await?;
        let row = sqlx::query_as::<_, Trade>("DELETE FROM trades WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

        row.ok_or_else(delete_not_found)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check().await
    }
}

/// Foreign-key violations become constraint errors; everything else stays a driver error
fn map_constraint(err: sqlx::Error, business_id: Option<&str>) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            return missing_business(business_id.unwrap_or_default());
        }
    }
    DatabaseError::Sqlx(err)
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
