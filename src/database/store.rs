use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{Trade, TradeInput, TradePatch};
use crate::filter::FilterData;

/// Which tenant partition a store call runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: String,
    /// Tenant database name (`tenant_<...>`), used by the Postgres store
    pub database: String,
}

/// Persistence port for trades. Every call is scoped to one tenant and is a
/// single atomic operation; there is no cross-call transaction.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn find_many(&self, tenant: &TenantContext, filter: &FilterData) -> Result<Vec<Trade>, DatabaseError>;

    /// First record matching the filter, or `None`
    async fn find_first(&self, tenant: &TenantContext, filter: &FilterData) -> Result<Option<Trade>, DatabaseError>;

    /// Fails with `Constraint` when `business_id` references no business
    async fn create(&self, tenant: &TenantContext, input: TradeInput) -> Result<Trade, DatabaseError>;

    /// Blind merge; fails with `NotFound` when no record has this id
    async fn update(&self, tenant: &TenantContext, id: &str, patch: &TradePatch) -> Result<Trade, DatabaseError>;

    /// Returns the removed record; fails with `NotFound` when no record has this id
    async fn delete(&self, tenant: &TenantContext, id: &str) -> Result<Trade, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

pub(crate) fn update_not_found() -> DatabaseError {
    DatabaseError::NotFound("Record to update not found.".to_string())
}

pub(crate) fn delete_not_found() -> DatabaseError {
    DatabaseError::NotFound("Record to delete does not exist.".to_string())
}

pub(crate) fn missing_business(business_id: &str) -> DatabaseError {
    DatabaseError::Constraint(format!("Foreign key constraint failed: business '{}' does not exist", business_id))
}
