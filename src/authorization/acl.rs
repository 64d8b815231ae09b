use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::{AuthorizationError, Authorizer, ResourceRef};
use crate::types::Operation;

/// Key of a per-instance rule: tenant, entity, instance id
type InstanceKey = (String, String, String);

/// Role grants plus per-instance overrides.
///
/// Decision order for an instance check: an instance deny for the operation
/// wins, then an instance allow for any of the caller's roles, then the role
/// grants. Collection checks (`id = None`) consult role grants only.
#[derive(Debug, Clone, Default)]
pub struct AclAuthorizer {
    grants: HashMap<String, HashSet<Operation>>,
    allow: HashMap<InstanceKey, HashMap<String, HashSet<Operation>>>,
    deny: HashMap<InstanceKey, HashSet<Operation>>,
}

impl AclAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `admin` may do everything, `trader` everything but delete, `viewer` may read
    pub fn with_default_roles() -> Self {
        Self::new()
            .grant("admin", &Operation::ALL)
            .grant("trader", &[Operation::Create, Operation::Read, Operation::Update])
            .grant("viewer", &[Operation::Read])
    }

    pub fn grant(mut self, role: &str, operations: &[Operation]) -> Self {
        self.grants.entry(role.to_string()).or_default().extend(operations.iter().copied());
        self
    }

    /// Lets `role` perform `operations` on one instance regardless of role grants
    pub fn allow_instance(mut self, tenant_id: &str, resource: &ResourceRef, role: &str, operations: &[Operation]) -> Self {
        if let Some(key) = instance_key(tenant_id, resource) {
            self.allow
                .entry(key)
                .or_default()
                .entry(role.to_string())
                .or_default()
                .extend(operations.iter().copied());
        }
        self
    }

    /// Forbids `operations` on one instance for every caller of the tenant
    pub fn deny_instance(mut self, tenant_id: &str, resource: &ResourceRef, operations: &[Operation]) -> Self {
        if let Some(key) = instance_key(tenant_id, resource) {
            self.deny.entry(key).or_default().extend(operations.iter().copied());
        }
        self
    }

    fn decide(&self, tenant_id: &str, roles: &[String], resource: &ResourceRef, operation: Operation) -> bool {
        if let Some(key) = instance_key(tenant_id, resource) {
            if self.deny.get(&key).map_or(false, |ops| ops.contains(&operation)) {
                return false;
            }
            if let Some(by_role) = self.allow.get(&key) {
                if roles.iter().any(|r| by_role.get(r).map_or(false, |ops| ops.contains(&operation))) {
                    return true;
                }
            }
        }

        roles
            .iter()
            .any(|r| self.grants.get(r).map_or(false, |ops| ops.contains(&operation)))
    }
}

fn instance_key(tenant_id: &str, resource: &ResourceRef) -> Option<InstanceKey> {
    resource
        .id
        .as_ref()
        .map(|id| (tenant_id.to_string(), resource.entity.clone(), id.clone()))
}

#[async_trait]
impl Authorizer for AclAuthorizer {
    async fn can(
        &self,
        tenant_id: &str,
        roles: &[String],
        resource: &ResourceRef,
        operation: Operation,
    ) -> Result<bool, AuthorizationError> {
        let allowed = self.decide(tenant_id, roles, resource, operation);
        debug!(
            "acl: tenant={} roles={:?} resource={}/{} op={} allowed={}",
            tenant_id,
            roles,
            resource.entity,
            resource.id.as_deref().unwrap_or("*"),
            operation,
            allowed
        );
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn default_roles() {
        let acl = AclAuthorizer::with_default_roles();
        let trade = ResourceRef::instance("trade", "t1");

        assert!(acl.can("acme", &roles(&["admin"]), &trade, Operation::Delete).await.unwrap());
        assert!(acl.can("acme", &roles(&["trader"]), &trade, Operation::Update).await.unwrap());
        assert!(!acl.can("acme", &roles(&["trader"]), &trade, Operation::Delete).await.unwrap());
        assert!(!acl.can("acme", &roles(&["viewer"]), &trade, Operation::Update).await.unwrap());
        assert!(!acl.can("acme", &roles(&[]), &trade, Operation::Read).await.unwrap());
    }

    #[tokio::test]
    async fn same_roles_different_instances() {
        let locked = ResourceRef::instance("trade", "locked");
        let open = ResourceRef::instance("trade", "open");
        let acl = AclAuthorizer::with_default_roles().deny_instance("acme", &locked, &[Operation::Update]);
        let trader = roles(&["trader"]);

        assert!(!acl.can("acme", &trader, &locked, Operation::Update).await.unwrap());
        assert!(acl.can("acme", &trader, &open, Operation::Update).await.unwrap());
        // rule is tenant scoped
        assert!(acl.can("globex", &trader, &locked, Operation::Update).await.unwrap());
    }

    #[tokio::test]
    async fn instance_allow_extends_grants() {
        let shared = ResourceRef::instance("trade", "shared");
        let acl = AclAuthorizer::with_default_roles().allow_instance("acme", &shared, "viewer", &[Operation::Update]);
        let viewer = roles(&["viewer"]);

        assert!(acl.can("acme", &viewer, &shared, Operation::Update).await.unwrap());
        assert!(!acl.can("acme", &viewer, &ResourceRef::instance("trade", "other"), Operation::Update).await.unwrap());
    }

    #[tokio::test]
    async fn deny_beats_allow() {
        let r = ResourceRef::instance("trade", "t1");
        let acl = AclAuthorizer::new()
            .allow_instance("acme", &r, "viewer", &[Operation::Delete])
            .deny_instance("acme", &r, &[Operation::Delete]);
        assert!(!acl.can("acme", &roles(&["viewer"]), &r, Operation::Delete).await.unwrap());
    }

    #[tokio::test]
    async fn collection_checks_use_grants_only() {
        let acl = AclAuthorizer::with_default_roles();
        let trades = ResourceRef::collection("trade");
        assert!(acl.can("acme", &roles(&["trader"]), &trades, Operation::Create).await.unwrap());
        assert!(!acl.can("acme", &roles(&["viewer"]), &trades, Operation::Create).await.unwrap());
    }
}
