//! Scripted resource applier for simulations and tests.
//!
//! Applies nothing. Captures every call and fails the resources it was told
//! to fail, so reconciliation ordering can be exercised without a cloud.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{GraphError, GraphResult};
use crate::reconcile::ResourceApplier;
use crate::resource::{ResourceDecl, ResourceId};

/// Applier that succeeds unless a resource has been scripted to fail.
#[derive(Clone, Default)]
pub struct ScriptedApplier {
    failures: Arc<RwLock<BTreeMap<ResourceId, String>>>,
    /// Captured calls for verification.
    calls: Arc<RwLock<Vec<ResourceId>>>,
}

impl ScriptedApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `id` with a generic provider message.
    pub fn fail_on(self, id: ResourceId) -> Self {
        let message = format!("provider rejected {}", id.kind());
        self.fail_with(id, message)
    }

    pub fn fail_with(self, id: ResourceId, message: impl Into<String>) -> Self {
        self.failures.write().insert(id, message.into());
        self
    }

    pub fn failing(&self) -> BTreeSet<ResourceId> {
        self.failures.read().keys().cloned().collect()
    }

    /// Resources handed to `apply`, in call order.
    pub fn calls(&self) -> Vec<ResourceId> {
        self.calls.read().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.write().clear();
    }
}

#[async_trait]
impl ResourceApplier for ScriptedApplier {
    async fn apply(&self, resource: &ResourceDecl) -> GraphResult<()> {
        self.calls.write().push(resource.id.clone());

        match self.failures.read().get(&resource.id) {
            Some(message) => Err(GraphError::ApplyFailed {
                resource: resource.id.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failure() {
        let failing = ResourceId::new("aws_redshift_cluster", "main");
        let applier = ScriptedApplier::new().fail_with(failing.clone(), "quota exceeded");

        let ok = ResourceDecl::new("aws_security_group", "sg");
        assert!(applier.apply(&ok).await.is_ok());

        let err = applier
            .apply(&ResourceDecl::new("aws_redshift_cluster", "main"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(applier.calls(), vec![ok.id.clone(), failing]);
    }
}
