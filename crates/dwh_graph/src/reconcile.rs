//! Reconciliation simulator.
//!
//! Walks a [`ResourceGraph`] in dependency order and hands each declaration
//! to a [`ResourceApplier`]. There are no retries. A failed resource blocks
//! everything that depends on it, directly or transitively; resources on
//! independent branches are still applied.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dwh_graph::{Reconciler, ScriptedApplier};
//!
//! let applier = Arc::new(ScriptedApplier::new());
//! let report = Reconciler::new(applier).reconcile(&graph).await?;
//! assert!(report.is_success());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::GraphResult;
use crate::graph::ResourceGraph;
use crate::resource::{ResourceDecl, ResourceId};

/// Applies one resource declaration to the target environment.
#[async_trait]
pub trait ResourceApplier: Send + Sync {
    async fn apply(&self, resource: &ResourceDecl) -> GraphResult<()>;
}

/// Outcome for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileStatus {
    Applied,
    Failed { message: String },
    /// Not attempted because `blocked_by` failed.
    Skipped { blocked_by: ResourceId },
}

impl ReconcileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStatus::Applied => "applied",
            ReconcileStatus::Failed { .. } => "failed",
            ReconcileStatus::Skipped { .. } => "skipped",
        }
    }
}

impl fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileStatus::Applied => write!(f, "applied"),
            ReconcileStatus::Failed { message } => write!(f, "failed: {}", message),
            ReconcileStatus::Skipped { blocked_by } => {
                write!(f, "skipped (dependency {} unmet)", blocked_by)
            }
        }
    }
}

/// One line of a reconciliation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileEntry {
    pub resource: ResourceId,
    #[serde(flatten)]
    pub status: ReconcileStatus,
}

/// Result of walking a graph, in the order resources were visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub entries: Vec<ReconcileEntry>,
}

impl ReconcileReport {
    pub fn status_of(&self, id: &ResourceId) -> Option<&ReconcileStatus> {
        self.entries
            .iter()
            .find(|e| &e.resource == id)
            .map(|e| &e.status)
    }

    fn with_status(&self, pred: fn(&ReconcileStatus) -> bool) -> Vec<&ResourceId> {
        self.entries
            .iter()
            .filter(|e| pred(&e.status))
            .map(|e| &e.resource)
            .collect()
    }

    pub fn applied(&self) -> Vec<&ResourceId> {
        self.with_status(|s| matches!(s, ReconcileStatus::Applied))
    }

    pub fn failed(&self) -> Vec<&ResourceId> {
        self.with_status(|s| matches!(s, ReconcileStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> Vec<&ResourceId> {
        self.with_status(|s| matches!(s, ReconcileStatus::Skipped { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.status == ReconcileStatus::Applied)
    }
}

/// Drives a [`ResourceApplier`] over a graph.
pub struct Reconciler {
    applier: Arc<dyn ResourceApplier>,
}

impl Reconciler {
    pub fn new(applier: Arc<dyn ResourceApplier>) -> Self {
        Self { applier }
    }

    /// Apply every resource in dependency order.
    ///
    /// Fails only if the graph itself is invalid. Apply failures are recorded
    /// in the report.
    pub async fn reconcile(&self, graph: &ResourceGraph) -> GraphResult<ReconcileReport> {
        let order = graph.execution_order()?;
        info!("Reconciling {} resources", order.len());

        let mut outcome: BTreeMap<ResourceId, ReconcileStatus> = BTreeMap::new();
        let mut report = ReconcileReport::default();

        for (i, id) in order.iter().enumerate() {
            let decl = graph.require(id)?;

            let blocked_by = decl.dependencies().into_iter().find_map(|dep| {
                match outcome.get(&dep) {
                    Some(ReconcileStatus::Failed { .. }) => Some(dep),
                    Some(ReconcileStatus::Skipped { blocked_by }) => Some(blocked_by.clone()),
                    _ => None,
                }
            });

            let status = match blocked_by {
                Some(blocked_by) => {
                    warn!("Skipping {}: dependency {} unmet", id, blocked_by);
                    ReconcileStatus::Skipped { blocked_by }
                }
                None => {
                    info!("Applying resource [{}/{}]: {}", i + 1, order.len(), id);
                    match self.applier.apply(decl).await {
                        Ok(()) => ReconcileStatus::Applied,
                        Err(e) => {
                            warn!("Resource {} failed: {}", id, e);
                            ReconcileStatus::Failed {
                                message: e.to_string(),
                            }
                        }
                    }
                }
            };

            outcome.insert(id.clone(), status.clone());
            report.entries.push(ReconcileEntry {
                resource: id.clone(),
                status,
            });
        }

        info!(
            "Reconciliation finished: {} applied, {} failed, {} skipped",
            report.applied().len(),
            report.failed().len(),
            report.skipped().len()
        );
        Ok(report)
    }
}
