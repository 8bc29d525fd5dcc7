//! # dwh_graph
//!
//! Declarative resource graph for dwhforge.
//!
//! Resources are declared, not created: each [`ResourceDecl`] states desired
//! properties and which other resources it needs. The [`ResourceGraph`]
//! answers ordering questions over those declarations, and the
//! [`Reconciler`] walks them the way a provisioning engine would.
//!
//! # Architecture
//!
//! - **Resources**: typed ids, property values, secret references
//! - **Graph**: duplicate, unknown-dependency and cycle checks; topological order; DOT output
//! - **Reconciler**: ordered apply with failure propagation to dependents
//!
//! # Example
//!
//! ```rust
//! use dwh_graph::{PropertyValue, ResourceDecl, ResourceGraph};
//!
//! let mut graph = ResourceGraph::new();
//! let role = graph.add(ResourceDecl::new("aws_iam_role", "redshift-role")).unwrap();
//! let cluster = graph
//!     .add(
//!         ResourceDecl::new("aws_redshift_cluster", "my-cluster")
//!             .with_property("iam_roles", PropertyValue::List(vec![role.output("arn").into()])),
//!     )
//!     .unwrap();
//!
//! assert!(graph.is_ordered_before(&role, &cluster));
//! ```

pub mod error;
pub mod graph;
pub mod mock;
pub mod reconcile;
pub mod resource;

pub use error::{GraphError, GraphResult};
pub use graph::ResourceGraph;
pub use mock::ScriptedApplier;
pub use reconcile::{ReconcileEntry, ReconcileReport, ReconcileStatus, Reconciler, ResourceApplier};
pub use resource::{
    InterpolationPart, OutputRef, Properties, PropertyValue, ResourceDecl, ResourceId, SecretRef,
};
