//! # dwh_iac
//!
//! Warehouse resource composition for dwhforge.
//!
//! This crate turns a [`dwh_config::DeploymentConfig`] into a validated
//! [`dwh_graph::ResourceGraph`] and renders it as Terraform for an external
//! engine to apply.
//!
//! ## Pipeline
//!
//! - [`NetworkResolver`] finds the default VPC and subnets (AWS only)
//! - [`AccessPolicy`] derives deny-by-default ingress and open egress
//! - [`Identity`] declares the service role and its permission attachments
//! - [`WarehouseVariant`] declares the platform resources
//! - [`TopologyExporter`] publishes endpoint, database name and username
//!
//! The admin password only ever appears as a [`dwh_graph::SecretRef`]. It is
//! never a literal in the graph, the outputs or the rendered files.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dwh_config::DeploymentFile;
//! use dwh_iac::{DeploymentPipeline, StaticInventory, TerraformRenderer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeploymentFile::read("deploy.yaml")?.into_config()?;
//! let inventory = StaticInventory::read("inventory.yaml")?;
//!
//! let plan = DeploymentPipeline::new(Arc::new(inventory)).plan(&config).await?;
//! TerraformRenderer::new().write(&plan, "infrastructure".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod deployment;
pub mod error;
pub mod exporter;
pub mod identity;
pub mod network;
pub mod terraform;
pub mod warehouse;

pub use access::{AccessPolicy, SecurityRule};
pub use deployment::{ensure_reconciled, simulate, DeploymentPipeline, DeploymentPlan};
pub use error::{IacError, IacResult};
pub use exporter::{ExportValue, OutputMap, TopologyExporter};
pub use identity::{AttachmentHandle, BoundIdentity, Identity, Permission};
pub use network::{DefaultNetwork, NetworkContext, NetworkInventory, NetworkResolver, StaticInventory};
pub use terraform::{RenderedFile, TerraformRenderer};
pub use warehouse::{
    BigQueryDataset, ComputeDescriptor, ProvisionedWarehouse, RedshiftCluster, RedshiftServerless,
    SynapseWorkspace, WarehouseProvisioner, WarehouseSpec, WarehouseVariant,
};
