//! Warehouse provisioning.
//!
//! Each platform is one variant of [`WarehouseVariant`]. A variant reads a
//! [`WarehouseSpec`], declares its resources into a [`ResourceGraph`] and
//! returns the values the exporter publishes.

mod bigquery;
mod redshift;
mod serverless;
mod synapse;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use dwh_config::{
    BigQuerySettings, ClusterSettings, DeploymentConfig, IpRange, ServerlessSettings,
    SynapseSettings, WarehousePlatform,
};
use dwh_graph::{ResourceGraph, SecretRef};

use crate::access::AccessPolicy;
use crate::error::{IacError, IacResult};
use crate::exporter::ExportValue;
use crate::identity::Identity;
use crate::network::NetworkContext;

pub use bigquery::BigQueryDataset;
pub use redshift::RedshiftCluster;
pub use serverless::RedshiftServerless;
pub use synapse::SynapseWorkspace;

/// Platform-specific compute and storage parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputeDescriptor {
    Cluster(ClusterSettings),
    Serverless(ServerlessSettings),
    Workspace(SynapseSettings),
    Dataset(BigQuerySettings),
}

impl ComputeDescriptor {
    pub fn platform(&self) -> WarehousePlatform {
        match self {
            ComputeDescriptor::Cluster(_) => WarehousePlatform::RedshiftCluster,
            ComputeDescriptor::Serverless(_) => WarehousePlatform::RedshiftServerless,
            ComputeDescriptor::Workspace(_) => WarehousePlatform::Synapse,
            ComputeDescriptor::Dataset(_) => WarehousePlatform::BigQuery,
        }
    }
}

/// Everything a variant needs to declare one warehouse.
///
/// Only the fields relevant to the selected platform are populated.
#[derive(Debug, Clone)]
pub struct WarehouseSpec {
    pub identifier: String,
    pub region: String,
    pub database_name: String,
    pub admin_username: String,
    /// Reference to the admin password. `None` lets the variant generate one
    /// where the platform allows it.
    pub admin_password: Option<SecretRef>,
    pub compute: ComputeDescriptor,
    pub network: Option<Arc<NetworkContext>>,
    pub access: Option<Arc<AccessPolicy>>,
    pub identity: Option<Identity>,
    pub firewall: Option<IpRange>,
}

impl WarehouseSpec {
    /// Assemble the spec for `config.platform` from resolved collaborators.
    pub fn from_config(
        config: &DeploymentConfig,
        network: Option<Arc<NetworkContext>>,
        access: Option<Arc<AccessPolicy>>,
        identity: Option<Identity>,
    ) -> Self {
        let (identifier, compute) = match config.platform {
            WarehousePlatform::RedshiftCluster => (
                config.cluster.identifier.clone(),
                ComputeDescriptor::Cluster(config.cluster.clone()),
            ),
            WarehousePlatform::RedshiftServerless => (
                config.serverless.workgroup_name.clone(),
                ComputeDescriptor::Serverless(config.serverless.clone()),
            ),
            WarehousePlatform::Synapse => (
                config.synapse.workspace_name.clone(),
                ComputeDescriptor::Workspace(config.synapse.clone()),
            ),
            WarehousePlatform::BigQuery => (
                config.bigquery.dataset_id.clone(),
                ComputeDescriptor::Dataset(config.bigquery.clone()),
            ),
        };

        let database_name = match config.platform {
            WarehousePlatform::BigQuery => config.bigquery.dataset_id.clone(),
            _ => config.database_name.clone(),
        };
        let admin_username = match config.platform {
            WarehousePlatform::BigQuery => config.bigquery.editor_email.clone(),
            _ => config.admin_username.clone(),
        };

        Self {
            identifier,
            region: config.region.clone(),
            database_name,
            admin_username,
            admin_password: config
                .admin_password
                .as_ref()
                .map(|_| SecretRef::config(dwh_config::keys::DB_PASSWORD)),
            compute,
            network,
            access,
            identity,
            firewall: config.allowed_ip_range,
        }
    }

    pub fn platform(&self) -> WarehousePlatform {
        self.compute.platform()
    }

    pub(crate) fn require_network(&self) -> IacResult<&NetworkContext> {
        self.network
            .as_deref()
            .ok_or_else(|| IacError::validation(&self.identifier, "no resolved network"))
    }

    pub(crate) fn require_access(&self) -> IacResult<&AccessPolicy> {
        self.access
            .as_deref()
            .ok_or_else(|| IacError::validation(&self.identifier, "no access policy"))
    }

    pub(crate) fn require_identity(&self) -> IacResult<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| IacError::validation(&self.identifier, "no service identity"))
    }

    pub(crate) fn require_password(&self) -> IacResult<SecretRef> {
        self.admin_password.clone().ok_or_else(|| {
            IacError::validation(
                &self.identifier,
                format!("{} is required", dwh_config::keys::DB_PASSWORD),
            )
        })
    }
}

/// Connection details of a declared warehouse. Never holds secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedWarehouse {
    pub endpoint: ExportValue,
    pub database_name: ExportValue,
    pub admin_username: ExportValue,
    pub extras: BTreeMap<String, ExportValue>,
}

impl ProvisionedWarehouse {
    pub fn new(
        endpoint: impl Into<ExportValue>,
        database_name: impl Into<ExportValue>,
        admin_username: impl Into<ExportValue>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            database_name: database_name.into(),
            admin_username: admin_username.into(),
            extras: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<ExportValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// Declares the resources of one warehouse platform.
pub trait WarehouseProvisioner {
    fn platform(&self) -> WarehousePlatform;

    fn provision(
        &self,
        spec: &WarehouseSpec,
        graph: &mut ResourceGraph,
    ) -> IacResult<ProvisionedWarehouse>;
}

/// The closed set of supported warehouse platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseVariant {
    Cluster(RedshiftCluster),
    Serverless(RedshiftServerless),
    Workspace(SynapseWorkspace),
    Dataset(BigQueryDataset),
}

impl WarehouseVariant {
    pub fn for_platform(platform: WarehousePlatform) -> Self {
        match platform {
            WarehousePlatform::RedshiftCluster => WarehouseVariant::Cluster(RedshiftCluster),
            WarehousePlatform::RedshiftServerless => {
                WarehouseVariant::Serverless(RedshiftServerless)
            }
            WarehousePlatform::Synapse => WarehouseVariant::Workspace(SynapseWorkspace),
            WarehousePlatform::BigQuery => WarehouseVariant::Dataset(BigQueryDataset),
        }
    }

    /// Service role for variants that run inside a VPC.
    pub fn service_identity(&self) -> Option<Identity> {
        match self {
            WarehouseVariant::Cluster(_) => Some(Identity::redshift(redshift::ROLE)),
            WarehouseVariant::Serverless(_) => Some(Identity::redshift(serverless::ROLE)),
            WarehouseVariant::Workspace(_) | WarehouseVariant::Dataset(_) => None,
        }
    }

    /// Label shown on the ingress rule of the variant's security group.
    pub fn ingress_description(&self) -> Option<&'static str> {
        match self {
            WarehouseVariant::Cluster(_) => Some("Redshift Ingress from Config"),
            WarehouseVariant::Serverless(_) => Some("Redshift Serverless Ingress"),
            WarehouseVariant::Workspace(_) | WarehouseVariant::Dataset(_) => None,
        }
    }

    fn provisioner(&self) -> &dyn WarehouseProvisioner {
        match self {
            WarehouseVariant::Cluster(p) => p,
            WarehouseVariant::Serverless(p) => p,
            WarehouseVariant::Workspace(p) => p,
            WarehouseVariant::Dataset(p) => p,
        }
    }
}

impl WarehouseProvisioner for WarehouseVariant {
    fn platform(&self) -> WarehousePlatform {
        self.provisioner().platform()
    }

    fn provision(
        &self,
        spec: &WarehouseSpec,
        graph: &mut ResourceGraph,
    ) -> IacResult<ProvisionedWarehouse> {
        if spec.platform() != self.platform() {
            return Err(IacError::validation(
                &spec.identifier,
                format!(
                    "{} settings cannot be provisioned as {}",
                    spec.platform(),
                    self.platform()
                ),
            ));
        }
        self.provisioner().provision(spec, graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_rejects_mismatched_spec() {
        let config = DeploymentConfig::default_for(WarehousePlatform::BigQuery);
        let spec = WarehouseSpec::from_config(&config, None, None, None);
        let mut graph = ResourceGraph::new();

        let err = WarehouseVariant::for_platform(WarehousePlatform::Synapse)
            .provision(&spec, &mut graph)
            .unwrap_err();
        assert!(matches!(err, IacError::Validation { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_variant_for_each_platform() {
        for platform in WarehousePlatform::all() {
            assert_eq!(WarehouseVariant::for_platform(platform).platform(), platform);
        }
    }
}
