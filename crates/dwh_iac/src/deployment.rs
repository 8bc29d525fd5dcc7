//! Deployment pipeline.
//!
//! Runs the components in order: network, access, identity, warehouse,
//! exporter. The result is a [`DeploymentPlan`], a validated graph plus the
//! outputs it will publish.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use dwh_config::{
    defaults, ConfigValidator, DeploymentConfig, DeploymentProfile, WarehousePlatform,
};
use dwh_graph::{ReconcileReport, ReconcileStatus, Reconciler, ResourceApplier, ResourceGraph};

use crate::access::AccessPolicy;
use crate::error::{IacError, IacResult};
use crate::exporter::{OutputMap, TopologyExporter};
use crate::network::{NetworkInventory, NetworkResolver};
use crate::warehouse::{WarehouseProvisioner, WarehouseSpec, WarehouseVariant};

/// Everything declared for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentPlan {
    pub platform: WarehousePlatform,
    pub profile: DeploymentProfile,
    pub region: String,
    pub graph: ResourceGraph,
    pub outputs: OutputMap,
    /// Configuration warnings raised while planning.
    pub warnings: Vec<String>,
}

/// Builds deployment plans from configuration.
pub struct DeploymentPipeline {
    inventory: Arc<dyn NetworkInventory>,
}

impl DeploymentPipeline {
    pub fn new(inventory: Arc<dyn NetworkInventory>) -> Self {
        Self { inventory }
    }

    /// Validate `config` and declare every resource it describes.
    ///
    /// Nothing is declared when validation fails.
    pub async fn plan(&self, config: &DeploymentConfig) -> IacResult<DeploymentPlan> {
        info!(
            "Planning {} deployment ({} profile)",
            config.platform, config.profile
        );

        let validation = ConfigValidator::validate(config)?;
        for warning in &validation.warnings {
            warn!("{}", warning);
        }
        if !validation.valid {
            return Err(IacError::validation(
                "configuration",
                validation.errors.join("; "),
            ));
        }

        let variant = WarehouseVariant::for_platform(config.platform);

        let (network, access) = if config.platform.needs_vpc() {
            let resolver =
                NetworkResolver::new(Arc::clone(&self.inventory)).with_explicit(config.network.clone());
            let network = resolver.resolve(&config.region).await?;

            let mut policy = AccessPolicy::build(config.allowed_cidr.as_ref(), defaults::WAREHOUSE_PORT);
            if let Some(description) = variant.ingress_description() {
                policy = policy.with_ingress_description(description);
            }
            (Some(network), Some(Arc::new(policy)))
        } else {
            debug!("{} does not attach to a VPC", config.platform);
            (None, None)
        };

        let spec = WarehouseSpec::from_config(config, network, access, variant.service_identity());

        let mut graph = ResourceGraph::new();
        let warehouse = variant.provision(&spec, &mut graph)?;
        graph.validate()?;

        let outputs = TopologyExporter::export(&warehouse)?;
        info!(
            "Planned {} resources with {} dependencies",
            graph.len(),
            graph.edge_count()
        );

        Ok(DeploymentPlan {
            platform: config.platform,
            profile: config.profile,
            region: config.region.clone(),
            graph,
            outputs,
            warnings: validation.warnings,
        })
    }
}

/// Walk a plan with `applier` and return the report.
pub async fn simulate(
    plan: &DeploymentPlan,
    applier: Arc<dyn ResourceApplier>,
) -> IacResult<ReconcileReport> {
    Ok(Reconciler::new(applier).reconcile(&plan.graph).await?)
}

/// Turn the first unsuccessful entry of a report into an error.
///
/// A failure maps to [`IacError::Provider`]; a resource skipped because of
/// an upstream failure maps to [`IacError::DependencyUnmet`].
pub fn ensure_reconciled(report: &ReconcileReport) -> IacResult<()> {
    for entry in &report.entries {
        match &entry.status {
            ReconcileStatus::Applied => {}
            ReconcileStatus::Failed { message } => {
                return Err(IacError::Provider {
                    resource: entry.resource.to_string(),
                    message: message.clone(),
                });
            }
            ReconcileStatus::Skipped { blocked_by } => {
                return Err(IacError::DependencyUnmet {
                    resource: entry.resource.to_string(),
                    dependency: blocked_by.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{DefaultNetwork, MockNetworkInventory, StaticInventory};
    use dwh_config::{Cidr, RpuCapacity, SecretString};
    use dwh_graph::{ResourceId, ScriptedApplier};

    fn inventory() -> Arc<dyn NetworkInventory> {
        Arc::new(StaticInventory::new().with_region(
            "us-east-1",
            "vpc-0a1b2c",
            ["subnet-2", "subnet-1"],
        ))
    }

    fn cluster_config() -> DeploymentConfig {
        let mut config = DeploymentConfig::default_for(WarehousePlatform::RedshiftCluster);
        config.admin_password = Some(SecretString::new("Sup3r-Secret"));
        config
    }

    #[tokio::test]
    async fn test_plan_cluster() {
        let plan = DeploymentPipeline::new(inventory())
            .plan(&cluster_config())
            .await
            .unwrap();

        let cluster = ResourceId::new("aws_redshift_cluster", "my-cluster");
        let attachment =
            ResourceId::new("aws_iam_role_policy_attachment", "redshift-role-s3-read-only");
        assert!(plan.graph.contains(&cluster));
        assert!(plan.graph.is_ordered_before(&attachment, &cluster));
        assert!(!plan.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_declares_nothing() {
        let mut config = cluster_config();
        config.admin_username = "admin".to_string();

        let err = DeploymentPipeline::new(inventory())
            .plan(&config)
            .await
            .unwrap_err();
        assert!(matches!(err, IacError::Validation { ref resource, .. } if resource == "configuration"));
    }

    #[tokio::test]
    async fn test_non_vpc_platform_skips_inventory() {
        let mut mock = MockNetworkInventory::new();
        mock.expect_default_network().never();

        let plan = DeploymentPipeline::new(Arc::new(mock))
            .plan(&DeploymentConfig::default_for(WarehousePlatform::BigQuery))
            .await
            .unwrap();
        assert_eq!(plan.platform, WarehousePlatform::BigQuery);
    }

    #[tokio::test]
    async fn test_serverless_ingress_labelled() {
        let mut mock = MockNetworkInventory::new();
        mock.expect_default_network().times(1).returning(|_| {
            Ok(Some(DefaultNetwork {
                vpc_id: "vpc-1".to_string(),
                subnet_ids: vec!["subnet-1".to_string()],
            }))
        });

        let mut config = DeploymentConfig::default_for(WarehousePlatform::RedshiftServerless);
        config.admin_password = Some(SecretString::new("Sup3r-Secret"));
        config.allowed_cidr = Some(Cidr::parse("allowedCidr", "10.0.0.0/16").unwrap());
        config.serverless.base_capacity = RpuCapacity::new(64).unwrap();

        let plan = DeploymentPipeline::new(Arc::new(mock)).plan(&config).await.unwrap();
        let sg = plan
            .graph
            .get(&ResourceId::new("aws_security_group", "redshift-serverless-sg"))
            .unwrap();
        let ingress = sg.property("ingress").and_then(|p| p.as_blocks()).unwrap();
        assert_eq!(ingress.len(), 1);
        assert_eq!(
            ingress[0].get("description").and_then(|d| d.as_str()),
            Some("Redshift Serverless Ingress")
        );
    }

    #[tokio::test]
    async fn test_failed_apply_maps_to_provider_error() {
        let plan = DeploymentPipeline::new(inventory())
            .plan(&cluster_config())
            .await
            .unwrap();

        let role = ResourceId::new("aws_iam_role", "redshift-role");
        let applier = ScriptedApplier::new().fail_with(role.clone(), "AccessDenied");
        let report = simulate(&plan, Arc::new(applier)).await.unwrap();

        match ensure_reconciled(&report).unwrap_err() {
            IacError::Provider { resource, message } => {
                assert_eq!(resource, role.to_string());
                assert!(message.contains("AccessDenied"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(
            report.status_of(&ResourceId::new("aws_redshift_cluster", "my-cluster")),
            Some(&ReconcileStatus::Skipped { blocked_by: role })
        );
    }

    #[tokio::test]
    async fn test_clean_simulation() {
        let plan = DeploymentPipeline::new(inventory())
            .plan(&cluster_config())
            .await
            .unwrap();
        let report = simulate(&plan, Arc::new(ScriptedApplier::new())).await.unwrap();
        assert!(ensure_reconciled(&report).is_ok());
        assert_eq!(report.applied().len(), plan.graph.len());
    }
}
