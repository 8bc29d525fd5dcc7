//! Provisioned Redshift cluster.

use tracing::{info, warn};

use dwh_config::{ClusterTopology, WarehousePlatform};
use dwh_graph::{PropertyValue, ResourceDecl, ResourceGraph};

use super::{ComputeDescriptor, ProvisionedWarehouse, WarehouseProvisioner, WarehouseSpec};
use crate::error::{IacError, IacResult};
use crate::exporter::ExportValue;

pub(crate) const SECURITY_GROUP: &str = "redshift-sg";
pub(crate) const SUBNET_GROUP: &str = "redshift-subnet-group";
pub(crate) const ROLE: &str = "redshift-role";
pub(crate) const CLUSTER: &str = "my-cluster";

/// Security group, subnet group, service role and cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedshiftCluster;

impl WarehouseProvisioner for RedshiftCluster {
    fn platform(&self) -> WarehousePlatform {
        WarehousePlatform::RedshiftCluster
    }

    fn provision(
        &self,
        spec: &WarehouseSpec,
        graph: &mut ResourceGraph,
    ) -> IacResult<ProvisionedWarehouse> {
        let ComputeDescriptor::Cluster(settings) = &spec.compute else {
            return Err(IacError::validation(&spec.identifier, "not a cluster spec"));
        };
        let network = spec.require_network()?;
        let access = spec.require_access()?;
        let password = spec.require_password()?;

        info!(
            "Declaring Redshift cluster {} ({}, {})",
            settings.identifier,
            settings.node_type,
            settings.topology.cluster_type()
        );

        let sg = graph.add(access.security_group(
            SECURITY_GROUP,
            "Allow Redshift access",
            &network.vpc_id,
        ))?;

        let subnet_group = graph.add(
            ResourceDecl::new("aws_redshift_subnet_group", SUBNET_GROUP)
                .with_property("name", SUBNET_GROUP)
                .with_property("description", "Default subnet group for Redshift")
                .with_property(
                    "subnet_ids",
                    PropertyValue::list_of_str(network.subnet_ids.iter().cloned()),
                ),
        )?;

        let identity = spec.require_identity()?.bind(graph)?;

        if settings.publicly_accessible {
            warn!("Cluster {} will be publicly accessible", settings.identifier);
        }

        let mut cluster = ResourceDecl::new("aws_redshift_cluster", CLUSTER)
            .with_property("cluster_identifier", settings.identifier.as_str())
            .with_property("database_name", spec.database_name.as_str())
            .with_property("master_username", spec.admin_username.as_str())
            .with_property("master_password", password)
            .with_property("node_type", settings.node_type.as_str())
            .with_property("cluster_type", settings.topology.cluster_type())
            .with_property("cluster_subnet_group_name", subnet_group.output("name"))
            .with_property(
                "vpc_security_group_ids",
                PropertyValue::List(vec![sg.output("id").into()]),
            )
            .with_property(
                "iam_roles",
                PropertyValue::List(vec![identity.role_arn.clone().into()]),
            )
            .with_property("publicly_accessible", settings.publicly_accessible)
            .with_property("skip_final_snapshot", settings.skip_final_snapshot)
            .with_depends_on_all(identity.attachments);

        if let ClusterTopology::MultiNode { nodes } = settings.topology {
            cluster = cluster.with_property("number_of_nodes", nodes);
        }
        if !settings.skip_final_snapshot {
            cluster = cluster.with_property(
                "final_snapshot_identifier",
                format!("{}-final", settings.identifier),
            );
        }

        let cluster = graph.add(cluster)?;

        Ok(ProvisionedWarehouse::new(
            cluster.output("endpoint"),
            ExportValue::literal(&spec.database_name),
            ExportValue::literal(&spec.admin_username),
        )
        .with_extra("cluster_identifier", cluster.output("cluster_identifier")))
    }
}
