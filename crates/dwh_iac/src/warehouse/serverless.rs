//! Redshift Serverless namespace and workgroup.

use tracing::info;

use dwh_config::WarehousePlatform;
use dwh_graph::{PropertyValue, ResourceDecl, ResourceGraph};

use super::{ComputeDescriptor, ProvisionedWarehouse, WarehouseProvisioner, WarehouseSpec};
use crate::error::{IacError, IacResult};
use crate::exporter::ExportValue;

pub(crate) const SECURITY_GROUP: &str = "redshift-serverless-sg";
pub(crate) const ROLE: &str = "redshift-serverless-role";
pub(crate) const NAMESPACE: &str = "my-namespace";
pub(crate) const WORKGROUP: &str = "my-workgroup";

/// The namespace owns data and credentials; the workgroup owns compute and network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedshiftServerless;

impl WarehouseProvisioner for RedshiftServerless {
    fn platform(&self) -> WarehousePlatform {
        WarehousePlatform::RedshiftServerless
    }

    fn provision(
        &self,
        spec: &WarehouseSpec,
        graph: &mut ResourceGraph,
    ) -> IacResult<ProvisionedWarehouse> {
        let ComputeDescriptor::Serverless(settings) = &spec.compute else {
            return Err(IacError::validation(&spec.identifier, "not a serverless spec"));
        };
        let network = spec.require_network()?;
        let access = spec.require_access()?;
        let password = spec.require_password()?;

        info!(
            "Declaring Redshift Serverless {}/{} at {}",
            settings.namespace_name, settings.workgroup_name, settings.base_capacity
        );

        let sg = graph.add(access.security_group(
            SECURITY_GROUP,
            "Allow Redshift Serverless access",
            &network.vpc_id,
        ))?;

        let identity = spec.require_identity()?.bind(graph)?;

        let namespace = graph.add(
            ResourceDecl::new("aws_redshiftserverless_namespace", NAMESPACE)
                .with_property("namespace_name", settings.namespace_name.as_str())
                .with_property("db_name", spec.database_name.as_str())
                .with_property("admin_username", spec.admin_username.as_str())
                .with_property("admin_user_password", password)
                .with_property(
                    "iam_roles",
                    PropertyValue::List(vec![identity.role_arn.clone().into()]),
                ),
        )?;

        let workgroup = graph.add(
            ResourceDecl::new("aws_redshiftserverless_workgroup", WORKGROUP)
                .with_property("workgroup_name", settings.workgroup_name.as_str())
                .with_property("namespace_name", namespace.output("namespace_name"))
                .with_property("base_capacity", settings.base_capacity.units())
                .with_property(
                    "security_group_ids",
                    PropertyValue::List(vec![sg.output("id").into()]),
                )
                .with_property(
                    "subnet_ids",
                    PropertyValue::list_of_str(network.subnet_ids.iter().cloned()),
                )
                .with_property("publicly_accessible", settings.publicly_accessible)
                .with_depends_on(namespace.clone())
                .with_depends_on_all(identity.attachments),
        )?;

        Ok(ProvisionedWarehouse::new(
            workgroup.output("endpoint[0].address"),
            ExportValue::literal(&spec.database_name),
            ExportValue::literal(&spec.admin_username),
        )
        .with_extra("namespace_name", namespace.output("namespace_name"))
        .with_extra("workgroup_name", workgroup.output("workgroup_name")))
    }
}
