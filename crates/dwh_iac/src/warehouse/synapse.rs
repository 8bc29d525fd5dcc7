//! Azure Synapse analytics workspace.
//!
//! Resource group, HNS-enabled storage account and data-lake filesystem come
//! first, then the workspace, then the SQL and Spark pools. The pools also
//! wait for the workspace identity's role assignment on the storage account.

use tracing::{info, warn};

use dwh_config::{defaults, WarehousePlatform};
use dwh_graph::{
    InterpolationPart, Properties, PropertyValue, ResourceDecl, ResourceGraph, SecretRef,
};

use super::{ComputeDescriptor, ProvisionedWarehouse, WarehouseProvisioner, WarehouseSpec};
use crate::access::synapse_firewall_rule;
use crate::error::{IacError, IacResult};
use crate::exporter::ExportValue;
use crate::identity::bind_synapse_storage;

pub(crate) const RESOURCE_GROUP: &str = "synapse-rg";
pub(crate) const STORAGE_ACCOUNT: &str = "datalake";
pub(crate) const FILESYSTEM: &str = "filesystem";
pub(crate) const ADMIN_PASSWORD: &str = "sqlAdminPassword";
pub(crate) const WORKSPACE: &str = "synapseWorkspace";
pub(crate) const FIREWALL_RULE: &str = "allowSpecificRange";
pub(crate) const SQL_POOL: &str = "sqlPool";
pub(crate) const SPARK_POOL: &str = "sparkPool";

/// Workspace with a dedicated SQL pool and an autoscaling Spark pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynapseWorkspace;

impl WarehouseProvisioner for SynapseWorkspace {
    fn platform(&self) -> WarehousePlatform {
        WarehousePlatform::Synapse
    }

    fn provision(
        &self,
        spec: &WarehouseSpec,
        graph: &mut ResourceGraph,
    ) -> IacResult<ProvisionedWarehouse> {
        let ComputeDescriptor::Workspace(settings) = &spec.compute else {
            return Err(IacError::validation(&spec.identifier, "not a workspace spec"));
        };

        info!(
            "Declaring Synapse workspace {} in {}",
            settings.workspace_name, settings.location
        );

        let rg = graph.add(
            ResourceDecl::new("azurerm_resource_group", RESOURCE_GROUP)
                .with_property("name", settings.resource_group_name.as_str())
                .with_property("location", settings.location.as_str()),
        )?;

        let storage = graph.add(
            ResourceDecl::new("azurerm_storage_account", STORAGE_ACCOUNT)
                .with_property("name", settings.storage_account_name.as_str())
                .with_property("resource_group_name", rg.output("name"))
                .with_property("location", rg.output("location"))
                .with_property("account_kind", "StorageV2")
                .with_property("account_tier", "Standard")
                .with_property("account_replication_type", "LRS")
                .with_property("is_hns_enabled", true)
                .with_property("allow_nested_items_to_be_public", false),
        )?;

        let filesystem = graph.add(
            ResourceDecl::new("azurerm_storage_data_lake_gen2_filesystem", FILESYSTEM)
                .with_property("name", settings.filesystem_name.as_str())
                .with_property("storage_account_id", storage.output("id")),
        )?;

        let password = match &spec.admin_password {
            Some(secret) => secret.clone(),
            None => {
                warn!("No SQL administrator password configured; generating one");
                let generated = graph.add(
                    ResourceDecl::new("random_password", ADMIN_PASSWORD)
                        .with_property("length", defaults::GENERATED_PASSWORD_LENGTH)
                        .with_property("special", true)
                        .with_property("min_upper", 1)
                        .with_property("min_lower", 1)
                        .with_property("min_numeric", 1),
                )?;
                SecretRef::Output(generated.output("result"))
            }
        };

        let mut identity_block = Properties::new();
        identity_block.insert("type".into(), PropertyValue::str("SystemAssigned"));

        let workspace = graph.add(
            ResourceDecl::new("azurerm_synapse_workspace", WORKSPACE)
                .with_property("name", settings.workspace_name.as_str())
                .with_property("resource_group_name", rg.output("name"))
                .with_property("location", rg.output("location"))
                .with_property("storage_data_lake_gen2_filesystem_id", filesystem.output("id"))
                .with_property("sql_administrator_login", spec.admin_username.as_str())
                .with_property("sql_administrator_login_password", password)
                .with_property(
                    "managed_resource_group_name",
                    PropertyValue::Interpolate(vec![
                        InterpolationPart::Ref(rg.output("name")),
                        InterpolationPart::Text(defaults::SYNAPSE_MANAGED_RG_SUFFIX.to_string()),
                    ]),
                )
                .with_property("identity", PropertyValue::Block(vec![identity_block])),
        )?;

        if let Some(range) = &spec.firewall {
            graph.add(synapse_firewall_rule(FIREWALL_RULE, range, &workspace))?;
        }

        let storage_access = bind_synapse_storage(graph, &storage, &workspace)?;

        let sql_pool = graph.add(
            ResourceDecl::new("azurerm_synapse_sql_pool", SQL_POOL)
                .with_property("name", settings.sql_pool_name.as_str())
                .with_property("synapse_workspace_id", workspace.output("id"))
                .with_property("sku_name", settings.sql_pool_sku.as_str())
                .with_property("create_mode", "Default")
                .with_property("storage_account_type", "GRS")
                .with_depends_on_all(storage_access.clone()),
        )?;

        let spark = &settings.spark_pool;
        let mut auto_scale = Properties::new();
        auto_scale.insert("min_node_count".into(), spark.min_nodes.into());
        auto_scale.insert("max_node_count".into(), spark.max_nodes.into());
        let mut auto_pause = Properties::new();
        auto_pause.insert("delay_in_minutes".into(), spark.auto_pause_minutes.into());

        let spark_pool = graph.add(
            ResourceDecl::new("azurerm_synapse_spark_pool", SPARK_POOL)
                .with_property("name", spark.name.as_str())
                .with_property("synapse_workspace_id", workspace.output("id"))
                .with_property("node_size_family", spark.node_size_family.as_str())
                .with_property("node_size", spark.node_size.as_str())
                .with_property("spark_version", spark.spark_version.as_str())
                .with_property("auto_scale", PropertyValue::Block(vec![auto_scale]))
                .with_property("auto_pause", PropertyValue::Block(vec![auto_pause]))
                .with_depends_on_all(storage_access),
        )?;

        Ok(ProvisionedWarehouse::new(
            workspace.output("connectivity_endpoints[\"sql\"]"),
            ExportValue::literal(&settings.sql_pool_name),
            ExportValue::literal(&spec.admin_username),
        )
        .with_extra("resource_group_name", rg.output("name"))
        .with_extra("storage_account_name", storage.output("name"))
        .with_extra("workspace_name", workspace.output("name"))
        .with_extra("sql_pool_name", sql_pool.output("name"))
        .with_extra("spark_pool_name", spark_pool.output("name")))
    }
}
