//! Typed deployment configuration.
//!
//! [`DeploymentConfig`] gathers every externally overridable value for one
//! deployment. [`DeploymentConfig::default_for`] shows the defaults;
//! [`DeploymentConfig::from_store`] layers a [`ConfigStore`] on top of them and
//! rejects malformed input before anything is declared.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compute::{ClusterTopology, RpuCapacity};
use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::keys;
use crate::net::{Cidr, IpRange};
use crate::platform::{DeploymentProfile, WarehousePlatform};
use crate::secret::SecretString;
use crate::store::ConfigStore;

/// A network supplied explicitly instead of resolved from the account default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitNetwork {
    pub vpc_id: String,
    pub subnet_ids: Vec<String>,
}

/// Provisioned Redshift cluster settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSettings {
    pub identifier: String,
    pub node_type: String,
    pub topology: ClusterTopology,
    /// Development default: `true`. Exposes the endpoint to the internet.
    pub publicly_accessible: bool,
    /// Development default: `true`. Deletion never produces a snapshot.
    pub skip_final_snapshot: bool,
}

/// Redshift Serverless settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerlessSettings {
    pub namespace_name: String,
    pub workgroup_name: String,
    pub base_capacity: RpuCapacity,
    pub publicly_accessible: bool,
}

/// Autoscaling Spark pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkPoolSettings {
    pub name: String,
    pub node_size: String,
    pub node_size_family: String,
    pub min_nodes: u32,
    pub max_nodes: u32,
    pub auto_pause_minutes: u32,
    pub spark_version: String,
}

/// Azure Synapse workspace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynapseSettings {
    pub resource_group_name: String,
    pub location: String,
    pub storage_account_name: String,
    pub filesystem_name: String,
    pub workspace_name: String,
    pub sql_pool_name: String,
    pub sql_pool_sku: String,
    pub spark_pool: SparkPoolSettings,
}

/// One column of the BigQuery table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub mode: String,
    pub description: String,
}

impl ColumnSchema {
    pub fn new(name: &str, column_type: &str, mode: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: column_type.to_string(),
            mode: mode.to_string(),
            description: description.to_string(),
        }
    }
}

/// Event log schema shipped as the default table layout.
pub fn default_event_schema() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("event_timestamp", "TIMESTAMP", "REQUIRED", "Time the event occurred"),
        ColumnSchema::new("user_id", "STRING", "NULLABLE", "User identifier"),
        ColumnSchema::new(
            "event_name",
            "STRING",
            "REQUIRED",
            "Event name (e.g. login, purchase)",
        ),
        ColumnSchema::new("event_params", "JSON", "NULLABLE", "Event parameters as JSON"),
    ]
}

/// BigQuery dataset and table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigQuerySettings {
    pub project: Option<String>,
    pub dataset_id: String,
    pub location: String,
    pub friendly_name: String,
    pub description: String,
    /// Default: `false` in every profile. A dataset that still holds tables
    /// cannot be destroyed.
    pub delete_contents_on_destroy: bool,
    pub table_id: String,
    pub table_description: String,
    pub deletion_protection: bool,
    pub partition_field: String,
    pub clustering: Vec<String>,
    /// Service account granted edit access. Defaults to a placeholder.
    pub editor_email: String,
    pub schema: Vec<ColumnSchema>,
}

impl BigQuerySettings {
    pub fn uses_placeholder_principal(&self) -> bool {
        self.editor_email == defaults::PLACEHOLDER_SA_EMAIL
    }
}

/// All inputs for one warehouse deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentConfig {
    pub platform: WarehousePlatform,
    pub profile: DeploymentProfile,
    pub region: String,
    pub database_name: String,
    pub admin_username: String,
    /// Supplied under `dbPassword`. Never rendered or exported.
    pub admin_password: Option<SecretString>,
    /// Deny-by-default: `None` grants no inbound access.
    pub allowed_cidr: Option<Cidr>,
    pub allowed_ip_range: Option<IpRange>,
    pub network: Option<ExplicitNetwork>,
    pub cluster: ClusterSettings,
    pub serverless: ServerlessSettings,
    pub synapse: SynapseSettings,
    pub bigquery: BigQuerySettings,
}

impl DeploymentConfig {
    /// Defaults for a platform in the development profile.
    pub fn default_for(platform: WarehousePlatform) -> Self {
        Self::defaults_with_profile(platform, DeploymentProfile::Development)
    }

    fn defaults_with_profile(platform: WarehousePlatform, profile: DeploymentProfile) -> Self {
        let convenient = profile.convenience_defaults();
        let region = platform.cloud().default_region().to_string();
        let admin_username = match platform {
            WarehousePlatform::Synapse => defaults::SYNAPSE_ADMIN_LOGIN,
            _ => defaults::ADMIN_USERNAME,
        };

        Self {
            platform,
            profile,
            region: region.clone(),
            database_name: defaults::DATABASE_NAME.to_string(),
            admin_username: admin_username.to_string(),
            admin_password: None,
            allowed_cidr: None,
            allowed_ip_range: None,
            network: None,
            cluster: ClusterSettings {
                identifier: defaults::CLUSTER_IDENTIFIER.to_string(),
                node_type: defaults::NODE_TYPE.to_string(),
                topology: ClusterTopology::SingleNode,
                publicly_accessible: convenient,
                skip_final_snapshot: convenient,
            },
            serverless: ServerlessSettings {
                namespace_name: defaults::NAMESPACE_NAME.to_string(),
                workgroup_name: defaults::WORKGROUP_NAME.to_string(),
                base_capacity: RpuCapacity::DEFAULT,
                publicly_accessible: convenient,
            },
            synapse: SynapseSettings {
                resource_group_name: defaults::SYNAPSE_RESOURCE_GROUP.to_string(),
                location: region,
                storage_account_name: defaults::SYNAPSE_STORAGE_ACCOUNT.to_string(),
                filesystem_name: defaults::SYNAPSE_FILESYSTEM.to_string(),
                workspace_name: defaults::SYNAPSE_WORKSPACE.to_string(),
                sql_pool_name: defaults::SYNAPSE_SQL_POOL.to_string(),
                sql_pool_sku: defaults::SYNAPSE_SQL_POOL_SKU.to_string(),
                spark_pool: SparkPoolSettings {
                    name: defaults::SYNAPSE_SPARK_POOL.to_string(),
                    node_size: defaults::SPARK_NODE_SIZE.to_string(),
                    node_size_family: defaults::SPARK_NODE_SIZE_FAMILY.to_string(),
                    min_nodes: defaults::SPARK_MIN_NODES,
                    max_nodes: defaults::SPARK_MAX_NODES,
                    auto_pause_minutes: defaults::SPARK_AUTO_PAUSE_MINUTES,
                    spark_version: defaults::SPARK_VERSION.to_string(),
                },
            },
            bigquery: BigQuerySettings {
                project: None,
                dataset_id: defaults::DATASET_ID.to_string(),
                location: defaults::DATASET_LOCATION.to_string(),
                friendly_name: defaults::DATASET_FRIENDLY_NAME.to_string(),
                description: defaults::DATASET_DESCRIPTION.to_string(),
                delete_contents_on_destroy: false,
                table_id: defaults::TABLE_ID.to_string(),
                table_description: defaults::TABLE_DESCRIPTION.to_string(),
                deletion_protection: !convenient,
                partition_field: defaults::PARTITION_FIELD.to_string(),
                clustering: defaults::CLUSTERING_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                editor_email: defaults::PLACEHOLDER_SA_EMAIL.to_string(),
                schema: default_event_schema(),
            },
        }
    }

    /// Build the configuration for `platform` from a key→value store.
    ///
    /// Malformed values (bad CIDR, half IP range, capacity out of range,
    /// missing required secret) fail here, before any resource is declared.
    pub fn from_store(platform: WarehousePlatform, store: &ConfigStore) -> ConfigResult<Self> {
        let profile = match store.get(keys::PROFILE) {
            Some(p) => p.parse()?,
            None => DeploymentProfile::default(),
        };
        let mut config = Self::defaults_with_profile(platform, profile);

        if let Some(region) = store.get(keys::REGION) {
            config.region = region.to_string();
            config.synapse.location = region.to_string();
        }
        if let Some(name) = store.get(keys::DATABASE_NAME) {
            config.database_name = name.to_string();
        }

        let username_key = match platform {
            WarehousePlatform::Synapse => keys::SQL_ADMIN,
            _ => keys::ADMIN_USERNAME,
        };
        if let Some(user) = store.get(username_key) {
            config.admin_username = user.to_string();
        }

        config.admin_password = match platform {
            WarehousePlatform::RedshiftCluster | WarehousePlatform::RedshiftServerless => {
                Some(store.require_secret(keys::DB_PASSWORD)?)
            }
            WarehousePlatform::Synapse => store.get_secret(keys::DB_PASSWORD)?,
            WarehousePlatform::BigQuery => None,
        };

        config.allowed_cidr = store
            .get(keys::ALLOWED_CIDR)
            .map(|c| Cidr::parse(keys::ALLOWED_CIDR, c))
            .transpose()?;

        config.allowed_ip_range = IpRange::from_bounds(
            keys::ALLOWED_IP_START,
            store.get(keys::ALLOWED_IP_START),
            keys::ALLOWED_IP_END,
            store.get(keys::ALLOWED_IP_END),
        )?;

        config.network = match (store.get(keys::VPC_ID), store.get_list(keys::SUBNET_IDS)) {
            (None, None) => None,
            (Some(vpc_id), Some(subnet_ids)) => Some(ExplicitNetwork {
                vpc_id: vpc_id.to_string(),
                subnet_ids,
            }),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteRange {
                    present: keys::VPC_ID.to_string(),
                    missing: keys::SUBNET_IDS.to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteRange {
                    present: keys::SUBNET_IDS.to_string(),
                    missing: keys::VPC_ID.to_string(),
                })
            }
        };

        config.apply_cluster(store)?;
        config.apply_serverless(store)?;
        config.apply_synapse(store);
        config.apply_bigquery(store)?;

        debug!(
            "Loaded {} configuration ({} profile, {} keys)",
            platform,
            profile,
            store.len()
        );
        Ok(config)
    }

    fn apply_cluster(&mut self, store: &ConfigStore) -> ConfigResult<()> {
        let cluster = &mut self.cluster;
        if let Some(id) = store.get(keys::CLUSTER_IDENTIFIER) {
            cluster.identifier = id.to_string();
        }
        if let Some(node_type) = store.get(keys::NODE_TYPE) {
            cluster.node_type = node_type.to_string();
        }
        cluster.topology = ClusterTopology::from_parts(
            store.get(keys::CLUSTER_TYPE),
            store.get_u32(keys::NUMBER_OF_NODES)?,
        )?;
        if let Some(public) = store.get_bool(keys::PUBLICLY_ACCESSIBLE)? {
            cluster.publicly_accessible = public;
        }
        if let Some(skip) = store.get_bool(keys::SKIP_FINAL_SNAPSHOT)? {
            cluster.skip_final_snapshot = skip;
        }
        Ok(())
    }

    fn apply_serverless(&mut self, store: &ConfigStore) -> ConfigResult<()> {
        let serverless = &mut self.serverless;
        if let Some(name) = store.get(keys::NAMESPACE_NAME) {
            serverless.namespace_name = name.to_string();
        }
        if let Some(name) = store.get(keys::WORKGROUP_NAME) {
            serverless.workgroup_name = name.to_string();
        }
        if let Some(units) = store.get_u32(keys::BASE_CAPACITY)? {
            serverless.base_capacity = RpuCapacity::new(units)?;
        }
        if let Some(public) = store.get_bool(keys::PUBLICLY_ACCESSIBLE)? {
            serverless.publicly_accessible = public;
        }
        Ok(())
    }

    fn apply_synapse(&mut self, store: &ConfigStore) {
        let synapse = &mut self.synapse;
        if let Some(rg) = store.get(keys::RESOURCE_GROUP_NAME) {
            synapse.resource_group_name = rg.to_string();
        }
        if let Some(account) = store.get(keys::STORAGE_ACCOUNT_NAME) {
            synapse.storage_account_name = account.to_string();
        }
        if let Some(workspace) = store.get(keys::WORKSPACE_NAME) {
            synapse.workspace_name = workspace.to_string();
        }
    }

    fn apply_bigquery(&mut self, store: &ConfigStore) -> ConfigResult<()> {
        let bq = &mut self.bigquery;
        bq.project = store.get(keys::PROJECT).map(str::to_string);
        if let Some(id) = store.get(keys::DATASET_ID) {
            bq.dataset_id = id.to_string();
        }
        if let Some(location) = store.get(keys::LOCATION) {
            bq.location = location.to_string();
        }
        if let Some(email) = store.get(keys::SA_EMAIL) {
            bq.editor_email = email.to_string();
        }
        if let Some(table) = store.get(keys::TABLE_ID) {
            bq.table_id = table.to_string();
        }
        if let Some(protect) = store.get_bool(keys::DELETION_PROTECTION)? {
            bq.deletion_protection = protect;
        }
        if let Some(purge) = store.get_bool(keys::DELETE_CONTENTS_ON_DESTROY)? {
            bq.delete_contents_on_destroy = purge;
        }
        if let Some(columns) = store.get_list(keys::CLUSTERING) {
            bq.clustering = columns;
        }

        if bq.clustering.len() > defaults::MAX_CLUSTERING_COLUMNS {
            return Err(ConfigError::invalid(
                keys::CLUSTERING,
                format!(
                    "{} clustering columns given, at most {} allowed",
                    bq.clustering.len(),
                    defaults::MAX_CLUSTERING_COLUMNS
                ),
            ));
        }
        for (i, column) in bq.clustering.iter().enumerate() {
            if bq.clustering[..i].contains(column) {
                return Err(ConfigError::invalid(
                    keys::CLUSTERING,
                    format!("column '{}' listed twice", column),
                ));
            }
            if !bq.schema.iter().any(|c| &c.name == column) {
                return Err(ConfigError::invalid(
                    keys::CLUSTERING,
                    format!("column '{}' is not in the table schema", column),
                ));
            }
        }
        Ok(())
    }

    /// Whether the deployment grants any inbound network access.
    pub fn has_ingress(&self) -> bool {
        match self.platform {
            WarehousePlatform::Synapse => self.allowed_ip_range.is_some(),
            _ => self.allowed_cidr.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redshift_store() -> ConfigStore {
        ConfigStore::new().with_secret(keys::DB_PASSWORD, "Sup3r-Secret")
    }

    #[test]
    fn test_defaults_match_development_profile() {
        let config = DeploymentConfig::default_for(WarehousePlatform::RedshiftCluster);
        assert_eq!(config.database_name, "analytics_db");
        assert_eq!(config.admin_username, "admin_user");
        assert_eq!(config.cluster.node_type, "dc2.large");
        assert!(config.cluster.publicly_accessible);
        assert!(config.cluster.skip_final_snapshot);
        assert!(config.allowed_cidr.is_none());
    }

    #[test]
    fn test_redshift_requires_password() {
        let err = DeploymentConfig::from_store(WarehousePlatform::RedshiftCluster, &ConfigStore::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(ref k) if k == keys::DB_PASSWORD));
    }

    #[test]
    fn test_bigquery_does_not_need_password() {
        let config =
            DeploymentConfig::from_store(WarehousePlatform::BigQuery, &ConfigStore::new()).unwrap();
        assert!(config.admin_password.is_none());
        assert!(config.bigquery.uses_placeholder_principal());
    }

    #[test]
    fn test_production_profile_flips_convenience_defaults() {
        let store = redshift_store().with(keys::PROFILE, "production");
        let config = DeploymentConfig::from_store(WarehousePlatform::RedshiftCluster, &store).unwrap();
        assert!(!config.cluster.publicly_accessible);
        assert!(!config.cluster.skip_final_snapshot);
        assert!(!config.serverless.publicly_accessible);
    }

    #[test]
    fn test_capacity_out_of_range_is_rejected() {
        let store = redshift_store().with(keys::BASE_CAPACITY, "4");
        let err = DeploymentConfig::from_store(WarehousePlatform::RedshiftServerless, &store)
            .unwrap_err();
        assert!(err.to_string().contains(keys::BASE_CAPACITY));
    }

    #[test]
    fn test_half_ip_range_is_rejected() {
        let store = ConfigStore::new().with(keys::ALLOWED_IP_START, "10.0.0.1");
        let err = DeploymentConfig::from_store(WarehousePlatform::Synapse, &store).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteRange { .. }));
    }

    #[test]
    fn test_explicit_network_needs_both_parts() {
        let store = redshift_store().with(keys::VPC_ID, "vpc-123");
        assert!(DeploymentConfig::from_store(WarehousePlatform::RedshiftCluster, &store).is_err());

        let store = redshift_store()
            .with(keys::VPC_ID, "vpc-123")
            .with(keys::SUBNET_IDS, "subnet-a,subnet-b");
        let config = DeploymentConfig::from_store(WarehousePlatform::RedshiftCluster, &store).unwrap();
        assert_eq!(config.network.unwrap().subnet_ids.len(), 2);
    }

    #[test]
    fn test_clustering_rules() {
        let store = ConfigStore::new().with(keys::CLUSTERING, "event_name,unknown_col");
        assert!(DeploymentConfig::from_store(WarehousePlatform::BigQuery, &store).is_err());

        let store = ConfigStore::new().with(keys::CLUSTERING, "event_name,event_name");
        assert!(DeploymentConfig::from_store(WarehousePlatform::BigQuery, &store).is_err());

        let store = ConfigStore::new().with(keys::CLUSTERING, "user_id");
        let config = DeploymentConfig::from_store(WarehousePlatform::BigQuery, &store).unwrap();
        assert_eq!(config.bigquery.clustering, vec!["user_id".to_string()]);
    }

    #[test]
    fn test_synapse_admin_login_key() {
        let store = ConfigStore::new().with(keys::SQL_ADMIN, "warehouse_admin");
        let config = DeploymentConfig::from_store(WarehousePlatform::Synapse, &store).unwrap();
        assert_eq!(config.admin_username, "warehouse_admin");
    }

    #[test]
    fn test_dataset_contents_purge_is_configurable() {
        let config =
            DeploymentConfig::from_store(WarehousePlatform::BigQuery, &ConfigStore::new()).unwrap();
        assert!(!config.bigquery.delete_contents_on_destroy);

        let store = ConfigStore::new().with(keys::DELETE_CONTENTS_ON_DESTROY, "true");
        let config = DeploymentConfig::from_store(WarehousePlatform::BigQuery, &store).unwrap();
        assert!(config.bigquery.delete_contents_on_destroy);

        let store = ConfigStore::new().with(keys::DELETE_CONTENTS_ON_DESTROY, "sometimes");
        let err = DeploymentConfig::from_store(WarehousePlatform::BigQuery, &store).unwrap_err();
        assert!(err.to_string().contains(keys::DELETE_CONTENTS_ON_DESTROY));
    }
}
