//! Deployment configuration validation.
//!
//! Shape errors (bad CIDR, capacity out of range) are already rejected by
//! [`DeploymentConfig::from_store`]. This validator adds naming rules and the
//! posture warnings for insecure development defaults.

use crate::deployment::DeploymentConfig;
use crate::error::ConfigResult;
use crate::keys;
use crate::naming::{self, NamingRule};
use crate::platform::{DeploymentProfile, WarehousePlatform};

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    fn check(&mut self, rule: &NamingRule, field: &str, value: &str) -> ConfigResult<()> {
        if let Some(violation) = rule.check(field, value)? {
            self.add_error(violation);
        }
        Ok(())
    }
}

/// Validator for deployment configuration.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration for its selected platform.
    pub fn validate(config: &DeploymentConfig) -> ConfigResult<ValidationResult> {
        let mut result = ValidationResult::new();

        match config.platform {
            WarehousePlatform::RedshiftCluster => {
                result.merge(Self::validate_cluster(config)?);
            }
            WarehousePlatform::RedshiftServerless => {
                result.merge(Self::validate_serverless(config)?);
            }
            WarehousePlatform::Synapse => {
                result.merge(Self::validate_synapse(config)?);
            }
            WarehousePlatform::BigQuery => {
                result.merge(Self::validate_bigquery(config)?);
            }
        }

        if let Some(cidr) = &config.allowed_cidr {
            if config.platform == WarehousePlatform::Synapse {
                result.add_warning(format!(
                    "{} is ignored on synapse; use {}/{}",
                    keys::ALLOWED_CIDR,
                    keys::ALLOWED_IP_START,
                    keys::ALLOWED_IP_END
                ));
            } else if cidr.is_any() {
                result.add_warning(format!(
                    "{} {} opens the warehouse port to every address",
                    keys::ALLOWED_CIDR,
                    cidr
                ));
            }
        }

        Ok(result)
    }

    fn validate_redshift_common(config: &DeploymentConfig) -> ConfigResult<ValidationResult> {
        let mut result = ValidationResult::new();
        result.check(&naming::REDSHIFT_DATABASE, keys::DATABASE_NAME, &config.database_name)?;
        result.check(&naming::ADMIN_USERNAME, keys::ADMIN_USERNAME, &config.admin_username)?;
        if config.admin_username == "admin" {
            result.add_error(format!("{} 'admin' is reserved by Redshift", keys::ADMIN_USERNAME));
        }
        Ok(result)
    }

    fn validate_cluster(config: &DeploymentConfig) -> ConfigResult<ValidationResult> {
        let mut result = Self::validate_redshift_common(config)?;
        let cluster = &config.cluster;
        result.check(
            &naming::REDSHIFT_CLUSTER_ID,
            keys::CLUSTER_IDENTIFIER,
            &cluster.identifier,
        )?;
        if cluster.node_type.trim().is_empty() {
            result.add_error(format!("{} cannot be empty", keys::NODE_TYPE));
        }

        Self::posture(&mut result, config.profile, "cluster", cluster.publicly_accessible);
        if cluster.skip_final_snapshot {
            let message = format!(
                "cluster '{}' skips its final snapshot; deleting it destroys all data",
                cluster.identifier
            );
            match config.profile {
                DeploymentProfile::Development => result.add_warning(message),
                DeploymentProfile::Production => {
                    result.add_warning(format!("{} (explicit override in production)", message))
                }
            }
        }
        Ok(result)
    }

    fn validate_serverless(config: &DeploymentConfig) -> ConfigResult<ValidationResult> {
        let mut result = Self::validate_redshift_common(config)?;
        let serverless = &config.serverless;
        result.check(
            &naming::REDSHIFT_SERVERLESS_NAME,
            keys::NAMESPACE_NAME,
            &serverless.namespace_name,
        )?;
        result.check(
            &naming::REDSHIFT_SERVERLESS_NAME,
            keys::WORKGROUP_NAME,
            &serverless.workgroup_name,
        )?;
        Self::posture(
            &mut result,
            config.profile,
            "workgroup",
            serverless.publicly_accessible,
        );
        Ok(result)
    }

    fn validate_synapse(config: &DeploymentConfig) -> ConfigResult<ValidationResult> {
        let mut result = ValidationResult::new();
        let synapse = &config.synapse;
        result.check(
            &naming::AZURE_RESOURCE_GROUP,
            keys::RESOURCE_GROUP_NAME,
            &synapse.resource_group_name,
        )?;
        result.check(
            &naming::AZURE_STORAGE_ACCOUNT,
            keys::STORAGE_ACCOUNT_NAME,
            &synapse.storage_account_name,
        )?;
        result.check(&naming::SYNAPSE_WORKSPACE, keys::WORKSPACE_NAME, &synapse.workspace_name)?;
        result.check(&naming::ADMIN_USERNAME, keys::SQL_ADMIN, &config.admin_username)?;

        let spark = &synapse.spark_pool;
        if spark.min_nodes < 3 {
            result.add_error(format!(
                "spark pool '{}' needs at least 3 nodes, got {}",
                spark.name, spark.min_nodes
            ));
        }
        if spark.min_nodes > spark.max_nodes {
            result.add_error(format!(
                "spark pool '{}' autoscale minimum {} exceeds maximum {}",
                spark.name, spark.min_nodes, spark.max_nodes
            ));
        }

        if config.allowed_ip_range.is_none() {
            result.add_warning(
                "no firewall rule configured; the workspace is reachable only through the control plane",
            );
        }
        if config.admin_password.is_none() {
            result.add_warning("no dbPassword supplied; a random SQL administrator password will be generated");
        }
        Ok(result)
    }

    fn validate_bigquery(config: &DeploymentConfig) -> ConfigResult<ValidationResult> {
        let mut result = ValidationResult::new();
        let bq = &config.bigquery;
        result.check(&naming::BIGQUERY_ID, keys::DATASET_ID, &bq.dataset_id)?;
        result.check(&naming::BIGQUERY_ID, keys::TABLE_ID, &bq.table_id)?;
        result.check(&naming::SERVICE_ACCOUNT_EMAIL, keys::SA_EMAIL, &bq.editor_email)?;

        if !bq.schema.iter().any(|c| c.name == bq.partition_field && c.column_type == "TIMESTAMP") {
            result.add_error(format!(
                "partition column '{}' must be a TIMESTAMP column of table '{}'",
                bq.partition_field, bq.table_id
            ));
        }

        if bq.uses_placeholder_principal() {
            let message = format!(
                "{} is the placeholder '{}'; set it to a real service account",
                keys::SA_EMAIL,
                bq.editor_email
            );
            match config.profile {
                DeploymentProfile::Development => result.add_warning(message),
                DeploymentProfile::Production => result.add_error(message),
            }
        }
        Ok(result)
    }

    fn posture(
        result: &mut ValidationResult,
        profile: DeploymentProfile,
        what: &str,
        publicly_accessible: bool,
    ) {
        if !publicly_accessible {
            return;
        }
        match profile {
            DeploymentProfile::Development => result.add_warning(format!(
                "{} is publicly accessible (development default); set {}=false for shared environments",
                what,
                keys::PUBLICLY_ACCESSIBLE
            )),
            DeploymentProfile::Production => result.add_warning(format!(
                "{} is publicly accessible in the production profile (explicit override)",
                what
            )),
        }
    }
}
