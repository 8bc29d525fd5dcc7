//! Cloud provider and warehouse platform definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Gcp => "gcp",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![CloudProvider::Aws, CloudProvider::Azure, CloudProvider::Gcp]
    }

    /// Get the Terraform provider name.
    pub fn provider_name(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azurerm",
            CloudProvider::Gcp => "google",
        }
    }

    /// Get the Terraform provider source address.
    pub fn provider_source(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "hashicorp/aws",
            CloudProvider::Azure => "hashicorp/azurerm",
            CloudProvider::Gcp => "hashicorp/google",
        }
    }

    /// Get default region for the provider.
    pub fn default_region(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "us-east-1",
            CloudProvider::Azure => "eastus",
            CloudProvider::Gcp => "asia-northeast1",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Warehouse platform variants. Selected once per deployment definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarehousePlatform {
    /// Provisioned Redshift cluster.
    #[serde(rename = "redshift", alias = "redshift-cluster")]
    RedshiftCluster,
    /// Redshift Serverless namespace + workgroup.
    RedshiftServerless,
    /// Azure Synapse analytics workspace.
    Synapse,
    /// BigQuery dataset + table.
    #[serde(rename = "bigquery")]
    BigQuery,
}

impl WarehousePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehousePlatform::RedshiftCluster => "redshift",
            WarehousePlatform::RedshiftServerless => "redshift-serverless",
            WarehousePlatform::Synapse => "synapse",
            WarehousePlatform::BigQuery => "bigquery",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            WarehousePlatform::RedshiftCluster,
            WarehousePlatform::RedshiftServerless,
            WarehousePlatform::Synapse,
            WarehousePlatform::BigQuery,
        ]
    }

    pub fn cloud(&self) -> CloudProvider {
        match self {
            WarehousePlatform::RedshiftCluster | WarehousePlatform::RedshiftServerless => {
                CloudProvider::Aws
            }
            WarehousePlatform::Synapse => CloudProvider::Azure,
            WarehousePlatform::BigQuery => CloudProvider::Gcp,
        }
    }

    /// Whether the platform attaches to a VPC and needs network resolution.
    pub fn needs_vpc(&self) -> bool {
        self.cloud() == CloudProvider::Aws
    }
}

impl FromStr for WarehousePlatform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redshift" | "redshift-cluster" => Ok(WarehousePlatform::RedshiftCluster),
            "redshift-serverless" => Ok(WarehousePlatform::RedshiftServerless),
            "synapse" => Ok(WarehousePlatform::Synapse),
            "bigquery" => Ok(WarehousePlatform::BigQuery),
            other => Err(ConfigError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl std::fmt::Display for WarehousePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deployment profile controlling the insecure development defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentProfile {
    /// Public endpoints and no final snapshot unless overridden.
    #[default]
    Development,
    /// Private endpoints and final snapshots unless overridden.
    Production,
}

impl DeploymentProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentProfile::Development => "development",
            DeploymentProfile::Production => "production",
        }
    }

    /// Default for `publicly_accessible` and `skip_final_snapshot`.
    pub fn convenience_defaults(&self) -> bool {
        matches!(self, DeploymentProfile::Development)
    }
}

impl FromStr for DeploymentProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(DeploymentProfile::Development),
            "prod" | "production" => Ok(DeploymentProfile::Production),
            other => Err(ConfigError::invalid(
                "profile",
                format!("unknown profile '{}', expected development or production", other),
            )),
        }
    }
}

impl std::fmt::Display for DeploymentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trips_through_str() {
        for platform in WarehousePlatform::all() {
            let parsed: WarehousePlatform = platform.as_str().parse().unwrap();
            assert_eq!(parsed, platform);
        }
    }

    #[test]
    fn test_platform_cloud_mapping() {
        assert_eq!(WarehousePlatform::RedshiftServerless.cloud(), CloudProvider::Aws);
        assert_eq!(WarehousePlatform::Synapse.cloud(), CloudProvider::Azure);
        assert_eq!(WarehousePlatform::BigQuery.cloud(), CloudProvider::Gcp);
        assert!(WarehousePlatform::RedshiftCluster.needs_vpc());
        assert!(!WarehousePlatform::BigQuery.needs_vpc());
    }

    #[test]
    fn test_platform_serde_names() {
        let yaml = serde_yaml::to_string(&WarehousePlatform::RedshiftServerless).unwrap();
        assert_eq!(yaml.trim(), "redshift-serverless");
        let parsed: WarehousePlatform = serde_yaml::from_str("bigquery").unwrap();
        assert_eq!(parsed, WarehousePlatform::BigQuery);
    }

    #[test]
    fn test_profile_defaults() {
        assert!(DeploymentProfile::Development.convenience_defaults());
        assert!(!DeploymentProfile::Production.convenience_defaults());
        assert_eq!("prod".parse::<DeploymentProfile>().unwrap(), DeploymentProfile::Production);
    }
}
