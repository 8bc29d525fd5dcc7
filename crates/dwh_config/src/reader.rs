//! Deployment file reading.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::deployment::DeploymentConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::platform::WarehousePlatform;
use crate::store::ConfigStore;

/// A deployment file: the selected platform plus its configuration keys.
///
/// ```yaml
/// platform: redshift
/// config:
///   dbPassword:
///     secure: change-me
///   allowedCidr: 203.0.113.0/24
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeploymentFile {
    pub platform: WarehousePlatform,
    #[serde(default)]
    pub config: ConfigStore,
}

impl DeploymentFile {
    pub fn new(platform: WarehousePlatform) -> Self {
        Self {
            platform,
            config: ConfigStore::new(),
        }
    }

    /// Read a deployment file. `.toml` files are parsed as TOML, everything else as YAML.
    pub fn read(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        debug!("Reading deployment file from {:?}", path);

        let content = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `key=value` overrides on top of the file's configuration.
    pub fn apply_overrides<I, S>(&mut self, assignments: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for assignment in assignments {
            let (key, value) = ConfigStore::parse_assignment(assignment.as_ref())?;
            self.config.set(&key, value);
        }
        Ok(())
    }

    /// Resolve the typed configuration.
    pub fn into_config(self) -> ConfigResult<DeploymentConfig> {
        DeploymentConfig::from_store(self.platform, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_file() {
        let file = DeploymentFile::from_yaml(
            r#"
platform: redshift-serverless
config:
  dbPassword:
    secure: pw
  baseCapacity: 64
"#,
        )
        .unwrap();
        assert_eq!(file.platform, WarehousePlatform::RedshiftServerless);
        let config = file.into_config().unwrap();
        assert_eq!(config.serverless.base_capacity.units(), 64);
    }

    #[test]
    fn test_toml_file() {
        let file = DeploymentFile::from_toml(
            r#"
platform = "bigquery"

[config]
dataset_id = "events"
clustering = ["user_id"]
"#,
        )
        .unwrap();
        assert_eq!(file.platform, WarehousePlatform::BigQuery);
        assert_eq!(file.config.get("dataset_id"), Some("events"));
    }

    #[test]
    fn test_overrides_win() {
        let mut file = DeploymentFile::new(WarehousePlatform::BigQuery);
        file.config.set("dataset_id", "from_file");
        file.apply_overrides(["dataset_id=from_cli"]).unwrap();
        assert_eq!(file.config.get("dataset_id"), Some("from_cli"));
        assert!(file.apply_overrides(["broken"]).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = DeploymentFile::read("/nonexistent/deploy.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
