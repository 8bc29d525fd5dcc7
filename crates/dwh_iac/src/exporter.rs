//! Stack outputs.
//!
//! [`ExportValue`] has no secret variant, and [`OutputMap`] refuses keys that
//! look like credentials, so the admin password cannot be exported.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use dwh_graph::{InterpolationPart, OutputRef};

use crate::error::{IacError, IacResult};
use crate::warehouse::ProvisionedWarehouse;

/// Fragments that mark an output key as credential material.
const FORBIDDEN_KEY_FRAGMENTS: &[&str] = &["password", "passwd", "secret", "credential"];

/// A value published after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportValue {
    Literal(String),
    Ref(OutputRef),
    Concat(Vec<InterpolationPart>),
}

impl ExportValue {
    pub fn literal(value: impl Into<String>) -> Self {
        ExportValue::Literal(value.into())
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            ExportValue::Literal(s) => Some(s),
            _ => None,
        }
    }
}

impl From<OutputRef> for ExportValue {
    fn from(value: OutputRef) -> Self {
        ExportValue::Ref(value)
    }
}

/// Flat, ordered map of named outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputMap {
    values: BTreeMap<String, ExportValue>,
}

impl OutputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ExportValue) -> IacResult<()> {
        let key = key.into();
        let lowered = key.to_lowercase();
        if let Some(fragment) = FORBIDDEN_KEY_FRAGMENTS.iter().find(|f| lowered.contains(*f)) {
            return Err(IacError::validation(
                format!("output {}", key),
                format!("output names containing '{}' are not exported", fragment),
            ));
        }
        self.values.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ExportValue> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExportValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Publishes the connection details of a provisioned warehouse.
pub struct TopologyExporter;

impl TopologyExporter {
    pub const ENDPOINT: &'static str = "endpoint";
    pub const DATABASE_NAME: &'static str = "database_name";
    pub const USERNAME: &'static str = "username";

    pub fn export(warehouse: &ProvisionedWarehouse) -> IacResult<OutputMap> {
        let mut outputs = OutputMap::new();
        outputs.insert(Self::ENDPOINT, warehouse.endpoint.clone())?;
        outputs.insert(Self::DATABASE_NAME, warehouse.database_name.clone())?;
        outputs.insert(Self::USERNAME, warehouse.admin_username.clone())?;

        for (key, value) in &warehouse.extras {
            if outputs.get(key).is_some() {
                return Err(IacError::validation(
                    format!("output {}", key),
                    "extra output shadows a standard output",
                ));
            }
            outputs.insert(key.clone(), value.clone())?;
        }

        debug!("Exporting {} outputs", outputs.len());
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwh_graph::ResourceId;

    fn warehouse() -> ProvisionedWarehouse {
        let cluster = ResourceId::new("aws_redshift_cluster", "my-cluster");
        ProvisionedWarehouse::new(
            cluster.output("endpoint"),
            ExportValue::literal("analytics_db"),
            ExportValue::literal("admin_user"),
        )
    }

    #[test]
    fn test_standard_outputs() {
        let outputs = TopologyExporter::export(&warehouse()).unwrap();
        let keys: Vec<&str> = outputs.keys().collect();
        assert_eq!(keys, vec!["database_name", "endpoint", "username"]);
        assert_eq!(outputs.get("username").unwrap().as_literal(), Some("admin_user"));
    }

    #[test]
    fn test_password_like_keys_are_rejected() {
        let mut map = OutputMap::new();
        for key in ["sql_admin_password", "DbPassword", "client_secret"] {
            let err = map.insert(key, ExportValue::literal("x")).unwrap_err();
            assert!(matches!(err, IacError::Validation { .. }), "{}", key);
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_extras_cannot_shadow() {
        let warehouse = warehouse().with_extra("endpoint", ExportValue::literal("elsewhere"));
        assert!(TopologyExporter::export(&warehouse).is_err());
    }
}
