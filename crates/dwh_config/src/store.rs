//! Key→value configuration store with secret-flagged entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::secret::SecretString;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    List(Vec<String>),
    Secret(SecretString),
}

impl ConfigValue {
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigValue::Secret(_))
    }
}

/// Value shapes accepted in deployment files.
///
/// Secrets are written as `{ secure: "..." }`, matching stack config files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Secure { secure: String },
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<RawScalar>),
}

/// List items; numbers and booleans read as their text form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<RawScalar> for String {
    fn from(raw: RawScalar) -> Self {
        match raw {
            RawScalar::Bool(b) => b.to_string(),
            RawScalar::Integer(i) => i.to_string(),
            RawScalar::Float(f) => f.to_string(),
            RawScalar::Text(s) => s,
        }
    }
}

impl From<RawValue> for ConfigValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Secure { secure } => ConfigValue::Secret(SecretString::new(secure)),
            RawValue::Bool(b) => ConfigValue::Text(b.to_string()),
            RawValue::Integer(i) => ConfigValue::Text(i.to_string()),
            RawValue::Float(f) => ConfigValue::Text(f.to_string()),
            RawValue::Text(s) => ConfigValue::Text(s),
            RawValue::List(items) => {
                ConfigValue::List(items.into_iter().map(String::from).collect())
            }
        }
    }
}

/// Configuration key→value store.
///
/// Keys may carry a `project:` namespace prefix, which is stripped on insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    entries: BTreeMap<String, ConfigValue>,
}

impl<'de> Deserialize<'de> for ConfigStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, RawValue>::deserialize(deserializer)?;
        let mut store = ConfigStore::new();
        for (key, value) in raw {
            store.insert(&key, value.into());
        }
        Ok(store)
    }
}

fn normalize_key(key: &str) -> &str {
    match key.rsplit_once(':') {
        Some((_, bare)) => bare.trim(),
        None => key.trim(),
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    fn insert(&mut self, key: &str, value: ConfigValue) {
        let key = normalize_key(key).to_string();
        debug!("Config key set: {} (secret: {})", key, value.is_secret());
        self.entries.insert(key, value);
    }

    /// Set a plain value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, ConfigValue::Text(value.into()));
    }

    /// Set a list value.
    pub fn set_list(&mut self, key: &str, values: Vec<String>) {
        self.insert(key, ConfigValue::List(values));
    }

    /// Set a secret value.
    pub fn set_secret(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, ConfigValue::Secret(SecretString::new(value)));
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_secret(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_secret(key, value);
        self
    }

    /// Overlay another store; its entries win.
    pub fn merge(&mut self, other: ConfigStore) {
        self.entries.extend(other.entries);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(normalize_key(key))
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.entries
            .get(normalize_key(key))
            .is_some_and(ConfigValue::is_secret)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a plain value. Blank values and secrets read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.entries.get(normalize_key(key)) {
            Some(ConfigValue::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Get a plain value or a default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Get a list value. Plain text is split on commas.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = match self.entries.get(normalize_key(key))? {
            ConfigValue::List(items) => items.iter().map(|s| s.trim().to_string()).collect(),
            ConfigValue::Text(s) => s.split(',').map(|s| s.trim().to_string()).collect(),
            ConfigValue::Secret(_) => return None,
        };
        let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                other => Err(ConfigError::invalid(
                    key,
                    format!("'{}' is not a boolean", other),
                )),
            },
        }
    }

    pub fn get_u32(&self, key: &str) -> ConfigResult<Option<u32>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a whole number", v))),
        }
    }

    /// Get a secret value, rejecting a value that was supplied in plain text.
    pub fn get_secret(&self, key: &str) -> ConfigResult<Option<SecretString>> {
        match self.entries.get(normalize_key(key)) {
            None => Ok(None),
            Some(ConfigValue::Secret(s)) if s.is_empty() => Ok(None),
            Some(ConfigValue::Secret(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::NotSecret(key.to_string())),
        }
    }

    pub fn require_secret(&self, key: &str) -> ConfigResult<SecretString> {
        self.get_secret(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Parse a `key=value` override.
    pub fn parse_assignment(assignment: &str) -> ConfigResult<(String, String)> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ConfigError::invalid(assignment, "expected key=value")
        })?;
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(ConfigError::invalid(assignment, "empty key"));
        }
        Ok((key.to_string(), value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefix_is_stripped() {
        let store = ConfigStore::new().with("dwh-aws:allowedCidr", "10.0.0.0/8");
        assert_eq!(store.get("allowedCidr"), Some("10.0.0.0/8"));
        assert!(store.contains("other:allowedCidr"));
    }

    #[test]
    fn test_blank_values_read_as_absent() {
        let store = ConfigStore::new().with("allowedCidr", "   ");
        assert_eq!(store.get("allowedCidr"), None);
    }

    #[test]
    fn test_secrets_are_not_readable_as_text() {
        let store = ConfigStore::new().with_secret("dbPassword", "S3cret!");
        assert_eq!(store.get("dbPassword"), None);
        assert!(store.is_secret("dbPassword"));
        assert_eq!(store.require_secret("dbPassword").unwrap().expose(), "S3cret!");
    }

    #[test]
    fn test_plain_password_is_rejected() {
        let store = ConfigStore::new().with("dbPassword", "S3cret!");
        assert!(matches!(
            store.require_secret("dbPassword"),
            Err(ConfigError::NotSecret(_))
        ));
    }

    #[test]
    fn test_missing_secret() {
        let store = ConfigStore::new();
        assert!(matches!(
            store.require_secret("dbPassword"),
            Err(ConfigError::MissingKey(_))
        ));
    }

    #[test]
    fn test_typed_getters() {
        let mut store = ConfigStore::new()
            .with("baseCapacity", "64")
            .with("publiclyAccessible", "false")
            .with("subnetIds", "subnet-b, subnet-a");
        assert_eq!(store.get_u32("baseCapacity").unwrap(), Some(64));
        assert_eq!(store.get_bool("publiclyAccessible").unwrap(), Some(false));
        assert_eq!(
            store.get_list("subnetIds").unwrap(),
            vec!["subnet-b".to_string(), "subnet-a".to_string()]
        );

        store.set("baseCapacity", "lots");
        assert!(store.get_u32("baseCapacity").is_err());
    }

    #[test]
    fn test_deserialize_yaml_values() {
        let yaml = r#"
dwh:dbPassword:
  secure: p@ss
allowedCidr: 203.0.113.0/24
baseCapacity: 64
publiclyAccessible: false
clustering:
  - event_name
  - user_id
"#;
        let store: ConfigStore = serde_yaml::from_str(yaml).unwrap();
        assert!(store.is_secret("dbPassword"));
        assert_eq!(store.get("baseCapacity"), Some("64"));
        assert_eq!(store.get_bool("publiclyAccessible").unwrap(), Some(false));
        assert_eq!(store.get_list("clustering").unwrap().len(), 2);
    }

    #[test]
    fn test_numeric_list_items_read_as_text() {
        let yaml = r#"
subnetIds: [1, 2]
clustering:
  - event_name
  - 7
"#;
        let store: ConfigStore = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            store.get_list("subnetIds").unwrap(),
            vec!["1".to_string(), "2".to_string()]
        );
        assert_eq!(
            store.get_list("clustering").unwrap(),
            vec!["event_name".to_string(), "7".to_string()]
        );
    }

    #[test]
    fn test_parse_assignment() {
        let (k, v) = ConfigStore::parse_assignment("allowedCidr=10.0.0.0/8").unwrap();
        assert_eq!(k, "allowedCidr");
        assert_eq!(v, "10.0.0.0/8");
        assert!(ConfigStore::parse_assignment("novalue").is_err());
    }
}
