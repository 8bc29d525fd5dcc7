//! Resource declarations and property values.
//!
//! A [`ResourceDecl`] is the desired state of one cloud resource: its
//! Terraform-style kind, a logical name, a property map and explicit
//! ordering edges. Properties that read another resource's outputs
//! ([`PropertyValue::Ref`], [`PropertyValue::Interpolate`], secret outputs)
//! are dependencies too; [`ResourceDecl::dependencies`] returns the union.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GraphError;

/// Identity of a declared resource: `<kind>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    kind: String,
    name: String,
}

impl ResourceId {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference one of this resource's output attributes.
    pub fn output(&self, attribute: impl Into<String>) -> OutputRef {
        OutputRef::new(self.clone(), attribute)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((kind, name)) if !kind.is_empty() && !name.is_empty() => {
                Ok(ResourceId::new(kind, name))
            }
            _ => Err(GraphError::InvalidId(s.to_string())),
        }
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A reference to an output attribute of another resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OutputRef {
    pub resource: ResourceId,
    pub attribute: String,
}

impl OutputRef {
    pub fn new(resource: ResourceId, attribute: impl Into<String>) -> Self {
        Self {
            resource,
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.attribute)
    }
}

/// Where a secret property value comes from. Never the value itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretRef {
    /// A secret configuration key, supplied to the engine as a sensitive input.
    Config { key: String },
    /// A sensitive output of another declared resource.
    Output(OutputRef),
}

impl SecretRef {
    pub fn config(key: impl Into<String>) -> Self {
        SecretRef::Config { key: key.into() }
    }
}

/// One piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationPart {
    Text(String),
    Ref(OutputRef),
}

/// Ordered property map of a resource or nested block.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A resource property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<PropertyValue>),
    Map(Properties),
    /// Repeated nested blocks. An empty list declares that none exist.
    Block(Vec<Properties>),
    Ref(OutputRef),
    Secret(SecretRef),
    Interpolate(Vec<InterpolationPart>),
}

impl PropertyValue {
    pub fn str(value: impl Into<String>) -> Self {
        PropertyValue::Str(value.into())
    }

    pub fn list_of_str<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::List(values.into_iter().map(|v| PropertyValue::Str(v.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_blocks(&self) -> Option<&[Properties]> {
        match self {
            PropertyValue::Block(blocks) => Some(blocks),
            _ => None,
        }
    }

    /// Collect every resource this value reads from.
    pub fn collect_references(&self, out: &mut BTreeSet<ResourceId>) {
        match self {
            PropertyValue::Ref(r) | PropertyValue::Secret(SecretRef::Output(r)) => {
                out.insert(r.resource.clone());
            }
            PropertyValue::Interpolate(parts) => {
                for part in parts {
                    if let InterpolationPart::Ref(r) = part {
                        out.insert(r.resource.clone());
                    }
                }
            }
            PropertyValue::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            PropertyValue::Map(map) => {
                for value in map.values() {
                    value.collect_references(out);
                }
            }
            PropertyValue::Block(blocks) => {
                for value in blocks.iter().flat_map(|b| b.values()) {
                    value.collect_references(out);
                }
            }
            PropertyValue::Str(_)
            | PropertyValue::Int(_)
            | PropertyValue::Bool(_)
            | PropertyValue::Secret(SecretRef::Config { .. }) => {}
        }
    }

    /// Whether this value, or anything nested in it, is a secret.
    pub fn contains_secret(&self) -> bool {
        match self {
            PropertyValue::Secret(_) => true,
            PropertyValue::List(items) => items.iter().any(PropertyValue::contains_secret),
            PropertyValue::Map(map) => map.values().any(PropertyValue::contains_secret),
            PropertyValue::Block(blocks) => blocks
                .iter()
                .flat_map(|b| b.values())
                .any(PropertyValue::contains_secret),
            _ => false,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<OutputRef> for PropertyValue {
    fn from(value: OutputRef) -> Self {
        PropertyValue::Ref(value)
    }
}

impl From<SecretRef> for PropertyValue {
    fn from(value: SecretRef) -> Self {
        PropertyValue::Secret(value)
    }
}

/// Desired state of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDecl {
    pub id: ResourceId,
    pub properties: Properties,
    /// Explicit ordering edges, in addition to property references.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<ResourceId>,
}

impl ResourceDecl {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(kind, name),
            properties: Properties::new(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set a property only when a value is present.
    pub fn with_optional_property(
        self,
        key: impl Into<String>,
        value: Option<impl Into<PropertyValue>>,
    ) -> Self {
        match value {
            Some(value) => self.with_property(key, value),
            None => self,
        }
    }

    pub fn with_depends_on(mut self, id: ResourceId) -> Self {
        self.depends_on.insert(id);
        self
    }

    pub fn with_depends_on_all(mut self, ids: impl IntoIterator<Item = ResourceId>) -> Self {
        self.depends_on.extend(ids);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn output(&self, attribute: impl Into<String>) -> OutputRef {
        self.id.output(attribute)
    }

    /// Explicit edges plus every resource referenced from a property.
    pub fn dependencies(&self) -> BTreeSet<ResourceId> {
        let mut deps = self.depends_on.clone();
        for value in self.properties.values() {
            value.collect_references(&mut deps);
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_display_and_parse() {
        let id = ResourceId::new("aws_redshift_cluster", "my-cluster");
        assert_eq!(id.to_string(), "aws_redshift_cluster.my-cluster");
        let parsed: ResourceId = "aws_redshift_cluster.my-cluster".parse().unwrap();
        assert_eq!(parsed, id);
        assert!("no-kind".parse::<ResourceId>().is_err());
        assert!(".name".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_dependencies_include_references() {
        let role = ResourceId::new("aws_iam_role", "redshift-role");
        let sg = ResourceId::new("aws_security_group", "redshift-sg");
        let attach = ResourceId::new("aws_iam_role_policy_attachment", "s3");

        let decl = ResourceDecl::new("aws_redshift_cluster", "my-cluster")
            .with_property("iam_roles", PropertyValue::List(vec![role.output("arn").into()]))
            .with_property(
                "vpc_security_group_ids",
                PropertyValue::List(vec![sg.output("id").into()]),
            )
            .with_property("master_password", SecretRef::config("dbPassword"))
            .with_depends_on(attach.clone());

        let deps = decl.dependencies();
        assert_eq!(deps.len(), 3);
        assert!(deps.contains(&role));
        assert!(deps.contains(&sg));
        assert!(deps.contains(&attach));
        assert!(decl.property("master_password").unwrap().contains_secret());
    }

    #[test]
    fn test_interpolation_and_blocks_are_scanned() {
        let dataset = ResourceId::new("google_bigquery_dataset", "dwh");
        let sg = ResourceId::new("aws_security_group", "sg");
        let mut block = Properties::new();
        block.insert("security_groups".into(), sg.output("id").into());

        let decl = ResourceDecl::new("test_kind", "x")
            .with_property(
                "path",
                PropertyValue::Interpolate(vec![
                    InterpolationPart::Text("projects/".into()),
                    InterpolationPart::Ref(dataset.output("project")),
                ]),
            )
            .with_property("ingress", PropertyValue::Block(vec![block]));

        let deps = decl.dependencies();
        assert!(deps.contains(&dataset));
        assert!(deps.contains(&sg));
    }

    #[test]
    fn test_secret_ref_is_never_a_value() {
        let json = serde_json::to_string(&PropertyValue::Secret(SecretRef::config("dbPassword")))
            .unwrap();
        assert_eq!(json, r#"{"secret":{"config":{"key":"dbPassword"}}}"#);
    }
}
