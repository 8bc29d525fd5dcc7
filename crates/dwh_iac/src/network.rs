//! Network resolution.
//!
//! Warehouses on AWS attach to the account's default VPC and all of its
//! subnets unless a network is given explicitly. The lookup goes through the
//! [`NetworkInventory`] seam so planning never needs cloud credentials.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dwh_config::ExplicitNetwork;

use crate::error::{IacError, IacResult};

/// Resolved network placement, shared read-only by every resource of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkContext {
    pub vpc_id: String,
    /// Sorted and de-duplicated.
    pub subnet_ids: Vec<String>,
}

impl NetworkContext {
    pub fn new(vpc_id: impl Into<String>, subnet_ids: impl IntoIterator<Item = String>) -> Self {
        let mut subnet_ids: Vec<String> = subnet_ids.into_iter().collect();
        subnet_ids.sort();
        subnet_ids.dedup();
        Self {
            vpc_id: vpc_id.into(),
            subnet_ids,
        }
    }
}

/// A default network as reported by an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultNetwork {
    pub vpc_id: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
}

/// Source of default network information for a region.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkInventory: Send + Sync {
    /// The default VPC of `region`, or `None` if the account has none.
    async fn default_network(&self, region: &str) -> IacResult<Option<DefaultNetwork>>;
}

/// Inventory backed by a static map, usually loaded from a YAML file.
///
/// ```yaml
/// regions:
///   us-east-1:
///     vpc_id: vpc-0a1b2c
///     subnet_ids: [subnet-1, subnet-2]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticInventory {
    #[serde(default)]
    pub regions: BTreeMap<String, DefaultNetwork>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(
        mut self,
        region: impl Into<String>,
        vpc_id: impl Into<String>,
        subnet_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.regions.insert(
            region.into(),
            DefaultNetwork {
                vpc_id: vpc_id.into(),
                subnet_ids: subnet_ids.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn from_yaml(content: &str) -> IacResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn read(path: impl AsRef<Path>) -> IacResult<Self> {
        let path = path.as_ref();
        debug!("Reading network inventory from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[async_trait]
impl NetworkInventory for StaticInventory {
    async fn default_network(&self, region: &str) -> IacResult<Option<DefaultNetwork>> {
        Ok(self.regions.get(region).cloned())
    }
}

/// Resolves the network once per planning pass.
///
/// The first successful resolution is cached; later calls return the same
/// `Arc` without consulting the inventory again.
pub struct NetworkResolver {
    inventory: Arc<dyn NetworkInventory>,
    explicit: Option<ExplicitNetwork>,
    cache: Mutex<Option<Arc<NetworkContext>>>,
}

impl NetworkResolver {
    pub fn new(inventory: Arc<dyn NetworkInventory>) -> Self {
        Self {
            inventory,
            explicit: None,
            cache: Mutex::new(None),
        }
    }

    /// Use this network instead of the default one.
    pub fn with_explicit(mut self, explicit: Option<ExplicitNetwork>) -> Self {
        self.explicit = explicit;
        self
    }

    pub async fn resolve(&self, region: &str) -> IacResult<Arc<NetworkContext>> {
        if let Some(cached) = self.cache.lock().as_ref() {
            return Ok(Arc::clone(cached));
        }

        let context = match &self.explicit {
            Some(explicit) => {
                info!("Using explicit network {}", explicit.vpc_id);
                NetworkContext::new(explicit.vpc_id.clone(), explicit.subnet_ids.clone())
            }
            None => self.lookup_default(region).await?,
        };

        if context.subnet_ids.is_empty() {
            return Err(IacError::resolution(
                format!("vpc {}", context.vpc_id),
                "no subnets available to place the warehouse in",
            ));
        }

        let mut cache = self.cache.lock();
        let resolved = cache.get_or_insert_with(|| Arc::new(context));
        Ok(Arc::clone(resolved))
    }

    async fn lookup_default(&self, region: &str) -> IacResult<NetworkContext> {
        info!("Resolving default VPC in {}", region);
        let network = self
            .inventory
            .default_network(region)
            .await?
            .ok_or_else(|| {
                IacError::resolution(
                    "default-vpc",
                    format!("region {} has no default VPC", region),
                )
            })?;

        debug!(
            "Default VPC {} has {} subnets",
            network.vpc_id,
            network.subnet_ids.len()
        );
        Ok(NetworkContext::new(network.vpc_id, network.subnet_ids))
    }
}
