//! Compute sizing inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults::{BASE_CAPACITY, MAX_BASE_CAPACITY, MIN_BASE_CAPACITY};
use crate::error::{ConfigError, ConfigResult};
use crate::keys;

/// Serverless base capacity in Redshift Processing Units, bounded to 8..=512.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RpuCapacity(u32);

impl RpuCapacity {
    pub const DEFAULT: RpuCapacity = RpuCapacity(BASE_CAPACITY);

    pub fn new(units: u32) -> ConfigResult<Self> {
        if !(MIN_BASE_CAPACITY..=MAX_BASE_CAPACITY).contains(&units) {
            return Err(ConfigError::invalid(
                keys::BASE_CAPACITY,
                format!(
                    "{} RPU is outside the accepted range {}-{}",
                    units, MIN_BASE_CAPACITY, MAX_BASE_CAPACITY
                ),
            ));
        }
        Ok(Self(units))
    }

    pub fn units(&self) -> u32 {
        self.0
    }
}

impl<'de> Deserialize<'de> for RpuCapacity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = u32::deserialize(deserializer)?;
        RpuCapacity::new(units).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for RpuCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} RPU", self.0)
    }
}

/// Provisioned cluster topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ClusterTopology {
    #[default]
    SingleNode,
    MultiNode { nodes: u32 },
}

impl ClusterTopology {
    /// Resolve from the `clusterType` and `numberOfNodes` keys.
    pub fn from_parts(cluster_type: Option<&str>, nodes: Option<u32>) -> ConfigResult<Self> {
        match cluster_type.unwrap_or("single-node") {
            "single-node" => match nodes {
                None | Some(1) => Ok(ClusterTopology::SingleNode),
                Some(n) => Err(ConfigError::invalid(
                    keys::NUMBER_OF_NODES,
                    format!("single-node clusters cannot have {} nodes", n),
                )),
            },
            "multi-node" => {
                let nodes = nodes.unwrap_or(2);
                if nodes < 2 {
                    return Err(ConfigError::invalid(
                        keys::NUMBER_OF_NODES,
                        format!("multi-node clusters need at least 2 nodes, got {}", nodes),
                    ));
                }
                Ok(ClusterTopology::MultiNode { nodes })
            }
            other => Err(ConfigError::invalid(
                keys::CLUSTER_TYPE,
                format!("'{}' is not single-node or multi-node", other),
            )),
        }
    }

    pub fn cluster_type(&self) -> &'static str {
        match self {
            ClusterTopology::SingleNode => "single-node",
            ClusterTopology::MultiNode { .. } => "multi-node",
        }
    }

    pub fn node_count(&self) -> u32 {
        match self {
            ClusterTopology::SingleNode => 1,
            ClusterTopology::MultiNode { nodes } => *nodes,
        }
    }
}
