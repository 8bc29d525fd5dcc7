//! Network input values: CIDR blocks and IP address ranges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

/// An IPv4 CIDR block such as `203.0.113.0/24`.
///
/// Host bits must be zero; `203.0.113.7/24` is rejected rather than
/// silently widened or narrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Cidr {
    /// Parse a CIDR string, attributing any failure to `key`.
    pub fn parse(key: &str, value: &str) -> ConfigResult<Self> {
        let value = value.trim();
        let (addr, prefix) = value
            .split_once('/')
            .ok_or_else(|| ConfigError::invalid(key, format!("'{}' is missing a /prefix", value)))?;

        let network: Ipv4Addr = addr
            .parse()
            .map_err(|_| ConfigError::invalid(key, format!("'{}' is not an IPv4 address", addr)))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a prefix length", prefix)))?;

        if prefix > 32 {
            return Err(ConfigError::invalid(
                key,
                format!("prefix length {} exceeds 32", prefix),
            ));
        }

        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        if u32::from(network) & !mask != 0 {
            return Err(ConfigError::invalid(
                key,
                format!("'{}' has host bits set for a /{} block", value, prefix),
            ));
        }

        Ok(Self { network, prefix })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Whether this block covers the whole IPv4 address space.
    pub fn is_any(&self) -> bool {
        self.prefix == 0
    }
}

impl FromStr for Cidr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("cidr", s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An inclusive IPv4 address range used for data-plane firewall rules.
///
/// Start and end are always present together; a half-specified range cannot
/// be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl IpRange {
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> ConfigResult<Self> {
        if start > end {
            return Err(ConfigError::invalid(
                "allowedIpStart",
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    /// Build a range from two optional bounds, requiring both or neither.
    ///
    /// Blank strings count as absent.
    pub fn from_bounds(
        start_key: &str,
        start: Option<&str>,
        end_key: &str,
        end: Option<&str>,
    ) -> ConfigResult<Option<Self>> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());

        match (start, end) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::IncompleteRange {
                present: start_key.to_string(),
                missing: end_key.to_string(),
            }),
            (None, Some(_)) => Err(ConfigError::IncompleteRange {
                present: end_key.to_string(),
                missing: start_key.to_string(),
            }),
            (Some(start), Some(end)) => {
                let start: Ipv4Addr = start.parse().map_err(|_| {
                    ConfigError::invalid(start_key, format!("'{}' is not an IPv4 address", start))
                })?;
                let end: Ipv4Addr = end.parse().map_err(|_| {
                    ConfigError::invalid(end_key, format!("'{}' is not an IPv4 address", end))
                })?;
                Self::new(start, end).map(Some)
            }
        }
    }

    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    pub fn end(&self) -> Ipv4Addr {
        self.end
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
