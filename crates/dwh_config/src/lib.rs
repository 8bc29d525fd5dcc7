//! # dwh_config
//!
//! Deployment configuration for dwhforge.
//!
//! Every value a deployment can override lives here, together with its
//! default. Input is read from a deployment file (YAML or TOML) into a
//! [`ConfigStore`], then resolved into a typed [`DeploymentConfig`] for one
//! [`WarehousePlatform`]. Malformed input is rejected during that resolution,
//! before any resource is declared.
//!
//! ## Secrets
//!
//! Secret values are written `{ secure: "..." }` in deployment files and held
//! as [`SecretString`]. A plain-text value under a secret key is an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dwh_config::{ConfigValidator, DeploymentFile};
//!
//! let file = DeploymentFile::read("deploy.yaml").unwrap();
//! let config = file.into_config().unwrap();
//!
//! let result = ConfigValidator::validate(&config).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

pub mod compute;
pub mod defaults;
pub mod deployment;
pub mod error;
pub mod keys;
pub mod naming;
pub mod net;
pub mod platform;
pub mod reader;
pub mod secret;
pub mod store;
pub mod validator;

pub use compute::{ClusterTopology, RpuCapacity};
pub use deployment::{
    default_event_schema, BigQuerySettings, ClusterSettings, ColumnSchema, DeploymentConfig,
    ExplicitNetwork, ServerlessSettings, SparkPoolSettings, SynapseSettings,
};
pub use error::{ConfigError, ConfigResult};
pub use net::{Cidr, IpRange};
pub use platform::{CloudProvider, DeploymentProfile, WarehousePlatform};
pub use reader::DeploymentFile;
pub use secret::SecretString;
pub use store::{ConfigStore, ConfigValue};
pub use validator::{ConfigValidator, ValidationResult};
