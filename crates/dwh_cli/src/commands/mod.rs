//! CLI command definitions.
//!
//! Every subcommand reads the same deployment inputs (see [`DeploymentArgs`])
//! and works on the resulting plan. Nothing here talks to a cloud API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use dwh_config::{keys, DeploymentConfig, DeploymentFile, WarehousePlatform};
use dwh_iac::{DeploymentPipeline, DeploymentPlan, StaticInventory};

pub mod plan;
pub mod render;
pub mod simulate;
pub mod validate;

/// dwhforge - declarative data warehouse provisioning
#[derive(Parser)]
#[command(name = "dwh")]
#[command(version, about = "dwhforge - declarative data warehouse provisioning")]
#[command(long_about = r#"
dwhforge declares the cloud resources of a data warehouse (Redshift,
Redshift Serverless, Synapse or BigQuery) as a dependency graph and renders
it for a provisioning engine.

WORKFLOWS:
  validate  → Check a deployment file for errors and insecure defaults
  plan      → Show the declared resources, their order and outputs
  render    → Write the plan as a Terraform module
  simulate  → Walk the plan in dependency order with injected failures

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the resource plan for a deployment
    Plan(plan::PlanArgs),

    /// Render the plan as Terraform files
    Render(render::RenderArgs),

    /// Validate a deployment file
    Validate(validate::ValidateArgs),

    /// Simulate reconciliation of the plan
    Simulate(simulate::SimulateArgs),
}

/// Inputs shared by every command.
#[derive(Args, Debug, Clone)]
pub struct DeploymentArgs {
    /// Deployment file (YAML, or TOML by extension)
    #[arg(short, long, default_value = "deploy.yaml")]
    pub file: PathBuf,

    /// Network inventory file listing default VPCs per region
    #[arg(short, long)]
    pub inventory: Option<PathBuf>,

    /// Override the platform named in the deployment file
    #[arg(long)]
    pub platform: Option<WarehousePlatform>,

    /// Override a configuration key (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Database admin password, kept out of the deployment file
    #[arg(long, env = "DWH_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
}

impl DeploymentArgs {
    /// Read the deployment file and apply command-line overrides.
    pub fn load_config(&self) -> Result<DeploymentConfig> {
        let mut file = DeploymentFile::read(&self.file)
            .with_context(|| format!("Failed to load deployment file {:?}", self.file))?;

        if let Some(platform) = self.platform {
            debug!("Platform overridden to {}", platform);
            file.platform = platform;
        }
        file.apply_overrides(&self.overrides)?;
        if let Some(password) = &self.db_password {
            file.config.set_secret(keys::DB_PASSWORD, password.as_str());
        }

        Ok(file.into_config()?)
    }

    /// Build the plan for this deployment.
    pub async fn plan(&self) -> Result<DeploymentPlan> {
        let config = self.load_config()?;

        let inventory = match &self.inventory {
            Some(path) => StaticInventory::read(path)
                .with_context(|| format!("Failed to read network inventory {:?}", path))?,
            None => StaticInventory::new(),
        };

        let plan = DeploymentPipeline::new(Arc::new(inventory))
            .plan(&config)
            .await?;
        info!(
            "{} plan: {} resources, {} outputs",
            plan.platform,
            plan.graph.len(),
            plan.outputs.len()
        );
        Ok(plan)
    }
}
