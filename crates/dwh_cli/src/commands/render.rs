//! Render command - Write the plan as a Terraform module.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use dwh_iac::TerraformRenderer;

use super::DeploymentArgs;

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Output directory for the Terraform files
    #[arg(short, long, default_value = "infrastructure")]
    pub out: PathBuf,
}

pub async fn execute(args: RenderArgs) -> Result<()> {
    let plan = args.deployment.plan().await?;

    let written = TerraformRenderer::new()
        .write(&plan, &args.out)
        .with_context(|| format!("Failed to render Terraform into {:?}", args.out))?;
    info!("Rendered {} files", written.len());

    println!("🏗️  Terraform module written to {}", args.out.display());
    for path in &written {
        println!("   {}", path.display());
    }
    if plan.graph.resources().any(|r| r.properties.values().any(|v| v.contains_secret())) {
        println!();
        println!("Secrets are read from sensitive variables; supply them with TF_VAR_<name>.");
    }
    Ok(())
}
