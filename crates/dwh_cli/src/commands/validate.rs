//! Validate command - Check a deployment file.

use anyhow::Result;
use clap::Args;
use tracing::info;

use dwh_config::ConfigValidator;

use super::DeploymentArgs;

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let config = args.deployment.load_config()?;
    info!("Validating {} deployment", config.platform);

    println!("📋 Validating {} configuration...", config.platform);
    let result = ConfigValidator::validate(&config)?;

    if result.valid {
        println!("   ✅ Configuration is valid");
    } else {
        println!("   ❌ Configuration is invalid:");
        for error in &result.errors {
            println!("      - {}", error);
        }
    }
    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }

    if !result.valid {
        anyhow::bail!("Validation failed with {} error(s)", result.errors.len());
    }
    if args.strict && !result.warnings.is_empty() {
        anyhow::bail!(
            "Validation failed: {} warning(s) in strict mode",
            result.warnings.len()
        );
    }
    Ok(())
}
