//! Simulate command - Walk the plan in dependency order.
//!
//! Resources named with `--fail` are rejected by the simulated engine, which
//! shows exactly which dependents would be left unapplied.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use dwh_graph::{ReconcileStatus, ResourceId, ScriptedApplier};
use dwh_iac::{ensure_reconciled, simulate};

use super::DeploymentArgs;

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Resource to fail, as `kind.name` (repeatable)
    #[arg(long = "fail", value_name = "RESOURCE")]
    pub failures: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: SimulateArgs) -> Result<()> {
    let plan = args.deployment.plan().await?;

    let mut applier = ScriptedApplier::new();
    for failure in &args.failures {
        let id: ResourceId = failure
            .parse()
            .with_context(|| format!("Invalid --fail argument '{}'", failure))?;
        if !plan.graph.contains(&id) {
            anyhow::bail!("Resource not found in plan: {}", id);
        }
        applier = applier.fail_with(id, "injected failure");
    }

    let report = simulate(&plan, Arc::new(applier)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in &report.entries {
            let marker = match entry.status {
                ReconcileStatus::Applied => "✅",
                ReconcileStatus::Failed { .. } => "❌",
                ReconcileStatus::Skipped { .. } => "⏭️ ",
            };
            println!("{} {} {}", marker, entry.resource, entry.status);
        }
        println!();
        println!(
            "{} applied, {} failed, {} skipped",
            report.applied().len(),
            report.failed().len(),
            report.skipped().len()
        );
    }

    ensure_reconciled(&report)?;
    Ok(())
}
