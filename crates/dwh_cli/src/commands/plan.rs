//! Plan command - Show the declared resources of a deployment.

use anyhow::Result;
use clap::{Args, ValueEnum};

use dwh_iac::{DeploymentPlan, ExportValue};

use super::DeploymentArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    Json,
    Yaml,
    /// Graphviz dependency graph
    Dot,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn execute(args: PlanArgs) -> Result<()> {
    let plan = args.deployment.plan().await?;

    match args.format {
        OutputFormat::Text => print!("{}", summary(&plan)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&plan)?),
        OutputFormat::Dot => print!("{}", plan.graph.to_dot()),
    }
    Ok(())
}

fn summary(plan: &DeploymentPlan) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!(
        "📦 {} deployment ({} profile, {})\n\n",
        plan.platform, plan.profile, plan.region
    ));

    out.push_str("Resources (in creation order):\n");
    for (i, id) in plan.graph.execution_order()?.iter().enumerate() {
        let deps = plan.graph.direct_dependencies(id)?;
        if deps.is_empty() {
            out.push_str(&format!("  {:>2}. {}\n", i + 1, id));
        } else {
            let deps: Vec<String> = deps.iter().map(ToString::to_string).collect();
            out.push_str(&format!("  {:>2}. {}  ← {}\n", i + 1, id, deps.join(", ")));
        }
    }

    out.push_str("\nOutputs:\n");
    for (key, value) in plan.outputs.iter() {
        let value = match value {
            ExportValue::Literal(s) => format!("\"{}\"", s),
            ExportValue::Ref(r) => format!("<{}>", r),
            ExportValue::Concat(_) => "<computed>".to_string(),
        };
        out.push_str(&format!("  {} = {}\n", key, value));
    }

    if !plan.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &plan.warnings {
            out.push_str(&format!("  ⚠️  {}\n", warning));
        }
    }
    Ok(out)
}
