//! dwhforge CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dwh_config::ConfigError;
use dwh_iac::IacError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const IAC_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "dwh=debug"
    } else if cli.quiet {
        "dwh=warn"
    } else {
        "dwh=info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr so plan output on stdout stays machine-readable.
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Plan(args) => commands::plan::execute(args).await,
        Commands::Render(args) => commands::render::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Simulate(args) => commands::simulate::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<IacError>() {
            return match err {
                IacError::Validation { .. } => ExitCodes::VALIDATION_FAILURE,
                IacError::Config(inner) => categorize_config_error(inner),
                _ => ExitCodes::IAC_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<ConfigError>() {
            return categorize_config_error(err);
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

fn categorize_config_error(err: &ConfigError) -> u8 {
    match err {
        ConfigError::NotFound(_) | ConfigError::Io(_) | ConfigError::UnsupportedPlatform(_) => {
            ExitCodes::INVALID_ARGS
        }
        _ => ExitCodes::VALIDATION_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_categorize_typed_errors() {
        let validation: anyhow::Error = IacError::Validation {
            resource: "configuration".to_string(),
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(categorize_error(&validation), ExitCodes::VALIDATION_FAILURE);

        let resolution: anyhow::Error = IacError::Resolution {
            resource: "default-vpc".to_string(),
            message: "none".to_string(),
        }
        .into();
        assert_eq!(categorize_error(&resolution), ExitCodes::IAC_ERROR);

        let missing: anyhow::Error =
            ConfigError::NotFound(PathBuf::from("deploy.yaml")).into();
        assert_eq!(categorize_error(&missing), ExitCodes::INVALID_ARGS);
    }

    #[test]
    fn test_categorize_through_context() {
        let err = anyhow::Error::from(ConfigError::MissingKey("dbPassword".to_string()))
            .context("Failed to load deployment");
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);
    }

    #[test]
    fn test_categorize_untyped() {
        assert_eq!(
            categorize_error(&anyhow::anyhow!("something broke")),
            ExitCodes::GENERAL_ERROR
        );
    }
}
