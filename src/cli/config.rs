//! Configuration management commands
//!
//! scorebook config show     - Show the effective configuration
//! scorebook config validate - Validate configuration

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output;
use crate::config::AppConfig;

/// Configuration-related commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Validate configuration values
    Validate,
}

impl ConfigCommands {
    pub fn run(self, config: &AppConfig) -> Result<()> {
        match self {
            Self::Show => {
                show_config(config);
                Ok(())
            }
            Self::Validate => validate_config(config),
        }
    }
}

fn show_config(config: &AppConfig) {
    println!("[ledger]");
    println!("  path            = {}", config.ledger.path.display());
    println!("  baseline_score  = {}", config.ledger.baseline_score);
    println!("[runner]");
    println!("  data_dir        = {}", config.runner.data_dir.display());
    println!("  submissions_dir = {}", config.runner.submissions_dir.display());
    println!("  submission_tag  = {}", config.runner.submission_tag);
    println!("  n_estimators    = {}", config.runner.n_estimators);
    println!("  random_state    = {}", config.runner.random_state);
    match config.runner.n_jobs {
        Some(n) => println!("  n_jobs          = {n}"),
        None => println!("  n_jobs          = all cores"),
    }
    println!(
        "  forecast        = {}-{:02}",
        config.runner.forecast_year, config.runner.forecast_month
    );
    println!("[logging]");
    println!("  level           = {}", config.logging.level);
    println!("  json            = {}", config.logging.json);
}

fn validate_config(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            output::print_success("Configuration is valid");
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                output::print_error(&format!("  - {e}"));
            }
            bail!("{} configuration error(s)", errors.len())
        }
    }
}
