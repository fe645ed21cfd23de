//! `scorebook run`: one forest experiment over the competition tables.

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;

use super::output::{self, OutputMode};
use crate::config::AppConfig;
use crate::runner::{format_outcome, record_command, ExperimentRunner};

pub fn run(
    mut config: AppConfig,
    data_dir: Option<PathBuf>,
    submissions_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    if let Some(dir) = data_dir {
        config.runner.data_dir = dir;
    }
    if let Some(dir) = submissions_dir {
        config.runner.submissions_dir = dir;
    }
    if let Err(errors) = config.validate() {
        bail!("invalid configuration: {}", errors.join("; "));
    }

    info!("📁 Loading data from {:?}", config.runner.data_dir);
    let runner = ExperimentRunner::from_config(config.runner);
    let outcome = runner.run()?;

    let mode = OutputMode::from_json_flag(json);
    output::print_report(&outcome, &format_outcome(&outcome), mode)?;

    if mode == OutputMode::Table {
        println!("\n📝 After uploading the submission, record its score with:\n");
        println!("  {}\n", record_command(&outcome));
    }
    Ok(())
}
