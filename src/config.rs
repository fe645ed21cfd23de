use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Score of the plain linear-regression submission every experiment is measured against
pub const DEFAULT_BASELINE_SCORE: f64 = 3.9937572546850784;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub runner: RunnerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JSON file holding the score history
    pub path: PathBuf,
    /// Fixed reference score for baseline comparisons
    #[serde(default = "default_baseline_score")]
    pub baseline_score: f64,
}

fn default_baseline_score() -> f64 {
    DEFAULT_BASELINE_SCORE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/score_history.json"),
            baseline_score: DEFAULT_BASELINE_SCORE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Directory containing the input CSV tables
    pub data_dir: PathBuf,
    /// Directory the submission file is written to
    pub submissions_dir: PathBuf,
    /// Suffix appended to the timestamped submission file name
    pub submission_tag: String,
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Seed for bootstrap sampling
    pub random_state: u64,
    /// Worker threads for tree construction (None = all cores)
    #[serde(default)]
    pub n_jobs: Option<usize>,
    /// Year assigned to every test row
    pub forecast_year: i32,
    /// Month assigned to every test row
    pub forecast_month: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            submissions_dir: PathBuf::from("submissions"),
            submission_tag: "Exercises3_Challenge_rf75_optimal".to_string(),
            n_estimators: 75,
            random_state: 42,
            n_jobs: None,
            forecast_year: 2022,
            forecast_month: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            runner: RunnerConfig::default(),
            logging: LoggingConfig {
                level: default_log_level(),
                json: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        let defaults = AppConfig::default();

        let builder = Config::builder()
            // Start with default values
            .set_default("ledger.path", defaults.ledger.path.to_string_lossy().to_string())?
            .set_default("ledger.baseline_score", defaults.ledger.baseline_score)?
            .set_default(
                "runner.data_dir",
                defaults.runner.data_dir.to_string_lossy().to_string(),
            )?
            .set_default(
                "runner.submissions_dir",
                defaults.runner.submissions_dir.to_string_lossy().to_string(),
            )?
            .set_default("runner.submission_tag", defaults.runner.submission_tag)?
            .set_default("runner.n_estimators", defaults.runner.n_estimators as i64)?
            .set_default("runner.random_state", defaults.runner.random_state as i64)?
            .set_default("runner.forecast_year", defaults.runner.forecast_year as i64)?
            .set_default("runner.forecast_month", defaults.runner.forecast_month as i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/ci.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SCOREBOOK_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SCOREBOOK__LEDGER__PATH, etc.)
            .add_source(
                Environment::with_prefix("SCOREBOOK")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.ledger.baseline_score.is_finite() || self.ledger.baseline_score == 0.0 {
            errors.push(format!(
                "baseline_score must be finite and non-zero, got {}",
                self.ledger.baseline_score
            ));
        }

        if self.runner.n_estimators == 0 {
            errors.push("n_estimators must be at least 1".to_string());
        }

        if self.runner.n_jobs == Some(0) {
            errors.push("n_jobs must be at least 1 when set".to_string());
        }

        if !(1..=12).contains(&self.runner.forecast_month) {
            errors.push(format!(
                "forecast_month must be between 1 and 12, got {}",
                self.runner.forecast_month
            ));
        }

        if self.runner.submission_tag.trim().is_empty() {
            errors.push("submission_tag must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
