//! Scorebook CLI
//!
//! Commands:
//! - `scorebook record`  - Record a competition score
//! - `scorebook compare` - Rank labelled scores
//! - `scorebook summary` - Print the improvement history
//! - `scorebook history` - List recorded entries
//! - `scorebook best`    - Show the best recorded entry
//! - `scorebook run`     - Train the forest and write a submission
//! - `scorebook config`  - Show or validate configuration

pub mod config;
pub mod ledger;
pub mod output;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

/// Experiment score ledger and sales-forecast runner
#[derive(Parser, Debug)]
#[command(name = "scorebook")]
#[command(author, version, about = "Experiment score ledger and sales-forecast runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true, default_value = "config", env = "SCOREBOOK_CONFIG_DIR")]
    pub config: PathBuf,

    /// Score history file (overrides ledger.path)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Baseline score (overrides ledger.baseline_score)
    #[arg(long, global = true)]
    pub baseline: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a score returned by the competition site
    Record {
        /// Score (lower is better)
        #[arg(allow_negative_numbers = true)]
        score: f64,
        /// Model description
        #[arg(short, long, default_value = "")]
        model: String,
        /// Features used
        #[arg(short, long, default_value = "")]
        features: String,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Rank labelled scores, best first
    Compare {
        /// Scores as NAME=SCORE
        #[arg(value_parser = ledger::parse_labelled_score)]
        scores: Vec<(String, f64)>,
        /// Include every recorded entry
        #[arg(long)]
        with_history: bool,
        /// Include the baseline score
        #[arg(long)]
        with_baseline: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the improvement history and best score
    Summary,

    /// List recorded entries
    History {
        /// Show only the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the best recorded entry
    Best {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Train the forest and write a submission file
    Run {
        /// Input data directory (overrides runner.data_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Output directory (overrides runner.submissions_dir)
        #[arg(long)]
        submissions_dir: Option<PathBuf>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

impl Cli {
    /// Load configuration and apply command-line overrides
    pub fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config)?;
        if let Some(path) = &self.ledger {
            config.ledger.path = path.clone();
        }
        if let Some(baseline) = self.baseline {
            config.ledger.baseline_score = baseline;
        }
        Ok(config)
    }

    /// Commands that do real work log at info level; reports stay quiet
    pub fn is_long_running(&self) -> bool {
        matches!(self.command, Commands::Run { .. })
    }

    pub fn run(self, config: AppConfig) -> anyhow::Result<()> {
        match self.command {
            Commands::Record {
                score,
                model,
                features,
                notes,
            } => ledger::record(&config, score, model, features, notes),
            Commands::Compare {
                scores,
                with_history,
                with_baseline,
                json,
            } => ledger::compare(&config, scores, with_history, with_baseline, json),
            Commands::Summary => ledger::summary(&config),
            Commands::History { limit, json } => ledger::history(&config, limit, json),
            Commands::Best { json } => ledger::best(&config, json),
            Commands::Run {
                data_dir,
                submissions_dir,
                json,
            } => run::run(config, data_dir, submissions_dir, json),
            Commands::Config(cmd) => cmd.run(&config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_arguments() {
        let cli = Cli::try_parse_from([
            "scorebook",
            "record",
            "3.07256739424164",
            "--model",
            "RandomForestRegressor (n_estimators=100)",
            "--notes",
            "best so far",
        ])
        .unwrap();

        match cli.command {
            Commands::Record {
                score,
                model,
                features,
                notes,
            } => {
                assert_eq!(score, 3.07256739424164);
                assert_eq!(model, "RandomForestRegressor (n_estimators=100)");
                assert!(features.is_empty());
                assert_eq!(notes, "best so far");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_compare_parses_labelled_scores() {
        let cli =
            Cli::try_parse_from(["scorebook", "compare", "a=3.99", "b=3.5", "--with-baseline"])
                .unwrap();
        match cli.command {
            Commands::Compare {
                scores,
                with_baseline,
                ..
            } => {
                assert_eq!(scores, vec![("a".to_string(), 3.99), ("b".to_string(), 3.5)]);
                assert!(with_baseline);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scorebook",
            "summary",
            "--ledger",
            "/tmp/h.json",
            "--baseline",
            "4.0",
        ])
        .unwrap();
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/h.json")));
        assert_eq!(cli.baseline, Some(4.0));
    }

    #[test]
    fn test_bad_labelled_score_is_rejected() {
        assert!(Cli::try_parse_from(["scorebook", "compare", "a:3.5"]).is_err());
    }

    #[test]
    fn test_overrides_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "scorebook",
            "summary",
            "--config",
            "conf/ci",
            "--ledger",
            "scores.json",
            "--baseline",
            "4.0",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("conf/ci"));
        assert_eq!(cli.ledger, Some(PathBuf::from("scores.json")));
        assert_eq!(cli.baseline, Some(4.0));

        let cli = Cli::try_parse_from(["scorebook", "--config", "conf/ci", "summary"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("conf/ci"));
    }
}
