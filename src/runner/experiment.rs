use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use super::data::InputTables;
use super::features::{build_test_features, build_training_set, FEATURE_COLUMNS};
use super::forest::{RandomForestTrainer, Regressor, Trainer};
use super::submission::{
    clip_negative, submission_file_name, write_submission, PredictionStats,
};
use crate::config::RunnerConfig;
use crate::error::Result;

/// One train / predict / write pass over the input tables
pub struct ExperimentRunner<T: Trainer> {
    config: RunnerConfig,
    trainer: T,
}

/// Everything the run report needs
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentOutcome {
    pub model_name: String,
    pub submission_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_count: usize,
    #[serde(with = "duration_secs")]
    pub training_time: Duration,
    #[serde(with = "duration_secs")]
    pub prediction_time: Duration,
    pub clipped_predictions: usize,
    pub stats: Option<PredictionStats>,
    pub importances: Vec<(String, f64)>,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

impl ExperimentRunner<RandomForestTrainer> {
    /// Runner with the forest configured from `config`
    pub fn from_config(config: RunnerConfig) -> Self {
        let trainer = RandomForestTrainer::new(config.n_estimators, config.random_state)
            .with_n_jobs(config.n_jobs);
        Self::new(config, trainer)
    }
}

impl<T: Trainer> ExperimentRunner<T> {
    pub fn new(config: RunnerConfig, trainer: T) -> Self {
        Self { config, trainer }
    }

    /// Load, train, predict and write the submission.
    ///
    /// All input tables are loaded before anything is written, so a missing
    /// file leaves no output behind.
    pub fn run(&self) -> Result<ExperimentOutcome> {
        let tables = InputTables::load(&self.config.data_dir)?;

        let training = build_training_set(&tables.sales, &tables.item_categories)?;
        let test_features = build_test_features(
            &tables.test,
            &tables.item_categories,
            self.config.forecast_year,
            self.config.forecast_month,
        );
        info!(
            "Training set: {} x {}, test set: {} x {}",
            training.features.len(),
            FEATURE_COLUMNS.len(),
            test_features.len(),
            FEATURE_COLUMNS.len()
        );

        let model_name = self.trainer.describe();
        info!("🌳 Training {}", model_name);
        let started = Instant::now();
        let model = self.trainer.fit(&training.features, &training.targets)?;
        let training_time = started.elapsed();

        let started = Instant::now();
        let mut predictions = model.predict(&test_features)?;
        let prediction_time = started.elapsed();
        let clipped_predictions = clip_negative(&mut predictions);

        let file_name = submission_file_name(&Local::now(), &self.config.submission_tag);
        let submission_path = write_submission(
            &self.config.submissions_dir,
            &file_name,
            &tables.submission_template,
            &predictions,
        )?;

        let importances = FEATURE_COLUMNS
            .iter()
            .zip(model.feature_importances())
            .map(|(name, value)| (name.to_string(), *value))
            .collect();

        Ok(ExperimentOutcome {
            model_name,
            submission_path,
            train_rows: training.features.len(),
            test_rows: test_features.len(),
            feature_count: FEATURE_COLUMNS.len(),
            training_time,
            prediction_time,
            clipped_predictions,
            stats: PredictionStats::from_values(&predictions),
            importances,
        })
    }
}

/// Run report printed by `scorebook run`
pub fn format_outcome(outcome: &ExperimentOutcome) -> String {
    let mut output = String::new();
    let rule = "=".repeat(70);

    output.push_str(&format!("{rule}\n📋 Experiment summary\n{rule}\n"));
    output.push_str(&format!("  Model:            {}\n", outcome.model_name));
    output.push_str(&format!(
        "  Features:         {} ({})\n",
        outcome.feature_count,
        FEATURE_COLUMNS.join(", ")
    ));
    output.push_str(&format!(
        "  Rows:             {} train / {} test\n",
        outcome.train_rows, outcome.test_rows
    ));
    output.push_str(&format!(
        "  Training time:    {:.2}s\n",
        outcome.training_time.as_secs_f64()
    ));
    output.push_str(&format!(
        "  Prediction time:  {:.3}s\n",
        outcome.prediction_time.as_secs_f64()
    ));

    if let Some(stats) = &outcome.stats {
        output.push_str(&format!(
            "  Predictions:      {:.2} ~ {:.2} (mean {:.2}, std {:.2})\n",
            stats.min, stats.max, stats.mean, stats.std
        ));
    }
    if outcome.clipped_predictions > 0 {
        output.push_str(&format!(
            "  Clipped to zero:  {}\n",
            outcome.clipped_predictions
        ));
    }

    output.push_str("\n  ── Feature importance ──────────────────────────────\n\n");
    for (name, value) in &outcome.importances {
        output.push_str(&format!("  {:<16} {:.4}\n", name, value));
    }

    output.push_str(&format!(
        "\n  Submission:       {}\n",
        outcome.submission_path.display()
    ));
    output.push_str(&format!("{rule}\n"));
    output
}

/// Command to record the score once the submission has been evaluated
pub fn record_command(outcome: &ExperimentOutcome) -> String {
    let file_name = outcome
        .submission_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!(
        "scorebook record <SCORE> --model \"{}\" --features \"{}\" --notes \"{}\"",
        outcome.model_name,
        FEATURE_COLUMNS.join(", "),
        file_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScorebookError;

    struct ConstantModel {
        value: f64,
        importances: Vec<f64>,
    }

    impl Regressor for ConstantModel {
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
            Ok(vec![self.value; rows.len()])
        }

        fn feature_importances(&self) -> &[f64] {
            &self.importances
        }
    }

    struct ConstantTrainer(f64);

    impl Trainer for ConstantTrainer {
        type Model = ConstantModel;

        fn fit(&self, _features: &[Vec<f64>], _targets: &[f64]) -> Result<ConstantModel> {
            Ok(ConstantModel {
                value: self.0,
                importances: vec![0.2; 5],
            })
        }

        fn describe(&self) -> String {
            "constant".to_string()
        }
    }

    fn write_inputs(dir: &std::path::Path) {
        std::fs::write(
            dir.join("sales_history.csv"),
            "日付,店舗ID,商品ID,商品価格,売上個数\n2022-10-01,1,100,300,2\n2022-11-02,1,100,300,3\n",
        )
        .unwrap();
        std::fs::write(dir.join("item_categories.csv"), "商品ID,商品カテゴリID\n100,10\n").unwrap();
        std::fs::write(dir.join("category_names.csv"), "商品カテゴリID,商品カテゴリ名\n10,食品\n")
            .unwrap();
        std::fs::write(dir.join("test.csv"), "index,商品ID,店舗ID\n0,100,1\n1,100,2\n").unwrap();
        std::fs::write(dir.join("sample_submission.csv"), "0,0\n1,0\n").unwrap();
    }

    fn config(root: &std::path::Path) -> RunnerConfig {
        RunnerConfig {
            data_dir: root.join("data"),
            submissions_dir: root.join("submissions"),
            submission_tag: "test".to_string(),
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn test_negative_predictions_are_clipped_in_output() {
        let root = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("data")).unwrap();
        write_inputs(&root.path().join("data"));

        let runner = ExperimentRunner::new(config(root.path()), ConstantTrainer(-1.0));
        let outcome = runner.run().unwrap();

        assert_eq!(outcome.clipped_predictions, 2);
        assert_eq!(outcome.train_rows, 2);
        let content = std::fs::read_to_string(&outcome.submission_path).unwrap();
        assert_eq!(content, "0,0\n1,0\n");
        assert!(outcome
            .submission_path
            .to_string_lossy()
            .ends_with("_test.csv"));
    }

    #[test]
    fn test_missing_input_produces_no_output() {
        let root = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("data")).unwrap();
        write_inputs(&root.path().join("data"));
        std::fs::remove_file(root.path().join("data/test.csv")).unwrap();

        let runner = ExperimentRunner::new(config(root.path()), ConstantTrainer(1.0));
        let err = runner.run().unwrap_err();

        assert!(matches!(err, ScorebookError::MissingInput { .. }));
        assert!(!root.path().join("submissions").exists());
    }

    #[test]
    fn test_report_and_record_command() {
        let root = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("data")).unwrap();
        write_inputs(&root.path().join("data"));

        let outcome = ExperimentRunner::new(config(root.path()), ConstantTrainer(2.0))
            .run()
            .unwrap();

        let report = format_outcome(&outcome);
        assert!(report.contains("constant"));
        assert!(report.contains("商品カテゴリID"));
        assert!(report.contains("2.00 ~ 2.00"));

        let command = record_command(&outcome);
        assert!(command.starts_with("scorebook record <SCORE> --model \"constant\""));
        assert!(command.contains("_test.csv"));
    }
}
