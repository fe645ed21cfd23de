//! Sales-forecast experiment runner.
//!
//! Reads the competition tables, builds monthly (store, item, year, month,
//! category) features, fits a random forest and writes a timestamped
//! submission file. Scores are recorded separately through the ledger.

pub mod data;
pub mod experiment;
pub mod features;
pub mod forest;
pub mod submission;

pub use data::InputTables;
pub use experiment::{format_outcome, record_command, ExperimentOutcome, ExperimentRunner};
pub use features::{TrainingSet, FEATURE_COLUMNS};
pub use forest::{RandomForest, RandomForestTrainer, Regressor, Trainer};
pub use submission::PredictionStats;
