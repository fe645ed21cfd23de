pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod runner;

pub use config::{AppConfig, DEFAULT_BASELINE_SCORE};
pub use error::{Result, ScorebookError};
pub use ledger::{
    compare_scores, EntryDetails, ImprovementBand, ImprovementSummary, JsonFileStore,
    MemoryStore, RankedScore, ScoreEntry, ScoreLedger, ScoreStore,
};
pub use runner::{ExperimentOutcome, ExperimentRunner, RandomForestTrainer, Regressor, Trainer};
