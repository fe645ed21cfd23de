//! Experiment score ledger
//!
//! Keeps an append-only history of competition scores and compares each new
//! score against the previous submission and a fixed baseline:
//! - JSON file persistence with full rewrite on every record
//! - Ranking of arbitrary labelled scores
//! - Improvement summary with best-ever lookup

pub mod book;
pub mod entry;
pub mod report;
pub mod store;

pub use book::{compare_scores, ImprovementSummary, RankedScore, ScoreLedger};
pub use entry::{EntryDetails, ImprovementBand, ScoreEntry};
pub use store::{JsonFileStore, MemoryStore, ScoreStore};
