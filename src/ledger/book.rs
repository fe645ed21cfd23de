use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::entry::{EntryDetails, ScoreEntry};
use super::store::ScoreStore;
use crate::error::Result;

/// Append-only score history with comparison metrics.
///
/// Every operation reloads the history from the store, so two ledgers over
/// the same file always see each other's writes (but do not lock).
pub struct ScoreLedger<S: ScoreStore> {
    store: S,
    baseline_score: f64,
}

/// A score's position in a comparison, best first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedScore {
    pub rank: usize,
    pub name: String,
    pub score: f64,
}

/// Stored history plus the best-ever entry
#[derive(Debug, Clone, PartialEq)]
pub struct ImprovementSummary {
    pub entries: Vec<ScoreEntry>,
    pub best: ScoreEntry,
}

impl<S: ScoreStore> ScoreLedger<S> {
    pub fn new(store: S, baseline_score: f64) -> Self {
        Self {
            store,
            baseline_score,
        }
    }

    pub fn baseline_score(&self) -> f64 {
        self.baseline_score
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a new score and persist the whole history.
    ///
    /// The previous score is the last entry's score, or the baseline when
    /// the history is empty. Nothing is written if the entry cannot be built.
    pub fn record_score(&self, current_score: f64, details: EntryDetails) -> Result<ScoreEntry> {
        let mut history = self.store.load()?;
        let previous_score = history
            .last()
            .map(|e| e.current_score)
            .unwrap_or(self.baseline_score);

        let entry = ScoreEntry::new(
            current_score,
            previous_score,
            self.baseline_score,
            details,
            Utc::now(),
        )?;

        history.push(entry.clone());
        self.store.save(&history)?;

        info!(
            "📝 Score recorded: {:.6} (prev {:.6}, {:+.2}%) | {} entries",
            entry.current_score,
            entry.previous_score,
            entry.improvement_rate,
            history.len()
        );

        Ok(entry)
    }

    /// Full stored history in insertion order
    pub fn history(&self) -> Result<Vec<ScoreEntry>> {
        self.store.load()
    }

    /// Entry with the lowest score; the earliest one wins ties
    pub fn best(&self) -> Result<Option<ScoreEntry>> {
        Ok(best_entry(&self.store.load()?).cloned())
    }

    /// History and best entry, or `None` when nothing has been recorded
    pub fn generate_improvement_summary(&self) -> Result<Option<ImprovementSummary>> {
        let entries = self.store.load()?;
        let Some(best) = best_entry(&entries).cloned() else {
            return Ok(None);
        };
        Ok(Some(ImprovementSummary { entries, best }))
    }
}

fn best_entry(entries: &[ScoreEntry]) -> Option<&ScoreEntry> {
    entries.iter().reduce(|best, e| {
        if e.current_score < best.current_score {
            e
        } else {
            best
        }
    })
}

/// Rank labelled scores ascending (lower is better).
///
/// The sort is stable, so equal scores keep their input order.
pub fn compare_scores<N: AsRef<str>>(scores: &[(N, f64)]) -> Vec<RankedScore> {
    let mut sorted: Vec<(&str, f64)> = scores.iter().map(|(n, s)| (n.as_ref(), *s)).collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, (name, score))| RankedScore {
            rank: i + 1,
            name: name.to_string(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScorebookError;
    use crate::ledger::store::{MemoryStore, MockScoreStore};

    const BASELINE: f64 = 3.9937572546850784;

    fn ledger() -> ScoreLedger<MemoryStore> {
        ScoreLedger::new(MemoryStore::new(), BASELINE)
    }

    fn details(model: &str) -> EntryDetails {
        EntryDetails::new(model, "店舗ID, 商品ID, 年, 月, 商品カテゴリID", "")
    }

    #[test]
    fn test_two_recordings_chain_previous_scores() {
        let ledger = ledger();

        let first = ledger.record_score(3.5, details("rf_100")).unwrap();
        assert_eq!(first.previous_score, BASELINE);
        assert!((first.improvement - 0.4937572546850784).abs() < 1e-12);
        assert!((first.improvement_rate - 12.36).abs() < 0.01);

        let second = ledger.record_score(3.45, details("rf_200")).unwrap();
        assert_eq!(second.previous_score, 3.5);
        assert!((second.improvement - 0.05).abs() < 1e-12);
        assert!((second.improvement_rate - 1.43).abs() < 0.01);
        assert!((second.baseline_improvement_rate - 13.615).abs() < 0.01);
        assert_eq!(
            second.baseline_improvement_rate,
            (BASELINE - 3.45) / BASELINE * 100.0
        );
    }

    #[test]
    fn test_previous_score_invariant_holds_for_every_entry() {
        let ledger = ledger();
        let scores = [3.8, 3.9, 3.2, 3.2, 3.07256739424164];
        for score in scores {
            ledger.record_score(score, EntryDetails::default()).unwrap();
        }

        let history = ledger.history().unwrap();
        assert_eq!(history.len(), scores.len());
        for (i, entry) in history.iter().enumerate() {
            assert_eq!(entry.current_score, scores[i]);
            let expected_prev = if i == 0 { BASELINE } else { scores[i - 1] };
            assert_eq!(entry.previous_score, expected_prev);
            assert_eq!(entry.improvement, entry.previous_score - entry.current_score);
            assert_eq!(
                entry.improvement_rate,
                entry.improvement / entry.previous_score * 100.0
            );
        }
    }

    #[test]
    fn test_zero_previous_score_leaves_history_untouched() {
        let ledger = ledger();
        ledger.record_score(0.0, EntryDetails::default()).unwrap();

        let err = ledger.record_score(1.0, EntryDetails::default()).unwrap_err();
        assert!(matches!(err, ScorebookError::ZeroReference { .. }));
        assert_eq!(ledger.history().unwrap().len(), 1);
    }

    #[test]
    fn test_best_returns_lowest_score() {
        let ledger = ledger();
        for score in [3.5, 3.45, 3.6] {
            ledger.record_score(score, EntryDetails::default()).unwrap();
        }
        assert_eq!(ledger.best().unwrap().unwrap().current_score, 3.45);
    }

    #[test]
    fn test_summary_of_empty_history_is_none() {
        assert!(ledger().generate_improvement_summary().unwrap().is_none());
    }

    #[test]
    fn test_summary_keeps_stored_order() {
        let ledger = ledger();
        for (score, model) in [(3.5, "a"), (3.45, "b"), (3.6, "c")] {
            ledger.record_score(score, details(model)).unwrap();
        }

        let summary = ledger.generate_improvement_summary().unwrap().unwrap();
        let models: Vec<_> = summary.entries.iter().map(|e| e.model_name.as_str()).collect();
        assert_eq!(models, ["a", "b", "c"]);
        assert_eq!(summary.best.model_name, "b");
    }

    #[test]
    fn test_compare_scores_ranks_ascending() {
        let ranked = compare_scores(&[("a", 3.99), ("b", 3.5), ("c", 3.45)]);
        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["c", "b", "a"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_compare_scores_keeps_input_order_for_ties() {
        let ranked = compare_scores(&[("first", 3.5), ("second", 3.5)]);
        assert_eq!(ranked[0].name, "first");
        assert_eq!(ranked[1].name, "second");
    }

    #[test]
    fn test_record_saves_full_history() {
        let mut store = MockScoreStore::new();
        let existing = ScoreEntry::new(3.5, BASELINE, BASELINE, EntryDetails::default(), Utc::now())
            .unwrap();
        let loaded = vec![existing];
        store.expect_load().times(1).return_once(move || Ok(loaded));
        store
            .expect_save()
            .withf(|entries| {
                entries.len() == 2
                    && entries[0].current_score == 3.5
                    && entries[1].previous_score == 3.5
            })
            .times(1)
            .returning(|_| Ok(()));

        let ledger = ScoreLedger::new(store, BASELINE);
        ledger.record_score(3.45, EntryDetails::default()).unwrap();
    }

    #[test]
    fn test_load_failure_propagates_without_saving() {
        let mut store = MockScoreStore::new();
        store.expect_load().returning(|| {
            Err(ScorebookError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });
        store.expect_save().never();

        let ledger = ScoreLedger::new(store, BASELINE);
        let err = ledger.record_score(3.45, EntryDetails::default()).unwrap_err();
        assert!(matches!(err, ScorebookError::Io(_)));
    }
}
