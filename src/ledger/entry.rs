//! Score entries and the comparison metrics derived from them.
//!
//! Scores are loss-like: lower is better, so an improvement is
//! `reference - current` and a positive rate means the score went down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScorebookError};

/// One recorded experiment submission with its comparison metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Time the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Score returned by the competition site
    pub current_score: f64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub features_used: String,
    #[serde(default)]
    pub notes: String,
    /// Score of the preceding entry, or the baseline for the first entry
    pub previous_score: f64,
    /// previous_score - current_score
    pub improvement: f64,
    /// improvement as a percentage of previous_score
    pub improvement_rate: f64,
    /// baseline - current_score
    pub baseline_improvement: f64,
    /// baseline_improvement as a percentage of the baseline
    pub baseline_improvement_rate: f64,
}

/// Free-text description attached to a recorded score
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDetails {
    pub model_name: String,
    pub features_used: String,
    pub notes: String,
}

impl EntryDetails {
    pub fn new(
        model_name: impl Into<String>,
        features_used: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            features_used: features_used.into(),
            notes: notes.into(),
        }
    }
}

impl ScoreEntry {
    /// Build an entry, deriving both comparison pairs.
    ///
    /// Fails with [`ScorebookError::ZeroReference`] when either reference
    /// score is zero, since the rate would be a division by zero.
    pub fn new(
        current_score: f64,
        previous_score: f64,
        baseline_score: f64,
        details: EntryDetails,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        if !current_score.is_finite() {
            return Err(ScorebookError::Validation(format!(
                "score must be a finite number, got {current_score}"
            )));
        }

        let (improvement, improvement_rate) =
            improvement_against(previous_score, current_score, "previous")?;
        let (baseline_improvement, baseline_improvement_rate) =
            improvement_against(baseline_score, current_score, "baseline")?;

        Ok(Self {
            timestamp,
            current_score,
            model_name: details.model_name,
            features_used: details.features_used,
            notes: details.notes,
            previous_score,
            improvement,
            improvement_rate,
            baseline_improvement,
            baseline_improvement_rate,
        })
    }

    /// Qualitative band of the improvement over the previous entry
    pub fn band(&self) -> ImprovementBand {
        ImprovementBand::from_rate(self.improvement_rate)
    }
}

/// Absolute and percentage improvement of `current` relative to `reference`
pub fn improvement_against(reference: f64, current: f64, label: &str) -> Result<(f64, f64)> {
    if reference == 0.0 {
        return Err(ScorebookError::ZeroReference {
            label: label.to_string(),
        });
    }
    let improvement = reference - current;
    Ok((improvement, improvement / reference * 100.0))
}

/// Qualitative label for an improvement rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprovementBand {
    /// More than 5%
    Large,
    /// More than 2%
    Good,
    /// Above zero
    Slight,
    NoChange,
    Regressed,
}

impl ImprovementBand {
    pub fn from_rate(rate: f64) -> Self {
        if rate > 5.0 {
            Self::Large
        } else if rate > 2.0 {
            Self::Good
        } else if rate > 0.0 {
            Self::Slight
        } else if rate == 0.0 {
            Self::NoChange
        } else {
            Self::Regressed
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Large => "🎉",
            Self::Good => "👍",
            Self::Slight => "📈",
            Self::NoChange => "➖",
            Self::Regressed => "❌",
        }
    }
}

impl fmt::Display for ImprovementBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Large => "large improvement",
            Self::Good => "good improvement",
            Self::Slight => "slight improvement",
            Self::NoChange => "no change",
            Self::Regressed => "regressed",
        };
        write!(f, "{label}")
    }
}
