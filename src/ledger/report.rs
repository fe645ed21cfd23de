//! Human-readable reports for the ledger operations.

use serde::Serialize;
use tabled::Tabled;

use super::book::{ImprovementSummary, RankedScore};
use super::entry::ScoreEntry;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Placeholder shown for entries recorded without a model name
pub const UNNAMED_MODEL: &str = "(unnamed model)";

/// Report printed after a score is recorded
pub fn format_record(entry: &ScoreEntry, baseline_score: f64) -> String {
    let mut output = String::new();

    output.push_str(RULE);
    output.push_str("\n📊 Score analysis\n");
    output.push_str(RULE);
    output.push('\n');
    output.push_str(&format!("  Baseline score:  {:.6}\n", baseline_score));
    output.push_str(&format!("  Previous score:  {:.6}\n", entry.previous_score));
    output.push_str(&format!("  Current score:   {:.6}\n", entry.current_score));
    output.push_str(&format!(
        "  vs previous:     {:+.6} ({:+.2}%)\n",
        entry.improvement, entry.improvement_rate
    ));
    output.push_str(&format!(
        "  vs baseline:     {:+.6} ({:+.2}%)\n",
        entry.baseline_improvement, entry.baseline_improvement_rate
    ));

    if !entry.model_name.is_empty() {
        output.push_str(&format!("  Model:           {}\n", entry.model_name));
    }
    if !entry.features_used.is_empty() {
        output.push_str(&format!("  Features:        {}\n", entry.features_used));
    }
    if !entry.notes.is_empty() {
        output.push_str(&format!("  Notes:           {}\n", entry.notes));
    }

    output.push_str(THIN_RULE);
    output.push('\n');
    let band = entry.band();
    output.push_str(&format!("{} {}\n", band.icon(), band));
    output.push_str(RULE);
    output.push('\n');

    output
}

/// Ranked comparison with medals for the top three
pub fn format_comparison(ranked: &[RankedScore]) -> String {
    let mut output = String::new();

    output.push_str(RULE);
    output.push_str("\n📈 Score comparison\n");
    output.push_str(RULE);
    output.push('\n');

    for r in ranked {
        let marker = match r.rank {
            1 => "🥇",
            2 => "🥈",
            3 => "🥉",
            _ => "  ",
        };
        let best = if r.rank == 1 { " (best)" } else { "" };
        output.push_str(&format!(
            "{} {}. {} - {:.6}{}\n",
            marker, r.rank, r.name, r.score, best
        ));
    }

    output.push_str(RULE);
    output.push('\n');
    output
}

/// Per-entry improvement history followed by the best-ever score
pub fn format_summary(summary: Option<&ImprovementSummary>) -> String {
    let mut output = String::new();

    output.push_str(RULE);
    output.push_str("\n📋 Improvement history\n");
    output.push_str(RULE);
    output.push('\n');

    let Some(summary) = summary else {
        output.push_str("No records yet.\n");
        output.push_str(RULE);
        output.push('\n');
        return output;
    };

    for (i, entry) in summary.entries.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, model_label(entry)));
        output.push_str(&format!("   Score:        {:.6}\n", entry.current_score));
        output.push_str(&format!("   vs previous:  {:+.2}%\n", entry.improvement_rate));
        output.push_str(&format!(
            "   vs baseline:  {:+.2}%\n",
            entry.baseline_improvement_rate
        ));
        if !entry.notes.is_empty() {
            output.push_str(&format!("   Notes:        {}\n", entry.notes));
        }
        output.push_str(&format!(
            "   Recorded:     {}\n\n",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    output.push_str(&format!(
        "🏆 Best score: {:.6} ({})\n",
        summary.best.current_score,
        model_label(&summary.best)
    ));
    output.push_str(RULE);
    output.push('\n');
    output
}

fn model_label(entry: &ScoreEntry) -> &str {
    if entry.model_name.is_empty() {
        UNNAMED_MODEL
    } else {
        &entry.model_name
    }
}

/// Table row for `scorebook history`
#[derive(Debug, Serialize, Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "#")]
    pub index: usize,
    pub recorded: String,
    pub model: String,
    pub score: String,
    #[tabled(rename = "vs prev")]
    pub vs_previous: String,
    #[tabled(rename = "vs baseline")]
    pub vs_baseline: String,
    pub notes: String,
}

impl HistoryRow {
    pub fn from_entry(index: usize, entry: &ScoreEntry) -> Self {
        Self {
            index,
            recorded: entry.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            model: model_label(entry).to_string(),
            score: format!("{:.6}", entry.current_score),
            vs_previous: format!("{:+.2}%", entry.improvement_rate),
            vs_baseline: format!("{:+.2}%", entry.baseline_improvement_rate),
            notes: entry.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::book::compare_scores;
    use crate::ledger::entry::EntryDetails;
    use chrono::Utc;

    const BASELINE: f64 = 3.9937572546850784;

    #[test]
    fn test_record_report_shows_band_and_optional_fields() {
        let entry = ScoreEntry::new(
            3.5,
            BASELINE,
            BASELINE,
            EntryDetails::new("RandomForestRegressor (n_estimators=100)", "", "first forest"),
            Utc::now(),
        )
        .unwrap();

        let report = format_record(&entry, BASELINE);
        assert!(report.contains("3.500000"));
        assert!(report.contains("+12.36%"));
        assert!(report.contains("large improvement"));
        assert!(report.contains("RandomForestRegressor (n_estimators=100)"));
        assert!(report.contains("first forest"));
        assert!(!report.contains("Features:"));
    }

    #[test]
    fn test_regression_report() {
        let entry =
            ScoreEntry::new(3.6, 3.5, BASELINE, EntryDetails::default(), Utc::now()).unwrap();
        assert!(format_record(&entry, BASELINE).contains("regressed"));
    }

    #[test]
    fn test_comparison_marks_top_three() {
        let ranked = compare_scores(&[("a", 4.0), ("b", 3.5), ("c", 3.45), ("d", 3.9)]);
        let report = format_comparison(&ranked);
        assert!(report.contains("🥇 1. c - 3.450000 (best)"));
        assert!(report.contains("🥈 2. b - 3.500000"));
        assert!(report.contains("🥉 3. d - 3.900000"));
        assert!(report.contains("   4. a - 4.000000"));
    }

    #[test]
    fn test_empty_summary_reports_no_records() {
        let report = format_summary(None);
        assert!(report.contains("No records yet."));
        assert!(!report.contains("Best score"));
    }

    #[test]
    fn test_history_row_uses_placeholder_for_unnamed_model() {
        let entry =
            ScoreEntry::new(3.5, BASELINE, BASELINE, EntryDetails::default(), Utc::now()).unwrap();
        let row = HistoryRow::from_entry(1, &entry);
        assert_eq!(row.model, UNNAMED_MODEL);
        assert_eq!(row.score, "3.500000");
    }
}
