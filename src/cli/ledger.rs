//! `scorebook record|compare|summary|history|best`: score ledger commands.

use anyhow::{bail, Result};
use tracing::debug;

use super::output::{self, OutputMode};
use crate::config::AppConfig;
use crate::ledger::report::{self, HistoryRow};
use crate::ledger::{compare_scores, EntryDetails, JsonFileStore, ScoreEntry, ScoreLedger};

fn open_ledger(config: &AppConfig) -> ScoreLedger<JsonFileStore> {
    debug!("Using score history at {:?}", config.ledger.path);
    ScoreLedger::new(
        JsonFileStore::new(config.ledger.path.clone()),
        config.ledger.baseline_score,
    )
}

/// Parse `NAME=SCORE`
pub fn parse_labelled_score(raw: &str) -> std::result::Result<(String, f64), String> {
    let (name, score) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=SCORE, got {raw:?}"))?;
    if name.is_empty() {
        return Err(format!("missing name in {raw:?}"));
    }
    let score: f64 = score
        .trim()
        .parse()
        .map_err(|_| format!("invalid score in {raw:?}"))?;
    Ok((name.to_string(), score))
}

pub fn record(
    config: &AppConfig,
    score: f64,
    model: String,
    features: String,
    notes: String,
) -> Result<()> {
    let ledger = open_ledger(config);
    let entry = ledger.record_score(score, EntryDetails::new(model, features, notes))?;
    print!("{}", report::format_record(&entry, ledger.baseline_score()));
    output::print_success(&format!(
        "Recorded to {}",
        ledger.store().path().display()
    ));
    Ok(())
}

pub fn compare(
    config: &AppConfig,
    scores: Vec<(String, f64)>,
    with_history: bool,
    with_baseline: bool,
    json: bool,
) -> Result<()> {
    let scores = comparison_candidates(config, scores, with_history, with_baseline)?;
    if scores.is_empty() {
        bail!("nothing to compare: pass NAME=SCORE pairs, --with-history or --with-baseline");
    }

    let ranked = compare_scores(&scores);
    let mode = OutputMode::from_json_flag(json);
    output::print_report(&ranked, &report::format_comparison(&ranked), mode)
}

/// Explicit pairs, then the baseline, then every recorded entry as `#N model`
fn comparison_candidates(
    config: &AppConfig,
    mut scores: Vec<(String, f64)>,
    with_history: bool,
    with_baseline: bool,
) -> Result<Vec<(String, f64)>> {
    if with_baseline {
        scores.push(("baseline".to_string(), config.ledger.baseline_score));
    }
    if with_history {
        let history = open_ledger(config).history()?;
        scores.extend(history_labels(&history));
    }
    Ok(scores)
}

fn history_labels(history: &[ScoreEntry]) -> Vec<(String, f64)> {
    history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let label = if entry.model_name.is_empty() {
                format!("#{}", i + 1)
            } else {
                format!("#{} {}", i + 1, entry.model_name)
            };
            (label, entry.current_score)
        })
        .collect()
}

pub fn summary(config: &AppConfig) -> Result<()> {
    let summary = open_ledger(config).generate_improvement_summary()?;
    print!("{}", report::format_summary(summary.as_ref()));
    Ok(())
}

pub fn history(config: &AppConfig, limit: Option<usize>, json: bool) -> Result<()> {
    let entries = open_ledger(config).history()?;
    let (offset, shown) = most_recent(&entries, limit);
    let mode = OutputMode::from_json_flag(json);

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(shown)?);
        }
        OutputMode::Table => {
            let rows: Vec<HistoryRow> = shown
                .iter()
                .enumerate()
                .map(|(i, e)| HistoryRow::from_entry(offset + i + 1, e))
                .collect();
            output::print_items(&rows, mode)?;
        }
    }
    Ok(())
}

/// The last `limit` entries (all when `None`) and the index of the first one shown
fn most_recent(entries: &[ScoreEntry], limit: Option<usize>) -> (usize, &[ScoreEntry]) {
    let offset = limit.map_or(0, |n| entries.len().saturating_sub(n));
    (offset, &entries[offset..])
}

pub fn best(config: &AppConfig, json: bool) -> Result<()> {
    let Some(entry) = open_ledger(config).best()? else {
        println!("No records yet.");
        return Ok(());
    };

    let text = format!(
        "🏆 Best score: {:.6} ({}) recorded {}\n",
        entry.current_score,
        if entry.model_name.is_empty() {
            report::UNNAMED_MODEL
        } else {
            entry.model_name.as_str()
        },
        entry.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    output::print_report(&entry, &text, OutputMode::from_json_flag(json))
}
