use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, ScorebookError};

/// `<YYYYmmdd_HHMMSS>_<tag>.csv`
pub fn submission_file_name<Tz: TimeZone>(at: &DateTime<Tz>, tag: &str) -> String
where
    Tz::Offset: Display,
{
    format!("{}_{}.csv", at.format("%Y%m%d_%H%M%S"), tag)
}

/// Replace negative predictions with zero
pub fn clip_negative(predictions: &mut [f64]) -> usize {
    let mut clipped = 0;
    for p in predictions.iter_mut() {
        if *p < 0.0 {
            *p = 0.0;
            clipped += 1;
        }
    }
    clipped
}

/// Summary statistics of a prediction vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl PredictionStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self {
            min,
            max,
            mean,
            std: variance.sqrt(),
        })
    }
}

/// Write the template rows with column 1 replaced by `predictions`.
///
/// Nothing is created unless the row counts match.
pub fn write_submission(
    dir: &Path,
    file_name: &str,
    template: &[Vec<String>],
    predictions: &[f64],
) -> Result<PathBuf> {
    if template.len() != predictions.len() {
        return Err(ScorebookError::MalformedData(format!(
            "submission template has {} rows but {} predictions were made",
            template.len(),
            predictions.len()
        )));
    }
    if let Some(i) = template.iter().position(|row| row.len() < 2) {
        return Err(ScorebookError::MalformedData(format!(
            "submission template row {} has fewer than 2 columns",
            i + 1
        )));
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    // Rows go to a hidden sibling first so a failed write never leaves a partial submission
    let partial = dir.join(format!(".{file_name}.part"));

    let written = write_rows(&partial, template, predictions)
        .and_then(|()| std::fs::rename(&partial, &path).map_err(ScorebookError::from));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    info!("Wrote {} predictions to {:?}", predictions.len(), path);
    Ok(path)
}

fn write_rows(path: &Path, template: &[Vec<String>], predictions: &[f64]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (row, prediction) in template.iter().zip(predictions) {
        let mut fields = row.clone();
        fields[1] = prediction.to_string();
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use tempfile::TempDir;

    fn template(n: usize) -> Vec<Vec<String>> {
        (0..n).map(|i| vec![i.to_string(), "0".to_string()]).collect()
    }

    #[test]
    fn test_file_name_is_timestamped() {
        let at = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 1, 13, 5, 9)
            .unwrap();
        assert_eq!(
            submission_file_name(&at, "rf75"),
            "20250601_130509_rf75.csv"
        );
    }

    #[test]
    fn test_clip_negative() {
        let mut preds = vec![-0.5, 0.0, 2.5, -3.0];
        assert_eq!(clip_negative(&mut preds), 2);
        assert_eq!(preds, vec![0.0, 0.0, 2.5, 0.0]);
    }

    #[test]
    fn test_prediction_stats() {
        let stats = PredictionStats::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 2.5);
        assert!((stats.std - 1.118033988749895).abs() < 1e-12);
        assert!(PredictionStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_write_replaces_second_column_in_order() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("submissions");

        let path = write_submission(&out, "sub.csv", &template(3), &[1.5, 0.0, 2.25]).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "0,1.5\n1,0\n2,2.25\n");

        let names: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sub.csv".to_string()]);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("submissions");
        // a non-empty directory in the way makes the final rename fail
        std::fs::create_dir_all(out.join("sub.csv").join("occupied")).unwrap();

        let err = write_submission(&out, "sub.csv", &template(2), &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ScorebookError::Io(_)));
        assert!(!out.join(".sub.csv.part").exists());
        assert!(out.join("sub.csv").is_dir());
    }

    #[test]
    fn test_row_count_mismatch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("submissions");

        let err = write_submission(&out, "sub.csv", &template(3), &[1.0]).unwrap_err();
        assert!(matches!(err, ScorebookError::MalformedData(_)));
        assert!(!out.exists());
    }
}
