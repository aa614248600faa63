//! Persisted run artifacts: newline-delimited JSON, one record per example.

use crate::report::ExampleReport;
use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading a results artifact back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArtifactError {
    /// Failed to read or write the file
    #[error("failed to access results file: {0}")]
    Io(#[from] io::Error),

    /// A line did not parse as an example record
    #[error("invalid record on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Run identifier derived from a start time, e.g. `20260804_153012`.
pub fn run_id(start: DateTime<Local>) -> String {
    start.format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the results file for one task within a run:
/// `<dir>/<task>_results_<run_id>.jsonl`.
pub fn results_path(dir: &Path, task_name: &str, run_id: &str) -> PathBuf {
    dir.join(format!("{}_results_{}.jsonl", task_name, run_id))
}

/// Recover the run id from a results file name, for regenerating reports.
pub fn extract_run_id(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, id) = stem.rsplit_once("_results_")?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Write one JSON record per example.
pub fn write_results(path: &Path, reports: &[ExampleReport]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for report in reports {
        serde_json::to_writer(&mut file, report)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Read a results artifact back into example reports.
pub fn read_results(path: &Path) -> Result<Vec<ExampleReport>, ArtifactError> {
    let content = std::fs::read_to_string(path)?;
    let mut reports = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let report = serde_json::from_str(line).map_err(|e| ArtifactError::Parse {
            line: idx + 1,
            message: e.to_string(),
        })?;
        reports.push(report);
    }
    Ok(reports)
}
