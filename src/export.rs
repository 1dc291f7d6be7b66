//! Timing record persistence and export.
//!
//! A record carries the flattened vector plus enough metadata to tell
//! sessions apart. The typed text and raw key events are never written.

use crate::core::session::CaptureSession;
use crate::core::summary::VectorSummary;
use crate::core::vectorizer::TimingVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors while writing or reading timing records.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session {0} has not produced a vector yet")]
    NotFinalized(Uuid),
}

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty JSON array
    Json,
    /// One record per line
    JsonLines,
}

impl ExportFormat {
    /// Parse a CLI format name; anything other than `jsonl` is JSON.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("jsonl") {
            ExportFormat::JsonLines
        } else {
            ExportFormat::Json
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::JsonLines => "jsonl",
        }
    }
}

/// One captured vector as handed to the enrollment/verification workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub session_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub phrase_length: usize,
    /// Dwell times followed by flight times, seconds
    pub timing_vector: Vec<f64>,
    pub dwell_collected: usize,
    pub flight_collected: usize,
    pub summary: VectorSummary,
}

impl TimingRecord {
    pub fn new(session_id: Uuid, vector: &TimingVector) -> Self {
        Self {
            session_id,
            captured_at: Utc::now(),
            phrase_length: vector.phrase_len(),
            timing_vector: vector.to_vec(),
            dwell_collected: vector.dwell_collected(),
            flight_collected: vector.flight_collected(),
            summary: VectorSummary::of(vector),
        }
    }

    /// Build a record from a finalized session.
    pub fn from_session(session: &CaptureSession) -> Result<Self, ExportError> {
        let vector = session
            .vector()
            .ok_or(ExportError::NotFinalized(session.id()))?;
        Ok(Self::new(session.id(), vector))
    }

    /// Write this record as `vector_<timestamp>_<id>.json` under `dir`.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let short_id: String = self.session_id.simple().to_string().chars().take(8).collect();
        let path = dir.join(format!(
            "vector_{}_{}.json",
            self.captured_at.format("%Y%m%d_%H%M%S"),
            short_id
        ));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// Load every record file (`vector_*.json`) in `dir`, oldest first.
///
/// Unreadable files are skipped with a warning.
pub fn load_records(dir: &Path) -> Result<Vec<TimingRecord>, ExportError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().map(|e| e == "json").unwrap_or(false)
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("vector_"))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(ExportError::from)
            .and_then(|content| Ok(serde_json::from_str::<TimingRecord>(&content)?));
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
        }
    }
    Ok(records)
}

/// Serialize records in the requested format.
pub fn render_records(records: &[TimingRecord], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ExportFormat::JsonLines => {
            let lines = records
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(lines.join("\n"))
        }
    }
}

/// Combine all records in `dir` into one `export_<timestamp>` file there.
///
/// Returns the output path and the number of records written, or `None`
/// when there was nothing to export.
pub fn export_records(
    dir: &Path,
    format: ExportFormat,
) -> Result<Option<(PathBuf, usize)>, ExportError> {
    let records = load_records(dir)?;
    if records.is_empty() {
        return Ok(None);
    }

    let output_path = dir.join(format!(
        "export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    ));
    std::fs::write(&output_path, render_records(&records, format)?)?;
    Ok(Some((output_path, records.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use std::sync::Arc;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "synheart-keyprint-export-test-{}-{name}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn finished_session() -> CaptureSession {
        let mut session = CaptureSession::new("ab", Arc::new(ManualClock::new())).unwrap();
        session.key_down_at("a", 0.0);
        session.key_up_at("a", 0.1);
        session.key_down_at("b", 0.2);
        session.key_up_at("b", 0.25);
        session.key_up_at("Enter", 0.4);
        session
    }

    #[test]
    fn test_record_from_session() {
        let session = finished_session();
        let record = TimingRecord::from_session(&session).unwrap();
        assert_eq!(record.session_id, session.id());
        assert_eq!(record.phrase_length, 2);
        assert_eq!(record.timing_vector.len(), 3);
        assert_eq!(record.dwell_collected, 2);
    }

    #[test]
    fn test_unfinished_session_has_no_record() {
        let session = CaptureSession::new("ab", Arc::new(ManualClock::new())).unwrap();
        assert!(matches!(
            TimingRecord::from_session(&session),
            Err(ExportError::NotFinalized(_))
        ));
    }

    #[test]
    fn test_record_json_has_no_text() {
        let record = TimingRecord::from_session(&finished_session()).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("timing_vector"));
        assert!(!json.contains("typed"));
    }

    #[test]
    fn test_save_load_and_export() {
        let dir = temp_dir("roundtrip");
        let record = TimingRecord::from_session(&finished_session()).unwrap();
        record.save_in(&dir).unwrap();

        let loaded = load_records(&dir).unwrap();
        assert_eq!(loaded, vec![record]);

        let (path, count) = export_records(&dir, ExportFormat::JsonLines)
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(path.extension().unwrap(), "jsonl");

        // Export files are not picked up as records
        assert_eq!(load_records(&dir).unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_export_empty_dir() {
        let dir = temp_dir("empty");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(export_records(&dir, ExportFormat::Json).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::from_name("jsonl"), ExportFormat::JsonLines);
        assert_eq!(ExportFormat::from_name("json"), ExportFormat::Json);
        assert_eq!(ExportFormat::from_name("whatever"), ExportFormat::Json);
    }
}
