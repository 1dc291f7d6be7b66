//! Recorded key signal scripts.
//!
//! A script is either a JSON array of signals or JSON Lines with one signal
//! per line:
//!
//! ```json
//! [
//!   {"action": "press", "key": "a", "timestamp": 0.0},
//!   {"action": "release", "key": "a", "timestamp": 0.1}
//! ]
//! ```

use crate::collector::types::KeySignal;
use crate::core::session::{CaptureSession, SignalOutcome};
use std::path::Path;
use thiserror::Error;

/// Errors reading a signal script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid signal on line {line}: {source}")]
    InvalidLine {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Invalid signal script: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a script from text.
pub fn parse_script(content: &str) -> Result<Vec<KeySignal>, ScriptError> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| ScriptError::InvalidLine {
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Load a script from disk.
pub fn load_script(path: &Path) -> Result<Vec<KeySignal>, ScriptError> {
    let content = std::fs::read_to_string(path)?;
    parse_script(&content)
}

/// Tally of how a session handled a replayed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub signals: usize,
    pub recorded: usize,
    pub ignored: usize,
    pub finalized: bool,
}

/// Feed every signal to `session` in order.
pub fn replay(session: &mut CaptureSession, signals: &[KeySignal]) -> ReplayReport {
    let mut report = ReplayReport::default();
    for signal in signals {
        report.signals += 1;
        match session.feed(signal) {
            SignalOutcome::Recorded => report.recorded += 1,
            SignalOutcome::Finalized { release_recorded } => {
                report.recorded += usize::from(release_recorded);
                report.finalized = true;
            }
            SignalOutcome::Ignored(_) => report.ignored += 1,
        }
    }
    report
}
