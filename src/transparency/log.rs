//! Transparency log of what the agent processed.
//!
//! Only counts are kept. No keys, text or timings are stored here.

use crate::core::recorder::IgnoreReason;
use crate::core::session::SignalOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency counters for the current run.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Signals offered to capture sessions
    signals_seen: AtomicU64,
    /// Signals appended to an event log
    events_recorded: AtomicU64,
    /// Modifier, repeat and unpaired signals dropped by the recorder
    signals_filtered: AtomicU64,
    /// Signals dropped while capture was disabled or already finalized
    signals_gated: AtomicU64,
    /// Timing vectors produced
    vectors_emitted: AtomicU64,
    /// Timing records written to disk
    records_exported: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            signals_seen: AtomicU64::new(0),
            events_recorded: AtomicU64::new(0),
            signals_filtered: AtomicU64::new(0),
            signals_gated: AtomicU64::new(0),
            vectors_emitted: AtomicU64::new(0),
            records_exported: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that loads and saves cumulative counts at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {e}");
        }

        log
    }

    /// Count the outcome of one signal.
    pub fn record_outcome(&self, outcome: SignalOutcome) {
        self.signals_seen.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            SignalOutcome::Recorded => &self.events_recorded,
            SignalOutcome::Finalized { release_recorded } => {
                if release_recorded {
                    self.events_recorded.fetch_add(1, Ordering::Relaxed);
                }
                &self.vectors_emitted
            }
            SignalOutcome::Ignored(IgnoreReason::Disabled | IgnoreReason::AlreadyFinalized) => {
                &self.signals_gated
            }
            SignalOutcome::Ignored(_) => &self.signals_filtered,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an exported timing record.
    pub fn record_exported(&self) {
        self.records_exported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            signals_seen: self.signals_seen.load(Ordering::Relaxed),
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            signals_filtered: self.signals_filtered.load(Ordering::Relaxed),
            signals_gated: self.signals_gated.load(Ordering::Relaxed),
            vectors_emitted: self.vectors_emitted.load(Ordering::Relaxed),
            records_exported: self.records_exported.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Capture Statistics:\n\
             - Key signals seen: {}\n\
             - Events recorded: {}\n\
             - Signals filtered (modifier/repeat/unpaired): {}\n\
             - Signals ignored while paused or finished: {}\n\
             - Timing vectors produced: {}\n\
             - Records exported: {}\n\
             - Run duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - Key identities are held only until the vector is computed\n\
             - Typed text is never written to disk\n\
             - Only dwell and flight times leave the capture session",
            stats.signals_seen,
            stats.events_recorded,
            stats.signals_filtered,
            stats.signals_gated,
            stats.vectors_emitted,
            stats.records_exported,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                signals_seen: stats.signals_seen,
                events_recorded: stats.events_recorded,
                signals_filtered: stats.signals_filtered,
                signals_gated: stats.signals_gated,
                vectors_emitted: stats.vectors_emitted,
                records_exported: stats.records_exported,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.signals_seen
                    .store(persisted.signals_seen, Ordering::Relaxed);
                self.events_recorded
                    .store(persisted.events_recorded, Ordering::Relaxed);
                self.signals_filtered
                    .store(persisted.signals_filtered, Ordering::Relaxed);
                self.signals_gated
                    .store(persisted.signals_gated, Ordering::Relaxed);
                self.vectors_emitted
                    .store(persisted.vectors_emitted, Ordering::Relaxed);
                self.records_exported
                    .store(persisted.records_exported, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.signals_seen.store(0, Ordering::Relaxed);
        self.events_recorded.store(0, Ordering::Relaxed);
        self.signals_filtered.store(0, Ordering::Relaxed);
        self.signals_gated.store(0, Ordering::Relaxed);
        self.vectors_emitted.store(0, Ordering::Relaxed);
        self.records_exported.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub signals_seen: u64,
    pub events_recorded: u64,
    pub signals_filtered: u64,
    pub signals_gated: u64,
    pub vectors_emitted: u64,
    pub records_exported: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    signals_seen: u64,
    events_recorded: u64,
    signals_filtered: u64,
    signals_gated: u64,
    vectors_emitted: u64,
    records_exported: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}
