//! Event recording for a single capture session.
//!
//! The recorder turns raw key signals into a clean event log:
//! - modifier keys are dropped
//! - auto-repeat presses of a held key are suppressed
//! - releases without an outstanding press are dropped
//!
//! Timestamps are clamped so the log never goes backwards in time.

use crate::collector::types::KeyAction;
use crate::core::keys;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One recorded key action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub key: String,
    /// Seconds, non-decreasing across the log
    pub timestamp: f64,
}

/// Ordered, append-only sequence of recorded events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<KeyEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, event: KeyEvent) {
        self.events.push(event);
    }

    /// Recorded events in arrival order.
    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded presses.
    pub fn press_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.action == KeyAction::Press)
            .count()
    }

    /// Reconstruct the text the presses would have typed.
    ///
    /// Printable keys append their character and Backspace removes the last
    /// one. Other named keys are skipped.
    pub fn typed_text(&self) -> String {
        let mut text = String::new();
        for event in self.events.iter().filter(|e| e.action == KeyAction::Press) {
            if event.key == keys::BACKSPACE {
                text.pop();
            } else if let Some(c) = keys::printable_char(&event.key) {
                text.push(c);
            }
        }
        text
    }
}

/// Why a signal did not produce a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Capture is disabled by the caller
    Disabled,
    /// Shift, Control, Alt, Meta or CapsLock
    Modifier,
    /// Key-down for a key that is already held (auto-repeat)
    Repeat,
    /// Key-up for a key with no outstanding press
    Unpaired,
    /// The session already produced its vector
    AlreadyFinalized,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            IgnoreReason::Disabled => "capture disabled",
            IgnoreReason::Modifier => "modifier key",
            IgnoreReason::Repeat => "key repeat",
            IgnoreReason::Unpaired => "release without press",
            IgnoreReason::AlreadyFinalized => "session finalized",
        };
        f.write_str(reason)
    }
}

/// Result of offering a signal to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Appended,
    Ignored(IgnoreReason),
}

/// Key identifier to the timestamp of its outstanding press.
pub type PressIndex = HashMap<String, f64>;

/// Records key signals into an [`EventLog`].
#[derive(Debug, Default)]
pub struct EventRecorder {
    log: EventLog,
    presses: PressIndex,
    last_timestamp: Option<f64>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key-down signal.
    pub fn on_key_down(&mut self, key: &str, timestamp: f64) -> RecordOutcome {
        if keys::is_modifier(key) {
            return RecordOutcome::Ignored(IgnoreReason::Modifier);
        }
        if self.presses.contains_key(key) {
            return RecordOutcome::Ignored(IgnoreReason::Repeat);
        }

        let timestamp = self.monotonic(timestamp);
        self.presses.insert(key.to_string(), timestamp);
        self.log.push(KeyEvent {
            action: KeyAction::Press,
            key: key.to_string(),
            timestamp,
        });
        RecordOutcome::Appended
    }

    /// Handle a key-up signal.
    pub fn on_key_up(&mut self, key: &str, timestamp: f64) -> RecordOutcome {
        if keys::is_modifier(key) {
            return RecordOutcome::Ignored(IgnoreReason::Modifier);
        }
        if self.presses.remove(key).is_none() {
            return RecordOutcome::Ignored(IgnoreReason::Unpaired);
        }

        let timestamp = self.monotonic(timestamp);
        self.log.push(KeyEvent {
            action: KeyAction::Release,
            key: key.to_string(),
            timestamp,
        });
        RecordOutcome::Appended
    }

    /// Whether `key` currently has an outstanding press.
    pub fn is_held(&self, key: &str) -> bool {
        self.presses.contains_key(key)
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Consume the recorder, discarding the press index.
    pub fn into_log(self) -> EventLog {
        self.log
    }

    // Non-finite and out-of-order readings collapse onto the previous
    // timestamp, or 0 before the first one.
    fn monotonic(&mut self, timestamp: f64) -> f64 {
        let timestamp = match self.last_timestamp {
            _ if !timestamp.is_finite() => self.last_timestamp.unwrap_or(0.0),
            Some(last) if timestamp < last => last,
            _ => timestamp,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_pair() {
        let mut recorder = EventRecorder::new();
        assert_eq!(recorder.on_key_down("a", 0.0), RecordOutcome::Appended);
        assert!(recorder.is_held("a"));
        assert_eq!(recorder.on_key_up("a", 0.1), RecordOutcome::Appended);
        assert!(!recorder.is_held("a"));

        let log = recorder.into_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].action, KeyAction::Press);
        assert_eq!(log.events()[1].action, KeyAction::Release);
    }

    #[test]
    fn test_key_repeat_suppressed() {
        let mut recorder = EventRecorder::new();
        recorder.on_key_down("a", 0.0);
        for i in 1..10 {
            assert_eq!(
                recorder.on_key_down("a", i as f64 * 0.03),
                RecordOutcome::Ignored(IgnoreReason::Repeat)
            );
        }
        recorder.on_key_up("a", 0.5);

        // A fresh press after the release is recorded again
        assert_eq!(recorder.on_key_down("a", 0.6), RecordOutcome::Appended);
        assert_eq!(recorder.log().press_count(), 2);
    }

    #[test]
    fn test_modifiers_never_logged() {
        let mut recorder = EventRecorder::new();
        for key in keys::MODIFIER_KEYS {
            assert_eq!(
                recorder.on_key_down(key, 0.0),
                RecordOutcome::Ignored(IgnoreReason::Modifier)
            );
            assert_eq!(
                recorder.on_key_up(key, 0.1),
                RecordOutcome::Ignored(IgnoreReason::Modifier)
            );
        }
        assert!(recorder.log().is_empty());
    }

    #[test]
    fn test_unpaired_release_dropped() {
        let mut recorder = EventRecorder::new();
        assert_eq!(
            recorder.on_key_up("x", 0.2),
            RecordOutcome::Ignored(IgnoreReason::Unpaired)
        );
        assert!(recorder.log().is_empty());
    }

    #[test]
    fn test_timestamps_clamped_monotonic() {
        let mut recorder = EventRecorder::new();
        recorder.on_key_down("a", 1.0);
        recorder.on_key_up("a", 0.5);
        recorder.on_key_down("b", f64::NAN);

        let stamps: Vec<f64> = recorder.log().events().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_non_finite_timestamps_clamped_anywhere() {
        let mut recorder = EventRecorder::new();
        recorder.on_key_down("a", f64::NEG_INFINITY);
        recorder.on_key_up("a", 0.1);
        recorder.on_key_down("b", 0.2);
        recorder.on_key_up("b", f64::INFINITY);
        recorder.on_key_down("c", 1.0);
        recorder.on_key_up("c", f64::NAN);
        recorder.on_key_down("d", 2.0);
        recorder.on_key_up("d", 2.1);

        let stamps: Vec<f64> = recorder.log().events().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 0.1, 0.2, 0.2, 1.0, 1.0, 2.0, 2.1]);
    }

    #[test]
    fn test_typed_text() {
        let mut recorder = EventRecorder::new();
        for (i, key) in ["h", "i", "x", "Backspace", " ", "y", "o", "Enter"]
            .iter()
            .enumerate()
        {
            let t = i as f64 * 0.1;
            recorder.on_key_down(key, t);
            recorder.on_key_up(key, t + 0.05);
        }
        assert_eq!(recorder.log().typed_text(), "hi yo");
    }
}
