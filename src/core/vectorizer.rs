//! Reduction of an event log into a fixed-length timing vector.
//!
//! Dwell time: `release_i - press_i` for the same key.
//! Flight time: `press_i - release_{i-1}`, measured from the most recent
//! release that produced a dwell time.
//!
//! For a phrase of `L` characters the vector holds `L` dwell times followed
//! by `L - 1` flight times. Collection stops once a list is full, and short
//! lists are padded with trailing zeros, so the shape depends only on the
//! phrase length and never on how many keys were actually typed.

use crate::collector::types::KeyAction;
use crate::core::recorder::EventLog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dwell and flight times for one capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingVector {
    dwell_times: Vec<f64>,
    flight_times: Vec<f64>,
    /// Dwell entries measured before padding
    dwell_collected: usize,
    /// Flight entries measured before padding
    flight_collected: usize,
}

impl TimingVector {
    /// Dwell times, exactly `L` entries.
    pub fn dwell_times(&self) -> &[f64] {
        &self.dwell_times
    }

    /// Flight times, exactly `L - 1` entries.
    pub fn flight_times(&self) -> &[f64] {
        &self.flight_times
    }

    pub fn dwell_collected(&self) -> usize {
        self.dwell_collected
    }

    pub fn flight_collected(&self) -> usize {
        self.flight_collected
    }

    /// Number of zero placeholder slots.
    pub fn padded_slots(&self) -> usize {
        self.len() - self.dwell_collected - self.flight_collected
    }

    /// Phrase length `L` this vector was shaped for.
    pub fn phrase_len(&self) -> usize {
        self.dwell_times.len()
    }

    /// Total length, `2L - 1` (or 0 for an empty phrase).
    pub fn len(&self) -> usize {
        self.dwell_times.len() + self.flight_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate dwell times then flight times.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.dwell_times
            .iter()
            .chain(self.flight_times.iter())
            .copied()
    }

    /// Flatten into `dwell ++ flight`.
    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

/// Reduce `log` to a timing vector for a phrase of `phrase_len` characters.
///
/// Pure: the same log always gives the same vector.
pub fn vectorize(log: &EventLog, phrase_len: usize) -> TimingVector {
    let max_dwell = phrase_len;
    let max_flight = phrase_len.saturating_sub(1);

    let mut dwell_times = Vec::with_capacity(max_dwell);
    let mut flight_times = Vec::with_capacity(max_flight);
    let mut outstanding: HashMap<&str, f64> = HashMap::new();
    let mut last_release_time: Option<f64> = None;

    for event in log.events() {
        match event.action {
            KeyAction::Press => {
                outstanding.insert(event.key.as_str(), event.timestamp);
                if let Some(last_release) = last_release_time {
                    if flight_times.len() < max_flight {
                        flight_times.push(event.timestamp - last_release);
                    }
                }
            }
            KeyAction::Release => {
                if let Some(pressed_at) = outstanding.remove(event.key.as_str()) {
                    if dwell_times.len() < max_dwell {
                        dwell_times.push(event.timestamp - pressed_at);
                        last_release_time = Some(event.timestamp);
                    }
                }
            }
        }
    }

    let dwell_collected = dwell_times.len();
    let flight_collected = flight_times.len();

    dwell_times.resize(max_dwell, 0.0);
    flight_times.resize(max_flight, 0.0);

    TimingVector {
        dwell_times,
        flight_times,
        dwell_collected,
        flight_collected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recorder::EventRecorder;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{actual:?} vs {expected:?}");
        }
    }

    fn log_of(pairs: &[(&str, f64, f64)]) -> EventLog {
        let mut recorder = EventRecorder::new();
        for &(key, down, up) in pairs {
            recorder.on_key_down(key, down);
            recorder.on_key_up(key, up);
        }
        recorder.into_log()
    }

    #[test]
    fn test_reference_session() {
        let log = log_of(&[
            ("a", 0.0, 0.1),
            ("b", 0.15, 0.22),
            ("c", 0.30, 0.33),
            ("Enter", 0.35, 0.40),
        ]);
        let vector = vectorize(&log, 3);

        assert_close(vector.dwell_times(), &[0.1, 0.07, 0.03]);
        assert_close(vector.flight_times(), &[0.05, 0.08]);
        assert_close(&vector.to_vec(), &[0.1, 0.07, 0.03, 0.05, 0.08]);
        assert_eq!(vector.padded_slots(), 0);
    }

    #[test]
    fn test_short_session_padded() {
        let log = log_of(&[("a", 0.0, 0.1), ("b", 0.2, 0.3)]);
        let vector = vectorize(&log, 5);

        assert_eq!(vector.len(), 9);
        assert_eq!(vector.dwell_collected(), 2);
        assert_eq!(vector.flight_collected(), 1);
        assert_close(vector.dwell_times(), &[0.1, 0.1, 0.0, 0.0, 0.0]);
        assert_close(vector.flight_times(), &[0.1, 0.0, 0.0, 0.0]);
        assert_eq!(vector.padded_slots(), 6);
    }

    #[test]
    fn test_empty_log() {
        let vector = vectorize(&EventLog::new(), 4);
        assert_eq!(vector.to_vec(), vec![0.0; 7]);
    }

    #[test]
    fn test_zero_length_phrase() {
        let log = log_of(&[("a", 0.0, 0.1)]);
        let vector = vectorize(&log, 0);
        assert!(vector.is_empty());
    }

    #[test]
    fn test_single_character_phrase() {
        let log = log_of(&[("a", 0.0, 0.1), ("Enter", 0.3, 0.4)]);
        let vector = vectorize(&log, 1);
        assert_close(&vector.to_vec(), &[0.1]);
    }

    #[test]
    fn test_extra_keystrokes_capped() {
        let log = log_of(&[
            ("a", 0.0, 0.1),
            ("b", 0.2, 0.3),
            ("c", 0.4, 0.5),
            ("d", 0.6, 0.7),
            ("e", 0.8, 0.9),
        ]);
        let vector = vectorize(&log, 2);
        assert_close(vector.dwell_times(), &[0.1, 0.1]);
        assert_close(vector.flight_times(), &[0.1]);
    }

    #[test]
    fn test_overlapping_keys() {
        // b goes down before a comes up (rollover typing)
        let mut recorder = EventRecorder::new();
        recorder.on_key_down("a", 0.0);
        recorder.on_key_down("b", 0.08);
        recorder.on_key_up("a", 0.1);
        recorder.on_key_up("b", 0.2);
        recorder.on_key_down("c", 0.25);
        recorder.on_key_up("c", 0.3);
        let vector = vectorize(&recorder.into_log(), 3);

        assert_close(vector.dwell_times(), &[0.1, 0.12, 0.05]);
        // No release preceded b's press, so the first flight is c's
        assert_close(vector.flight_times(), &[0.05, 0.0]);
    }

    #[test]
    fn test_vectorize_is_pure() {
        let log = log_of(&[("x", 0.0, 0.09), ("y", 0.13, 0.2), ("z", 0.31, 0.4)]);
        let first = vectorize(&log, 3);
        let second = vectorize(&log, 3);
        assert_eq!(first, second);
    }
}
