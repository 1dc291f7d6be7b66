//! Descriptive statistics over a timing vector.
//!
//! Only measured entries contribute; zero placeholders are excluded.

use crate::core::vectorizer::TimingVector;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary of the measured part of a timing vector, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorSummary {
    pub dwell_mean_ms: f64,
    pub dwell_std_dev_ms: f64,
    pub flight_mean_ms: f64,
    pub flight_std_dev_ms: f64,
    /// Zero placeholder slots in the vector
    pub padded_slots: usize,
}

impl VectorSummary {
    pub fn of(vector: &TimingVector) -> Self {
        let dwell = &vector.dwell_times()[..vector.dwell_collected()];
        let flight = &vector.flight_times()[..vector.flight_collected()];

        Self {
            dwell_mean_ms: mean_ms(dwell),
            dwell_std_dev_ms: std_dev_ms(dwell),
            flight_mean_ms: mean_ms(flight),
            flight_std_dev_ms: std_dev_ms(flight),
            padded_slots: vector.padded_slots(),
        }
    }
}

fn mean_ms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean() * 1000.0
}

// Sample standard deviation; undefined below two samples.
fn std_dev_ms(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().std_dev() * 1000.0
}

impl std::fmt::Display for VectorSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dwell {:.1} ± {:.1} ms, flight {:.1} ± {:.1} ms, {} padded slot(s)",
            self.dwell_mean_ms,
            self.dwell_std_dev_ms,
            self.flight_mean_ms,
            self.flight_std_dev_ms,
            self.padded_slots
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recorder::{EventLog, EventRecorder};
    use crate::core::vectorizer::vectorize;

    #[test]
    fn test_summary_excludes_padding() {
        let mut recorder = EventRecorder::new();
        recorder.on_key_down("a", 0.0);
        recorder.on_key_up("a", 0.1);
        recorder.on_key_down("b", 0.2);
        recorder.on_key_up("b", 0.3);
        let vector = vectorize(&recorder.into_log(), 4);

        let summary = VectorSummary::of(&vector);
        assert!((summary.dwell_mean_ms - 100.0).abs() < 1e-6);
        assert!(summary.dwell_std_dev_ms.abs() < 1e-6);
        assert!((summary.flight_mean_ms - 100.0).abs() < 1e-6);
        // A single flight has no spread
        assert_eq!(summary.flight_std_dev_ms, 0.0);
        assert_eq!(summary.padded_slots, 4);
    }

    #[test]
    fn test_summary_of_empty_vector() {
        let vector = vectorize(&EventLog::new(), 3);
        let summary = VectorSummary::of(&vector);
        assert_eq!(summary.dwell_mean_ms, 0.0);
        assert_eq!(summary.flight_mean_ms, 0.0);
        assert_eq!(summary.padded_slots, 5);
        assert!(summary.to_string().contains("5 padded slot(s)"));
    }
}
