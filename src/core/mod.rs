//! Core functionality for keystroke timing capture.
//!
//! This module contains:
//! - The injected clock abstraction
//! - Event recording with modifier, repeat and unpaired-release filtering
//! - Dwell/flight vectorization
//! - The capture session state machine

pub mod clock;
pub mod keys;
pub mod recorder;
pub mod session;
pub mod summary;
pub mod vectorizer;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use recorder::{EventLog, EventRecorder, IgnoreReason, KeyEvent, PressIndex, RecordOutcome};
pub use session::{CaptureSession, Completion, SessionError, SignalOutcome};
pub use summary::VectorSummary;
pub use vectorizer::{vectorize, TimingVector};
