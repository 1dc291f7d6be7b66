//! Synheart Keyprint - keystroke timing capture for behavioral authentication.
//!
//! This library turns the rhythm of a user typing a known phrase into a
//! fixed-length vector of dwell and flight times. The vector is key material
//! for a downstream fuzzy extractor; that stage, and any transport to an
//! enrollment or verification service, live outside this crate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Synheart Keyprint                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Collector  │──▶│  Recorder   │──▶│ Vectorizer  │──▶ vector│
//! │  │ (tap/replay)│   │ (event log) │   │(dwell/flight)│         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │                 CaptureSession                      │
//! │         ▼                                                     │
//! │  ┌─────────────┐                                              │
//! │  │Transparency │                                              │
//! │  │    Log      │                                              │
//! │  └─────────────┘                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use synheart_keyprint::core::{CaptureSession, ManualClock};
//!
//! let clock = Arc::new(ManualClock::new());
//! let mut session = CaptureSession::new("hi", clock)
//!     .expect("phrase is not empty")
//!     .on_finished(|vector| println!("{:?}", vector.to_vec()));
//!
//! session.key_down_at("h", 0.00);
//! session.key_up_at("h", 0.09);
//! session.key_down_at("i", 0.15);
//! session.key_up_at("i", 0.22);
//! session.key_down_at("Enter", 0.30);
//! session.key_up_at("Enter", 0.36);
//!
//! assert_eq!(session.vector().unwrap().len(), 3);
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod export;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorConfig, CollectorError, KeyAction, KeySignal};
pub use config::{Config, ConfigError};
pub use core::{
    vectorize, CaptureSession, Clock, EventLog, EventRecorder, IgnoreReason, KeyEvent,
    ManualClock, MonotonicClock, SessionError, SignalOutcome, TimingVector, VectorSummary,
};
pub use export::{ExportError, ExportFormat, TimingRecord};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║             SYNHEART KEYPRINT - PRIVACY DECLARATION              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Keyprint measures HOW you type a known phrase, not WHAT you     ║
║  type elsewhere.                                                 ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE:                                              ║
║    • How long each key is held (dwell time)                      ║
║    • The gap between releasing one key and pressing the next     ║
║      (flight time)                                               ║
║                                                                  ║
║  ✗ WHAT WE NEVER KEEP:                                           ║
║    • Which keys you pressed, once the vector is computed         ║
║    • The text you typed                                          ║
║    • Anything typed outside an active capture                    ║
║                                                                  ║
║  Capture stops when you release Enter. Only the timing vector    ║
║  is written to disk.                                             ║
║                                                                  ║
║  You can view processing statistics anytime with:                ║
║    keyprint status                                               ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER KEEP"));
        assert!(PRIVACY_DECLARATION.contains("dwell time"));
    }
}
