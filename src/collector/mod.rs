//! Key signal collection for the capture session.
//!
//! This module provides the input surfaces that feed a capture session:
//! a platform collector for live typing and replayable signal scripts.

pub mod keymap;
pub mod script;
pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(not(target_os = "macos"))]
pub mod noop;

use thiserror::Error;

// Re-export commonly used types
pub use script::{load_script, parse_script, replay, ReplayReport, ScriptError};
pub use types::{KeyAction, KeySignal};

#[cfg(target_os = "macos")]
pub use macos::{check_permission, MacOSCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "macos")]
pub type Collector = MacOSCollector;

#[cfg(not(target_os = "macos"))]
pub use noop::{check_permission, NoopCollector};

/// Platform-agnostic collector type alias
#[cfg(not(target_os = "macos"))]
pub type Collector = NoopCollector;

/// Collector settings.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Signals buffered before new ones are dropped
    pub channel_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 10_000,
        }
    }
}

/// Errors that can occur during collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,

    #[error("Input Monitoring permission not granted")]
    PermissionDenied,

    #[error("Failed to create CGEvent tap")]
    TapCreationFailed,

    #[error("Failed to create run loop source")]
    RunLoopSourceFailed,
}
