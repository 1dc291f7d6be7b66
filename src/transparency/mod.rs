//! Transparency module for the keyprint agent.
//!
//! Tracks and exposes what the agent processed so users can audit it.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
