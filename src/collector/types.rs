//! Raw key signal types produced by input surfaces.
//!
//! A signal is what an input surface observed, before any filtering. The
//! capture session decides which signals become recorded events.

use serde::{Deserialize, Serialize};

/// Whether a key went down or came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Press,
    Release,
}

/// A single key signal from an input surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySignal {
    /// Press or release
    pub action: KeyAction,
    /// Key identifier (`"a"`, `" "`, `"Enter"`, `"Shift"`, ...)
    pub key: String,
    /// Monotonic clock reading in seconds
    pub timestamp: f64,
}

impl KeySignal {
    /// Create a key-down signal.
    pub fn press(key: impl Into<String>, timestamp: f64) -> Self {
        Self {
            action: KeyAction::Press,
            key: key.into(),
            timestamp,
        }
    }

    /// Create a key-up signal.
    pub fn release(key: impl Into<String>, timestamp: f64) -> Self {
        Self {
            action: KeyAction::Release,
            key: key.into(),
            timestamp,
        }
    }

    pub fn is_key_down(&self) -> bool {
        self.action == KeyAction::Press
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_constructors() {
        let down = KeySignal::press("a", 0.5);
        assert!(down.is_key_down());
        assert_eq!(down.key, "a");

        let up = KeySignal::release("a", 0.6);
        assert!(!up.is_key_down());
        assert_eq!(up.action, KeyAction::Release);
    }

    #[test]
    fn test_signal_wire_format() {
        let json = r#"{"action":"release","key":"Enter","timestamp":0.4}"#;
        let signal: KeySignal = serde_json::from_str(json).unwrap();
        assert_eq!(signal, KeySignal::release("Enter", 0.4));
    }
}
