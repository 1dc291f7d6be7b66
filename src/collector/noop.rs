//! Non-macOS (noop) implementation of key signal collection.
//!
//! This exists so the crate (and binary) can compile on non-Apple targets
//! without pulling in CoreGraphics/CoreFoundation. Live capture is not
//! available here; replay scripts still work.

use crate::collector::types::KeySignal;
use crate::collector::{CollectorConfig, CollectorError};
use crate::core::clock::SharedClock;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A collector that never emits signals.
pub struct NoopCollector {
    _clock: SharedClock,
    _sender: Sender<KeySignal>,
    receiver: Receiver<KeySignal>,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    pub fn new(config: CollectorConfig, clock: SharedClock) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity);
        Self {
            _clock: clock,
            _sender: sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marks the collector as running.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether this platform can capture live key signals.
    pub fn is_live(&self) -> bool {
        false
    }

    pub fn receiver(&self) -> &Receiver<KeySignal> {
        &self.receiver
    }

    pub fn try_recv(&self) -> Option<KeySignal> {
        self.receiver.try_recv().ok()
    }
}

/// There is no Input Monitoring permission gate off macOS.
pub fn check_permission() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::MonotonicClock;

    #[test]
    fn test_noop_collector_lifecycle() {
        let mut collector = NoopCollector::new(CollectorConfig::default(), MonotonicClock::shared());
        assert!(!collector.is_live());

        collector.start().unwrap();
        assert!(collector.is_running());
        assert!(matches!(collector.start(), Err(CollectorError::AlreadyRunning)));
        assert!(collector.try_recv().is_none());

        collector.stop();
        assert!(!collector.is_running());
    }
}
