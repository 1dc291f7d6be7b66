//! Capture session state machine.
//!
//! A session moves one way from `Capturing` to `Finalized` when the
//! terminating key (Enter by default) is released. The event log and press
//! index live inside the `Capturing` state and are dropped at that
//! transition, so nothing recorded in one session can leak into another.
//! After finalization every signal is ignored and the completion callback
//! never fires again.

use crate::collector::types::{KeyAction, KeySignal};
use crate::core::clock::{Clock, SharedClock};
use crate::core::keys;
use crate::core::recorder::{EventRecorder, IgnoreReason, RecordOutcome};
use crate::core::vectorizer::{vectorize, TimingVector};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when setting up a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Target phrase must not be empty")]
    EmptyPhrase,
}

/// Completion callback receiving the session's vector.
pub type Completion = Box<dyn FnOnce(TimingVector) + Send>;

/// What happened to a signal offered to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Appended to the event log
    Recorded,
    /// Terminator released; the vector was produced. `release_recorded`
    /// tells whether the release itself was appended to the log.
    Finalized { release_recorded: bool },
    /// Dropped without touching the log
    Ignored(IgnoreReason),
}

enum State {
    Capturing {
        recorder: EventRecorder,
        on_finished: Option<Completion>,
    },
    Finalized {
        vector: TimingVector,
        typed_text: String,
        event_count: usize,
    },
}

/// One capture of a user typing the target phrase.
pub struct CaptureSession {
    id: Uuid,
    phrase_len: usize,
    terminator: String,
    terminator_needs_press: bool,
    enabled: bool,
    clock: SharedClock,
    state: State,
}

impl CaptureSession {
    /// Start capturing for `phrase`. Only its character count is kept.
    pub fn new(phrase: &str, clock: SharedClock) -> Result<Self, SessionError> {
        let phrase_len = phrase.chars().count();
        if phrase_len == 0 {
            return Err(SessionError::EmptyPhrase);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            phrase_len,
            terminator: keys::ENTER.to_string(),
            terminator_needs_press: false,
            enabled: true,
            clock,
            state: State::Capturing {
                recorder: EventRecorder::new(),
                on_finished: None,
            },
        })
    }

    /// Use a different terminating key.
    pub fn with_terminator(mut self, key: impl Into<String>) -> Self {
        self.terminator = key.into();
        self
    }

    /// Only finalize on a terminator release whose press was recorded by
    /// this session. A release left over from before the session started
    /// is then ignored as unpaired.
    pub fn require_terminator_press(mut self) -> Self {
        self.terminator_needs_press = true;
        self
    }

    /// Register the callback fired once with the finished vector.
    pub fn on_finished<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(TimingVector) + Send + 'static,
    {
        if let State::Capturing { on_finished, .. } = &mut self.state {
            *on_finished = Some(Box::new(callback));
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Character length `L` of the target phrase.
    pub fn phrase_len(&self) -> usize {
        self.phrase_len
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Gate both handlers. While disabled every signal is ignored.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::debug!(session = %self.id, enabled, "capture gate changed");
        }
        self.enabled = enabled;
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, State::Finalized { .. })
    }

    /// The finished vector, once the session is finalized.
    pub fn vector(&self) -> Option<&TimingVector> {
        match &self.state {
            State::Finalized { vector, .. } => Some(vector),
            State::Capturing { .. } => None,
        }
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> usize {
        match &self.state {
            State::Capturing { recorder, .. } => recorder.log().len(),
            State::Finalized { event_count, .. } => *event_count,
        }
    }

    /// Text reconstructed from recorded presses. Not checked against the
    /// target phrase; comparing is up to the caller.
    pub fn typed_text(&self) -> String {
        match &self.state {
            State::Capturing { recorder, .. } => recorder.log().typed_text(),
            State::Finalized { typed_text, .. } => typed_text.clone(),
        }
    }

    /// Key-down stamped with the session clock.
    pub fn key_down(&mut self, key: &str) -> SignalOutcome {
        let timestamp = self.clock.now();
        self.key_down_at(key, timestamp)
    }

    /// Key-up stamped with the session clock.
    pub fn key_up(&mut self, key: &str) -> SignalOutcome {
        let timestamp = self.clock.now();
        self.key_up_at(key, timestamp)
    }

    /// Key-down with an explicit timestamp in seconds.
    pub fn key_down_at(&mut self, key: &str, timestamp: f64) -> SignalOutcome {
        if !self.enabled {
            return self.ignored(key, IgnoreReason::Disabled);
        }
        let State::Capturing { recorder, .. } = &mut self.state else {
            return self.ignored(key, IgnoreReason::AlreadyFinalized);
        };

        match recorder.on_key_down(key, timestamp) {
            RecordOutcome::Appended => SignalOutcome::Recorded,
            RecordOutcome::Ignored(reason) => self.ignored(key, reason),
        }
    }

    /// Key-up with an explicit timestamp in seconds.
    ///
    /// Releasing the terminator finalizes the session whether or not its
    /// press was recorded, unless [`require_terminator_press`] is set.
    ///
    /// [`require_terminator_press`]: CaptureSession::require_terminator_press
    pub fn key_up_at(&mut self, key: &str, timestamp: f64) -> SignalOutcome {
        if !self.enabled {
            return self.ignored(key, IgnoreReason::Disabled);
        }
        let State::Capturing { recorder, .. } = &mut self.state else {
            return self.ignored(key, IgnoreReason::AlreadyFinalized);
        };

        let outcome = recorder.on_key_up(key, timestamp);
        if key == self.terminator {
            let release_recorded = outcome == RecordOutcome::Appended;
            if !release_recorded && self.terminator_needs_press {
                return self.ignored(key, IgnoreReason::Unpaired);
            }
            return self.finalize(release_recorded);
        }

        match outcome {
            RecordOutcome::Appended => SignalOutcome::Recorded,
            RecordOutcome::Ignored(reason) => self.ignored(key, reason),
        }
    }

    /// Dispatch a raw signal from an input surface.
    pub fn feed(&mut self, signal: &KeySignal) -> SignalOutcome {
        match signal.action {
            KeyAction::Press => self.key_down_at(&signal.key, signal.timestamp),
            KeyAction::Release => self.key_up_at(&signal.key, signal.timestamp),
        }
    }

    fn finalize(&mut self, release_recorded: bool) -> SignalOutcome {
        let State::Capturing {
            recorder,
            on_finished,
        } = &mut self.state
        else {
            return SignalOutcome::Ignored(IgnoreReason::AlreadyFinalized);
        };

        let log = recorder.log();
        let vector = vectorize(log, self.phrase_len);
        let typed_text = log.typed_text();
        let event_count = log.len();
        let callback = on_finished.take();

        tracing::info!(
            session = %self.id,
            phrase_len = self.phrase_len,
            events = event_count,
            padded_slots = vector.padded_slots(),
            "capture session finalized"
        );

        // Dropping the Capturing state discards the log and press index.
        self.state = State::Finalized {
            vector: vector.clone(),
            typed_text,
            event_count,
        };

        if let Some(callback) = callback {
            callback(vector);
        }
        SignalOutcome::Finalized { release_recorded }
    }

    fn ignored(&self, key: &str, reason: IgnoreReason) -> SignalOutcome {
        // Modifiers are routine; only log the rest
        if reason != IgnoreReason::Modifier {
            tracing::debug!(session = %self.id, key, %reason, "signal ignored");
        }
        SignalOutcome::Ignored(reason)
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("phrase_len", &self.phrase_len)
            .field("terminator", &self.terminator)
            .field("enabled", &self.enabled)
            .field("finalized", &self.is_finalized())
            .field("event_count", &self.event_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use std::sync::Arc;

    fn new_session(phrase: &str) -> (CaptureSession, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let session = CaptureSession::new(phrase, clock.clone()).unwrap();
        (session, clock)
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let clock = Arc::new(ManualClock::new());
        let err = CaptureSession::new("", clock).unwrap_err();
        assert_eq!(err, SessionError::EmptyPhrase);
    }

    #[test]
    fn test_phrase_length_counts_characters() {
        let (session, _) = new_session("héllo");
        assert_eq!(session.phrase_len(), 5);
    }

    #[test]
    fn test_clock_stamps_signals() {
        let (mut session, clock) = new_session("ab");

        session.key_down("a");
        clock.advance(0.1);
        session.key_up("a");
        clock.advance(0.05);
        session.key_down("b");
        clock.advance(0.08);
        session.key_up("b");
        clock.advance(0.1);
        session.key_down("Enter");
        clock.advance(0.05);
        assert_eq!(
            session.key_up("Enter"),
            SignalOutcome::Finalized {
                release_recorded: true
            }
        );

        let vector = session.vector().unwrap();
        assert_eq!(vector.len(), 3);
        assert!((vector.dwell_times()[0] - 0.1).abs() < 1e-9);
        assert!((vector.dwell_times()[1] - 0.08).abs() < 1e-9);
        assert!((vector.flight_times()[0] - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_single_shot_finalization() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (session, _) = new_session("ab");
        let mut session = session.on_finished(move |vector| {
            let _ = tx.send(vector);
        });

        session.key_down_at("a", 0.0);
        session.key_up_at("a", 0.1);
        assert_eq!(
            session.key_up_at("Enter", 0.2),
            SignalOutcome::Finalized {
                release_recorded: false
            }
        );
        assert_eq!(
            session.key_down_at("Enter", 0.3),
            SignalOutcome::Ignored(IgnoreReason::AlreadyFinalized)
        );
        assert_eq!(
            session.key_up_at("Enter", 0.4),
            SignalOutcome::Ignored(IgnoreReason::AlreadyFinalized)
        );

        assert_eq!(rx.try_iter().count(), 1);
        assert!(session.is_finalized());
        assert_eq!(session.event_count(), 2);
    }

    #[test]
    fn test_unpressed_terminator_still_finalizes() {
        let (mut session, _) = new_session("abc");
        assert_eq!(
            session.key_up_at("Enter", 1.0),
            SignalOutcome::Finalized {
                release_recorded: false
            }
        );
        assert_eq!(session.vector().unwrap().to_vec(), vec![0.0; 5]);
    }

    #[test]
    fn test_stale_terminator_release_ignored_when_press_required() {
        let (session, _) = new_session("hello");
        let mut session = session.require_terminator_press();

        // Enter released after the session started but pressed before it
        assert_eq!(
            session.key_up_at("Enter", 0.05),
            SignalOutcome::Ignored(IgnoreReason::Unpaired)
        );
        assert!(!session.is_finalized());
        assert_eq!(session.key_down_at("h", 0.5), SignalOutcome::Recorded);
        assert_eq!(session.key_up_at("h", 0.6), SignalOutcome::Recorded);

        session.key_down_at("Enter", 0.8);
        assert_eq!(
            session.key_up_at("Enter", 0.9),
            SignalOutcome::Finalized {
                release_recorded: true
            }
        );
        assert_eq!(session.event_count(), 4);
        assert!((session.vector().unwrap().dwell_times()[0] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_session_ignores_everything() {
        let (mut session, _) = new_session("ab");
        session.key_down_at("a", 0.0);
        session.set_enabled(false);

        assert_eq!(
            session.key_up_at("a", 0.1),
            SignalOutcome::Ignored(IgnoreReason::Disabled)
        );
        assert_eq!(
            session.key_up_at("Enter", 0.2),
            SignalOutcome::Ignored(IgnoreReason::Disabled)
        );
        assert!(!session.is_finalized());
        assert_eq!(session.event_count(), 1);

        // Re-enabling resumes the same session
        session.set_enabled(true);
        assert_eq!(session.key_up_at("a", 0.3), SignalOutcome::Recorded);
    }

    #[test]
    fn test_custom_terminator() {
        let (session, _) = new_session("a");
        let mut session = session.with_terminator("Escape");

        session.key_down_at("Enter", 0.0);
        assert_eq!(session.key_up_at("Enter", 0.1), SignalOutcome::Recorded);
        assert_eq!(
            session.key_up_at("Escape", 0.2),
            SignalOutcome::Finalized {
                release_recorded: false
            }
        );
    }

    #[test]
    fn test_typed_text_survives_finalization() {
        let (mut session, _) = new_session("hi");
        for (i, key) in ["h", "i", "Enter"].iter().enumerate() {
            let t = i as f64 * 0.2;
            session.key_down_at(key, t);
            session.key_up_at(key, t + 0.1);
        }
        assert!(session.is_finalized());
        assert_eq!(session.typed_text(), "hi");
    }
}
