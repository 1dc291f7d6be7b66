//! macOS implementation of key signal collection using a CGEvent tap.
//!
//! The tap runs on its own thread and forwards stamped key signals through a
//! bounded channel. It requires Input Monitoring permission.

use crate::collector::keymap::{key_for_keycode, KeyTracker};
use crate::collector::types::KeySignal;
use crate::collector::{CollectorConfig, CollectorError};
use crate::core::clock::{Clock, SharedClock};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, CallbackResult, EventField,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// The macOS key signal collector.
pub struct MacOSCollector {
    clock: SharedClock,
    sender: Sender<KeySignal>,
    receiver: Receiver<KeySignal>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MacOSCollector {
    /// Create a new collector stamping signals with `clock`.
    pub fn new(config: CollectorConfig, clock: SharedClock) -> Self {
        // Bounded so a stalled consumer cannot grow memory without limit
        let (sender, receiver) = bounded(config.channel_capacity);

        Self {
            clock,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start capturing in a background thread.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let clock = self.clock.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_event_loop(sender, running.clone(), clock) {
                tracing::error!("Event loop error: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop capturing.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether this platform can capture live key signals.
    pub fn is_live(&self) -> bool {
        true
    }

    /// Get the receiver for key signals.
    pub fn receiver(&self) -> &Receiver<KeySignal> {
        &self.receiver
    }

    /// Try to receive a signal without blocking.
    pub fn try_recv(&self) -> Option<KeySignal> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for MacOSCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_event_loop(
    sender: Sender<KeySignal>,
    running: Arc<AtomicBool>,
    clock: SharedClock,
) -> Result<(), CollectorError> {
    let event_types = vec![
        CGEventType::KeyDown,
        CGEventType::KeyUp,
        CGEventType::FlagsChanged,
    ];
    let tracker = Mutex::new(KeyTracker::new());

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        event_types,
        move |_proxy, event_type, event| {
            // Stamp first so channel latency never shows up in the timings
            let timestamp = clock.now();
            let Ok(mut tracker) = tracker.lock() else {
                return CallbackResult::Keep;
            };
            if let Some(signal) = process_cg_event(&mut tracker, event_type, event, timestamp) {
                // Never block the tap; drop the signal if the channel is full
                let _ = sender.try_send(signal);
            }
            CallbackResult::Keep
        },
    )
    .map_err(|_| CollectorError::TapCreationFailed)?;

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| CollectorError::RunLoopSourceFailed)?;

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }

    tap.enable();

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            std::time::Duration::from_millis(100),
            false,
        );
    }

    Ok(())
}

/// Convert a CGEvent into a key signal.
fn process_cg_event(
    tracker: &mut KeyTracker,
    event_type: CGEventType,
    event: &CGEvent,
    timestamp: f64,
) -> Option<KeySignal> {
    let keycode = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
    let flags = event.get_flags();
    let shift = flags.contains(CGEventFlags::CGEventFlagShift);
    let caps_lock = flags.contains(CGEventFlags::CGEventFlagAlphaShift);

    match event_type {
        CGEventType::KeyDown => {
            let key = tracker.press(keycode, shift, caps_lock)?;
            Some(KeySignal::press(key, timestamp))
        }
        CGEventType::KeyUp => {
            let key = tracker.release(keycode, shift, caps_lock)?;
            Some(KeySignal::release(key, timestamp))
        }
        // Modifiers only report a new flag state; derive the direction from it
        CGEventType::FlagsChanged => {
            let key = key_for_keycode(keycode)?;
            if modifier_is_down(key, flags) {
                Some(KeySignal::press(key, timestamp))
            } else {
                Some(KeySignal::release(key, timestamp))
            }
        }
        _ => None,
    }
}

fn modifier_is_down(key: &str, flags: CGEventFlags) -> bool {
    let mask = match key {
        "Shift" => CGEventFlags::CGEventFlagShift,
        "Control" => CGEventFlags::CGEventFlagControl,
        "Alt" => CGEventFlags::CGEventFlagAlternate,
        "Meta" => CGEventFlags::CGEventFlagCommand,
        "CapsLock" => CGEventFlags::CGEventFlagAlphaShift,
        _ => return false,
    };
    flags.contains(mask)
}

/// Check if the application has Input Monitoring permission.
///
/// macOS has no direct query; creating a passive tap fails without it.
pub fn check_permission() -> bool {
    let result = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    );

    result.is_ok()
}
