//! Demonstration of a keyprint capture session.
//!
//! This example shows how to:
//! 1. Create a capture session with an injected clock
//! 2. Feed it key signals, including modifiers and key repeats
//! 3. Receive the timing vector through the completion callback
//! 4. Summarize and record the result
//!
//! Run with: cargo run --example capture_demo
//!
//! The demo drives a manual clock, so it needs no Input Monitoring
//! permission and prints the same vector every run.

use std::sync::Arc;

use synheart_keyprint::{
    collector::KeySignal,
    core::{CaptureSession, Clock, ManualClock, VectorSummary},
    transparency::TransparencyLog,
    PRIVACY_DECLARATION,
};

/// Per-character (dwell, flight-before) timings in seconds.
const RHYTHM: [(f64, f64); 5] = [(0.09, 0.0), (0.11, 0.07), (0.08, 0.12), (0.10, 0.05), (0.13, 0.09)];

fn main() {
    println!("Synheart Keyprint - Capture Demo");
    println!("================================");
    println!();
    println!("{PRIVACY_DECLARATION}");

    let phrase = "hello";
    let clock = Arc::new(ManualClock::new());
    let (tx, rx) = crossbeam_channel::bounded(1);

    let mut session = match CaptureSession::new(phrase, clock.clone()) {
        Ok(session) => session.on_finished(move |vector| {
            let _ = tx.send(vector);
        }),
        Err(e) => {
            eprintln!("Error creating session: {e}");
            return;
        }
    };
    let transparency_log = TransparencyLog::new();

    println!("Session {} typing {:?}", session.id(), phrase);
    println!();

    // Live-style calls stamped by the injected clock
    session.key_down("Shift");
    for (c, (dwell, flight)) in phrase.chars().zip(RHYTHM) {
        let key = c.to_string();
        clock.advance(flight);
        transparency_log.record_outcome(session.key_down(&key));
        // An auto-repeat signal while the key is held
        transparency_log.record_outcome(session.key_down(&key));
        clock.advance(dwell);
        transparency_log.record_outcome(session.key_up(&key));
    }
    session.key_up("Shift");

    // Finish with a scripted Enter press and release
    let t = clock.now();
    let tail = [
        KeySignal::press("Enter", t + 0.2),
        KeySignal::release("Enter", t + 0.3),
    ];
    for signal in &tail {
        let outcome = session.feed(signal);
        println!("{:?} {} -> {outcome:?}", signal.action, signal.key);
        transparency_log.record_outcome(outcome);
    }

    match rx.try_recv() {
        Ok(vector) => {
            println!("Dwell times:  {:?}", vector.dwell_times());
            println!("Flight times: {:?}", vector.flight_times());
            println!("Summary: {}", VectorSummary::of(&vector));
        }
        Err(_) => println!("No vector produced"),
    }

    println!();
    println!("{}", transparency_log.summary());
}
