//! Synheart Keyprint CLI
//!
//! Capture a typing-rhythm vector for a known phrase.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use synheart_keyprint::{
    collector::{check_permission, load_script, replay, Collector, CollectorConfig, CollectorError},
    config::Config,
    core::{CaptureSession, MonotonicClock, TimingVector, VectorSummary},
    export::{export_records, ExportFormat, TimingRecord},
    transparency::create_shared_log_with_persistence,
    PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keyprint")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Keystroke timing capture for behavioral authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a timing vector from live typing
    Capture {
        /// Phrase to type (defaults to the configured target phrase)
        #[arg(long)]
        phrase: Option<String>,

        /// Discard the vector if the typed text differs from the phrase
        #[arg(long)]
        strict: bool,

        /// Print the vector without writing a record
        #[arg(long)]
        no_export: bool,
    },

    /// Compute a timing vector from a recorded signal script
    Replay {
        /// JSON or JSON Lines file of key signals
        file: PathBuf,

        /// Phrase the script was typed against
        #[arg(long)]
        phrase: Option<String>,

        /// Fail if the typed text differs from the phrase
        #[arg(long)]
        strict: bool,

        /// Output format (pretty or json)
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Pause capture in a running agent
    Pause,

    /// Resume capture in a running agent
    Resume,

    /// Show current status
    Status,

    /// Display privacy declaration
    Privacy,

    /// Combine captured timing records into one file
    Export {
        /// Directory holding timing records
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture {
            phrase,
            strict,
            no_export,
        } => cmd_capture(phrase, strict, no_export),
        Commands::Replay {
            file,
            phrase,
            strict,
            format,
        } => cmd_replay(&file, phrase, strict, &format),
        Commands::Pause => cmd_set_paused(true),
        Commands::Resume => cmd_set_paused(false),
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Export { output, format } => cmd_export(output, &format),
        Commands::Config => cmd_config(),
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {e}");
        Config::default()
    })
}

fn cmd_capture(phrase: Option<String>, strict: bool, no_export: bool) -> anyhow::Result<()> {
    println!("Synheart Keyprint v{VERSION}");
    println!();

    if !check_permission() {
        eprintln!("To grant permission:");
        eprintln!("1. Open System Settings > Privacy & Security");
        eprintln!("2. Select 'Input Monitoring'");
        eprintln!("3. Add this application to the allowed list");
        eprintln!("4. Restart the application");
        return Err(CollectorError::PermissionDenied.into());
    }

    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create directories: {e}");
    }
    let phrase = phrase.unwrap_or_else(|| config.target_phrase.clone());

    let clock = MonotonicClock::shared();
    let mut collector = Collector::new(CollectorConfig::default(), clock.clone());
    if !collector.is_live() {
        bail!("Live capture is not available on this platform; use `keyprint replay <FILE>`");
    }

    let transparency_log = create_shared_log_with_persistence(config.transparency_path());

    let (done_tx, done_rx) = crossbeam_channel::bounded::<TimingVector>(1);
    let mut session = CaptureSession::new(&phrase, clock)?
        .with_terminator(config.terminator_key.clone())
        // The Enter that launched this command may be released after the tap starts
        .require_terminator_press()
        .on_finished(move |vector| {
            let _ = done_tx.send(vector);
        });

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let mut paused = config.paused;
    session.set_enabled(!paused);
    if paused {
        println!("Capture is currently paused.");
        println!("Run `keyprint resume` to start capturing.");
        println!();
    }

    println!("Type: \"{phrase}\" and release {}", session.terminator());
    println!("Press Ctrl+C to cancel");
    println!();

    collector.start()?;
    let receiver = collector.receiver().clone();
    let mut last_config_check = Instant::now();
    let mut finished: Option<TimingVector> = None;

    while running.load(Ordering::SeqCst) {
        // `keyprint pause/resume` toggles the flag in the config file
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if cfg.paused != paused {
                    paused = cfg.paused;
                    session.set_enabled(!paused);
                    println!("{}", if paused { "Capture paused." } else { "Capture resumed." });
                }
            }
            last_config_check = Instant::now();
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(signal) => {
                let outcome = session.feed(&signal);
                transparency_log.record_outcome(outcome);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::error!("Collector disconnected unexpectedly");
                break;
            }
        }

        if let Ok(vector) = done_rx.try_recv() {
            finished = Some(vector);
            break;
        }
    }

    collector.stop();

    let result = match finished {
        Some(vector) => {
            print_vector(&vector);
            check_phrase(&session, &phrase, config.phrase_match_required(strict)).and_then(|()| {
                if no_export {
                    return Ok(());
                }
                let record = TimingRecord::from_session(&session)?;
                let path = record.save_in(&config.export_path)?;
                transparency_log.record_exported();
                println!("Saved timing record to {path:?}");
                Ok(())
            })
        }
        None => {
            println!("Capture cancelled before {} was released.", session.terminator());
            Ok(())
        }
    };

    if let Err(e) = transparency_log.save() {
        tracing::warn!("Could not save transparency log: {e}");
    }

    println!();
    println!("{}", transparency_log.summary());
    result
}

fn cmd_replay(
    file: &std::path::Path,
    phrase: Option<String>,
    strict: bool,
    format: &str,
) -> anyhow::Result<()> {
    let config = load_config();
    let phrase = phrase.unwrap_or_else(|| config.target_phrase.clone());

    let signals =
        load_script(file).with_context(|| format!("Failed to read signal script {file:?}"))?;
    let mut session = CaptureSession::new(&phrase, MonotonicClock::shared())?
        .with_terminator(config.terminator_key.clone());

    let report = replay(&mut session, &signals);
    tracing::debug!(?report, "replay finished");

    let Some(vector) = session.vector() else {
        bail!(
            "Script ended before {} was released ({} of {} signals recorded)",
            session.terminator(),
            report.recorded,
            report.signals
        );
    };

    check_phrase(&session, &phrase, config.phrase_match_required(strict))?;

    if format == "json" {
        let record = TimingRecord::new(session.id(), vector);
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "Replayed {} signals: {} recorded, {} ignored",
            report.signals, report.recorded, report.ignored
        );
        print_vector(vector);
    }
    Ok(())
}

/// Compare the reconstructed text with the phrase.
///
/// Mismatches are only fatal when `strict`; otherwise they are reported.
fn check_phrase(session: &CaptureSession, phrase: &str, strict: bool) -> anyhow::Result<()> {
    if session.typed_text() == phrase {
        return Ok(());
    }
    if strict {
        bail!("Typed text does not match the target phrase; vector discarded");
    }
    eprintln!("Warning: typed text does not match the target phrase.");
    Ok(())
}

fn print_vector(vector: &TimingVector) {
    let fmt = |values: &[f64]| {
        values
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("Timing vector ({} values):", vector.len());
    println!("  Dwell:  [{}]", fmt(vector.dwell_times()));
    println!("  Flight: [{}]", fmt(vector.flight_times()));
    println!("  {}", VectorSummary::of(vector));
}

fn cmd_set_paused(paused: bool) -> anyhow::Result<()> {
    let mut config = load_config();
    config.paused = paused;
    config.save().context("Error saving config")?;
    if paused {
        println!("Capture paused. Use 'keyprint resume' to continue.");
    } else {
        println!("Capture resumed.");
    }
    Ok(())
}

fn cmd_status() {
    let config = load_config();

    println!("Synheart Keyprint Status");
    println!("========================");
    println!();

    println!(
        "Input Monitoring Permission: {}",
        if check_permission() {
            "Granted ✓"
        } else {
            "Not Granted ✗"
        }
    );
    println!();

    println!("Configuration:");
    println!(
        "  Target phrase length: {} characters",
        config.target_phrase.chars().count()
    );
    println!("  Terminator key: {}", config.terminator_key);
    println!("  Require phrase match: {}", config.require_phrase_match);
    println!("  Paused: {}", config.paused);
    println!();

    let stats_path = config.transparency_path();
    if !stats_path.exists() {
        println!("No previous capture data found.");
        return;
    }

    let stats = std::fs::read_to_string(&stats_path)
        .ok()
        .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok());
    if let Some(stats) = stats {
        println!("Cumulative Statistics:");
        for (label, field) in [
            ("Key signals seen", "signals_seen"),
            ("Events recorded", "events_recorded"),
            ("Signals filtered", "signals_filtered"),
            ("Timing vectors produced", "vectors_emitted"),
            ("Records exported", "records_exported"),
        ] {
            if let Some(value) = stats.get(field) {
                println!("  {label}: {value}");
            }
        }
    }
}

fn cmd_export(output: Option<PathBuf>, format: &str) -> anyhow::Result<()> {
    let config = load_config();
    let export_dir = output.unwrap_or(config.export_path);

    if !export_dir.exists() {
        println!("No timing records found in {export_dir:?}");
        println!("Run 'keyprint capture' to record one.");
        return Ok(());
    }

    match export_records(&export_dir, ExportFormat::from_name(format))? {
        Some((path, count)) => println!("Exported {count} record(s) to {path:?}"),
        None => {
            println!("No timing records found in {export_dir:?}");
            println!("Run 'keyprint capture' to record one.");
        }
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
