//! Timing scopes and the event debug log.
//!
//! `--perf` turns on scope timings, reported through `tracing` under the
//! `perf` target. `--debug-log PATH` records relay, pairing and input events
//! with their offset from startup.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> =
    LazyLock::new(|| Mutex::new(DebugLogger::new()));

#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(target: "perf", scope = self.name, elapsed_ms, "scope finished");
        log_event("perf", format!("{} {elapsed_ms:.2} ms", self.name));
    }
}

#[derive(Debug)]
struct DebugLogger {
    enabled: bool,
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            enabled: false,
            start: Instant::now(),
            writer: None,
        }
    }
}

/// A panic while logging must not take the event log down with it.
fn logger() -> MutexGuard<'static, DebugLogger> {
    DEBUG_LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Start (or with `None`, stop) writing the event log to `path`.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = logger();
    if let Some(path) = path {
        let file = File::create(path)?;
        logger.enabled = true;
        logger.start = Instant::now();
        logger.writer = Some(BufWriter::new(file));
        if let Some(writer) = logger.writer.as_mut() {
            writeln!(writer, "notemirror debug log start")?;
            writer.flush()?;
        }
    } else {
        logger.enabled = false;
        logger.writer = None;
    }
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    logger().enabled
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut logger = logger();
    if !logger.enabled {
        return;
    }
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(
            writer,
            "[{elapsed_ms:>10.3} ms] {name}: {}",
            detail.as_ref()
        );
        let _ = writer.flush();
    }
}
