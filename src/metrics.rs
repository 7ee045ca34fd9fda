// Sync metrics module
//
// Lightweight counters for what a run detected, copied and failed on

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Counters for a map installer
///
/// Uses atomic operations so the scan (caller thread) and the copy worker can
/// both record without locks. Reset when a run starts and logged once when it
/// completes, so every summary covers a single run.
#[derive(Debug)]
pub struct SyncMetrics {
    /// Sources found to differ from the target
    changes_detected: AtomicUsize,

    /// Tasks that ran to the end (possibly with per-file errors)
    tasks_completed: AtomicUsize,

    /// Tasks that could not run at all
    tasks_failed: AtomicUsize,

    /// Loose files copied
    files_copied: AtomicUsize,

    /// Archive entries extracted
    entries_extracted: AtomicUsize,

    /// Archive entries refused by the path sanitizer
    entries_rejected: AtomicUsize,

    /// Recoverable errors of any kind
    errors: AtomicUsize,

    /// Start of the current run
    start_time: Mutex<Instant>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            changes_detected: AtomicUsize::new(0),
            tasks_completed: AtomicUsize::new(0),
            tasks_failed: AtomicUsize::new(0),
            files_copied: AtomicUsize::new(0),
            entries_extracted: AtomicUsize::new(0),
            entries_rejected: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            start_time: Mutex::new(Instant::now()),
        }
    }

    /// Zero every counter and restart the clock for a new run.
    pub fn reset(&self) {
        for counter in [
            &self.changes_detected,
            &self.tasks_completed,
            &self.tasks_failed,
            &self.files_copied,
            &self.entries_extracted,
            &self.entries_rejected,
            &self.errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.start_time.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn record_change_detected(&self) {
        self.changes_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_copied(&self) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entry_extracted(&self) {
        self.entries_extracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entry_rejected(&self) {
        self.entries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn changes_detected(&self) -> usize {
        self.changes_detected.load(Ordering::Relaxed)
    }

    pub fn tasks_completed(&self) -> usize {
        self.tasks_completed.load(Ordering::Relaxed)
    }

    pub fn tasks_failed(&self) -> usize {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    pub fn files_copied(&self) -> usize {
        self.files_copied.load(Ordering::Relaxed)
    }

    pub fn entries_extracted(&self) -> usize {
        self.entries_extracted.load(Ordering::Relaxed)
    }

    pub fn entries_rejected(&self) -> usize {
        self.entries_rejected.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Time since the current run started
    pub fn uptime(&self) -> Duration {
        self.start_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Map Installer Summary ===");
        tracing::info!("Elapsed: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Changes: {} detected, tasks: {} completed, {} failed",
            self.changes_detected(),
            self.tasks_completed(),
            self.tasks_failed()
        );
        tracing::info!(
            "Files: {} copied, {} extracted, {} rejected",
            self.files_copied(),
            self.entries_extracted(),
            self.entries_rejected()
        );
        tracing::info!("Errors: {}", self.errors());
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
