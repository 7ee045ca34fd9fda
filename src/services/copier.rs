use crate::metrics::SyncMetrics;
use crate::models::{AssetKind, CopyTask, entry_file_name};
use crate::services::locator::AssetLocator;
use crate::services::sanitize::resolve_entry_path;
use crate::services::SyncError;
use camino::Utf8Path;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::sync::Arc;
use zip::ZipArchive;

/// Outcome of a task that ran to the end.
///
/// Per-file failures do not abort a task; they are collected in `errors`.
#[derive(Debug, Default)]
pub struct TaskReport {
    /// Files or entries the task selected for copying
    pub total: usize,
    /// Files or entries written to the target directory
    pub written: usize,
    pub errors: Vec<SyncError>,
}

impl TaskReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Executes a single queued task against the filesystem.
///
/// Returns `Err` only when the task as a whole could not run (source folder
/// unreadable, archive missing or corrupt).
#[cfg_attr(test, mockall::automock)]
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: &CopyTask) -> Result<TaskReport, SyncError>;
}

/// Logs progress each time another 10% of a task's files is done.
#[derive(Debug)]
pub struct ProgressTracker {
    verb: &'static str,
    total: usize,
    done: usize,
    last_decile: usize,
}

impl ProgressTracker {
    pub fn new(verb: &'static str, total: usize) -> Self {
        Self {
            verb,
            total,
            done: 0,
            last_decile: 0,
        }
    }

    /// Mark one more item done. Returns the percentage when a new 10% step was reached.
    pub fn advance(&mut self) -> Option<usize> {
        self.done += 1;
        if self.total == 0 {
            return None;
        }

        let percent = self.done * 100 / self.total;
        let decile = percent / 10;
        if decile > self.last_decile {
            self.last_decile = decile;
            tracing::info!("{} file {}/{} ({}%)", self.verb, self.done, self.total, percent);
            return Some(percent);
        }
        None
    }
}

/// Copies loose map folders and extracts map archives into the target directory.
pub struct FsTaskExecutor {
    locator: AssetLocator,
    metrics: Arc<SyncMetrics>,
}

impl FsTaskExecutor {
    pub fn new(kind: AssetKind, metrics: Arc<SyncMetrics>) -> Self {
        Self {
            locator: AssetLocator::new(kind),
            metrics,
        }
    }

    /// Copy every map file of `folder` into `target`, overwriting.
    ///
    /// The file list is read now, not when the task was queued.
    fn copy_directory(
        &self,
        task: &CopyTask,
        folder: &Utf8Path,
        target: &Utf8Path,
    ) -> Result<TaskReport, SyncError> {
        let files = self.locator.asset_files(folder)?;
        let mut report = TaskReport {
            total: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            tracing::info!("Nothing left to copy in {}", task);
            return Ok(report);
        }

        tracing::info!("Copying {} files from '{}'.", files.len(), task.display_path());
        let mut progress = ProgressTracker::new("Copying", files.len());

        for file in &files {
            match copy_file(file, target) {
                Ok(()) => {
                    report.written += 1;
                    self.metrics.record_file_copied();
                }
                Err(e) => {
                    tracing::error!("Failed to copy {}: {}", file, e);
                    report.errors.push(e);
                }
            }
            progress.advance();
        }

        tracing::info!("Finished copying '{}'.", task.display_path());
        Ok(report)
    }

    /// Extract every map entry of `archive_path` into `target`, overwriting.
    ///
    /// Entries are isolated from each other: an entry that fails sanitizing or
    /// writing is recorded and skipped, the rest still extract.
    fn extract_archive(
        &self,
        task: &CopyTask,
        archive_path: &Utf8Path,
        target: &Utf8Path,
    ) -> Result<TaskReport, SyncError> {
        tracing::info!("Processing zip file '{}'.", task.display_path());

        let file = File::open(archive_path).map_err(|e| SyncError::archive_open(archive_path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| SyncError::archive(archive_path, e))?;

        let relevant = self.locator.archive_entries(&archive);

        let mut report = TaskReport {
            total: relevant.len(),
            ..Default::default()
        };
        if relevant.is_empty() {
            tracing::info!("No map entries left in {}", task);
            return Ok(report);
        }

        tracing::info!(
            "Extracting {} files from '{}'.",
            relevant.len(),
            task.display_path()
        );
        let mut progress = ProgressTracker::new("Extracting", relevant.len());

        for (index, entry_name) in relevant {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    let e = SyncError::archive(archive_path, e);
                    tracing::error!("Failed to read '{}': {}", entry_name, e);
                    report.errors.push(e);
                    progress.advance();
                    continue;
                }
            };

            let result = resolve_entry_path(entry_file_name(&entry_name), target).and_then(|path| {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
                }
                let mut out = File::create(&path).map_err(|e| SyncError::io(&path, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| SyncError::io(&path, e))?;
                Ok(())
            });

            match result {
                Ok(()) => {
                    report.written += 1;
                    self.metrics.record_entry_extracted();
                }
                Err(e) => {
                    if matches!(e, SyncError::PathTraversal { .. }) {
                        self.metrics.record_entry_rejected();
                    }
                    tracing::error!("Failed to extract '{}': {}", entry_name, e);
                    report.errors.push(e);
                }
            }
            progress.advance();
        }

        tracing::info!("Finished processing zip file '{}'.", task.display_path());
        Ok(report)
    }
}

impl TaskExecutor for FsTaskExecutor {
    fn execute(&self, task: &CopyTask) -> Result<TaskReport, SyncError> {
        match task {
            CopyTask::DirectoryCopy { folder, target, .. } => {
                self.copy_directory(task, folder, target)
            }
            CopyTask::ArchiveExtract {
                archive, target, ..
            } => self.extract_archive(task, archive, target),
        }
    }
}

/// Copy one file into `target_dir` under the same name, overwriting.
fn copy_file(file: &Utf8Path, target_dir: &Utf8Path) -> Result<(), SyncError> {
    let file_name = file
        .file_name()
        .ok_or_else(|| SyncError::io(file, io::Error::other("path has no file name")))?;
    let target_path = target_dir.join(file_name);
    fs::copy(file, &target_path).map_err(|e| SyncError::io(&target_path, e))?;
    Ok(())
}
