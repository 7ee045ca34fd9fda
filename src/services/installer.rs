use crate::metrics::SyncMetrics;
use crate::models::{AssetKind, CopyTask, InstallPhase, RootKind, SourceRoot, relative_display};
use crate::services::changes::ChangeDetector;
use crate::services::copier::{FsTaskExecutor, TaskExecutor};
use crate::services::locator::AssetLocator;
use crate::services::queue::{RunSummary, TaskQueue};
use crate::services::SyncError;
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

/// Advisory shown once at the end of a run that hit errors.
pub const SUPPORT_MESSAGE: &str = "Map installer encountered errors trying to copy maps, \
     for support please visit the community Discord referencing the error.";

/// Result of scanning all source roots.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub queue: TaskQueue,
    /// Tasks queued per source root, in scan order
    pub queued_per_root: IndexMap<Utf8PathBuf, usize>,
}

/// Syncs map assets from plugin folders and archives into one target directory.
///
/// A run goes `EnsureTarget -> Scan -> RunQueue -> Complete`. Scanning happens
/// on the caller; the queued copies run strictly in order on a single blocking
/// worker. Every filesystem or archive failure is logged, raises the run's
/// error flag and is skipped.
///
/// # Usage Example
///
/// ```ignore
/// let installer = MapInstaller::new(
///     AssetKind::default(),
///     "/home/me/Maps",
///     vec![SourceRoot::plugins("/game/BepInEx/plugins", "/game/BepInEx")],
/// );
/// let summary = installer.run().await?;
/// ```
pub struct MapInstaller {
    locator: AssetLocator,
    detector: ChangeDetector,
    target: Utf8PathBuf,
    roots: Vec<SourceRoot>,
    executor: Arc<dyn TaskExecutor>,
    state: Arc<StateManager>,
    metrics: Arc<SyncMetrics>,
    running: AtomicBool,
}

/// Clears the run-in-progress flag on every exit path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MapInstaller {
    /// Create an installer that copies with the filesystem executor.
    pub fn new(kind: AssetKind, target: impl Into<Utf8PathBuf>, roots: Vec<SourceRoot>) -> Self {
        let metrics = Arc::new(SyncMetrics::new());
        let executor = Arc::new(FsTaskExecutor::new(kind.clone(), metrics.clone()));
        Self::with_executor(kind, target, roots, executor, metrics)
    }

    /// Create an installer with a custom task executor.
    pub fn with_executor(
        kind: AssetKind,
        target: impl Into<Utf8PathBuf>,
        roots: Vec<SourceRoot>,
        executor: Arc<dyn TaskExecutor>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        let target = target.into();
        Self {
            locator: AssetLocator::new(kind.clone()),
            detector: ChangeDetector::new(kind, target.clone()),
            target,
            roots,
            executor,
            state: Arc::new(StateManager::new()),
            metrics,
            running: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    pub fn roots(&self) -> &[SourceRoot] {
        &self.roots
    }

    /// Run a full install: ensure target, scan, copy, report.
    ///
    /// # Errors
    ///
    /// - [`SyncError::RunInProgress`] if this installer is already running
    /// - A worker join error if a task panicked; panics are not recovered
    ///
    /// Filesystem and archive failures are never returned here; they show up
    /// in the summary and the error flag.
    ///
    /// Ensure-target and scan (listing and hashing every source) run inline on
    /// the polling thread before the first await. Drive this from a dedicated
    /// runtime, not one shared with latency-sensitive tasks.
    pub async fn run(&self) -> Result<RunSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SyncError::RunInProgress.into());
        }
        let _guard = RunGuard(&self.running);

        self.state.begin_run();
        self.metrics.reset();

        self.state.set_phase(InstallPhase::EnsureTarget);
        if let Err(e) = self.ensure_target() {
            self.record_error(&e);
        }

        self.state.set_phase(InstallPhase::Scan);
        let ScanOutcome {
            mut queue,
            queued_per_root,
        } = self.scan();

        for (root, queued) in &queued_per_root {
            tracing::debug!("{} task(s) queued from {}", queued, root);
        }

        let mut summary = RunSummary::default();

        if queue.is_empty() {
            tracing::info!("No changes detected!");
        } else {
            self.state.set_phase(InstallPhase::RunQueue);
            tracing::info!("Running {} queued copy task(s)", queue.len());

            let executor = self.executor.clone();
            let state = self.state.clone();
            let metrics = self.metrics.clone();
            summary = tokio::task::spawn_blocking(move || {
                queue.run_all(executor.as_ref(), &state, &metrics)
            })
            .await
            .context("Copy worker terminated unexpectedly")?;
        }

        summary.errors = self.state.read(|s| s.error_count);
        self.complete();
        Ok(summary)
    }

    /// Create the target directory if it is missing.
    pub fn ensure_target(&self) -> Result<(), SyncError> {
        fs::create_dir_all(&self.target).map_err(|e| SyncError::io(&self.target, e))
    }

    /// Scan every source root and queue a task per changed folder or archive.
    ///
    /// Folders come before archives within a root; roots are scanned in order.
    pub fn scan(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for root in &self.roots {
            if !root.path.is_dir() {
                tracing::warn!("Source folder {} does not exist, skipping", root.path);
                continue;
            }

            tracing::info!("Scanning {} folder '{}'...", root_label(root.kind), root.path);
            let before = outcome.queue.len();
            self.scan_directories(root, &mut outcome.queue);
            self.scan_archives(root, &mut outcome.queue);

            let queued = outcome.queue.len() - before;
            if queued == 0 {
                tracing::info!("No changes in '{}'", root.path);
            }
            outcome.queued_per_root.insert(root.path.clone(), queued);
        }

        outcome
    }

    fn scan_directories(&self, root: &SourceRoot, queue: &mut TaskQueue) {
        let directories = match subdirectories(&root.path) {
            Ok(dirs) => dirs,
            Err(e) => {
                self.record_error(&e);
                return;
            }
        };

        for directory in directories {
            let result = self.locator.classify(&directory).and_then(|collection| {
                match collection {
                    Some(collection) => Ok(self
                        .detector
                        .folder_has_changes(&collection.folder)?
                        .then_some(collection.folder)),
                    None => Ok(None),
                }
            });

            match result {
                Ok(Some(folder)) => {
                    tracing::info!(
                        "Detected changes at '{}', queuing for copy...",
                        relative_display(&root.path, &folder)
                    );
                    self.queue_task(
                        queue,
                        CopyTask::DirectoryCopy {
                            source_root: root.path.clone(),
                            folder,
                            target: self.target.clone(),
                        },
                    );
                }
                Ok(None) => {}
                Err(e) => self.record_error(&e),
            }
        }
    }

    fn scan_archives(&self, root: &SourceRoot, queue: &mut TaskQueue) {
        for archive in self.find_archives(&root.path) {
            match self.detector.archive_has_changes(&archive) {
                Ok(true) => {
                    tracing::info!(
                        "Detected changes in map ZIP '{}', queuing for copy...",
                        relative_display(&root.path, &archive)
                    );
                    self.queue_task(
                        queue,
                        CopyTask::ArchiveExtract {
                            source_root: root.path.clone(),
                            archive,
                            target: self.target.clone(),
                        },
                    );
                }
                Ok(false) => {}
                Err(e) => self.record_error(&e),
            }
        }
    }

    /// All `*.zip` files below `root`, recursively, sorted by path.
    fn find_archives(&self, root: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut archives = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .and_then(Utf8Path::from_path)
                        .map(Utf8Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    let err = match e.into_io_error() {
                        Some(io) => SyncError::io(path, io),
                        None => SyncError::io(path, std::io::Error::other("filesystem loop")),
                    };
                    self.record_error(&err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let is_zip = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
            if !is_zip {
                continue;
            }

            match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => archives.push(path),
                Err(path) => self.record_error(&SyncError::NonUtf8Path(path)),
            }
        }

        archives.sort();
        archives
    }

    fn queue_task(&self, queue: &mut TaskQueue, task: CopyTask) {
        self.metrics.record_change_detected();
        self.state.task_queued(task.to_string());
        queue.enqueue(task);
    }

    /// Log a recoverable error and raise the error flag.
    fn record_error(&self, error: &SyncError) {
        tracing::error!("{}", error);
        self.metrics.record_error();
        self.state.record_error(error.to_string());
    }

    /// Report errors and release the finished run.
    fn complete(&self) {
        self.state.set_phase(InstallPhase::Complete);
        self.check_for_errors();
        self.metrics.log_summary();
    }

    /// Emit the support message when the run hit any error.
    fn check_for_errors(&self) {
        if !self.state.has_errors() {
            return;
        }

        tracing::info!("{}", SUPPORT_MESSAGE);
        if let Some(log_location) = self.log_location() {
            tracing::info!("See log file at: {}", log_location);
        }
    }

    /// Log location for the support message: the profile root's if one is
    /// configured, else the first root's.
    pub fn log_location(&self) -> Option<&Utf8Path> {
        self.roots
            .iter()
            .find(|root| root.kind == RootKind::Profile)
            .or_else(|| self.roots.first())
            .map(|root| root.log_location.as_path())
    }
}

fn root_label(kind: RootKind) -> &'static str {
    match kind {
        RootKind::Plugins => "plugins",
        RootKind::Profile => "profile",
    }
}

/// Immediate subdirectories of `root`, sorted by path.
fn subdirectories(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SyncError> {
    let mut directories = Vec::new();
    for entry in root.read_dir_utf8().map_err(|e| SyncError::io(root, e))? {
        let entry = entry.map_err(|e| SyncError::io(root, e))?;
        if entry.file_type().map_err(|e| SyncError::io(entry.path(), e))?.is_dir() {
            directories.push(entry.into_path());
        }
    }
    directories.sort();
    Ok(directories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Run once on a current-thread runtime and return everything logged.
    fn run_capturing_logs(installer: &MapInstaller) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        tracing::subscriber::with_default(subscriber, || {
            runtime.block_on(installer.run()).unwrap();
        });
        logs.contents()
    }

    fn setup() -> (TempDir, Utf8PathBuf, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let plugins = root.join("plugins");
        fs::create_dir_all(&plugins).unwrap();
        (temp_dir, plugins, root.join("Maps"))
    }

    #[test]
    fn test_scan_queues_changed_folders() {
        let (_temp_dir, plugins, target) = setup();
        fs::create_dir_all(plugins.join("ModA/Maps")).unwrap();
        fs::write(plugins.join("ModA/Maps/a.cok"), b"X").unwrap();
        fs::create_dir_all(plugins.join("ModB")).unwrap();
        fs::write(plugins.join("ModB/b.cok"), b"X").unwrap();
        fs::write(plugins.join("ModB/b.cok.cid"), b"Y").unwrap();
        fs::create_dir_all(plugins.join("NotAMap")).unwrap();

        let installer = MapInstaller::new(
            AssetKind::default(),
            &target,
            vec![SourceRoot::plugins(&plugins, "logs")],
        );
        installer.ensure_target().unwrap();
        let outcome = installer.scan();

        assert_eq!(outcome.queue.len(), 2);
        assert_eq!(outcome.queue.tasks()[0].source(), plugins.join("ModA/Maps").as_path());
        assert_eq!(outcome.queue.tasks()[1].source(), plugins.join("ModB").as_path());
        assert_eq!(outcome.queued_per_root.get(&plugins), Some(&2));
    }

    #[test]
    fn test_scan_skips_missing_root() {
        let (_temp_dir, plugins, target) = setup();
        let installer = MapInstaller::new(
            AssetKind::default(),
            &target,
            vec![SourceRoot::plugins(plugins.join("nope"), "logs")],
        );
        let outcome = installer.scan();
        assert!(outcome.queue.is_empty());
        assert!(!installer.state().has_errors());
    }

    #[test]
    fn test_log_location_prefers_profile_root() {
        let installer = MapInstaller::new(
            AssetKind::default(),
            "/maps",
            vec![
                SourceRoot::plugins("/game/plugins", "/game/logs"),
                SourceRoot::profile("/profiles/p/BepInEx/plugins", "/profiles/p/BepInEx"),
            ],
        );
        assert_eq!(
            installer.log_location(),
            Some(Utf8Path::new("/profiles/p/BepInEx"))
        );

        let plugins_only = MapInstaller::new(
            AssetKind::default(),
            "/maps",
            vec![SourceRoot::plugins("/game/plugins", "/game/logs")],
        );
        assert_eq!(plugins_only.log_location(), Some(Utf8Path::new("/game/logs")));
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected() {
        let (_temp_dir, plugins, target) = setup();
        let installer = MapInstaller::new(
            AssetKind::default(),
            &target,
            vec![SourceRoot::plugins(&plugins, "logs")],
        );

        installer.running.store(true, Ordering::Release);
        let err = installer.run().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::RunInProgress)
        ));

        installer.running.store(false, Ordering::Release);
        assert!(installer.run().await.is_ok());
    }

    #[test]
    fn test_support_message_only_after_errors() {
        let (_temp_dir, plugins, target) = setup();
        let profile_plugins = plugins.join("profile/BepInEx/plugins");
        fs::create_dir_all(profile_plugins.join("ModBad")).unwrap();
        fs::write(profile_plugins.join("ModBad/broken.zip"), b"not a zip").unwrap();
        let profile_log = plugins.join("profile/BepInEx");

        let installer = MapInstaller::new(
            AssetKind::default(),
            &target,
            vec![
                SourceRoot::plugins(plugins.join("game"), "game-logs"),
                SourceRoot::profile(&profile_plugins, &profile_log),
            ],
        );

        let logs = run_capturing_logs(&installer);
        assert!(logs.contains(SUPPORT_MESSAGE));
        assert!(logs.contains(&format!("See log file at: {}", profile_log)));

        fs::remove_file(profile_plugins.join("ModBad/broken.zip")).unwrap();
        let logs = run_capturing_logs(&installer);
        assert!(logs.contains("No changes detected!"));
        assert!(!logs.contains(SUPPORT_MESSAGE));
        assert!(!logs.contains("See log file at:"));
    }
}
