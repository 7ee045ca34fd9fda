//! Map Installer - syncs map assets from plugin folders and map archives
//!
//! Main entry point for the command line application.
//!
//! # Execution Flow
//!
//! 1. Load `Map Installer.yaml` from `MapInstaller Data/` (environment overrides applied)
//! 2. Initialize logging → logs/map-installer.<date>
//! 3. Collect source roots: configured plugin folders plus the most recently used
//!    mod manager profile, if a profiles directory is configured
//! 4. Run one install on a tokio runtime and log the summary
//!
//! The process exits non-zero only when the run itself could not complete.
//! Per-file failures are reported through the log and the support message.

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use map_installer::models::InstallerSettings;
use map_installer::services::find_active_profile;
use map_installer::{APP_NAME, ConfigManager, MapInstaller, SourceRoot, VERSION};

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("MapInstaller Data")?;
    let config = config_manager.load_config()?;
    let settings = config.installer;

    let _guard = map_installer::logging::setup_logging(
        &settings.log_dir,
        "map-installer",
        settings.debug_mode,
        settings.console_output,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let roots = collect_source_roots(&settings)?;
    if roots.is_empty() {
        tracing::warn!("No source roots configured, nothing to scan");
    }

    let installer = MapInstaller::new(settings.asset_kind(), settings.target_dir.clone(), roots);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("map-installer-worker")
        .build()?;

    let summary = runtime.block_on(installer.run())?;

    tracing::info!(
        "Install finished: {} tasks run, {} failed, {} files written, {} errors",
        summary.tasks_run,
        summary.tasks_failed,
        summary.files_written,
        summary.errors
    );

    Ok(())
}

/// Configured plugin folders first, then the active mod manager profile.
fn collect_source_roots(settings: &InstallerSettings) -> Result<Vec<SourceRoot>> {
    let mut roots: Vec<SourceRoot> = settings
        .source_roots
        .iter()
        .map(|path| {
            let log_location = path.parent().unwrap_or(path).to_path_buf();
            SourceRoot::plugins(path.clone(), log_location)
        })
        .collect();

    if let Some(profiles_dir) = &settings.profiles_dir {
        if let Some(plugins_dir) =
            find_active_profile(profiles_dir, &settings.profile_plugins_subdir)?
        {
            let profile_dir = profile_dir_of(&plugins_dir, &settings.profile_plugins_subdir);
            let log_location = profile_dir.join(&settings.profile_log_subdir);
            roots.push(SourceRoot::profile(plugins_dir, log_location));
        } else {
            tracing::info!("No active profile found in {}", profiles_dir);
        }
    }

    Ok(roots)
}

/// Strips the plugin subfolder back off a profile's plugin path.
fn profile_dir_of(plugins_dir: &Utf8Path, plugins_subdir: &str) -> Utf8PathBuf {
    let depth = Utf8Path::new(plugins_subdir).components().count();
    plugins_dir
        .ancestors()
        .nth(depth)
        .unwrap_or(plugins_dir)
        .to_path_buf()
}
