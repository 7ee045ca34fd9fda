//! Mod manager profile detection.
//!
//! Mod managers keep one plugin folder per profile. The profile the user played
//! last is assumed to be the one whose plugin folder holds the most recently
//! modified file.
//!
//! # Examples
//!
//! ```ignore
//! use map_installer::services::profile_detection::find_active_profile;
//! use camino::Utf8Path;
//!
//! let plugins = find_active_profile(Utf8Path::new("profiles"), "BepInEx/plugins")?;
//! ```

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::SystemTime;
use walkdir::WalkDir;

/// Finds the plugin folder of the most recently used profile.
///
/// # Arguments
///
/// * `profiles_dir` - Directory with one subdirectory per profile
/// * `plugins_subdir` - Plugin folder inside each profile (e.g. `BepInEx/plugins`)
///
/// # Returns
///
/// `<profile>/<plugins_subdir>` of the winning profile, or `None` when the
/// profiles directory is missing or no profile has any files in its plugin folder.
///
/// # Errors
///
/// Returns an error if the profiles directory cannot be listed
pub fn find_active_profile(profiles_dir: &Utf8Path, plugins_subdir: &str) -> Result<Option<Utf8PathBuf>> {
    if !profiles_dir.is_dir() {
        tracing::debug!("Profiles directory {} not found", profiles_dir);
        return Ok(None);
    }

    let mut most_recent: Option<(SystemTime, Utf8PathBuf)> = None;

    let entries = fs::read_dir(profiles_dir)
        .with_context(|| format!("Failed to list profiles in {}", profiles_dir))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list profiles in {}", profiles_dir))?;
        let Ok(profile_dir) = Utf8PathBuf::from_path_buf(entry.path()) else {
            tracing::warn!("Skipping profile with non UTF-8 path: {}", entry.path().display());
            continue;
        };

        let plugins_dir = profile_dir.join(plugins_subdir);
        if !plugins_dir.is_dir() {
            continue;
        }

        let Some(modified) = most_recent_modification(&plugins_dir) else {
            tracing::debug!("Profile {} has no files, skipping", profile_dir);
            continue;
        };

        let is_newer = most_recent
            .as_ref()
            .is_none_or(|(current, _)| modified > *current);
        if is_newer {
            most_recent = Some((modified, plugins_dir));
        }
    }

    if let Some((_, plugins_dir)) = &most_recent {
        tracing::info!("Active profile plugin folder: {}", plugins_dir);
    }

    Ok(most_recent.map(|(_, plugins_dir)| plugins_dir))
}

/// Newest modification time of any file below `directory`, recursively.
///
/// Unreadable entries are ignored. `None` when there are no files.
pub fn most_recent_modification(directory: &Utf8Path) -> Option<SystemTime> {
    WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Utf8Path, age: Duration) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_missing_profiles_dir() {
        let result = find_active_profile(Utf8Path::new("/no/such/profiles"), "BepInEx/plugins");
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_most_recent_profile_wins() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

        touch(
            &root.join("Old/BepInEx/plugins/ModA/a.dll"),
            Duration::from_secs(3600),
        );
        touch(
            &root.join("New/BepInEx/plugins/deep/nested/b.dll"),
            Duration::from_secs(60),
        );

        let result = find_active_profile(&root, "BepInEx/plugins").unwrap();
        assert_eq!(result, Some(root.join("New/BepInEx/plugins")));
    }

    #[test]
    fn test_empty_profile_never_wins() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("Empty/BepInEx/plugins")).unwrap();

        assert_eq!(find_active_profile(&root, "BepInEx/plugins").unwrap(), None);
    }

    #[test]
    fn test_most_recent_modification_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(most_recent_modification(&root), None);
    }
}
