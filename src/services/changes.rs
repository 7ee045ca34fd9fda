use crate::models::{AssetKind, entry_file_name};
use crate::services::hashing::{hash_file, hash_reader};
use crate::services::locator::AssetLocator;
use crate::services::sanitize::resolve_entry_path;
use crate::services::SyncError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::BufReader;
use zip::ZipArchive;

/// Decides whether a source differs from the target directory.
///
/// Only source → target differences are detected: a source file that is
/// missing in the target, or whose content digest differs, is a change. Files
/// that exist only in the target are never reported. Every check stops at the
/// first difference.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    locator: AssetLocator,
    target: Utf8PathBuf,
}

impl ChangeDetector {
    pub fn new(kind: AssetKind, target: impl Into<Utf8PathBuf>) -> Self {
        Self {
            locator: AssetLocator::new(kind),
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Folder form: compares every map file directly inside `folder`.
    ///
    /// A folder without any map files has nothing to copy and reports no changes.
    pub fn folder_has_changes(&self, folder: &Utf8Path) -> Result<bool, SyncError> {
        for source_file in self.locator.asset_files(folder)? {
            let Some(file_name) = source_file.file_name() else {
                continue;
            };
            let target_file = self.target.join(file_name);

            if !target_file.is_file() {
                tracing::debug!("{} is missing from target", file_name);
                return Ok(true);
            }

            if hash_file(&source_file)? != hash_file(&target_file)? {
                tracing::debug!("{} differs from target", file_name);
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Archive form: compares every map entry of a ZIP file.
    ///
    /// Directory entries and entries that are not map files under a maps folder
    /// are ignored. Entries whose name would resolve outside the target are
    /// skipped here; extraction rejects and reports them.
    pub fn archive_has_changes(&self, archive_path: &Utf8Path) -> Result<bool, SyncError> {
        let file = File::open(archive_path).map_err(|e| SyncError::archive_open(archive_path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| SyncError::archive(archive_path, e))?;

        for (index, entry_name) in self.locator.archive_entries(&archive) {
            let target_file = match resolve_entry_path(entry_file_name(&entry_name), &self.target) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Ignoring unsafe entry in {}: {}", archive_path, e);
                    continue;
                }
            };

            if !target_file.is_file() {
                tracing::debug!("{} is missing from target", entry_name);
                return Ok(true);
            }

            let mut entry = archive
                .by_index(index)
                .map_err(|e| SyncError::archive(archive_path, e))?;
            let entry_digest = hash_reader(&mut entry).map_err(|e| SyncError::io(archive_path, e))?;
            if entry_digest != hash_file(&target_file)? {
                tracing::debug!("{} differs from target", entry_name);
                return Ok(true);
            }
        }

        Ok(false)
    }
}
