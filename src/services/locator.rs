use crate::models::AssetKind;
use crate::services::SyncError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// How the maps in a collection are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionLayout {
    /// A dedicated `Maps` subfolder
    MapsFolder,
    /// `<name>.cok` / `<name>.cok.cid` pairs directly inside the plugin folder
    Flattened,
}

/// A folder that holds map files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCollection {
    pub folder: Utf8PathBuf,
    pub layout: CollectionLayout,
}

/// Decides whether a plugin folder ships maps, and where.
#[derive(Debug, Clone, Default)]
pub struct AssetLocator {
    kind: AssetKind,
}

impl AssetLocator {
    pub fn new(kind: AssetKind) -> Self {
        Self { kind }
    }

    /// Classify a directory.
    ///
    /// 1. A `Maps` subfolder (ASCII case-insensitive) wins.
    /// 2. Otherwise the directory itself qualifies if any identifier file has
    ///    its primary file next to it.
    /// 3. Otherwise it is not a map collection.
    pub fn classify(&self, directory: &Utf8Path) -> Result<Option<AssetCollection>, SyncError> {
        let mut identifiers = Vec::new();

        for entry in fs::read_dir(directory).map_err(|e| SyncError::io(directory, e))? {
            let entry = entry.map_err(|e| SyncError::io(directory, e))?;
            let file_type = entry.file_type().map_err(|e| SyncError::io(directory, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };

            if file_type.is_dir() && name.eq_ignore_ascii_case(self.kind.maps_folder()) {
                return Ok(Some(AssetCollection {
                    folder: directory.join(name),
                    layout: CollectionLayout::MapsFolder,
                }));
            }

            if file_type.is_file() && self.kind.is_identifier(&name) {
                identifiers.push(name);
            }
        }

        let has_pair = identifiers.iter().any(|identifier| {
            self.kind
                .primary_for_identifier(identifier)
                .is_some_and(|primary| directory.join(primary).is_file())
        });

        if has_pair {
            return Ok(Some(AssetCollection {
                folder: directory.to_path_buf(),
                layout: CollectionLayout::Flattened,
            }));
        }

        Ok(None)
    }

    /// Map files directly inside `folder`: identifier files first, then primary
    /// files, each group sorted by name. Subfolders are not searched.
    pub fn asset_files(&self, folder: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SyncError> {
        let mut identifiers = Vec::new();
        let mut primaries = Vec::new();

        for entry in fs::read_dir(folder).map_err(|e| SyncError::io(folder, e))? {
            let entry = entry.map_err(|e| SyncError::io(folder, e))?;
            let file_type = entry.file_type().map_err(|e| SyncError::io(folder, e))?;
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::warn!("Skipping non UTF-8 file name in {}", folder);
                continue;
            };

            if self.kind.is_identifier(&name) {
                identifiers.push(folder.join(name));
            } else if self.kind.is_primary(&name) {
                primaries.push(folder.join(name));
            }
        }

        identifiers.sort();
        primaries.sort();
        identifiers.extend(primaries);
        Ok(identifiers)
    }

    /// Indices and names of the map entries of an archive, in archive order.
    ///
    /// Selection uses the central directory names only. No entry is opened,
    /// so encrypted or unsupported entries that are not maps never matter.
    pub fn archive_entries<R: Read + Seek>(&self, archive: &ZipArchive<R>) -> Vec<(usize, String)> {
        (0..archive.len())
            .filter_map(|index| {
                let name = archive.name_for_index(index)?;
                self.kind
                    .is_archive_asset(name)
                    .then(|| (index, name.to_string()))
            })
            .collect()
    }

    pub fn kind(&self) -> &AssetKind {
        &self.kind
    }
}
