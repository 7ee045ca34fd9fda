use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Where a source root came from.
///
/// The variant only changes where the end-of-run support message points users
/// for the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// The game's own plugin folder
    Plugins,
    /// A mod manager profile discovered at startup
    Profile,
}

/// A directory scanned for map folders and archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub path: Utf8PathBuf,
    pub kind: RootKind,
    /// Log file location quoted in the support message for this root
    pub log_location: Utf8PathBuf,
}

impl SourceRoot {
    pub fn plugins(path: impl Into<Utf8PathBuf>, log_location: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: RootKind::Plugins,
            log_location: log_location.into(),
        }
    }

    pub fn profile(path: impl Into<Utf8PathBuf>, log_location: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: RootKind::Profile,
            log_location: log_location.into(),
        }
    }
}

/// A deferred copy operation.
///
/// Tasks only carry locations. The file list is resolved again when the task
/// executes so files added between scan and copy are still picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyTask {
    /// Copy the map files of a loose folder into the target directory
    DirectoryCopy {
        source_root: Utf8PathBuf,
        folder: Utf8PathBuf,
        target: Utf8PathBuf,
    },
    /// Extract the map entries of a ZIP archive into the target directory
    ArchiveExtract {
        source_root: Utf8PathBuf,
        archive: Utf8PathBuf,
        target: Utf8PathBuf,
    },
}

impl CopyTask {
    /// Path of the folder or archive this task reads from.
    pub fn source(&self) -> &Utf8Path {
        match self {
            CopyTask::DirectoryCopy { folder, .. } => folder,
            CopyTask::ArchiveExtract { archive, .. } => archive,
        }
    }

    pub fn target(&self) -> &Utf8Path {
        match self {
            CopyTask::DirectoryCopy { target, .. } | CopyTask::ArchiveExtract { target, .. } => {
                target
            }
        }
    }

    /// Source path relative to its root, for log lines.
    pub fn display_path(&self) -> String {
        let root = match self {
            CopyTask::DirectoryCopy { source_root, .. }
            | CopyTask::ArchiveExtract { source_root, .. } => source_root,
        };
        relative_display(root, self.source())
    }
}

impl fmt::Display for CopyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyTask::DirectoryCopy { .. } => write!(f, "folder '{}'", self.display_path()),
            CopyTask::ArchiveExtract { .. } => write!(f, "zip file '{}'", self.display_path()),
        }
    }
}

/// `path` relative to `root`, or the full path when it is not under `root`.
pub fn relative_display(root: &Utf8Path, path: &Utf8Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string(),
        Err(_) => path.to_string(),
    }
}
