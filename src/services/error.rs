use camino::Utf8PathBuf;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Errors that can occur while scanning, copying or extracting maps
///
/// Everything except [`SyncError::RunInProgress`] is recoverable: it is logged,
/// raises the run's error flag and the run carries on with the next file, entry
/// or task.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("I/O failure at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Access denied at {path}: {source}")]
    AccessDenied {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Attempted to extract '{entry}' outside of the target directory {root}")]
    PathTraversal { entry: String, root: Utf8PathBuf },

    #[error("Invalid or corrupt ZIP file {path}: {source}")]
    CorruptArchive {
        path: Utf8PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("ZIP file not found: {0}")]
    ArchiveNotFound(Utf8PathBuf),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("An install run is already in progress")]
    RunInProgress,
}

impl SyncError {
    /// Wrap a filesystem error, splitting out permission failures.
    pub fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => SyncError::AccessDenied { path, source },
            _ => SyncError::Io { path, source },
        }
    }

    /// Wrap an error raised while opening or reading an archive.
    pub fn archive(path: impl Into<Utf8PathBuf>, source: ZipError) -> Self {
        let path = path.into();
        match source {
            ZipError::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                SyncError::ArchiveNotFound(path)
            }
            ZipError::Io(err) => SyncError::io(path, err),
            other => SyncError::CorruptArchive {
                path,
                source: other,
            },
        }
    }

    /// Open-time variant of [`SyncError::io`]: a vanished archive is reported as such.
    pub fn archive_open(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            SyncError::ArchiveNotFound(path)
        } else {
            SyncError::io(path, source)
        }
    }

    /// Whether the run may log this error and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::RunInProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_maps_to_access_denied() {
        let err = SyncError::io(
            "/maps/a.cok",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, SyncError::AccessDenied { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_other_io_maps_to_io() {
        let err = SyncError::io("/maps/a.cok", io::Error::other("disk full"));
        assert!(matches!(err, SyncError::Io { .. }));
        assert!(err.to_string().contains("/maps/a.cok"));
    }

    #[test]
    fn test_archive_error_mapping() {
        let missing = SyncError::archive(
            "a.zip",
            ZipError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")),
        );
        assert!(matches!(missing, SyncError::ArchiveNotFound(_)));

        let corrupt = SyncError::archive("a.zip", ZipError::InvalidArchive("bad header".into()));
        assert!(matches!(corrupt, SyncError::CorruptArchive { .. }));

        let opened = SyncError::archive_open(
            "a.zip",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(opened, SyncError::ArchiveNotFound(_)));
    }

    #[test]
    fn test_run_in_progress_is_not_recoverable() {
        assert!(!SyncError::RunInProgress.is_recoverable());
        let traversal = SyncError::PathTraversal {
            entry: "..".to_string(),
            root: Utf8PathBuf::from("/maps"),
        };
        assert!(traversal.is_recoverable());
    }
}
