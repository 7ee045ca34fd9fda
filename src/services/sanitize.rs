//! Guards archive extraction against zip-slip.
//!
//! An entry name is joined onto the target root, normalized lexically (the
//! destination file usually does not exist yet, so it cannot be canonicalized
//! by the filesystem), and must still lie under the root.

use crate::services::SyncError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Resolves the absolute destination of an archive entry.
///
/// # Arguments
/// * `entry_name` - Entry file name (usually already reduced to its base name)
/// * `target_root` - Directory the entry is extracted into
///
/// # Errors
///
/// [`SyncError::PathTraversal`] when the resolved path is not strictly inside
/// `target_root` (e.g. `..` segments or an absolute entry name).
pub fn resolve_entry_path(entry_name: &str, target_root: &Utf8Path) -> Result<Utf8PathBuf, SyncError> {
    let root = normalize(&absolute(target_root)?);
    let resolved = normalize(&root.join(entry_name));

    if !is_strictly_within(&resolved, &root) {
        return Err(SyncError::PathTraversal {
            entry: entry_name.to_string(),
            root,
        });
    }

    Ok(resolved)
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf, SyncError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| SyncError::io(path, e))?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(SyncError::NonUtf8Path)?;
    Ok(cwd.join(path))
}

/// Collapses `.` and `..` without touching the filesystem.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::Normal(_) => {
                out.push(component.as_str());
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                // `..` at the root stays at the root
                if matches!(out.components().next_back(), Some(Utf8Component::Normal(_))) {
                    out.pop();
                }
            }
        }
    }
    out
}

/// Case-insensitive, component-wise prefix test that rejects `root` itself.
fn is_strictly_within(path: &Utf8Path, root: &Utf8Path) -> bool {
    let mut path_components = path.components();
    for root_component in root.components() {
        match path_components.next() {
            Some(c) if c.as_str().eq_ignore_ascii_case(root_component.as_str()) => {}
            _ => return false,
        }
    }
    path_components.next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn root() -> Utf8PathBuf {
        if cfg!(windows) {
            Utf8PathBuf::from("C:\\Games\\Maps")
        } else {
            Utf8PathBuf::from("/games/Maps")
        }
    }

    #[test]
    fn test_plain_name_resolves_under_root() {
        let resolved = resolve_entry_path("skin.cok", &root()).unwrap();
        assert_eq!(resolved, root().join("skin.cok"));
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let err = resolve_entry_path("../../etc/passwd", &root()).unwrap_err();
        assert!(matches!(err, SyncError::PathTraversal { .. }));
    }

    #[test]
    fn test_absolute_entry_rejected() {
        let entry = if cfg!(windows) { "D:\\evil.cok" } else { "/etc/evil.cok" };
        assert!(matches!(
            resolve_entry_path(entry, &root()),
            Err(SyncError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_sibling_with_common_prefix_rejected() {
        // `/games/MapsEvil` shares a string prefix with `/games/Maps`
        assert!(resolve_entry_path("../MapsEvil/x.cok", &root()).is_err());
    }

    #[test]
    fn test_root_itself_rejected() {
        assert!(resolve_entry_path(".", &root()).is_err());
        assert!(resolve_entry_path("", &root()).is_err());
    }

    #[test]
    fn test_inner_dot_segments_are_collapsed() {
        let resolved = resolve_entry_path("sub/../park.cok", &root()).unwrap();
        assert_eq!(resolved, root().join("park.cok"));
    }

    #[test]
    fn test_prefix_comparison_ignores_case() {
        assert!(is_strictly_within(
            Utf8Path::new("/GAMES/maps/a.cok"),
            Utf8Path::new("/games/Maps")
        ));
    }

    #[test]
    fn test_normalize_stops_at_root() {
        assert_eq!(normalize(Utf8Path::new("/a/../../b")), Utf8PathBuf::from("/b"));
    }

    proptest! {
        #[test]
        fn prop_resolved_paths_stay_under_root(name in "[a-zA-Z0-9_./\\\\-]{0,24}") {
            if let Ok(resolved) = resolve_entry_path(&name, &root()) {
                prop_assert!(is_strictly_within(&resolved, &root()));
            }
        }
    }
}
