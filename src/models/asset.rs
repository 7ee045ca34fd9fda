/// Describes which files make up a map asset.
///
/// A map is a primary data file (`park.cok`) plus a companion identifier file
/// that appends a second extension to the primary one (`park.cok.cid`). Maps are
/// either shipped loose in a dedicated folder (`Maps/`) or flattened next to
/// other plugin files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetKind {
    primary_suffix: String,
    identifier_suffix: String,
    maps_folder: String,
}

impl AssetKind {
    /// Build an asset kind from bare extensions (no leading dot).
    ///
    /// # Arguments
    /// * `primary_extension` - Extension of the map data file (e.g. "cok")
    /// * `identifier_extension` - Extension appended for the identifier file (e.g. "cid")
    /// * `maps_folder` - Name of the dedicated maps folder (e.g. "Maps")
    pub fn new(primary_extension: &str, identifier_extension: &str, maps_folder: &str) -> Self {
        let primary_suffix = format!(".{}", primary_extension.trim_start_matches('.')).to_lowercase();
        let identifier_suffix = format!(
            "{}.{}",
            primary_suffix,
            identifier_extension.trim_start_matches('.').to_lowercase()
        );

        Self {
            primary_suffix,
            identifier_suffix,
            maps_folder: maps_folder.to_string(),
        }
    }

    /// Name of the dedicated maps folder.
    pub fn maps_folder(&self) -> &str {
        &self.maps_folder
    }

    /// Suffix of primary files, e.g. `.cok`.
    pub fn primary_suffix(&self) -> &str {
        &self.primary_suffix
    }

    /// Suffix of identifier files, e.g. `.cok.cid`.
    pub fn identifier_suffix(&self) -> &str {
        &self.identifier_suffix
    }

    pub fn is_primary(&self, file_name: &str) -> bool {
        file_name.to_lowercase().ends_with(&self.primary_suffix)
    }

    pub fn is_identifier(&self, file_name: &str) -> bool {
        file_name.to_lowercase().ends_with(&self.identifier_suffix)
    }

    /// True for either half of a map pair.
    pub fn is_asset_file(&self, file_name: &str) -> bool {
        self.is_primary(file_name) || self.is_identifier(file_name)
    }

    /// Name of the primary file an identifier file belongs to.
    ///
    /// `park.cok.cid` → `park.cok`. Returns `None` for anything that is not an
    /// identifier file.
    pub fn primary_for_identifier<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        if !self.is_identifier(file_name) {
            return None;
        }
        let strip = self.identifier_suffix.len() - self.primary_suffix.len();
        file_name.get(..file_name.len() - strip)
    }

    /// Whether an archive entry should be treated as a map file.
    ///
    /// The entry path is normalized to `/` separators and matched
    /// case-insensitively. The maps folder test is a plain substring check, not
    /// a segment match, so `foo/OldMaps/x.cok` is accepted too.
    pub fn is_archive_asset(&self, entry_name: &str) -> bool {
        let normalized = entry_name.replace('\\', "/").to_lowercase();
        if normalized.ends_with('/') {
            return false;
        }

        let marker = format!("{}/", self.maps_folder.to_lowercase());
        normalized.contains(&marker) && self.is_asset_file(&normalized)
    }
}

impl Default for AssetKind {
    fn default() -> Self {
        Self::new("cok", "cid", "Maps")
    }
}

/// Final path component of an archive entry name.
///
/// Directory components inside archives are dropped on extraction, so only the
/// base file name is ever used to build a target path.
pub fn entry_file_name(entry_name: &str) -> &str {
    entry_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(entry_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes() {
        let kind = AssetKind::default();
        assert_eq!(kind.primary_suffix(), ".cok");
        assert_eq!(kind.identifier_suffix(), ".cok.cid");
        assert_eq!(kind.maps_folder(), "Maps");
    }

    #[test]
    fn test_primary_and_identifier_are_disjoint() {
        let kind = AssetKind::default();
        assert!(kind.is_primary("park.cok"));
        assert!(!kind.is_identifier("park.cok"));
        assert!(kind.is_identifier("park.cok.cid"));
        assert!(!kind.is_primary("park.cok.cid"));
        assert!(kind.is_primary("PARK.COK"));
        assert!(!kind.is_asset_file("readme.txt"));
    }

    #[test]
    fn test_primary_for_identifier() {
        let kind = AssetKind::default();
        assert_eq!(kind.primary_for_identifier("park.cok.cid"), Some("park.cok"));
        assert_eq!(kind.primary_for_identifier("Park.COK.CID"), Some("Park.COK"));
        assert_eq!(kind.primary_for_identifier("park.cok"), None);
    }

    #[test]
    fn test_archive_asset_predicate() {
        let kind = AssetKind::default();
        assert!(kind.is_archive_asset("Maps/b.cok"));
        assert!(kind.is_archive_asset("Mod/maps/b.cok.cid"));
        assert!(kind.is_archive_asset("Mod\\MAPS\\b.cok"));
        assert!(kind.is_archive_asset("foo/OldMaps/x.cok"));
        assert!(!kind.is_archive_asset("Readme/notes.txt"));
        assert!(!kind.is_archive_asset("Maps/notes.txt"));
        assert!(!kind.is_archive_asset("b.cok"));
        assert!(!kind.is_archive_asset("Maps/"));
    }

    #[test]
    fn test_custom_extensions() {
        let kind = AssetKind::new(".map", "id", "Levels");
        assert!(kind.is_primary("a.map"));
        assert!(kind.is_identifier("a.map.id"));
        assert!(kind.is_archive_asset("levels/a.map"));
    }

    #[test]
    fn test_entry_file_name() {
        assert_eq!(entry_file_name("Maps/b.cok"), "b.cok");
        assert_eq!(entry_file_name("a\\b\\c.cok.cid"), "c.cok.cid");
        assert_eq!(entry_file_name("../evil.cok"), "evil.cok");
        assert_eq!(entry_file_name("plain.cok"), "plain.cok");
    }
}
