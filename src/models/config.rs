use crate::models::AssetKind;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Configuration from `Map Installer.yaml`
///
/// Every key is optional; missing keys fall back to the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallerConfig {
    #[serde(default)]
    pub installer: InstallerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    /// Plugin folders scanned for maps (absolute paths)
    pub source_roots: Vec<Utf8PathBuf>,

    /// Directory maps are installed into
    pub target_dir: Utf8PathBuf,

    /// Mod manager profiles directory; the most recently used profile is scanned too
    pub profiles_dir: Option<Utf8PathBuf>,

    /// Plugin folder inside each profile
    pub profile_plugins_subdir: String,

    /// Log folder inside each profile, quoted in the support message
    pub profile_log_subdir: String,

    pub primary_extension: String,
    pub identifier_extension: String,
    pub maps_folder: String,

    pub log_dir: Utf8PathBuf,
    pub debug_mode: bool,
    pub console_output: bool,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            target_dir: Utf8PathBuf::from("Maps"),
            profiles_dir: None,
            profile_plugins_subdir: "BepInEx/plugins".to_string(),
            profile_log_subdir: "BepInEx".to_string(),
            primary_extension: "cok".to_string(),
            identifier_extension: "cid".to_string(),
            maps_folder: "Maps".to_string(),
            log_dir: Utf8PathBuf::from("logs"),
            debug_mode: false,
            console_output: true,
        }
    }
}

impl InstallerSettings {
    /// Asset naming rules derived from the configured extensions.
    pub fn asset_kind(&self) -> AssetKind {
        AssetKind::new(
            &self.primary_extension,
            &self.identifier_extension,
            &self.maps_folder,
        )
    }
}
