use crate::models::InstallerConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "Map Installer.yaml";

/// Prefix of environment variables that override file settings,
/// e.g. `MAP_INSTALLER_INSTALLER__TARGET_DIR`
pub const ENV_PREFIX: &str = "MAP_INSTALLER";

/// Configuration manager for loading and saving the YAML configuration file.
///
/// Values come from `Map Installer.yaml` (optional) with environment overrides
/// layered on top; anything unset falls back to the serde defaults.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing the configuration file (e.g., "MapInstaller Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the configuration.
    ///
    /// # Returns
    /// The merged InstallerConfig, or defaults if neither file nor environment set anything
    pub fn load_config(&self) -> Result<InstallerConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let settings = Config::builder()
            .add_source(
                File::new(self.config_path.as_str(), FileFormat::Yaml).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(";")
                    .with_list_parse_key("installer.source_roots"),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: InstallerConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save the configuration file.
    ///
    /// # Arguments
    /// * `config` - The InstallerConfig to save
    pub fn save_config(&self, config: &InstallerConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.config_path().as_str().ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_defaults_without_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        let config = manager.load_config().unwrap();
        assert_eq!(config.installer.primary_extension, "cok");
        assert_eq!(config.installer.maps_folder, "Maps");
    }

    #[test]
    fn test_load_save_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = InstallerConfig::default();
        config.installer.target_dir = Utf8PathBuf::from("/games/Maps");
        config.installer.source_roots = vec![Utf8PathBuf::from("/games/plugins")];
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.installer.target_dir, Utf8PathBuf::from("/games/Maps"));
        assert_eq!(
            loaded.installer.source_roots,
            vec![Utf8PathBuf::from("/games/plugins")]
        );
    }
}
