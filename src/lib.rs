// Map Installer - syncs map assets from plugin folders and map archives
//
// This is the library crate containing the sync pipeline and its data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::SyncMetrics;
pub use models::{AssetKind, CopyTask, InstallerConfig, InstallerSettings, RootKind, SourceRoot};
pub use services::{MapInstaller, RunSummary, SyncError};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
