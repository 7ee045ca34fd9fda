//! Data models for the map installer.
//!
//! This module contains the core data structures shared by the services:
//! - [`AssetKind`]: Naming rules for map files (primary `.cok`, identifier `.cok.cid`, `Maps/` folder)
//! - [`CopyTask`]: A queued folder copy or archive extraction
//! - [`SourceRoot`]: A plugin or profile folder to scan
//! - [`InstallerConfig`]: Settings loaded from `Map Installer.yaml`
//! - [`RunState`]: Per-run context (phase, queue progress, error flag)

pub mod asset;
pub mod config;
pub mod run_state;
pub mod task;

pub use asset::{AssetKind, entry_file_name};
pub use config::{InstallerConfig, InstallerSettings};
pub use run_state::{InstallPhase, RunState};
pub use task::{CopyTask, RootKind, SourceRoot, relative_display};
