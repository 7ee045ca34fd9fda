//! Services module - the map sync pipeline.
//!
//! Everything here is framework-agnostic: explicit inputs, filesystem side
//! effects only, no global state.
//!
//! # Components
//!
//! - [`hashing`]: MD5 content digests of files and archive entries
//! - [`sanitize`]: Zip-slip guard for archive entry destinations
//! - [`AssetLocator`]: Finds the map folder of a plugin (`Maps/` or flattened pairs)
//! - [`ChangeDetector`]: Hash-based source → target comparison, folder and ZIP forms
//! - [`FsTaskExecutor`]: Runs a [`CopyTask`](crate::models::CopyTask) against the filesystem
//! - [`TaskQueue`]: Ordered, strictly serial task execution with per-task isolation
//! - [`MapInstaller`]: Orchestrates ensure-target, scan, copy and error reporting
//! - [`profile_detection`]: Picks the most recently used mod manager profile
//!
//! # Data Flow
//!
//! 1. Every subdirectory of a source root is classified by [`AssetLocator`]
//! 2. Classified folders and every `*.zip` below the root go through [`ChangeDetector`]
//! 3. Each changed source becomes one queued task
//! 4. The queue runs on a single blocking worker; failures are logged and skipped
//!
//! # Usage Example
//!
//! ```ignore
//! use map_installer::models::{AssetKind, SourceRoot};
//! use map_installer::services::MapInstaller;
//!
//! let installer = MapInstaller::new(
//!     AssetKind::default(),
//!     target_dir,
//!     vec![SourceRoot::plugins(plugins_dir, log_dir)],
//! );
//! let summary = installer.run().await?;
//! ```

pub mod changes;
pub mod copier;
pub mod error;
pub mod hashing;
pub mod installer;
pub mod locator;
pub mod profile_detection;
pub mod queue;
pub mod sanitize;

pub use changes::ChangeDetector;
pub use copier::{FsTaskExecutor, ProgressTracker, TaskExecutor, TaskReport};
pub use error::SyncError;
pub use installer::{MapInstaller, SUPPORT_MESSAGE, ScanOutcome};
pub use locator::{AssetCollection, AssetLocator, CollectionLayout};
pub use profile_detection::find_active_profile;
pub use queue::{RunSummary, TaskQueue};
pub use sanitize::resolve_entry_path;
