//! Data models for the composer.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`WorkspaceConfig`]: Plugin metadata persisted in `composer.json`
//! - [`WorkspacePaths`]: Directories derived from a config file location and its config
//! - [`ResourceKind`]: Source files, fonts and images managed per workspace
//! - [`AppSettings`]: Settings of the composer application itself
//! - [`WorkspaceState`] / [`FilesState`]: State held by the stores in [`crate::state`]

pub mod paths;
pub mod resource;
pub mod settings;
pub mod ui_state;
pub mod workspace_config;

pub use paths::{OperatingSystem, WorkspacePaths, relative_path, to_windows_path};
pub use resource::{ResourceContent, ResourceKind};
pub use settings::{AppSettings, default_settings_dir};
pub use ui_state::{FilesState, FilesTab, ResourceListState, WorkspaceState};
pub use workspace_config::{
    PluginFormat, PluginType, Vst3Subcategory, WorkspaceConfig, WorkspaceConfigKey,
};
