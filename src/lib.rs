// iPlug Composer - project composer for iPlug2 audio plugins
//
// This is the library crate holding the workspace model, the IDE project
// patching services and the state stores. The binary crate (main.rs)
// provides the command line front end.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use crate::config::ConfigManager;
pub use error::{ComposerError, Result};
pub use models::{AppSettings, WorkspaceConfig, WorkspacePaths};
pub use state::{FilesStore, StateChange, WorkspaceStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
