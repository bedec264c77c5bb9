//! Services module - business logic of the composer.
//!
//! The services have no dependencies on the state or UI layers. Each takes the
//! resolved [`crate::models::WorkspacePaths`] explicitly, so they can be tested
//! against a temporary directory.
//!
//! # Components
//!
//! - [`WorkspaceConfigValidator`]: Field-level rules for the plugin config
//! - [`FilesService`]: Lists, loads, adds and deletes sources, fonts and images
//! - [`DirWatcher`]: Debounced directory watch, used to keep file lists fresh
//! - [`IdeProject`]: Platform adapter that patches the generated IDE project:
//!   - [`ide::VisualStudioProject`]: Windows, marker substitution in `.vcxproj`, `.sln`, `config.h`, `main.rc`
//!   - [`ide::XcodeProject`]: macOS, every operation unsupported
//! - [`WorkspaceService`]: Generation pipeline: dependencies, generator, customization
//!
//! Supporting modules: [`text_patch`] (substitution primitives), [`fs_utils`]
//! (retrying directory recreation), [`dependencies`] (SDK archives) and
//! [`generator`] (iPlug2 duplicate script).

pub mod dependencies;
pub mod files;
pub mod fs_utils;
pub mod generator;
pub mod ide;
pub mod text_patch;
pub mod validation;
pub mod watcher;
pub mod workspace;

pub use dependencies::{DependencyService, extract_archive};
pub use files::FilesService;
pub use fs_utils::{RetryPolicy, recreate_dir, retry_with_delay};
pub use generator::{GeneratorCommand, ProjectGenerator};
pub use ide::{DependencyArchive, IdeProject, ide_for, resource_alias};
pub use validation::{ValidationErrors, WorkspaceConfigValidator};
pub use watcher::DirWatcher;
pub use workspace::{SyncSummary, WorkspaceService};
