use crate::models::WorkspaceConfig;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform whose IDE project a workspace targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingSystem {
    Windows,
    MacOs,
}

impl OperatingSystem {
    /// The platform the composer runs on. Everything that is not Windows
    /// resolves to the macOS layout.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OperatingSystem::Windows
        } else {
            OperatingSystem::MacOs
        }
    }

    /// Suffix of the per-platform build directory
    pub fn build_dir_suffix(&self) -> &'static str {
        match self {
            OperatingSystem::Windows => "win",
            OperatingSystem::MacOs => "mac",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingSystem::Windows => f.write_str("Windows"),
            OperatingSystem::MacOs => f.write_str("macOS"),
        }
    }
}

/// Resolved directories of a workspace.
///
/// Derived purely from the config file location and the parsed config; nothing
/// here touches the file system and none of the directories need to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub os: OperatingSystem,
    pub project_name: String,
    pub config_file: Utf8PathBuf,
    pub config_dir: Utf8PathBuf,
    pub sources_dir: Utf8PathBuf,
    pub fonts_dir: Utf8PathBuf,
    pub images_dir: Utf8PathBuf,
    pub dependencies_dir: Utf8PathBuf,
    pub workspace_dir: Utf8PathBuf,
    pub ide_project_dir: Utf8PathBuf,
}

impl WorkspacePaths {
    pub fn resolve(
        config_file: impl AsRef<Utf8Path>,
        config: &WorkspaceConfig,
        os: OperatingSystem,
    ) -> Self {
        let config_file = config_file.as_ref().to_path_buf();
        let config_dir = match config_file.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };

        let resources_dir = config_dir.join("resources");
        let workspace_dir = config_dir.join(format!("build-{}", os.build_dir_suffix()));

        Self {
            os,
            project_name: config.project_name.clone(),
            sources_dir: config_dir.join("sources"),
            fonts_dir: resources_dir.join("fonts"),
            images_dir: resources_dir.join("images"),
            dependencies_dir: config_dir.join("dependencies"),
            ide_project_dir: workspace_dir.join(&config.project_name),
            workspace_dir,
            config_dir,
            config_file,
        }
    }

    /// Resolve for the platform the composer runs on
    pub fn resolve_for_host(config_file: impl AsRef<Utf8Path>, config: &WorkspaceConfig) -> Self {
        Self::resolve(config_file, config, OperatingSystem::current())
    }

    /// Directory the IDE project's `.vcxproj` / `.xcodeproj` files live in
    pub fn ide_projects_dir(&self) -> Utf8PathBuf {
        self.ide_project_dir.join("projects")
    }

    pub fn ide_resources_dir(&self) -> Utf8PathBuf {
        self.ide_project_dir.join("resources")
    }
}

/// Relative path from `base` to `target`, both absolute or both relative to
/// the same root. Purely lexical.
pub fn relative_path(base: &Utf8Path, target: &Utf8Path) -> Utf8PathBuf {
    let base: Vec<Utf8Component<'_>> = base
        .components()
        .filter(|c| !matches!(c, Utf8Component::CurDir))
        .collect();
    let target: Vec<Utf8Component<'_>> = target
        .components()
        .filter(|c| !matches!(c, Utf8Component::CurDir))
        .collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = Utf8PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_str());
    }
    relative
}

/// Render a relative path with Windows separators, as Visual Studio project
/// files expect
pub fn to_windows_path(path: &Utf8Path) -> String {
    path.components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("\\")
}
