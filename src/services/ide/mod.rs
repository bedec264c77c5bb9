//! Platform adapters that patch a generated iPlug2 IDE project.
//!
//! The generated project is treated as text with known anchor strings. Each
//! mutation locates its anchor and fails with an assertion error when the
//! anchor is missing, since that means the template drifted.

pub mod macos;
pub mod windows;

use crate::error::Result;
use crate::models::{AppSettings, OperatingSystem, PluginFormat, WorkspaceConfig, WorkspacePaths};
use camino::Utf8PathBuf;

pub use macos::XcodeProject;
pub use windows::VisualStudioProject;

/// Source archive the generated project depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyArchive {
    pub name: String,
    pub url: String,
    /// Top-level folder inside the zip, stripped while extracting
    pub root_dir: String,
    /// Install location relative to the workspace dependencies directory
    pub install_dir: Utf8PathBuf,
}

/// Capabilities of an IDE project variant
#[cfg_attr(test, mockall::automock)]
pub trait IdeProject: Send + Sync {
    fn os(&self) -> OperatingSystem;

    fn ide_name(&self) -> &'static str;

    fn dependency_archives(&self, config: &WorkspaceConfig) -> Result<Vec<DependencyArchive>>;

    fn start_ide_project(&self, paths: &WorkspacePaths) -> Result<()>;

    /// Replace the references to the generated prototype sources with insertion markers
    fn remove_default_prototype_source_files(
        &self,
        paths: &WorkspacePaths,
        prototype_files: &[String],
    ) -> Result<()>;

    fn remove_default_prototype_font_files(&self, paths: &WorkspacePaths) -> Result<()>;

    /// # Returns
    /// `false` when the file was already referenced
    fn add_source_file(&self, paths: &WorkspacePaths, name: &str) -> Result<bool>;

    fn remove_source_file(&self, paths: &WorkspacePaths, name: &str) -> Result<()>;

    fn add_font_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<bool>;

    fn remove_font_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<()>;

    fn add_image_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<bool>;

    fn remove_image_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<()>;

    fn reconfigure_file_filters(&self, paths: &WorkspacePaths, source_files: &[String]) -> Result<()>;

    /// Write the plugin metadata into the generated `config.h`
    fn apply_config(&self, paths: &WorkspacePaths, config: &WorkspaceConfig) -> Result<()>;

    fn remove_format(&self, paths: &WorkspacePaths, format: PluginFormat) -> Result<()>;

    fn add_format(&self, paths: &WorkspacePaths, format: PluginFormat) -> Result<()>;
}

/// Build the IDE adapter for `os`
pub fn ide_for(os: OperatingSystem, settings: &AppSettings) -> Box<dyn IdeProject> {
    match os {
        OperatingSystem::Windows => Box::new(VisualStudioProject::new(
            settings.ide_command.clone(),
            settings.github_base_url.clone(),
        )),
        OperatingSystem::MacOs => Box::new(XcodeProject),
    }
}

/// Identifier a resource file is referenced by in generated code.
///
/// `knob.png` becomes `PNG_KNOB_FN`, `Roboto-Regular.ttf` becomes
/// `TTF_ROBOTO_REGULAR_FN`.
pub fn resource_alias(file_name: &str) -> String {
    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, extension),
        _ => (file_name, ""),
    };

    let normalize = |value: &str| -> String {
        value
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    };

    if extension.is_empty() {
        format!("{}_FN", normalize(stem))
    } else {
        format!("{}_{}_FN", normalize(extension), normalize(stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_alias() {
        assert_eq!(resource_alias("knob.png"), "PNG_KNOB_FN");
        assert_eq!(resource_alias("Roboto-Regular.ttf"), "TTF_ROBOTO_REGULAR_FN");
        assert_eq!(resource_alias("my knob@2x.png"), "PNG_MY_KNOB_2X_FN");
        assert_eq!(resource_alias("LICENSE"), "LICENSE_FN");
    }

    #[test]
    fn test_ide_for_host_variants() {
        let settings = AppSettings::default();
        assert_eq!(ide_for(OperatingSystem::Windows, &settings).ide_name(), "Visual Studio");
        assert_eq!(ide_for(OperatingSystem::MacOs, &settings).os(), OperatingSystem::MacOs);
    }
}
