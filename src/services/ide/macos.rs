use crate::error::{ComposerError, Result};
use crate::models::{OperatingSystem, PluginFormat, WorkspaceConfig, WorkspacePaths};
use crate::services::ide::{DependencyArchive, IdeProject};

/// Xcode variant. Patching Xcode projects is not implemented, so every
/// operation fails with [`ComposerError::UnsupportedOperation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XcodeProject;

fn unsupported<T>(operation: &'static str) -> Result<T> {
    Err(ComposerError::unsupported(OperatingSystem::MacOs, operation))
}

impl IdeProject for XcodeProject {
    fn os(&self) -> OperatingSystem {
        OperatingSystem::MacOs
    }

    fn ide_name(&self) -> &'static str {
        "Xcode"
    }

    fn dependency_archives(&self, _config: &WorkspaceConfig) -> Result<Vec<DependencyArchive>> {
        unsupported("Downloading dependencies")
    }

    fn start_ide_project(&self, _paths: &WorkspacePaths) -> Result<()> {
        unsupported("Starting the IDE")
    }

    fn remove_default_prototype_source_files(
        &self,
        _paths: &WorkspacePaths,
        _prototype_files: &[String],
    ) -> Result<()> {
        unsupported("Removing prototype source files")
    }

    fn remove_default_prototype_font_files(&self, _paths: &WorkspacePaths) -> Result<()> {
        unsupported("Removing prototype fonts")
    }

    fn add_source_file(&self, _paths: &WorkspacePaths, _name: &str) -> Result<bool> {
        unsupported("Adding source files")
    }

    fn remove_source_file(&self, _paths: &WorkspacePaths, _name: &str) -> Result<()> {
        unsupported("Removing source files")
    }

    fn add_font_file(&self, _paths: &WorkspacePaths, _name: &str, _alias: &str) -> Result<bool> {
        unsupported("Adding fonts")
    }

    fn remove_font_file(&self, _paths: &WorkspacePaths, _name: &str, _alias: &str) -> Result<()> {
        unsupported("Removing fonts")
    }

    fn add_image_file(&self, _paths: &WorkspacePaths, _name: &str, _alias: &str) -> Result<bool> {
        unsupported("Adding images")
    }

    fn remove_image_file(&self, _paths: &WorkspacePaths, _name: &str, _alias: &str) -> Result<()> {
        unsupported("Removing images")
    }

    fn reconfigure_file_filters(&self, _paths: &WorkspacePaths, _source_files: &[String]) -> Result<()> {
        unsupported("Reconfiguring file filters")
    }

    fn apply_config(&self, _paths: &WorkspacePaths, _config: &WorkspaceConfig) -> Result<()> {
        unsupported("Applying the configuration")
    }

    fn remove_format(&self, _paths: &WorkspacePaths, _format: PluginFormat) -> Result<()> {
        unsupported("Removing formats")
    }

    fn add_format(&self, _paths: &WorkspacePaths, _format: PluginFormat) -> Result<()> {
        unsupported("Adding formats")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_fails_closed() {
        let ide = XcodeProject;
        let config = WorkspaceConfig::default();
        let paths = WorkspacePaths::resolve("/w/composer.json", &config, OperatingSystem::MacOs);

        let err = ide.start_ide_project(&paths).unwrap_err();
        assert_eq!(err.to_string(), "Starting the IDE is not supported on macOS");
        assert!(matches!(
            ide.add_source_file(&paths, "A.cpp"),
            Err(ComposerError::UnsupportedOperation { os: OperatingSystem::MacOs, .. })
        ));
        assert!(ide.remove_format(&paths, PluginFormat::Au2).is_err());
        assert!(ide.dependency_archives(&config).is_err());
    }
}
