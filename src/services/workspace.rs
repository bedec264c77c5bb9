//! Generation pipeline of a workspace.
//!
//! Sequences dependency installation, the external project generator and the
//! IDE customization that wires the user's sources, fonts and images into the
//! generated project.

use crate::error::Result;
use crate::models::{
    AppSettings, OperatingSystem, PluginFormat, ResourceKind, WorkspaceConfig, WorkspacePaths,
};
use crate::services::dependencies::{DependencyService, iplug2_dir};
use crate::services::files::FilesService;
use crate::services::fs_utils::{RetryPolicy, ensure_dir, read_text, recreate_dir, write_text};
use crate::services::generator::ProjectGenerator;
use crate::services::ide::{IdeProject, ide_for, resource_alias};
use crate::services::text_patch::replace_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Font bundled with every iPlug2 example project
pub const PROTOTYPE_FONT: &str = "Roboto-Regular.ttf";
const PROTOTYPE_FONT_ALIAS: &str = "ROBOTO_FN";

/// Counts of resources wired into the IDE project by one sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub sources: usize,
    pub fonts: usize,
    pub images: usize,
    /// References that were not present before
    pub added: usize,
}

pub struct WorkspaceService {
    ide: Arc<dyn IdeProject>,
    files: FilesService,
    dependencies: DependencyService,
    generator: ProjectGenerator,
    retry: RetryPolicy,
}

impl WorkspaceService {
    pub fn new(ide: Arc<dyn IdeProject>, settings: &AppSettings) -> Self {
        Self {
            ide,
            files: FilesService::new(),
            dependencies: DependencyService::new(),
            generator: ProjectGenerator::new(settings.python.clone(), settings.generator_timeout()),
            retry: settings.retry_policy(),
        }
    }

    /// Service for the platform the composer runs on
    pub fn for_host(settings: &AppSettings) -> Self {
        Self::new(Arc::from(ide_for(OperatingSystem::current(), settings)), settings)
    }

    pub fn ide(&self) -> &dyn IdeProject {
        self.ide.as_ref()
    }

    pub fn os(&self) -> OperatingSystem {
        self.ide.os()
    }

    pub fn files(&self) -> &FilesService {
        &self.files
    }

    pub fn resource_alias(&self, file_name: &str) -> String {
        resource_alias(file_name)
    }

    /// Names of the prototype sources the generator creates for `config`
    pub fn prototype_source_files(config: &WorkspaceConfig) -> Vec<String> {
        vec![
            format!("{}.cpp", config.class_name()),
            format!("{}.h", config.class_name()),
        ]
    }

    /// Install dependencies, regenerate the IDE project from scratch and customize it
    pub async fn generate_project(&self, config: &WorkspaceConfig, paths: &WorkspacePaths) -> Result<()> {
        self.install_dependencies(config, paths).await?;

        recreate_dir(&paths.workspace_dir, self.retry).await?;
        self.generator
            .generate(&iplug2_dir(paths, config), config, paths)
            .await?;

        self.customize_ide_project(config, paths).await?;
        info!("Generated {} project in {}", self.ide.ide_name(), paths.ide_project_dir);
        Ok(())
    }

    /// Download the SDKs the platform's project needs, skipping finished installs
    ///
    /// # Returns
    /// Names of the archives that were installed by this call
    pub async fn install_dependencies(
        &self,
        config: &WorkspaceConfig,
        paths: &WorkspacePaths,
    ) -> Result<Vec<String>> {
        let archives = self.ide.dependency_archives(config)?;
        let installed = self.dependencies.ensure(paths, &archives).await?;
        if !installed.is_empty() {
            info!("Installed dependencies: {}", installed.join(", "));
        }
        Ok(installed)
    }

    /// Replace the prototype content of a freshly generated project with the
    /// workspace's own files and settings
    pub async fn customize_ide_project(
        &self,
        config: &WorkspaceConfig,
        paths: &WorkspacePaths,
    ) -> Result<()> {
        let prototype_sources = Self::prototype_source_files(config);
        self.seed_from_prototype(paths, &prototype_sources).await?;

        self.ide
            .remove_default_prototype_source_files(paths, &prototype_sources)?;
        self.ide.remove_default_prototype_font_files(paths)?;

        let summary = self.sync_resources(paths).await?;
        let sources = self.files.list(paths, ResourceKind::Source).await?;
        self.ide.reconfigure_file_filters(paths, &sources)?;
        self.ide.apply_config(paths, config)?;

        for format in PluginFormat::ALL {
            if !config.has_format(format) {
                self.ide.remove_format(paths, format)?;
            }
        }

        info!(
            "Customized IDE project: {} sources, {} fonts, {} images",
            summary.sources, summary.fonts, summary.images
        );
        Ok(())
    }

    /// Reference every current workspace file from the IDE project. Files that
    /// are already referenced are left alone.
    pub async fn sync_resources(&self, paths: &WorkspacePaths) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        for kind in ResourceKind::ALL {
            let names = self.files.list(paths, kind).await?;
            for name in &names {
                if self.link_resource(paths, kind, name)? {
                    summary.added += 1;
                }
            }
            match kind {
                ResourceKind::Source => summary.sources = names.len(),
                ResourceKind::Font => summary.fonts = names.len(),
                ResourceKind::Image => summary.images = names.len(),
            }
        }

        debug!("Synced resources: {:?}", summary);
        Ok(summary)
    }

    /// Reference one workspace file from the IDE project
    pub fn link_resource(&self, paths: &WorkspacePaths, kind: ResourceKind, name: &str) -> Result<bool> {
        match kind {
            ResourceKind::Source => self.ide.add_source_file(paths, name),
            ResourceKind::Font => self.ide.add_font_file(paths, name, &resource_alias(name)),
            ResourceKind::Image => self.ide.add_image_file(paths, name, &resource_alias(name)),
        }
    }

    pub fn unlink_resource(&self, paths: &WorkspacePaths, kind: ResourceKind, name: &str) -> Result<()> {
        match kind {
            ResourceKind::Source => self.ide.remove_source_file(paths, name),
            ResourceKind::Font => self.ide.remove_font_file(paths, name, &resource_alias(name)),
            ResourceKind::Image => self.ide.remove_image_file(paths, name, &resource_alias(name)),
        }
    }

    pub fn set_format_enabled(
        &self,
        paths: &WorkspacePaths,
        format: PluginFormat,
        enabled: bool,
    ) -> Result<()> {
        if enabled {
            self.ide.add_format(paths, format)
        } else {
            self.ide.remove_format(paths, format)
        }
    }

    pub fn start_ide(&self, paths: &WorkspacePaths) -> Result<()> {
        self.ide.start_ide_project(paths)
    }

    /// Whether the IDE project has been generated
    pub fn is_generated(paths: &WorkspacePaths) -> bool {
        paths.ide_project_dir.is_dir()
    }

    /// On the first customization the workspace has no files of its own yet:
    /// the prototype sources and font become the starting point.
    async fn seed_from_prototype(&self, paths: &WorkspacePaths, prototype_sources: &[String]) -> Result<()> {
        if self.files.list(paths, ResourceKind::Source).await?.is_empty() {
            ensure_dir(&paths.sources_dir).await?;
            let font_alias = resource_alias(PROTOTYPE_FONT);

            for name in prototype_sources {
                let source = paths.ide_project_dir.join(name);
                if !source.is_file() {
                    debug!("No prototype source {}", source);
                    continue;
                }
                let content = replace_all(&read_text(&source).await?, PROTOTYPE_FONT_ALIAS, &font_alias);
                write_text(&paths.sources_dir.join(name), &content).await?;
                info!("Copied prototype source {} into the workspace", name);
            }
        }

        if self.files.list(paths, ResourceKind::Font).await?.is_empty() {
            let font = paths.ide_resources_dir().join("fonts").join(PROTOTYPE_FONT);
            if font.is_file() {
                ensure_dir(&paths.fonts_dir).await?;
                tokio::fs::copy(&font, paths.fonts_dir.join(PROTOTYPE_FONT))
                    .await
                    .map_err(|e| crate::error::ComposerError::io(format!("Failed to copy {}", font), e))?;
                info!("Copied prototype font {} into the workspace", PROTOTYPE_FONT);
            }
        }

        Ok(())
    }
}
