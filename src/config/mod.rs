use crate::error::{ComposerError, Result};
use crate::models::{AppSettings, WorkspaceConfig, WorkspacePaths};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;

/// Number of entries kept in the recent projects list
pub const MAX_RECENT_PROJECTS: usize = 10;

/// Configuration manager for workspace configs and the composer's own settings.
///
/// Manages:
/// - Workspace configs (`composer.json`): plugin metadata, one per workspace
/// - Settings (`settings.toml` in the settings directory): composer application settings
/// - Recent projects (`recent-projects.json` in the settings directory)
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    recent_projects_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified settings directory.
    ///
    /// # Arguments
    /// * `settings_dir` - Directory holding settings.toml and the recent projects list
    ///
    /// # Returns
    /// A new ConfigManager instance
    pub fn new<P: AsRef<Utf8Path>>(settings_dir: P) -> anyhow::Result<Self> {
        let settings_dir = settings_dir.as_ref().to_path_buf();

        if !settings_dir.exists() {
            fs::create_dir_all(&settings_dir)
                .with_context(|| format!("Failed to create settings directory: {}", settings_dir))?;
        }

        Ok(Self {
            settings_path: settings_dir.join("settings.toml"),
            recent_projects_path: settings_dir.join("recent-projects.json"),
            settings_dir,
        })
    }

    /// The config of a new workspace
    pub fn create_initial_config() -> WorkspaceConfig {
        WorkspaceConfig::default()
    }

    /// Load a workspace config.
    ///
    /// Missing keys take their default values and unknown keys are ignored;
    /// field rules are left to the validator.
    pub fn load_config_from_path(path: &Utf8Path) -> Result<WorkspaceConfig> {
        let file_contents = fs::read_to_string(path)
            .map_err(|e| ComposerError::io(format!("Failed to read config {}", path), e))?;

        let config: WorkspaceConfig =
            serde_json::from_str(&file_contents).map_err(|e| ComposerError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Loaded workspace config from {}", path);
        Ok(config)
    }

    /// Write a workspace config as 4-space indented JSON, replacing the file
    pub fn write_config_to_path(path: &Utf8Path, config: &WorkspaceConfig) -> Result<()> {
        let json = to_pretty_json(config)?;

        fs::write(path, json)
            .map_err(|e| ComposerError::io(format!("Failed to write config {}", path), e))?;

        tracing::info!("Saved workspace config to {}", path);
        Ok(())
    }

    /// Start a workspace at `path`: the initial config plus empty resource directories
    pub fn write_new_config_to_path(path: &Utf8Path) -> Result<WorkspaceConfig> {
        let config = Self::create_initial_config();

        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ComposerError::io(format!("Failed to create {}", parent), e))?;
        }
        Self::write_config_to_path(path, &config)?;

        let paths = WorkspacePaths::resolve_for_host(path, &config);
        for dir in [&paths.sources_dir, &paths.fonts_dir, &paths.images_dir] {
            fs::create_dir_all(dir)
                .map_err(|e| ComposerError::io(format!("Failed to create {}", dir), e))?;
        }

        tracing::info!("Created new workspace at {}", paths.config_dir);
        Ok(config)
    }

    /// Load the composer settings.
    ///
    /// Layers, later ones winning: built-in defaults, `settings.toml` when present,
    /// `IPLUG_COMPOSER_*` environment variables (`__` separates nested keys).
    pub fn load_settings(&self) -> anyhow::Result<AppSettings> {
        let defaults = ::config::Config::try_from(&AppSettings::default())
            .context("Failed to build default settings")?;

        let settings: AppSettings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(
                ::config::File::from(self.settings_path.as_std_path())
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix("IPLUG_COMPOSER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Recently opened workspace configs, most recent first
    pub fn load_recent_projects(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        if !self.recent_projects_path.exists() {
            return Ok(Vec::new());
        }

        let file_contents = fs::read_to_string(&self.recent_projects_path).with_context(|| {
            format!("Failed to read recent projects: {}", self.recent_projects_path)
        })?;

        let projects: Vec<Utf8PathBuf> = serde_json::from_str(&file_contents).with_context(|| {
            format!("Failed to parse recent projects: {}", self.recent_projects_path)
        })?;

        Ok(projects)
    }

    /// Move `path` to the front of the recent projects list.
    ///
    /// # Returns
    /// The updated list
    pub fn push_recent_project(&self, path: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
        let mut projects = self.load_recent_projects().unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable recent projects list: {:#}", e);
            Vec::new()
        });

        projects.retain(|existing| existing != path);
        projects.insert(0, path.to_path_buf());
        projects.truncate(MAX_RECENT_PROJECTS);

        let json = to_pretty_json(&projects)?;
        fs::write(&self.recent_projects_path, json).with_context(|| {
            format!("Failed to write recent projects: {}", self.recent_projects_path)
        })?;

        Ok(projects)
    }

    pub fn settings_dir(&self) -> &Utf8Path {
        &self.settings_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

/// JSON with 4-space indentation and a trailing newline
fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|e| ComposerError::io("Failed to serialize JSON", std::io::Error::other(e)))?;

    let mut json = String::from_utf8(buffer)
        .map_err(|e| ComposerError::io("Serialized JSON is not UTF-8", std::io::Error::other(e)))?;
    json.push('\n');
    Ok(json)
}
