use crate::config::ConfigManager;
use crate::error::{ComposerError, Result};
use crate::models::{
    PluginFormat, WorkspaceConfig, WorkspaceConfigKey, WorkspacePaths, WorkspaceState,
};
use crate::services::validation::{ValidationErrors, WorkspaceConfigValidator};
use crate::services::workspace::{SyncSummary, WorkspaceService};
use crate::state::{ObservableState, StateChange, StateManager};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

impl ObservableState for WorkspaceState {
    fn detect_changes(old: &Self, new: &Self) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.config_path != new.config_path {
            if let Some(config_path) = &new.config_path {
                changes.push(StateChange::WorkspaceOpened {
                    config_path: config_path.clone(),
                });
            }
        } else if let (Some(old_config), Some(new_config)) = (&old.user_config, &new.user_config) {
            let keys = changed_keys(old_config, new_config);
            if !keys.is_empty() {
                changes.push(StateChange::ConfigChanged { keys });
            }
        }

        if !old.validation_errors.keys().eq(new.validation_errors.keys()) {
            changes.push(StateChange::ValidationChanged {
                error_count: new.validation_errors.len(),
            });
        }

        changes
    }
}

/// Keys whose serialized value differs between two configs
fn changed_keys(old: &WorkspaceConfig, new: &WorkspaceConfig) -> Vec<WorkspaceConfigKey> {
    let (Ok(Value::Object(old)), Ok(Value::Object(new))) =
        (serde_json::to_value(old), serde_json::to_value(new))
    else {
        return Vec::new();
    };

    WorkspaceConfigKey::ALL
        .into_iter()
        .filter(|key| old.get(key.as_str()) != new.get(key.as_str()))
        .collect()
}

/// Store of the open workspace: its config, resolved paths and validation state.
///
/// Sequences persistence, validation and the [`WorkspaceService`] pipeline in
/// response to user commands. Every operation except creating or opening a
/// config fails with [`ComposerError::NoWorkspace`] while nothing is open.
pub struct WorkspaceStore {
    state: StateManager<WorkspaceState>,
    service: Arc<WorkspaceService>,
    validator: WorkspaceConfigValidator,
}

impl WorkspaceStore {
    pub fn new(service: Arc<WorkspaceService>) -> Self {
        Self {
            state: StateManager::new(),
            service,
            validator: WorkspaceConfigValidator::new(),
        }
    }

    pub fn snapshot(&self) -> WorkspaceState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    pub fn service(&self) -> &WorkspaceService {
        &self.service
    }

    /// Config and paths of the open workspace
    pub fn current(&self) -> Result<(WorkspaceConfig, WorkspacePaths)> {
        self.state.read(|state| {
            match (&state.user_config, &state.workspace_paths) {
                (Some(config), Some(paths)) => Ok((config.clone(), paths.clone())),
                _ => Err(ComposerError::NoWorkspace),
            }
        })
    }

    pub fn paths(&self) -> Result<WorkspacePaths> {
        self.current().map(|(_, paths)| paths)
    }

    /// Write a new workspace at `path` and open it
    pub async fn create_new_user_config(&self, path: &Utf8Path) -> Result<()> {
        ConfigManager::write_new_config_to_path(path)?;
        self.open_config(path).await
    }

    /// Load the config at `path` and make it the open workspace
    pub async fn open_config(&self, path: &Utf8Path) -> Result<()> {
        let config = ConfigManager::load_config_from_path(path)?;
        let paths = WorkspacePaths::resolve(path, &config, self.service.os());
        let errors = self.validator.validate(&config, None);

        if !errors.is_empty() {
            info!("Opened {} with {} invalid field(s)", path, errors.len());
        }

        self.state.update(|state| {
            state.user_config = Some(config);
            state.config_path = Some(path.to_path_buf());
            state.workspace_paths = Some(paths);
            state.validation_errors = errors;
        });
        Ok(())
    }

    /// Write the open config back to its file. Validation errors do not block saving.
    pub async fn save(&self) -> Result<Utf8PathBuf> {
        let (config, config_path) = self.state.read(|state| {
            match (&state.user_config, &state.config_path) {
                (Some(config), Some(path)) => Ok((config.clone(), path.clone())),
                _ => Err(ComposerError::NoWorkspace),
            }
        })?;

        ConfigManager::write_config_to_path(&config_path, &config)?;
        self.state.emit(StateChange::WorkspaceSaved {
            config_path: config_path.clone(),
        });
        Ok(config_path)
    }

    /// Mutate the open config and revalidate `keys`.
    ///
    /// # Arguments
    /// * `keys` - Fields touched by `update_fn`; only these are revalidated
    /// * `update_fn` - Field-level mutation of the config
    ///
    /// # Returns
    /// The errors of `keys` after the update
    pub fn update_config<F>(&self, keys: &[WorkspaceConfigKey], update_fn: F) -> Result<ValidationErrors>
    where
        F: FnOnce(&mut WorkspaceConfig),
    {
        let (mut config, _) = self.current()?;
        update_fn(&mut config);

        let errors = self.validator.validate(&config, Some(keys));
        let os = self.service.os();

        self.state.update(|state| {
            for key in keys {
                state.validation_errors.shift_remove(key);
            }
            state
                .validation_errors
                .extend(errors.iter().map(|(key, message)| (*key, message.clone())));
            state.validation_errors.sort_keys();

            if let Some(config_path) = &state.config_path {
                state.workspace_paths = Some(WorkspacePaths::resolve(config_path, &config, os));
            }
            state.user_config = Some(config);
        });

        debug!("Updated {} field(s), {} error(s)", keys.len(), errors.len());
        Ok(errors)
    }

    /// Validate every field and replace the stored errors
    pub fn validate_all(&self) -> Result<ValidationErrors> {
        let (config, _) = self.current()?;
        let errors = self.validator.validate(&config, None);
        let stored = errors.clone();
        self.state.update(|state| state.validation_errors = stored);
        Ok(errors)
    }

    pub fn start_ide(&self) -> Result<()> {
        let paths = self.paths()?;
        self.service.start_ide(&paths)
    }

    /// Regenerate the IDE project. Refused while the config has validation errors.
    pub async fn generate_project(&self) -> Result<()> {
        let (config, paths) = self.current()?;
        let errors = self.validate_all()?;
        if !errors.is_empty() {
            return Err(ComposerError::Validation(errors));
        }

        self.service.generate_project(&config, &paths).await?;
        self.state.emit(StateChange::ProjectGenerated {
            ide_project_dir: paths.ide_project_dir.clone(),
        });
        Ok(())
    }

    pub async fn install_dependencies(&self) -> Result<Vec<String>> {
        let (config, paths) = self.current()?;
        self.service.install_dependencies(&config, &paths).await
    }

    pub async fn sync_resources(&self) -> Result<SyncSummary> {
        let paths = self.paths()?;
        let summary = self.service.sync_resources(&paths).await?;
        self.state.emit(StateChange::ResourcesSynced {
            added: summary.added,
        });
        Ok(summary)
    }

    /// Toggle a format in the config, and in the IDE project once it has been generated
    pub fn set_format_enabled(&self, format: PluginFormat, enabled: bool) -> Result<ValidationErrors> {
        let paths = self.paths()?;
        if WorkspaceService::is_generated(&paths) {
            self.service.set_format_enabled(&paths, format, enabled)?;
        } else {
            debug!("IDE project not generated, only updating the config for {}", format);
        }

        self.update_config(&[WorkspaceConfigKey::Formats], |config| {
            config.set_format_enabled(format, enabled)
        })
    }

    pub fn resource_alias_name(&self, file_name: &str) -> String {
        self.service.resource_alias(file_name)
    }
}
