// Command Controller - turns front end commands into store calls
//
// Each command opens the workspace (except `new` and `recent`), runs the
// store operations it maps to and reports the outcome through the notifier.

use crate::config::ConfigManager;
use crate::error::ComposerError;
use crate::models::{
    AppSettings, PluginFormat, ResourceContent, ResourceKind, WorkspaceConfig, WorkspaceConfigKey,
    WorkspacePaths,
};
use crate::services::workspace::WorkspaceService;
use crate::state::{FilesStore, WorkspaceStore};
use crate::ui::notifications::{NotificationOptions, Notifier, with_notification};
use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Subcommand;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a new workspace config and its resource directories
    New {
        /// Where to write the config
        #[arg(default_value = "composer.json")]
        path: Utf8PathBuf,
    },
    /// Print the config and the resolved workspace directories
    Show,
    /// Validate the config
    Validate {
        /// Only check this field (JSON key, e.g. manufacturerId)
        #[arg(long)]
        key: Option<String>,
    },
    /// Set one config field and save
    Set {
        /// JSON key of the field
        key: String,
        /// JSON value; bare words are taken as strings
        value: String,
    },
    /// Manage sources, fonts and images
    #[command(subcommand)]
    Files(FilesCommand),
    /// Print the resource alias of a file name
    Alias { file: String },
    /// Download the SDKs the IDE project needs
    Deps,
    /// Regenerate and customize the IDE project
    Generate,
    /// Reference every workspace file from the IDE project
    Sync,
    /// Enable or disable a plugin format
    #[command(subcommand)]
    Format(FormatCommand),
    /// Open the generated project in the IDE
    StartIde,
    /// List recently opened workspaces
    Recent,
}

#[derive(Debug, Clone, Subcommand)]
pub enum FilesCommand {
    List {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
    },
    /// Copy external files into the workspace
    Add {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        #[arg(required = true)]
        files: Vec<Utf8PathBuf>,
    },
    /// Create an empty source file
    Create { name: String },
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        name: String,
    },
    Rename {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        from: String,
        to: String,
    },
    /// Re-list a directory whenever it changes, until interrupted
    Watch {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum FormatCommand {
    Enable {
        #[arg(value_parser = parse_format)]
        format: PluginFormat,
    },
    Disable {
        #[arg(value_parser = parse_format)]
        format: PluginFormat,
    },
}

fn parse_kind(value: &str) -> std::result::Result<ResourceKind, String> {
    ResourceKind::parse(value).ok_or_else(|| format!("unknown resource kind '{}'", value))
}

fn parse_format(value: &str) -> std::result::Result<PluginFormat, String> {
    PluginFormat::parse(value).ok_or_else(|| format!("unknown plugin format '{}'", value))
}

impl Command {
    /// Description of the failure and success message for this command
    pub fn notification_options(&self) -> NotificationOptions<'static> {
        match self {
            Command::New { .. } => NotificationOptions::on_error("Failed creating a new project")
                .with_success("Successfully created a new project"),
            Command::Show => NotificationOptions::on_error("Failed to open project"),
            Command::Validate { .. } => NotificationOptions::on_error("Validation failed")
                .with_success("Configuration is valid"),
            Command::Set { .. } => {
                NotificationOptions::on_error("Failed saving project").with_success("Saved")
            }
            Command::Files(FilesCommand::List { .. }) => {
                NotificationOptions::on_error("Failed to list files")
            }
            Command::Files(FilesCommand::Add { .. }) => {
                NotificationOptions::on_error("Failed importing files").with_success("Imported")
            }
            Command::Files(FilesCommand::Create { .. }) => {
                NotificationOptions::on_error("Failed creating source file").with_success("Created")
            }
            Command::Files(FilesCommand::Delete { .. }) => {
                NotificationOptions::on_error("Failed deleting file").with_success("Deleted")
            }
            Command::Files(FilesCommand::Rename { .. }) => {
                NotificationOptions::on_error("Failed renaming file").with_success("Renamed")
            }
            Command::Files(FilesCommand::Watch { .. }) => {
                NotificationOptions::on_error("Failed watching directory")
            }
            Command::Alias { .. } => NotificationOptions::on_error("Failed to compute alias"),
            Command::Deps => NotificationOptions::on_error("Failed installing dependencies")
                .with_success("Dependencies installed"),
            Command::Generate => NotificationOptions::on_error("Failed generating project")
                .with_success("Project generated"),
            Command::Sync => NotificationOptions::on_error("Failed syncing resources")
                .with_success("Resources synced"),
            Command::Format(_) => {
                NotificationOptions::on_error("Failed updating formats").with_success("Saved")
            }
            Command::StartIde => NotificationOptions::on_error("Failed to start IDE"),
            Command::Recent => {
                NotificationOptions::on_error("Failed load recently used projects")
            }
        }
    }
}

/// Controller that maps commands onto the workspace and files stores
///
/// # Example
/// ```ignore
/// let config_manager = ConfigManager::new(default_settings_dir())?;
/// let settings = config_manager.load_settings()?;
/// let controller = CommandController::new(
///     config_manager,
///     &settings,
///     "composer.json".into(),
///     Arc::new(ConsoleNotifier),
/// );
/// controller.run(Command::Sync).await?;
/// ```
pub struct CommandController {
    config_manager: ConfigManager,
    workspace: WorkspaceStore,
    files: FilesStore,
    notifier: Arc<dyn Notifier>,
    config_path: Utf8PathBuf,
}

impl CommandController {
    /// Create a controller for the platform the composer runs on
    ///
    /// # Arguments
    /// * `config_manager` - Settings directory access, used for the recent projects list
    /// * `settings` - Application settings
    /// * `config_path` - Workspace config the commands operate on
    /// * `notifier` - Receives the outcome of every command
    pub fn new(
        config_manager: ConfigManager,
        settings: &AppSettings,
        config_path: Utf8PathBuf,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let service = Arc::new(WorkspaceService::for_host(settings));
        Self::with_service(config_manager, service, settings, config_path, notifier)
    }

    pub fn with_service(
        config_manager: ConfigManager,
        service: Arc<WorkspaceService>,
        settings: &AppSettings,
        config_path: Utf8PathBuf,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config_manager,
            workspace: WorkspaceStore::new(service),
            files: FilesStore::new(settings.watch_debounce()),
            notifier,
            config_path,
        }
    }

    pub fn workspace(&self) -> &WorkspaceStore {
        &self.workspace
    }

    pub fn files(&self) -> &FilesStore {
        &self.files
    }

    /// Execute `command`, reporting its outcome through the notifier
    pub async fn run(&self, command: Command) -> Result<()> {
        let options = command.notification_options();
        with_notification(self.notifier.as_ref(), options, self.execute(command)).await
    }

    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::New { path } => {
                self.workspace.create_new_user_config(&path).await?;
                self.remember(&path);
                println!("Created workspace at {}", path);
            }
            Command::Recent => {
                for path in self.config_manager.load_recent_projects()? {
                    println!("{}", path);
                }
            }
            command => {
                self.open().await?;
                self.execute_in_workspace(command).await?;
            }
        }
        Ok(())
    }

    async fn open(&self) -> Result<()> {
        self.workspace
            .open_config(&self.config_path)
            .await
            .with_context(|| format!("Could not open {}", self.config_path))?;
        self.remember(&self.config_path);
        Ok(())
    }

    fn remember(&self, path: &Utf8Path) {
        let path = path.canonicalize_utf8().unwrap_or_else(|_| path.to_path_buf());
        if let Err(e) = self.config_manager.push_recent_project(&path) {
            tracing::warn!("Failed to update recent projects: {:#}", e);
        }
    }

    async fn execute_in_workspace(&self, command: Command) -> Result<()> {
        match command {
            Command::Show => self.show()?,
            Command::Validate { key } => self.validate(key.as_deref())?,
            Command::Set { key, value } => self.set(&key, &value).await?,
            Command::Files(files_command) => self.files_command(files_command).await?,
            Command::Alias { file } => println!("{}", self.workspace.resource_alias_name(&file)),
            Command::Deps => {
                let installed = self.workspace.install_dependencies().await?;
                if installed.is_empty() {
                    println!("All dependencies are installed");
                } else {
                    println!("Installed {}", installed.join(", "));
                }
            }
            Command::Generate => self.workspace.generate_project().await?,
            Command::Sync => {
                if !WorkspaceService::is_generated(&self.workspace.paths()?) {
                    return Err(anyhow!("The IDE project has not been generated yet"));
                }
                let summary = self.workspace.sync_resources().await?;
                println!(
                    "{} sources, {} fonts, {} images ({} newly referenced)",
                    summary.sources, summary.fonts, summary.images, summary.added
                );
            }
            Command::Format(format_command) => {
                let (format, enabled) = match format_command {
                    FormatCommand::Enable { format } => (format, true),
                    FormatCommand::Disable { format } => (format, false),
                };
                let errors = self.workspace.set_format_enabled(format, enabled)?;
                self.workspace.save().await?;
                if let Some(message) = errors.get(&WorkspaceConfigKey::Formats) {
                    println!("warning: {}", message);
                }
            }
            Command::StartIde => self.workspace.start_ide()?,
            Command::New { .. } | Command::Recent => {}
        }
        Ok(())
    }

    fn show(&self) -> Result<()> {
        let (config, paths) = self.workspace.current()?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        println!("config:       {}", paths.config_file);
        println!("sources:      {}", paths.sources_dir);
        println!("fonts:        {}", paths.fonts_dir);
        println!("images:       {}", paths.images_dir);
        println!("dependencies: {}", paths.dependencies_dir);
        println!("ide project:  {}", paths.ide_project_dir);
        println!(
            "generated:    {}",
            if WorkspaceService::is_generated(&paths) { "yes" } else { "no" }
        );
        Ok(())
    }

    fn validate(&self, key: Option<&str>) -> Result<()> {
        let errors = match key {
            Some(key) => {
                let key = parse_key(key)?;
                self.workspace.update_config(&[key], |_| {})?
            }
            None => self.workspace.validate_all()?,
        };

        if errors.is_empty() {
            return Ok(());
        }
        for (key, message) in &errors {
            println!("{}: {}", key, message);
        }
        Err(ComposerError::Validation(errors).into())
    }

    async fn set(&self, key: &str, raw_value: &str) -> Result<()> {
        let key = parse_key(key)?;
        let (config, _) = self.workspace.current()?;
        let updated = with_field(&config, key, raw_value)?;

        let errors = self.workspace.update_config(&[key], |config| *config = updated)?;
        self.workspace.save().await?;

        if let Some(message) = errors.get(&key) {
            println!("warning: {}: {}", key, message);
        }
        Ok(())
    }

    async fn files_command(&self, command: FilesCommand) -> Result<()> {
        let paths = self.workspace.paths()?;
        let generated = WorkspaceService::is_generated(&paths);
        let service = self.workspace.service();

        match command {
            FilesCommand::List { kind } => {
                self.files.refresh(kind, &paths).await?;
                self.print_list(kind);
            }
            FilesCommand::Add { kind, files } => {
                let added = self.files.import(kind, &paths, &files).await?;
                if generated {
                    for name in &added {
                        service.link_resource(&paths, kind, name)?;
                    }
                }
                for name in &added {
                    println!("{}", name);
                }
            }
            FilesCommand::Create { name } => {
                self.files.set_create_new_source_file_dialog_opened(true);
                self.files.create_new_source_file(&paths, &name).await?;
                if generated {
                    service.link_resource(&paths, ResourceKind::Source, &name)?;
                }
            }
            FilesCommand::Delete { kind, name } => {
                self.files.start_deleting(kind, &name);
                if generated {
                    if let Err(e) = unlink_if_linked(service, &paths, kind, &name) {
                        self.files.cancel_deleting(kind);
                        return Err(e.into());
                    }
                }
                let (name, deleted) = self.files.complete_deleting(kind, &paths).await?;
                if !deleted {
                    println!("{} was already gone", name);
                }
            }
            FilesCommand::Rename { kind, from, to } => {
                service.files().rename(&paths, kind, &from, &to).await?;
                if generated {
                    unlink_if_linked(service, &paths, kind, &from)?;
                    service.link_resource(&paths, kind, &to)?;
                }
                self.files.refresh(kind, &paths).await?;
            }
            FilesCommand::Watch { kind } => {
                let (tx, mut rx) = mpsc::unbounded_channel();
                self.files.watch(kind, &paths, move || {
                    let _ = tx.send(());
                })?;
                self.files.refresh(kind, &paths).await?;
                self.print_list(kind);

                loop {
                    tokio::select! {
                        changed = rx.recv() => {
                            if changed.is_none() {
                                break;
                            }
                            if self.refresh_watched(kind, &paths).await {
                                self.print_list(kind);
                            }
                        }
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                self.files.unwatch(kind);
            }
        }
        Ok(())
    }

    /// Refresh a watched list; failures are logged and the watch goes on
    async fn refresh_watched(&self, kind: ResourceKind, paths: &WorkspacePaths) -> bool {
        match self.files.refresh(kind, paths).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to refresh {} list: {}", kind, e);
                false
            }
        }
    }

    fn print_list(&self, kind: ResourceKind) {
        let state = self.files.snapshot();
        let list = state.list(kind);
        for name in &list.files {
            let marker = if list.selected.as_deref() == Some(name.as_str()) { "*" } else { " " };
            println!("{} {}", marker, name);
        }
        if let (Some(name), Some(content)) = (&list.selected, &list.content) {
            match content {
                ResourceContent::Text(text) => {
                    println!("{}: {} lines", name, text.lines().count())
                }
                ResourceContent::Binary(bytes) => println!("{}: {} bytes", name, bytes.len()),
            }
        }
    }
}

/// Drop the IDE references of a file, tolerating a file that was never linked
fn unlink_if_linked(
    service: &WorkspaceService,
    paths: &WorkspacePaths,
    kind: ResourceKind,
    name: &str,
) -> std::result::Result<(), ComposerError> {
    match service.unlink_resource(paths, kind, name) {
        Err(ComposerError::Assertion(message)) => {
            tracing::warn!("{} {} is not referenced by the IDE project: {}", kind, name, message);
            Ok(())
        }
        other => other,
    }
}

fn parse_key(key: &str) -> Result<WorkspaceConfigKey> {
    WorkspaceConfigKey::parse(key).ok_or_else(|| anyhow!("Unknown config key '{}'", key))
}

/// Copy of `config` with `key` set from `raw_value`
fn with_field(config: &WorkspaceConfig, key: WorkspaceConfigKey, raw_value: &str) -> Result<WorkspaceConfig> {
    let value = serde_json::from_str::<Value>(raw_value)
        .unwrap_or_else(|_| Value::String(raw_value.to_string()));

    let mut document = serde_json::to_value(config)?;
    if let Value::Object(fields) = &mut document {
        fields.insert(key.as_str().to_string(), value);
    }

    serde_json::from_value(document).with_context(|| format!("Invalid value for {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperatingSystem, PluginType};

    #[test]
    fn test_with_field_parses_json_values() {
        let config = WorkspaceConfig::default();

        let updated = with_field(&config, WorkspaceConfigKey::Fps, "30").unwrap();
        assert_eq!(updated.fps, 30);

        let updated = with_field(&config, WorkspaceConfigKey::PluginType, "INSTRUMENT").unwrap();
        assert_eq!(updated.plugin_type, PluginType::Instrument);
    }

    #[test]
    fn test_with_field_bare_word_is_string() {
        let config = WorkspaceConfig::default();
        let updated = with_field(&config, WorkspaceConfigKey::ManufacturerName, "Acme").unwrap();
        assert_eq!(updated.manufacturer_name, "Acme");
    }

    #[test]
    fn test_with_field_rejects_wrong_type() {
        let config = WorkspaceConfig::default();
        assert!(with_field(&config, WorkspaceConfigKey::Fps, "fast").is_err());
    }

    #[tokio::test]
    async fn test_watched_refresh_failure_keeps_watching() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let settings = AppSettings::default();
        let controller = CommandController::with_service(
            ConfigManager::new(root.join("settings")).unwrap(),
            Arc::new(WorkspaceService::for_host(&settings)),
            &settings,
            root.join("composer.json"),
            Arc::new(crate::ui::MemoryNotifier::new()),
        );
        let paths = WorkspacePaths::resolve(
            root.join("composer.json"),
            &WorkspaceConfig::default(),
            OperatingSystem::Windows,
        );

        // A plain file where the directory should be cannot be listed
        std::fs::write(&paths.sources_dir, "").unwrap();
        assert!(!controller.refresh_watched(ResourceKind::Source, &paths).await);

        std::fs::remove_file(&paths.sources_dir).unwrap();
        std::fs::create_dir_all(&paths.sources_dir).unwrap();
        std::fs::write(paths.sources_dir.join("Dsp.cpp"), "").unwrap();
        assert!(controller.refresh_watched(ResourceKind::Source, &paths).await);
        assert_eq!(controller.files().snapshot().sources.files, vec!["Dsp.cpp"]);
    }

    #[test]
    fn test_success_messages() {
        assert_eq!(Command::Generate.notification_options().on_success, Some("Project generated"));
        assert_eq!(Command::Show.notification_options().on_success, None);
    }
}
