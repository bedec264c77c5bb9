//! End-to-end tests of the command controller
//!
//! Commands run against a temporary workspace with a Visual Studio project
//! fixture; outcomes are collected by a [`MemoryNotifier`].

mod common;

use camino::Utf8PathBuf;
use common::{Workspace, config_header, generated_workspace, read, solution, vcxproj};
use iplug_composer::models::{AppSettings, PluginFormat, ResourceKind};
use iplug_composer::services::ide::VisualStudioProject;
use iplug_composer::services::workspace::WorkspaceService;
use iplug_composer::ui::{
    Command, CommandController, FilesCommand, FormatCommand, MemoryNotifier, NotificationLevel,
};
use iplug_composer::ConfigManager;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    controller: CommandController,
    notifier: Arc<MemoryNotifier>,
    settings: TempDir,
}

fn service() -> Arc<WorkspaceService> {
    let ide = VisualStudioProject::new(None, "https://github.com".to_string());
    Arc::new(WorkspaceService::new(Arc::new(ide), &AppSettings::default()))
}

fn harness(config_path: Utf8PathBuf) -> Harness {
    let settings = TempDir::new().unwrap();
    let config_manager =
        ConfigManager::new(Utf8PathBuf::try_from(settings.path().to_path_buf()).unwrap()).unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let controller = CommandController::with_service(
        config_manager,
        service(),
        &AppSettings::default(),
        config_path,
        notifier.clone(),
    );
    Harness {
        controller,
        notifier,
        settings,
    }
}

/// Generated, customized workspace with its config on disk
async fn customized_workspace() -> Workspace {
    let workspace = generated_workspace();
    ConfigManager::write_config_to_path(&workspace.paths.config_file, &workspace.config).unwrap();
    service()
        .customize_ide_project(&workspace.config, &workspace.paths)
        .await
        .unwrap();
    workspace
}

#[tokio::test]
async fn test_new_command_creates_and_remembers_workspace() {
    let temp = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp.path().join("plugin").join("composer.json")).unwrap();
    let harness = harness(path.clone());

    harness
        .controller
        .run(Command::New { path: path.clone() })
        .await
        .unwrap();

    assert!(path.is_file());
    let notifications = harness.notifier.take();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Successfully created a new project.");

    let manager =
        ConfigManager::new(Utf8PathBuf::try_from(harness.settings.path().to_path_buf()).unwrap())
            .unwrap();
    let recent = manager.load_recent_projects().unwrap();
    assert_eq!(recent, vec![path.canonicalize_utf8().unwrap()]);
}

#[tokio::test]
async fn test_missing_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp.path().join("composer.json")).unwrap();
    let harness = harness(path);

    assert!(harness.controller.run(Command::Show).await.is_err());

    let notifications = harness.notifier.take();
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(notifications[0].text.starts_with("Failed to open project: Could not open"));
}

#[tokio::test]
async fn test_set_saves_invalid_value_and_validate_fails() {
    let workspace = customized_workspace().await;
    let harness = harness(workspace.paths.config_file.clone());

    harness
        .controller
        .run(Command::Set {
            key: "manufacturerId".to_string(),
            value: "ABCDE".to_string(),
        })
        .await
        .unwrap();
    let saved = ConfigManager::load_config_from_path(&workspace.paths.config_file).unwrap();
    assert_eq!(saved.manufacturer_id, "ABCDE");

    let result = harness.controller.run(Command::Validate { key: None }).await;
    assert!(result.is_err());

    let notifications = harness.notifier.take();
    assert_eq!(notifications[0].text, "Saved.");
    assert_eq!(notifications[1].level, NotificationLevel::Error);
    assert!(notifications[1].text.starts_with("Validation failed: "));
    assert!(notifications[1].text.contains("manufacturerId"));
}

#[tokio::test]
async fn test_generate_refused_while_invalid() {
    let workspace = customized_workspace().await;
    let mut config = workspace.config.clone();
    config.fps = 0;
    ConfigManager::write_config_to_path(&workspace.paths.config_file, &config).unwrap();
    let harness = harness(workspace.paths.config_file.clone());

    assert!(harness.controller.run(Command::Generate).await.is_err());
    // The generated project is left untouched
    assert!(workspace.paths.ide_project_dir.is_dir());
    assert!(harness.notifier.take()[0].text.starts_with("Failed generating project: "));
}

#[tokio::test]
async fn test_file_commands_patch_generated_project() {
    let workspace = customized_workspace().await;
    let paths = &workspace.paths;
    let harness = harness(paths.config_file.clone());

    harness
        .controller
        .run(Command::Files(FilesCommand::Create {
            name: "Dsp.cpp".to_string(),
        }))
        .await
        .unwrap();
    assert!(paths.sources_dir.join("Dsp.cpp").is_file());
    assert!(read(vcxproj(paths, "app")).contains("sources\\Dsp.cpp\" />"));
    assert_eq!(
        harness.controller.files().snapshot().sources.selected.as_deref(),
        Some("Dsp.cpp")
    );

    harness
        .controller
        .run(Command::Files(FilesCommand::Delete {
            kind: ResourceKind::Font,
            name: "Roboto-Regular.ttf".to_string(),
        }))
        .await
        .unwrap();
    assert!(!paths.fonts_dir.join("Roboto-Regular.ttf").exists());
    assert!(!read(config_header(paths)).contains("TTF_ROBOTO_REGULAR_FN"));
    assert!(harness.controller.files().snapshot().fonts.files.is_empty());

    let texts: Vec<String> = harness
        .notifier
        .take()
        .into_iter()
        .map(|notification| notification.text)
        .collect();
    assert_eq!(texts, vec!["Created.", "Deleted."]);
}

#[tokio::test]
async fn test_deleting_unlinked_file_still_deletes() {
    let workspace = customized_workspace().await;
    let paths = &workspace.paths;
    let harness = harness(paths.config_file.clone());
    // Written behind the composer's back, never referenced by the project
    std::fs::write(paths.sources_dir.join("Extra.cpp"), "").unwrap();

    harness
        .controller
        .run(Command::Files(FilesCommand::Delete {
            kind: ResourceKind::Source,
            name: "Extra.cpp".to_string(),
        }))
        .await
        .unwrap();

    assert!(!paths.sources_dir.join("Extra.cpp").exists());
    assert!(!read(vcxproj(paths, "app")).contains("Extra.cpp"));
    assert!(harness.controller.files().snapshot().sources.pending_delete.is_none());
    let notifications = harness.notifier.take();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Deleted.");
}

#[tokio::test]
async fn test_format_commands_update_config_and_solution() {
    let workspace = customized_workspace().await;
    let paths = &workspace.paths;
    let harness = harness(paths.config_file.clone());

    harness
        .controller
        .run(Command::Format(FormatCommand::Disable {
            format: PluginFormat::Vst3,
        }))
        .await
        .unwrap();
    let saved = ConfigManager::load_config_from_path(&paths.config_file).unwrap();
    assert!(!saved.has_format(PluginFormat::Vst3));
    assert!(!read(solution(paths)).contains("NewProject-vst3"));

    harness
        .controller
        .run(Command::Format(FormatCommand::Enable {
            format: PluginFormat::Vst3,
        }))
        .await
        .unwrap();
    let saved = ConfigManager::load_config_from_path(&paths.config_file).unwrap();
    assert!(saved.has_format(PluginFormat::Vst3));
    assert!(read(solution(paths)).contains("NewProject-vst3"));
}

#[tokio::test]
async fn test_sync_requires_generated_project() {
    let workspace = common::workspace();
    ConfigManager::write_config_to_path(&workspace.paths.config_file, &workspace.config).unwrap();
    let harness = harness(workspace.paths.config_file.clone());

    assert!(harness.controller.run(Command::Sync).await.is_err());
    let notification = &harness.notifier.take()[0];
    assert_eq!(
        notification.text,
        "Failed syncing resources: The IDE project has not been generated yet"
    );
}
