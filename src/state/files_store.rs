use crate::error::{ComposerError, Result};
use crate::models::{FilesState, FilesTab, ResourceKind, WorkspacePaths};
use crate::services::files::FilesService;
use crate::services::watcher::DirWatcher;
use crate::state::{ObservableState, StateChange, StateManager};
use camino::Utf8PathBuf;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

impl ObservableState for FilesState {
    fn detect_changes(old: &Self, new: &Self) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.active_tab != new.active_tab {
            changes.push(StateChange::ActiveTabChanged {
                tab: new.active_tab,
            });
        }

        for kind in ResourceKind::ALL {
            let (old_list, new_list) = (old.list(kind), new.list(kind));

            if old_list.files != new_list.files {
                changes.push(StateChange::FileListChanged {
                    kind,
                    count: new_list.files.len(),
                });
            }
            if old_list.selected != new_list.selected {
                changes.push(StateChange::SelectionChanged {
                    kind,
                    selected: new_list.selected.clone(),
                });
            }
            if old_list.content != new_list.content {
                if let (Some(name), Some(_)) = (&new_list.selected, &new_list.content) {
                    changes.push(StateChange::ContentLoaded {
                        kind,
                        name: name.clone(),
                    });
                }
            }
            if old_list.pending_delete != new_list.pending_delete {
                changes.push(StateChange::PendingDeleteChanged {
                    kind,
                    name: new_list.pending_delete.clone(),
                });
            }
        }

        if old.font_viewer_font_size != new.font_viewer_font_size
            || old.image_viewer_stretch_image != new.image_viewer_stretch_image
        {
            changes.push(StateChange::ViewerSettingsChanged);
        }

        if old.create_new_source_file_dialog_opened != new.create_new_source_file_dialog_opened
            || old.image_info_panel_opened != new.image_info_panel_opened
        {
            changes.push(StateChange::DialogsChanged);
        }

        changes
    }
}

/// Store of the files page: per-kind file lists, selection, pending deletion
/// and the directory watchers that keep the lists fresh.
pub struct FilesStore {
    state: StateManager<FilesState>,
    files: FilesService,
    debounce: Duration,
    watchers: Mutex<HashMap<ResourceKind, DirWatcher>>,
}

impl FilesStore {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: StateManager::new(),
            files: FilesService::new(),
            debounce,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    pub fn snapshot(&self) -> FilesState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    /// Re-list one kind and keep its selection consistent.
    ///
    /// A selection that disappeared is cleared and the first file takes its
    /// place; the content of the resulting selection is loaded.
    pub async fn refresh(&self, kind: ResourceKind, paths: &WorkspacePaths) -> Result<Vec<String>> {
        let names = self.files.list(paths, kind).await?;
        let listed = names.clone();

        self.state.update(|state| {
            state.list_mut(kind).apply_listing(listed);
        });

        let selected = self.state.read(|state| state.list(kind).selected.clone());
        if let Some(name) = selected {
            self.select(kind, paths, &name).await?;
        }

        debug!("Refreshed {} list: {} file(s)", kind, names.len());
        Ok(names)
    }

    /// Select a file and load its content
    pub async fn select(&self, kind: ResourceKind, paths: &WorkspacePaths, name: &str) -> Result<()> {
        let content = self.files.load_content(paths, kind, name).await?;

        self.state.update(|state| {
            let list = state.list_mut(kind);
            list.selected = Some(name.to_string());
            list.content = Some(content);
        });
        Ok(())
    }

    /// Create an empty source file, close the dialog and select the new file
    pub async fn create_new_source_file(&self, paths: &WorkspacePaths, name: &str) -> Result<()> {
        self.files.create_source_file(paths, name).await?;

        self.state.update(|state| {
            state.create_new_source_file_dialog_opened = false;
        });
        self.refresh(ResourceKind::Source, paths).await?;
        self.select(ResourceKind::Source, paths, name).await
    }

    pub fn start_deleting(&self, kind: ResourceKind, name: &str) {
        self.state.update(|state| {
            state.list_mut(kind).pending_delete = Some(name.to_string());
        });
    }

    pub fn cancel_deleting(&self, kind: ResourceKind) {
        self.state.update(|state| {
            state.list_mut(kind).pending_delete = None;
        });
    }

    /// Delete the pending file of `kind` and refresh that kind's list.
    ///
    /// # Returns
    /// The deleted file name, and whether it still existed
    pub async fn complete_deleting(
        &self,
        kind: ResourceKind,
        paths: &WorkspacePaths,
    ) -> Result<(String, bool)> {
        let name = self
            .state
            .read(|state| state.list(kind).pending_delete.clone())
            .ok_or_else(|| ComposerError::Assertion(format!("No {} is pending deletion", kind)))?;

        let deleted = self.files.delete(paths, kind, &name).await?;
        self.refresh(kind, paths).await?;
        self.cancel_deleting(kind);
        Ok((name, deleted))
    }

    /// Copy external files into the workspace and refresh the list
    pub async fn import(
        &self,
        kind: ResourceKind,
        paths: &WorkspacePaths,
        files: &[Utf8PathBuf],
    ) -> Result<Vec<String>> {
        let added = self.files.add(paths, kind, files).await?;
        self.refresh(kind, paths).await?;
        Ok(added)
    }

    /// Watch the directory of `kind`, replacing an earlier watch of that kind.
    ///
    /// `on_change` runs on the watcher thread once per debounced batch; callers
    /// dispatch a [`refresh`](Self::refresh) from it.
    pub fn watch<F>(&self, kind: ResourceKind, paths: &WorkspacePaths, on_change: F) -> Result<()>
    where
        F: Fn() + Send + 'static,
    {
        self.unwatch(kind);
        let watcher = DirWatcher::watch(kind.dir(paths), self.debounce, on_change)?;
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, watcher);
        Ok(())
    }

    /// # Returns
    /// Whether a watch of `kind` was active
    pub fn unwatch(&self, kind: ResourceKind) -> bool {
        let watcher = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);

        match watcher {
            Some(mut watcher) => {
                watcher.stop();
                info!("Unwatched {} directory", kind);
                true
            }
            None => false,
        }
    }

    pub fn is_watching(&self, kind: ResourceKind) -> bool {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    pub fn set_active_tab(&self, tab: FilesTab) {
        self.state.update(|state| state.active_tab = tab);
    }

    pub fn set_font_viewer_font_size(&self, size: u32) {
        self.state.update(|state| state.font_viewer_font_size = size);
    }

    pub fn set_image_viewer_stretch_image(&self, stretch: bool) {
        self.state.update(|state| state.image_viewer_stretch_image = stretch);
    }

    pub fn set_create_new_source_file_dialog_opened(&self, opened: bool) {
        self.state
            .update(|state| state.create_new_source_file_dialog_opened = opened);
    }

    pub fn set_image_info_panel_opened(&self, opened: bool) {
        self.state.update(|state| state.image_info_panel_opened = opened);
    }
}

impl Drop for FilesStore {
    fn drop(&mut self) {
        for kind in ResourceKind::ALL {
            self.unwatch(kind);
        }
    }
}
