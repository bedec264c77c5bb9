// State management module
//
// The stores hold the view state of an open workspace behind Arc<RwLock<T>>
// and emit change events so a front end can re-render without polling.

pub mod files_store;
pub mod workspace_store;

pub use files_store::FilesStore;
pub use workspace_store::WorkspaceStore;

use crate::models::{FilesTab, ResourceKind, WorkspaceConfigKey};
use camino::Utf8PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when store state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A config was created or opened
    WorkspaceOpened { config_path: Utf8PathBuf },

    /// Fields of the open config were modified
    ConfigChanged { keys: Vec<WorkspaceConfigKey> },

    /// The set of fields with validation errors changed
    ValidationChanged { error_count: usize },

    /// The config was written to disk
    WorkspaceSaved { config_path: Utf8PathBuf },

    /// The IDE project was (re)generated
    ProjectGenerated { ide_project_dir: Utf8PathBuf },

    /// Workspace files were referenced from the IDE project
    ResourcesSynced { added: usize },

    ActiveTabChanged { tab: FilesTab },

    /// The file list of a resource kind was refreshed with a different result
    FileListChanged { kind: ResourceKind, count: usize },

    SelectionChanged {
        kind: ResourceKind,
        selected: Option<String>,
    },

    /// The content of the selected file was (re)loaded
    ContentLoaded { kind: ResourceKind, name: String },

    /// A deletion was started, cancelled or completed
    PendingDeleteChanged {
        kind: ResourceKind,
        name: Option<String>,
    },

    /// Font size or image stretch changed
    ViewerSettingsChanged,

    /// A dialog or panel was opened or closed
    DialogsChanged,
}

/// State that can report what changed between two of its versions
pub trait ObservableState: Clone + Default + Send + Sync + 'static {
    fn detect_changes(old: &Self, new: &Self) -> Vec<StateChange>;
}

/// Thread-safe state container with event emission
///
/// Shared by the stores in this module:
/// - [`read()`](Self::read) for reading state under a short read lock
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// Cloning yields another handle to the same state and channel.
pub struct StateManager<S: ObservableState> {
    state: Arc<RwLock<S>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl<S: ObservableState> StateManager<S> {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(S::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> S {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// # Arguments
    /// * `update_fn` - A function that mutates the state
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut S),
    {
        let changes = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let old_state = state.clone();
            update_fn(&mut state);
            S::detect_changes(&old_state, &state)
        };

        for change in &changes {
            self.emit(change.clone());
        }
        changes
    }

    /// Emit an event that is not derived from a state difference
    pub fn emit(&self, change: StateChange) {
        // Nobody listening is fine
        let _ = self.state_tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }
}

impl<S: ObservableState> Default for StateManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ObservableState> Clone for StateManager<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default)]
    struct Counter {
        value: u32,
    }

    impl ObservableState for Counter {
        fn detect_changes(old: &Self, new: &Self) -> Vec<StateChange> {
            if old.value != new.value {
                vec![StateChange::ViewerSettingsChanged]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_update_reports_changes() {
        let manager = StateManager::<Counter>::new();
        assert_eq!(
            manager.update(|s| s.value = 3),
            vec![StateChange::ViewerSettingsChanged]
        );
        assert!(manager.update(|s| s.value = 3).is_empty());
        assert_eq!(manager.read(|s| s.value), 3);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let manager = StateManager::<Counter>::new();
        let mut rx = manager.subscribe();

        manager.update(|s| s.value += 1);
        manager.emit(StateChange::DialogsChanged);

        assert_eq!(rx.recv().await.unwrap(), StateChange::ViewerSettingsChanged);
        assert_eq!(rx.recv().await.unwrap(), StateChange::DialogsChanged);
    }

    #[test]
    fn test_clones_share_state() {
        let manager = StateManager::<Counter>::new();
        let other = manager.clone();
        other.update(|s| s.value = 7);
        assert_eq!(manager.snapshot().value, 7);
    }
}
