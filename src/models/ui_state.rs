use crate::models::{ResourceContent, ResourceKind, WorkspaceConfig, WorkspacePaths};
use crate::services::validation::ValidationErrors;
use camino::Utf8PathBuf;

/// State held by [`crate::state::WorkspaceStore`]
#[derive(Clone, Debug, Default)]
pub struct WorkspaceState {
    pub user_config: Option<WorkspaceConfig>,
    pub config_path: Option<Utf8PathBuf>,
    pub workspace_paths: Option<WorkspacePaths>,
    pub validation_errors: ValidationErrors,
}

impl WorkspaceState {
    pub fn is_open(&self) -> bool {
        self.user_config.is_some() && self.config_path.is_some()
    }
}

/// Tabs of the files page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilesTab {
    #[default]
    SourceFiles,
    Fonts,
    Images,
}

impl FilesTab {
    pub fn kind(&self) -> ResourceKind {
        match self {
            FilesTab::SourceFiles => ResourceKind::Source,
            FilesTab::Fonts => ResourceKind::Font,
            FilesTab::Images => ResourceKind::Image,
        }
    }
}

/// File list, selection and pending deletion for one resource kind
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceListState {
    pub files: Vec<String>,
    pub selected: Option<String>,
    pub content: Option<ResourceContent>,
    pub pending_delete: Option<String>,
}

impl ResourceListState {
    /// Replace the file list and keep the selection consistent with it.
    ///
    /// A selection that vanished from the list is cleared; with no selection
    /// the first file becomes selected. Returns true when the selection changed.
    pub fn apply_listing(&mut self, files: Vec<String>) -> bool {
        let previous = self.selected.clone();
        self.files = files;

        if let Some(selected) = &self.selected {
            if !self.files.contains(selected) {
                self.selected = None;
                self.content = None;
            }
        }
        if self.selected.is_none() {
            self.selected = self.files.first().cloned();
        }

        previous != self.selected
    }
}

/// State held by [`crate::state::FilesStore`]
#[derive(Clone, Debug, PartialEq)]
pub struct FilesState {
    pub active_tab: FilesTab,
    pub sources: ResourceListState,
    pub fonts: ResourceListState,
    pub images: ResourceListState,
    pub font_viewer_font_size: u32,
    pub image_viewer_stretch_image: bool,
    pub create_new_source_file_dialog_opened: bool,
    pub image_info_panel_opened: bool,
}

impl Default for FilesState {
    fn default() -> Self {
        Self {
            active_tab: FilesTab::default(),
            sources: ResourceListState::default(),
            fonts: ResourceListState::default(),
            images: ResourceListState::default(),
            font_viewer_font_size: 18,
            image_viewer_stretch_image: false,
            create_new_source_file_dialog_opened: false,
            image_info_panel_opened: false,
        }
    }
}

impl FilesState {
    pub fn list(&self, kind: ResourceKind) -> &ResourceListState {
        match kind {
            ResourceKind::Source => &self.sources,
            ResourceKind::Font => &self.fonts,
            ResourceKind::Image => &self.images,
        }
    }

    pub fn list_mut(&mut self, kind: ResourceKind) -> &mut ResourceListState {
        match kind {
            ResourceKind::Source => &mut self.sources,
            ResourceKind::Font => &mut self.fonts,
            ResourceKind::Image => &mut self.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_first_file_selected_when_empty() {
        let mut list = ResourceListState::default();
        assert!(list.apply_listing(names(&["A.cpp", "B.cpp"])));
        assert_eq!(list.selected.as_deref(), Some("A.cpp"));
    }

    #[test]
    fn test_vanished_selection_falls_back_to_first() {
        let mut list = ResourceListState::default();
        list.apply_listing(names(&["A.cpp", "B.cpp", "C.cpp"]));
        list.selected = Some("B.cpp".to_string());
        list.content = Some(ResourceContent::Text("b".to_string()));

        assert!(list.apply_listing(names(&["A.cpp", "C.cpp"])));
        assert_eq!(list.selected.as_deref(), Some("A.cpp"));
        assert!(list.content.is_none());
    }

    #[test]
    fn test_selection_cleared_when_list_empty() {
        let mut list = ResourceListState::default();
        list.apply_listing(names(&["A.cpp"]));
        list.apply_listing(Vec::new());
        assert!(list.selected.is_none());
    }

    #[test]
    fn test_existing_selection_kept() {
        let mut list = ResourceListState::default();
        list.apply_listing(names(&["A.cpp", "B.cpp"]));
        list.selected = Some("B.cpp".to_string());
        assert!(!list.apply_listing(names(&["A.cpp", "B.cpp", "C.cpp"])));
        assert_eq!(list.selected.as_deref(), Some("B.cpp"));
    }

    #[test]
    fn test_files_state_defaults() {
        let state = FilesState::default();
        assert_eq!(state.font_viewer_font_size, 18);
        assert_eq!(state.active_tab, FilesTab::SourceFiles);
        assert!(!state.image_viewer_stretch_image);
    }
}
