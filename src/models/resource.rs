use crate::models::WorkspacePaths;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a managed project asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Source,
    Font,
    Image,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Source, ResourceKind::Font, ResourceKind::Image];

    /// Directory of this kind inside a workspace
    pub fn dir<'a>(&self, paths: &'a WorkspacePaths) -> &'a Utf8Path {
        match self {
            ResourceKind::Source => &paths.sources_dir,
            ResourceKind::Font => &paths.fonts_dir,
            ResourceKind::Image => &paths.images_dir,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Source => &["h", "hpp", "cpp"],
            ResourceKind::Font => &["ttf"],
            ResourceKind::Image => &["png"],
        }
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        Utf8Path::new(file_name)
            .extension()
            .map(|ext| {
                self.allowed_extensions()
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Whether files of this kind are edited as text
    pub fn is_text(&self) -> bool {
        matches!(self, ResourceKind::Source)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "source" | "sources" => Some(ResourceKind::Source),
            "font" | "fonts" => Some(ResourceKind::Font),
            "image" | "images" => Some(ResourceKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Source => f.write_str("source file"),
            ResourceKind::Font => f.write_str("font"),
            ResourceKind::Image => f.write_str("image"),
        }
    }
}

/// Loaded content of a resource file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContent {
    Text(String),
    Binary(Vec<u8>),
}

impl ResourceContent {
    pub fn len(&self) -> usize {
        match self {
            ResourceContent::Text(text) => text.len(),
            ResourceContent::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
