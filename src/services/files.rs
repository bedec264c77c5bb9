//! File collections of a workspace: sources, fonts and images.
//!
//! The file system is the source of truth. Listings are recomputed on every
//! call and sorted lexicographically so callers see a deterministic order.

use crate::error::{ComposerError, Result};
use crate::models::{ResourceContent, ResourceKind, WorkspacePaths};
use crate::services::fs_utils::{delete_if_exists, ensure_dir};
use crate::services::ide::resource_alias;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::io;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Characters never accepted in a managed file name
const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', '\0', ':', '*', '?', '"', '<', '>'];

#[derive(Debug, Clone, Default)]
pub struct FilesService;

impl FilesService {
    pub fn new() -> Self {
        Self
    }

    /// Names of the files of `kind`, sorted. A missing directory lists as empty.
    pub async fn list(&self, paths: &WorkspacePaths, kind: ResourceKind) -> Result<Vec<String>> {
        let dir = kind.dir(paths);
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} directory {} does not exist", kind, dir);
                return Ok(Vec::new());
            }
            Err(e) => return Err(ComposerError::io(format!("Failed to list {}", dir), e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ComposerError::io(format!("Failed to list {}", dir), e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|file_type| file_type.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if kind.accepts(&name) {
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    pub async fn load_content(
        &self,
        paths: &WorkspacePaths,
        kind: ResourceKind,
        name: &str,
    ) -> Result<ResourceContent> {
        let path = self.file_path(paths, kind, name)?;
        let content = if kind.is_text() {
            fs::read_to_string(&path).await.map(ResourceContent::Text)
        } else {
            fs::read(&path).await.map(ResourceContent::Binary)
        };
        content.map_err(|e| ComposerError::io(format!("Failed to read {}", path), e))
    }

    /// Overwrite an existing source file with edited text
    pub async fn save_source(&self, paths: &WorkspacePaths, name: &str, text: &str) -> Result<()> {
        let path = self.file_path(paths, ResourceKind::Source, name)?;
        fs::write(&path, text)
            .await
            .map_err(|e| ComposerError::io(format!("Failed to save {}", path), e))?;
        info!("Saved source file {}", name);
        Ok(())
    }

    /// Copy external files into the directory of `kind`.
    ///
    /// All names are checked before the first copy, so a rejected batch leaves
    /// the directory untouched.
    ///
    /// # Returns
    /// The names of the added files, in input order
    pub async fn add(
        &self,
        paths: &WorkspacePaths,
        kind: ResourceKind,
        source_files: &[Utf8PathBuf],
    ) -> Result<Vec<String>> {
        let dir = kind.dir(paths);
        let existing: HashSet<String> = self.list(paths, kind).await?.into_iter().collect();
        let mut aliases: HashSet<String> = existing.iter().filter_map(|name| alias_of(kind, name)).collect();
        let mut batch = HashSet::new();
        let mut planned = Vec::with_capacity(source_files.len());

        for source in source_files {
            let name = source
                .file_name()
                .ok_or_else(|| ComposerError::InvalidFileName(source.to_string()))?;
            validate_file_name(name)?;
            if !kind.accepts(name) {
                return Err(ComposerError::InvalidFileName(name.to_string()));
            }
            if existing.contains(name) || !batch.insert(name.to_string()) {
                return Err(ComposerError::Conflict(name.to_string()));
            }
            if let Some(alias) = alias_of(kind, name) {
                if !aliases.insert(alias) {
                    return Err(ComposerError::Conflict(name.to_string()));
                }
            }
            planned.push((source, name.to_string()));
        }

        ensure_dir(dir).await?;

        let mut added = Vec::with_capacity(planned.len());
        for (source, name) in planned {
            let target = dir.join(&name);
            if fs::try_exists(&target).await.unwrap_or(false) {
                return Err(ComposerError::Conflict(name));
            }
            fs::copy(source, &target)
                .await
                .map_err(|e| ComposerError::io(format!("Failed to copy {}", source), e))?;
            info!("Added {} {}", kind, name);
            added.push(name);
        }

        Ok(added)
    }

    /// Create an empty source file; headers start with `#pragma once`
    pub async fn create_source_file(&self, paths: &WorkspacePaths, name: &str) -> Result<()> {
        let kind = ResourceKind::Source;
        validate_file_name(name)?;
        if !kind.accepts(name) {
            return Err(ComposerError::InvalidFileName(name.to_string()));
        }

        let dir = kind.dir(paths);
        ensure_dir(dir).await?;

        let path = dir.join(name);
        let is_header = Utf8Path::new(name)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("h") || ext.eq_ignore_ascii_case("hpp"))
            .unwrap_or(false);
        let content = if is_header { "#pragma once\n" } else { "" };

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = match options.open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ComposerError::Conflict(name.to_string()));
            }
            Err(e) => return Err(ComposerError::io(format!("Failed to create {}", path), e)),
        };

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ComposerError::io(format!("Failed to write {}", path), e))?;
        file.flush()
            .await
            .map_err(|e| ComposerError::io(format!("Failed to write {}", path), e))?;

        info!("Created source file {}", name);
        Ok(())
    }

    pub async fn rename(
        &self,
        paths: &WorkspacePaths,
        kind: ResourceKind,
        from: &str,
        to: &str,
    ) -> Result<()> {
        let source = self.file_path(paths, kind, from)?;
        let target = self.file_path(paths, kind, to)?;
        if !kind.accepts(to) {
            return Err(ComposerError::InvalidFileName(to.to_string()));
        }
        if fs::try_exists(&target).await.unwrap_or(false) {
            return Err(ComposerError::Conflict(to.to_string()));
        }
        if let Some(alias) = alias_of(kind, to) {
            let taken = self
                .list(paths, kind)
                .await?
                .iter()
                .any(|name| name != from && alias_of(kind, name).as_ref() == Some(&alias));
            if taken {
                return Err(ComposerError::Conflict(to.to_string()));
            }
        }

        fs::rename(&source, &target)
            .await
            .map_err(|e| ComposerError::io(format!("Failed to rename {} to {}", from, to), e))?;
        info!("Renamed {} {} to {}", kind, from, to);
        Ok(())
    }

    /// # Returns
    /// `false` when the file did not exist
    pub async fn delete(&self, paths: &WorkspacePaths, kind: ResourceKind, name: &str) -> Result<bool> {
        let path = self.file_path(paths, kind, name)?;
        let deleted = delete_if_exists(&path).await?;
        if deleted {
            info!("Deleted {} {}", kind, name);
        } else {
            debug!("{} {} was already gone", kind, name);
        }
        Ok(deleted)
    }

    /// Full path of a managed file, rejecting names that would leave the directory
    pub fn file_path(&self, paths: &WorkspacePaths, kind: ResourceKind, name: &str) -> Result<Utf8PathBuf> {
        validate_file_name(name)?;
        Ok(kind.dir(paths).join(name))
    }
}

/// Resource alias a font or image is linked under
fn alias_of(kind: ResourceKind, name: &str) -> Option<String> {
    match kind {
        ResourceKind::Source => None,
        ResourceKind::Font | ResourceKind::Image => Some(resource_alias(name)),
    }
}

/// A plain file name: no separators, not `.` or `..`, nothing reserved
pub fn validate_file_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed != name
        || name.chars().any(|c| FORBIDDEN_CHARS.contains(&c) || c.is_control())
    {
        return Err(ComposerError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("Plugin.cpp").is_ok());
        assert!(validate_file_name("My Knob.png").is_ok());
        for bad in ["", ".", "..", "../x.cpp", "a/b.cpp", "a\\b.cpp", " x.cpp", "a:b.cpp"] {
            assert!(validate_file_name(bad).is_err(), "{:?} should be rejected", bad);
        }
    }
}
