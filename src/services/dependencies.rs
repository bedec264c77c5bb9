//! Download and extraction of the SDK archives a generated project needs.
//!
//! Each archive installs into its own directory below the workspace
//! dependencies directory. A `.composer-complete` file marks a finished
//! install; anything without it is treated as partial and replaced.

use crate::error::{ComposerError, Result};
use crate::models::{WorkspaceConfig, WorkspacePaths};
use crate::services::fs_utils::{delete_if_exists, ensure_dir};
use crate::services::ide::DependencyArchive;
use camino::{Utf8Path, Utf8PathBuf};
use futures_util::StreamExt;
use std::fs;
use std::io;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use zip::ZipArchive;

pub const COMPLETE_MARKER: &str = ".composer-complete";

/// Checkout of iPlug2 the generator runs from
pub fn iplug2_dir(paths: &WorkspacePaths, config: &WorkspaceConfig) -> Utf8PathBuf {
    paths
        .dependencies_dir
        .join(format!("iPlug2-{}", config.iplug2_git_hash))
}

pub struct DependencyService {
    client: reqwest::Client,
}

impl DependencyService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn is_installed(paths: &WorkspacePaths, archive: &DependencyArchive) -> bool {
        paths
            .dependencies_dir
            .join(&archive.install_dir)
            .join(COMPLETE_MARKER)
            .is_file()
    }

    /// Install every archive that is not installed yet, in order.
    ///
    /// # Returns
    /// Names of the archives that were downloaded
    pub async fn ensure(
        &self,
        paths: &WorkspacePaths,
        archives: &[DependencyArchive],
    ) -> Result<Vec<String>> {
        ensure_dir(&paths.dependencies_dir).await?;
        let mut installed = Vec::new();

        for archive in archives {
            if Self::is_installed(paths, archive) {
                debug!("{} is already installed", archive.name);
                continue;
            }

            let install_dir = paths.dependencies_dir.join(&archive.install_dir);
            if delete_if_exists(&install_dir).await? {
                info!("Removed partial install of {} at {}", archive.name, install_dir);
            }

            let zip_path = paths.dependencies_dir.join(format!("{}.zip", archive.root_dir));
            self.download(&archive.url, &zip_path).await?;

            let zip_for_task = zip_path.clone();
            let dir_for_task = install_dir.clone();
            let root_dir = archive.root_dir.clone();
            let extracted = tokio::task::spawn_blocking(move || {
                extract_archive(&zip_for_task, &dir_for_task, &root_dir)
            })
            .await
            .map_err(|e| ComposerError::Download(format!("Extraction task failed: {}", e)))??;

            tokio::fs::write(install_dir.join(COMPLETE_MARKER), archive.url.as_bytes())
                .await
                .map_err(|e| ComposerError::io(format!("Failed to mark {} as complete", install_dir), e))?;
            delete_if_exists(&zip_path).await?;

            info!("Installed {} ({} files) into {}", archive.name, extracted, install_dir);
            installed.push(archive.name.clone());
        }

        Ok(installed)
    }

    /// Stream `url` into `target`
    pub async fn download(&self, url: &str, target: &Utf8Path) -> Result<u64> {
        info!("Downloading {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ComposerError::Download(format!(
                "HTTP {}: {}",
                response.status(),
                url
            )));
        }

        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| ComposerError::io(format!("Failed to create {}", target), e))?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ComposerError::io(format!("Failed to write {}", target), e))?;
            downloaded += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| ComposerError::io(format!("Failed to write {}", target), e))?;

        debug!("Downloaded {} bytes to {}", downloaded, target);
        Ok(downloaded)
    }
}

impl Default for DependencyService {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `zip_path` into `dest`, dropping the leading `root_dir` folder.
///
/// Entries with unsafe paths (absolute, or escaping through `..`) and
/// entries outside `root_dir` are skipped.
///
/// # Returns
/// Number of files written
pub fn extract_archive(zip_path: &Utf8Path, dest: &Utf8Path, root_dir: &str) -> Result<usize> {
    let file = fs::File::open(zip_path)
        .map_err(|e| ComposerError::io(format!("Failed to open {}", zip_path), e))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ComposerError::Download(format!("Failed to read zip archive {}: {}", zip_path, e)))?;

    fs::create_dir_all(dest).map_err(|e| ComposerError::io(format!("Failed to create {}", dest), e))?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ComposerError::Download(format!("Failed to read zip entry: {}", e)))?;

        let Some(enclosed) = entry.enclosed_name() else {
            debug!("Skipping unsafe zip entry {}", entry.name());
            continue;
        };
        let relative = if root_dir.is_empty() {
            enclosed
        } else {
            match enclosed.strip_prefix(root_dir) {
                Ok(stripped) => stripped.to_path_buf(),
                Err(_) => continue,
            }
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.as_std_path().join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let mut out = fs::File::create(&target).map_err(|e| io_error(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| io_error(&target, e))?;
        written += 1;
    }

    Ok(written)
}

fn io_error(path: &std::path::Path, err: io::Error) -> ComposerError {
    ComposerError::io(format!("Failed to extract {}", path.display()), err)
}
