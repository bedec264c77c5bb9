use crate::error::{ComposerError, Result};
use camino::Utf8Path;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// Bounded retry with a fixed delay between failed attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(200),
        }
    }
}

/// Run `operation` until it succeeds or `policy.attempts` calls have failed.
///
/// # Arguments
/// * `policy` - Number of attempts and the pause after each failure
/// * `context` - Description used for the error of the last failed attempt
/// * `operation` - Fallible async operation, called once per attempt
pub async fn retry_with_delay<T, F, Fut>(
    policy: RetryPolicy,
    context: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                debug!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    context, attempt, attempts, e, policy.delay
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                warn!("{} failed after {} attempts: {}", context, attempts, e);
                return Err(ComposerError::io(context, e));
            }
        }
    }
}

/// Delete `dir` with everything in it and create it again, empty.
///
/// Recreation is retried because a finished delete is not always visible to
/// the following create right away.
pub async fn recreate_dir(dir: &Utf8Path, policy: RetryPolicy) -> Result<()> {
    delete_if_exists(dir).await?;

    retry_with_delay(policy, &format!("Failed to recreate directory {}", dir), || {
        fs::create_dir_all(dir)
    })
    .await
}

pub async fn ensure_dir(dir: &Utf8Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ComposerError::io(format!("Failed to create directory {}", dir), e))
}

/// Delete a file or directory tree.
///
/// # Returns
/// `false` when nothing existed at `path`
pub async fn delete_if_exists(path: &Utf8Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ComposerError::io(format!("Failed to inspect {}", path), e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => {
            debug!("Deleted {}", path);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ComposerError::io(format!("Failed to delete {}", path), e)),
    }
}

pub async fn read_text(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ComposerError::io(format!("Failed to read {}", path), e))
}

pub async fn write_text(path: &Utf8Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| ComposerError::io(format!("Failed to write {}", path), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_with_delay(fast_policy(5), "flaky", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(io::Error::other("not yet"))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = retry_with_delay(fast_policy(3), "always failing", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(io::Error::other("nope"))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(matches!(err, ComposerError::Io { .. }));
        assert_eq!(err.to_string(), "always failing: nope");
    }

    #[tokio::test]
    async fn test_recreate_dir_empties_directory() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let dir = root.join("build-win");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/file.txt"), "x").unwrap();

        recreate_dir(&dir, fast_policy(5)).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let file = root.join("gone.txt");

        assert!(!delete_if_exists(&file).await.unwrap());
        std::fs::write(&file, "x").unwrap();
        assert!(delete_if_exists(&file).await.unwrap());
        assert!(!file.exists());
    }
}
