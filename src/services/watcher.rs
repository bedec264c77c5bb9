use crate::error::{ComposerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Debounced, non-recursive watch of a single directory.
///
/// `on_change` runs on the watcher's worker thread, once per batch of file
/// system events: after the first event the worker keeps draining until the
/// debounce window passes without a new one. Dropping the watcher stops it.
pub struct DirWatcher {
    dir: Utf8PathBuf,
    watcher: Option<RecommendedWatcher>,
    stop_tx: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl DirWatcher {
    /// Start watching `dir`, creating it first when missing
    pub fn watch<F>(dir: &Utf8Path, debounce: Duration, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        std::fs::create_dir_all(dir)
            .map_err(|e| ComposerError::io(format!("Failed to create directory {}", dir), e))?;

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (event_tx, event_rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.send(res);
            },
            Config::default(),
        )
        .map_err(|e| watch_error(dir, e))?;
        watcher
            .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(dir, e))?;

        let worker_dir = dir.to_path_buf();
        let worker = thread::Builder::new()
            .name(format!("watch-{}", dir.file_name().unwrap_or("dir")))
            .spawn(move || {
                loop {
                    if stop_rx.try_recv().is_ok() {
                        break;
                    }

                    match event_rx.recv_timeout(STOP_POLL_INTERVAL) {
                        Ok(Ok(_)) => {
                            if !drain_batch(&event_rx, &stop_rx, debounce) {
                                break;
                            }
                            debug!("Change detected in {}", worker_dir);
                            on_change();
                        }
                        Ok(Err(e)) => warn!("Watcher error for {}: {}", worker_dir, e),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Watcher worker for {} stopped", worker_dir);
            })
            .map_err(|e| ComposerError::io(format!("Failed to start watcher thread for {}", dir), e))?;

        info!("Watching {}", dir);
        Ok(Self {
            dir: dir.to_path_buf(),
            watcher: Some(watcher),
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Unwatch the directory and wait for the worker thread to finish
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            let _ = watcher.unwatch(self.dir.as_std_path());
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Watcher worker for {} panicked", self.dir);
            }
            info!("Stopped watching {}", self.dir);
        }
    }
}

impl Drop for DirWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Swallow events until `debounce` passes quietly. Returns false when the
/// watcher should shut down instead.
fn drain_batch(
    events: &mpsc::Receiver<notify::Result<Event>>,
    stop: &mpsc::Receiver<()>,
    debounce: Duration,
) -> bool {
    loop {
        if stop.try_recv().is_ok() {
            return false;
        }
        match events.recv_timeout(debounce) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => return true,
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
}

fn watch_error(dir: &Utf8Path, err: notify::Error) -> ComposerError {
    ComposerError::io(
        format!("Failed to watch {}", dir),
        io::Error::other(err.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_watch_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let dir = root.join("resources").join("fonts");

        let mut watcher = DirWatcher::watch(&dir, Duration::from_millis(50), || {}).unwrap();
        assert!(dir.is_dir());
        assert_eq!(watcher.dir(), dir.as_path());
        watcher.stop();
    }

    #[test]
    fn test_batch_of_writes_fires_once() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut watcher = DirWatcher::watch(&dir, Duration::from_millis(300), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        for i in 0..5 {
            std::fs::write(dir.join(format!("file{}.cpp", i)), "x").unwrap();
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        thread::sleep(Duration::from_millis(500));
        watcher.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
