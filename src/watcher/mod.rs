//! File watching for live reload.
//!
//! Uses notify for cross-platform file system events. Events are pulled by
//! the event loop with [`FileWatcher::poll`]; the notify backend thread only
//! feeds a channel.
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// What happened to the watched file once a burst of events settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// The file changed; carries its new contents.
    Changed(String),
    /// The file no longer exists.
    Deleted,
    /// The backend or the read failed.
    Error(String),
}

/// Watches a single file and emits debounced change notifications.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
    backend_error: Option<String>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("target_path", &self.target_path)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Create a watcher for `path`. The file does not have to exist yet;
    /// its parent directory does.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        let target_path = canonical_target(path.as_ref());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(
            target = %target_path.display(),
            root = %watch_root.display(),
            "watching file"
        );

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
            backend_error: None,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Whether a change has been seen but has not settled yet.
    pub const fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Returns true once a debounced file change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        let mut total_events = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total_events += 1;
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    saw_relevant_event = true;
                }
                Ok(ev) => {
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "irrelevant watch event");
                }
                Err(err) => {
                    tracing::warn!(%err, "watch backend error");
                    self.backend_error = Some(err.to_string());
                }
            }
        }

        if total_events > 0 {
            tracing::debug!(
                total_events,
                relevant = saw_relevant_event,
                target = %self.target_path.display(),
                "watch events drained"
            );
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    /// Drain pending events and report at most one settled outcome.
    ///
    /// Backend errors are reported first. A settled change re-reads the
    /// file, so the returned contents are what is on disk now.
    pub fn poll(&mut self) -> Option<FileEvent> {
        let ready = self.take_change_ready();
        if let Some(err) = self.backend_error.take() {
            return Some(FileEvent::Error(err));
        }
        if !ready {
            return None;
        }
        Some(read_target(&self.target_path))
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn read_target(path: &Path) -> FileEvent {
    match std::fs::read_to_string(path) {
        Ok(content) => FileEvent::Changed(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => FileEvent::Deleted,
        Err(err) => FileEvent::Error(format!("{}: {err}", path.display())),
    }
}

/// Canonicalize the parent so event paths from the OS (always absolute
/// and canonical) match, even when the file itself is missing.
fn canonical_target(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map_or_else(|_| path.to_path_buf(), |dir| dir.join(name)),
        _ => path.to_path_buf(),
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn wait_for_event(watcher: &mut FileWatcher) -> Option<FileEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(event) = watcher.poll() {
                return Some(event);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        None
    }

    #[test]
    fn test_directory_level_event_is_relevant_for_watched_file() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("content.md");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        let event = Event {
            kind: EventKind::Any,
            paths: vec![canonical_dir],
            attrs: notify::event::EventAttributes::new(),
        };

        assert!(watcher.is_relevant(&event));
    }

    #[test]
    fn test_sibling_file_event_is_irrelevant() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("content.md");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        let event = Event {
            kind: EventKind::Any,
            paths: vec![canonical_dir.join("meta.json")],
            attrs: notify::event::EventAttributes::new(),
        };

        assert!(!watcher.is_relevant(&event));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        let root = watch_root_for(Path::new("content.md"));
        assert_eq!(root, PathBuf::from("."));
    }

    #[test]
    fn test_missing_file_can_be_watched() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("not-yet.md");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");
        assert_eq!(
            watcher.target_path(),
            dir.path().canonicalize().expect("canonicalize").join("not-yet.md")
        );
    }

    #[test]
    fn test_real_file_modification_delivers_contents() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("content.md");
        std::fs::write(&path, "original").expect("write");

        let mut watcher = FileWatcher::new(&path, Duration::from_millis(50)).expect("watcher");
        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(&path, "# modified").expect("write");

        assert_eq!(
            wait_for_event(&mut watcher),
            Some(FileEvent::Changed("# modified".to_string()))
        );
    }

    #[test]
    fn test_real_file_removal_reports_deleted() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("content.md");
        std::fs::write(&path, "original").expect("write");

        let mut watcher = FileWatcher::new(&path, Duration::from_millis(50)).expect("watcher");
        std::thread::sleep(Duration::from_millis(500));

        std::fs::remove_file(&path).expect("remove");

        assert_eq!(wait_for_event(&mut watcher), Some(FileEvent::Deleted));
    }

    #[test]
    fn test_read_target_maps_missing_file() {
        let dir = tempdir().expect("tempdir");
        assert_eq!(read_target(&dir.path().join("gone.md")), FileEvent::Deleted);
    }
}
