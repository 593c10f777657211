//! Camera frame watching.
//!
//! A capture tool keeps overwriting one image file; the scanner re-reads it
//! once writes have settled. Uses notify for cross-platform file events.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a single frame file and reports when a fresh frame is ready.
pub struct FrameWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    frame_path: PathBuf,
    frame_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl FrameWatcher {
    /// Watch `path`. A frame already on disk counts as pending, so it is
    /// scanned once the debounce has elapsed.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the frame's
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are canonical; the frame may not exist yet.
        let frame_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let frame_name = frame_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&frame_path);
        let watch_root = watch_root.canonicalize().unwrap_or(watch_root);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        let pending_since = frame_path.exists().then(Instant::now);
        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            frame_path,
            frame_name,
            debounce,
            pending_since,
        })
    }

    pub fn frame_path(&self) -> &Path {
        &self.frame_path
    }

    /// Returns true once the frame file has been quiet for the debounce.
    pub fn take_frame_ready(&mut self) -> bool {
        let mut saw_frame_write = false;
        let mut total_events = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total_events += 1;
            match event {
                Ok(ev) if self.is_relevant(&ev) => saw_frame_write = true,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(error = %err, "frame watcher error");
                    crate::perf::log_event("watcher.error", format!("{err}"));
                }
            }
        }

        if total_events > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "total={total_events} frame={} path={}",
                    if saw_frame_write { "yes" } else { "no" },
                    self.frame_path.display(),
                ),
            );
        }

        if saw_frame_write {
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

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.frame_path
                || self
                    .frame_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

impl std::fmt::Debug for FrameWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWatcher")
            .field("frame_path", &self.frame_path)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
