use std::path::{Path, PathBuf};
use std::time::Duration;

use image::GrayImage;

use crate::watcher::FrameWatcher;

/// How long the frame file must be quiet before it is decoded.
pub const SCAN_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot watch camera frames at {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("cannot read frame {path}: {source}")]
    Frame {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Live scanner over a camera frame file.
#[derive(Debug)]
pub struct Scanner {
    watcher: FrameWatcher,
}

impl Scanner {
    /// # Errors
    ///
    /// Returns [`ScanError::Watch`] when the frame file cannot be watched.
    pub fn start(camera: &Path) -> Result<Self, ScanError> {
        Self::with_delay(camera, SCAN_DELAY)
    }

    /// # Errors
    ///
    /// Returns [`ScanError::Watch`] when the frame file cannot be watched.
    pub fn with_delay(camera: &Path, delay: Duration) -> Result<Self, ScanError> {
        let watcher = FrameWatcher::new(camera, delay).map_err(|source| ScanError::Watch {
            path: camera.to_path_buf(),
            source,
        })?;
        tracing::debug!(camera = %camera.display(), "scanner started");
        Ok(Self { watcher })
    }

    /// A payload once a settled frame contains a non-empty code.
    pub fn poll(&mut self) -> Option<String> {
        if !self.watcher.take_frame_ready() {
            return None;
        }
        match decode_frame_file(self.watcher.frame_path()) {
            Ok(payload) => payload,
            Err(err) => {
                // Capture tools can leave a half-written frame behind.
                tracing::debug!(error = %err, "skipping unreadable frame");
                None
            }
        }
    }
}

/// Decode the first non-empty code in an image file.
///
/// # Errors
///
/// Returns [`ScanError::Frame`] when the file is not a readable image.
pub fn decode_frame_file(path: &Path) -> Result<Option<String>, ScanError> {
    let _scope = crate::perf::scope("scan.decode_frame");
    let image = image::open(path).map_err(|source| ScanError::Frame {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = decode_luma(&image.to_luma8());
    crate::perf::log_event(
        "scan.frame",
        format!("path={} found={}", path.display(), payload.is_some()),
    );
    Ok(payload)
}

/// Decode the first non-empty code in a greyscale image. Payloads are trimmed.
pub fn decode_luma(image: &GrayImage) -> Option<String> {
    let width = usize::try_from(image.width()).ok()?;
    let height = usize::try_from(image.height()).ok()?;
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        u32::try_from(x)
            .ok()
            .zip(u32::try_from(y).ok())
            .map_or(0, |(x, y)| image.get_pixel(x, y).0[0])
    });
    prepared.detect_grids().into_iter().find_map(|grid| {
        let (_meta, content) = grid.decode().ok()?;
        let payload = content.trim();
        (!payload.is_empty()).then(|| payload.to_string())
    })
}
