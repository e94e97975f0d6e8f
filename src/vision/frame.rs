use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::DynamicImage;
use tracing::debug;

use crate::kernel::error::{KernelError, KernelResult};

/// One captured camera image.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub image: DynamicImage,
}

/// Hands out the latest frame on demand. Called every 100-200ms, so it must
/// not block for long.
pub trait FrameSource: Send + Sync {
    fn current_frame(&self) -> KernelResult<Frame>;
}

/// Reads the newest frame from an image file that an external grabber keeps
/// overwriting (e.g. `ffmpeg -f v4l2 -i /dev/video0 -update 1 latest.jpg`).
pub struct SnapshotFileSource {
    path: PathBuf,
    sequence: AtomicU64,
}

impl SnapshotFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for SnapshotFileSource {
    fn current_frame(&self) -> KernelResult<Frame> {
        // A half-written file fails to decode; that is just a missed frame.
        let image = image::open(&self.path).map_err(|e| {
            KernelError::FrameUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        debug!(sequence, "Frame read from {}", self.path.display());
        Ok(Frame { sequence, image })
    }
}
