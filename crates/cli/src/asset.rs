use std::path::{Path, PathBuf};

use scrubber::{Asset, FrameBatch, MediaTime};
use tracing::debug;

use crate::bridge::{WorkerRequest, WorkerSender};

/// Video file whose thumbnails are rendered on the media worker thread.
#[derive(Debug)]
pub struct FfmpegAsset {
    path: PathBuf,
    duration: MediaTime,
    worker_tx: WorkerSender,
}

impl FfmpegAsset {
    pub fn new(path: impl Into<PathBuf>, duration: MediaTime, worker_tx: WorkerSender) -> Self {
        Self {
            path: path.into(),
            duration,
            worker_tx,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Asset for FfmpegAsset {
    fn duration(&self) -> MediaTime {
        self.duration
    }

    fn request_frames(&self, batch: FrameBatch) {
        let frame_count = batch.times.len();
        let request = WorkerRequest::RenderFrames {
            path: self.path.clone(),
            batch,
        };
        if self.worker_tx.send(request).is_err() {
            debug!(frame_count, "media worker gone, thumbnail batch dropped");
        }
    }
}
