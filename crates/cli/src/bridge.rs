use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use media_ffmpeg::{DecodedVideoFrame, ThumbnailSource, probe_media};
use scrubber::{
    AssetProperties, Command, FrameArrival, FrameBatch, MediaTime, ScrubError, SeekTolerance,
    Thumbnail,
};
use tracing::{debug, info, warn};

const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// Work the session loop hands to the media worker thread.
#[derive(Debug, Clone)]
pub enum WorkerRequest {
    Probe {
        path: PathBuf,
    },
    RenderFrames {
        path: PathBuf,
        batch: FrameBatch,
    },
    Seek {
        path: PathBuf,
        to: MediaTime,
        tolerance: SeekTolerance,
    },
}

/// Messages delivered to the session loop.
#[derive(Debug)]
pub enum HostMessage {
    Probed {
        path: PathBuf,
        result: Result<AssetProperties, ScrubError>,
    },
    Session(Command),
}

/// Sender used by the player and assets to queue media work.
pub type WorkerSender = mpsc::SyncSender<WorkerRequest>;

/// Sender used by the worker and the player to reach the session loop.
pub type HostSender = mpsc::Sender<HostMessage>;

/// Spawns the thread that runs `ffprobe`/`ffmpeg` for the session loop.
///
/// The worker stops once the session loop drops its receiver.
pub fn spawn_media_worker(timescale: i32, host_tx: HostSender) -> WorkerSender {
    let (request_tx, request_rx) = mpsc::sync_channel::<WorkerRequest>(REQUEST_CHANNEL_CAPACITY);

    thread::spawn(move || {
        let mut worker = MediaWorker {
            timescale,
            source: None,
            host_tx,
        };
        while let Ok(request) = request_rx.recv() {
            if worker.handle(request).is_err() {
                debug!("session loop gone, media worker stopping");
                return;
            }
        }
    });

    request_tx
}

struct MediaWorker {
    timescale: i32,
    source: Option<ThumbnailSource>,
    host_tx: HostSender,
}

type Disconnected = mpsc::SendError<HostMessage>;

impl MediaWorker {
    fn handle(&mut self, request: WorkerRequest) -> Result<(), Disconnected> {
        match request {
            WorkerRequest::Probe { path } => {
                let result = probe_media(&path)
                    .map(|info| AssetProperties::from_media_info(&info, self.timescale))
                    .map_err(ScrubError::from);
                self.host_tx.send(HostMessage::Probed { path, result })
            }
            WorkerRequest::RenderFrames { path, batch } => self.render_frames(&path, batch),
            WorkerRequest::Seek {
                path,
                to,
                tolerance,
            } => self.seek(&path, to, tolerance),
        }
    }

    fn render_frames(&mut self, path: &Path, batch: FrameBatch) -> Result<(), Disconnected> {
        let max_size = Some((batch.max_size.width, batch.max_size.height));
        let opened = self.open(path);

        for (index, time) in batch.times.iter().copied().enumerate() {
            let result = opened
                .clone()
                .and_then(|()| self.decode(time, max_size))
                .map(Thumbnail::from);
            self.host_tx
                .send(HostMessage::Session(Command::FrameArrived(FrameArrival {
                    generation: batch.generation,
                    purpose: batch.purpose,
                    index,
                    requested_time: time,
                    result,
                })))?;
        }
        Ok(())
    }

    fn seek(
        &mut self,
        path: &Path,
        to: MediaTime,
        tolerance: SeekTolerance,
    ) -> Result<(), Disconnected> {
        let landed = self.open(path).and_then(|()| self.decode(to, None));
        let finished = match landed {
            Ok(frame) => {
                info!(
                    %to,
                    exact = tolerance.is_exact(),
                    pts = frame.best_effort_timestamp,
                    width = frame.width,
                    height = frame.height,
                    "seek landed"
                );
                true
            }
            Err(reason) => {
                warn!(%to, %reason, "seek failed");
                false
            }
        };
        self.host_tx
            .send(HostMessage::Session(Command::SeekCompleted { finished }))
    }

    fn decode(
        &self,
        time: MediaTime,
        max_size: Option<(u32, u32)>,
    ) -> Result<DecodedVideoFrame, String> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| "no thumbnail source open".to_string())?;
        source
            .decode_at(time.seconds(), max_size)
            .map_err(|err| err.to_string())
    }

    fn open(&mut self, path: &Path) -> Result<(), String> {
        if let Some(source) = &self.source {
            if source.path() == path {
                return Ok(());
            }
        }
        match ThumbnailSource::open(path) {
            Ok(source) => {
                let (width, height) = source.dimensions();
                debug!(path = ?path, width, height, "thumbnail source opened");
                self.source = Some(source);
                Ok(())
            }
            Err(error) => {
                self.source = None;
                Err(error.to_string())
            }
        }
    }
}
