use std::path::PathBuf;
use std::time::Instant;

use scrubber::{Command, MediaTime, Player, PlayerStatus, SeekTolerance, TimeControlStatus};
use tracing::debug;

use crate::bridge::{HostMessage, HostSender, WorkerRequest, WorkerSender};

/// Wall-clock player for a headless session.
///
/// Playback advances the position in real time; seeks move it at once and
/// ask the media worker to render the target frame, which reports the seek
/// completion back to the session loop.
#[derive(Debug)]
pub struct ClockPlayer {
    path: PathBuf,
    status: PlayerStatus,
    time_control: TimeControlStatus,
    duration: MediaTime,
    anchor: MediaTime,
    started_at: Option<Instant>,
    timescale: i32,
    worker_tx: WorkerSender,
    host_tx: HostSender,
}

impl ClockPlayer {
    pub fn new(
        path: impl Into<PathBuf>,
        timescale: i32,
        worker_tx: WorkerSender,
        host_tx: HostSender,
    ) -> Self {
        Self {
            path: path.into(),
            status: PlayerStatus::Unknown,
            time_control: TimeControlStatus::Paused,
            duration: MediaTime::ZERO,
            anchor: MediaTime::ZERO,
            started_at: None,
            timescale,
            worker_tx,
            host_tx,
        }
    }

    /// Makes `duration` the current item and reports the player ready.
    pub fn replace_item(&mut self, path: impl Into<PathBuf>, duration: MediaTime) {
        self.path = path.into();
        self.duration = duration;
        self.anchor = MediaTime::ZERO;
        self.started_at = None;
        self.set_time_control(TimeControlStatus::Paused);
        self.set_status(PlayerStatus::ReadyToPlay);
    }

    /// Playback position, clamped to the item duration.
    pub fn current_time(&self) -> MediaTime {
        let Some(started_at) = self.started_at else {
            return self.anchor;
        };
        let elapsed = MediaTime::from_seconds(started_at.elapsed().as_secs_f64(), self.timescale)
            .ok()
            .and_then(|elapsed| self.anchor.checked_add(elapsed))
            .unwrap_or(self.anchor);
        elapsed.min(self.duration)
    }

    /// Periodic time update: the current position while playing.
    pub fn tick(&self) -> Option<MediaTime> {
        (self.time_control == TimeControlStatus::Playing).then(|| self.current_time())
    }

    /// Stops playback once the position reaches the end of the item.
    /// Called after the last time update has been delivered.
    pub fn pause_at_end(&mut self) -> bool {
        if self.time_control != TimeControlStatus::Playing {
            return false;
        }
        let now = self.current_time();
        if now < self.duration {
            return false;
        }
        debug!(%now, "reached end of item");
        self.pause();
        true
    }

    fn set_status(&mut self, status: PlayerStatus) {
        if self.status == status {
            return;
        }
        self.status = status.clone();
        self.notify(Command::PlayerStatusChanged(status));
    }

    fn set_time_control(&mut self, time_control: TimeControlStatus) {
        if self.time_control == time_control {
            return;
        }
        self.time_control = time_control;
        self.notify(Command::TimeControlChanged(time_control));
    }

    fn notify(&self, command: Command) {
        if self.host_tx.send(HostMessage::Session(command)).is_err() {
            debug!("session loop gone, player notification dropped");
        }
    }
}

impl Player for ClockPlayer {
    fn status(&self) -> PlayerStatus {
        self.status.clone()
    }

    fn time_control(&self) -> TimeControlStatus {
        self.time_control
    }

    fn play(&mut self) {
        if self.status != PlayerStatus::ReadyToPlay {
            return;
        }
        if self.anchor >= self.duration {
            self.anchor = MediaTime::ZERO;
        }
        self.started_at = Some(Instant::now());
        self.set_time_control(TimeControlStatus::Playing);
    }

    fn pause(&mut self) {
        self.anchor = self.current_time();
        self.started_at = None;
        self.set_time_control(TimeControlStatus::Paused);
    }

    fn seek(&mut self, to: MediaTime, tolerance: SeekTolerance) {
        self.anchor = to.max(MediaTime::ZERO).min(self.duration);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }

        let request = WorkerRequest::Seek {
            path: self.path.clone(),
            to,
            tolerance,
        };
        if self.worker_tx.send(request).is_err() {
            debug!(%to, "media worker gone, completing seek unfinished");
            self.notify(Command::SeekCompleted { finished: false });
        }
    }
}
