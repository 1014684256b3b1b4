use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use scrubber::{
    Asset, Command, ErrorEvent, Event, KeyStatus, MediaTime, PlayButton, ScrubEvent,
    ScrubberConfig, Session, StripLayout, format_time,
};
use tracing::{debug, info, warn};

use crate::asset::FfmpegAsset;
use crate::bridge::{HostMessage, WorkerRequest, WorkerSender, spawn_media_worker};
use crate::error::{CliError, Result};
use crate::player::ClockPlayer;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const STRIP_TIMEOUT: Duration = Duration::from_secs(300);
const SEEK_TIMEOUT: Duration = Duration::from_secs(60);
/// Width of the phone-sized view the strip is laid out for.
const VIEWPORT_WIDTH: f64 = 390.0;
/// Scroll events sent per simulated drag.
const DRAG_STEPS: u32 = 8;

/// What a `scrub` run should do after loading the video.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub video: PathBuf,
    pub play_for: Option<Duration>,
    pub scrub_targets: Vec<f64>,
}

/// Observations collected while the session ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub duration_secs: f64,
    pub frame_count: usize,
    pub failed_frames: usize,
    pub placeholder_ready: bool,
    pub value_changes: usize,
    pub final_value: f64,
    pub time_label: String,
    pub errors: Vec<ErrorEvent>,
}

/// Headless shell around a [`Session`]: forwards worker results and
/// simulated gestures, and records what the session emits.
pub struct ScrubHost {
    config: ScrubberConfig,
    session: Session<ClockPlayer>,
    host_rx: mpsc::Receiver<HostMessage>,
    worker_tx: WorkerSender,
    summary: RunSummary,
}

impl ScrubHost {
    pub fn new(config: ScrubberConfig) -> Result<Self> {
        let (host_tx, host_rx) = mpsc::channel::<HostMessage>();
        let worker_tx = spawn_media_worker(config.timescale, host_tx.clone());
        let player = ClockPlayer::new(PathBuf::new(), config.timescale, worker_tx.clone(), host_tx);
        let session = Session::new(player, &config)?;

        Ok(Self {
            config,
            session,
            host_rx,
            worker_tx,
            summary: RunSummary::default(),
        })
    }

    pub fn run(mut self, scenario: &Scenario) -> Result<RunSummary> {
        // The session only holds a weak reference; the asset lives for the run.
        let asset = self.open(&scenario.video)?;
        self.summary.duration_secs = asset.duration().seconds();
        self.pump_until("strip thumbnails", STRIP_TIMEOUT, |host| {
            host.session.controller().loader().is_complete()
        })?;

        if let Some(play_for) = scenario.play_for {
            self.play_for(play_for)?;
        }
        for target in &scenario.scrub_targets {
            self.drag_to(*target)?;
        }
        self.pump_until("seeks to settle", SEEK_TIMEOUT, |host| {
            !host.session.debouncer().is_in_flight()
        })?;

        let controller = self.session.controller();
        self.summary.final_value = controller.value();
        self.summary.time_label = controller.time_label().to_string();
        self.summary.frame_count = controller.frames().len();
        self.summary.failed_frames = controller
            .frames()
            .iter()
            .filter(|frame| frame.image.is_none())
            .count();
        Ok(self.summary)
    }

    fn open(&mut self, video: &Path) -> Result<Arc<FfmpegAsset>> {
        self.worker_tx
            .send(WorkerRequest::Probe {
                path: video.to_path_buf(),
            })
            .map_err(|_| CliError::WorkerDisconnected)?;

        let deadline = Instant::now() + PROBE_TIMEOUT;
        let properties = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.host_rx.recv_timeout(remaining) {
                Ok(HostMessage::Probed { result, .. }) => break result,
                Ok(HostMessage::Session(command)) => self.dispatch(command),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Err(CliError::Timeout {
                        waiting_for: "ffprobe",
                    });
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(CliError::WorkerDisconnected);
                }
            }
        };
        let properties = match properties {
            Ok(properties) => properties,
            Err(error) => {
                self.present(Event::Error(ErrorEvent::from_error(&error)));
                return Err(error.into());
            }
        };

        let duration = match &properties.duration {
            KeyStatus::Loaded(duration) => *duration,
            KeyStatus::Failed(_) => MediaTime::ZERO,
        };
        let asset = Arc::new(FfmpegAsset::new(video, duration, self.worker_tx.clone()));
        let shared: Arc<dyn Asset> = asset.clone();
        match self.session.handle_command(Command::LoadAsset {
            asset: shared,
            properties,
        }) {
            Ok(events) => events.into_iter().for_each(|event| self.present(event)),
            Err(error) => {
                self.present(Event::Error(ErrorEvent::from_error(&error)));
                return Err(error.into());
            }
        }

        info!(path = ?video, %duration, "video opened");
        self.session
            .player_mut()
            .replace_item(asset.path(), duration);
        self.lay_out_strip();
        Ok(asset)
    }

    fn lay_out_strip(&mut self) {
        let controller = self.session.controller();
        let content_width = controller
            .item_size()
            .content_width(controller.loader().requested_count());
        let layout = StripLayout::centered(content_width, VIEWPORT_WIDTH, 0.0);
        self.dispatch(Command::LayoutChanged {
            content_width: layout.content_width,
            inset_left: layout.inset_left,
        });
    }

    fn play_for(&mut self, duration: Duration) -> Result<()> {
        self.pump_until("player ready", PROBE_TIMEOUT, |host| host.session.ui_enabled())?;
        info!(seconds = duration.as_secs_f64(), "playing");
        self.dispatch(Command::PlayPausePressed);
        self.pump_for(duration)?;
        self.dispatch(Command::PlayPausePressed);
        Ok(())
    }

    /// Simulates a finger dragging the strip from the current value to
    /// `target` seconds and letting go without momentum.
    fn drag_to(&mut self, target: f64) -> Result<()> {
        let start = self.session.controller().value();
        info!(from = start, to = target, "dragging strip");
        self.dispatch(Command::DragBegan);
        for step in 1..=DRAG_STEPS {
            let value = start + (target - start) * f64::from(step) / f64::from(DRAG_STEPS);
            let raw_offset = self.session.controller().raw_offset_for_value(value);
            self.dispatch(Command::ScrollChanged { raw_offset });
            self.drain_pending()?;
        }
        self.dispatch(Command::DragEnded {
            will_decelerate: false,
        });
        Ok(())
    }

    fn pump_for(&mut self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            self.pump_once(deadline)?;
        }
        Ok(())
    }

    fn pump_until(
        &mut self,
        waiting_for: &'static str,
        timeout: Duration,
        done: impl Fn(&Self) -> bool,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while !done(self) {
            if Instant::now() >= deadline {
                return Err(CliError::Timeout { waiting_for });
            }
            self.pump_once(deadline)?;
        }
        Ok(())
    }

    /// Handles one message or one periodic time update, whichever comes
    /// first.
    fn pump_once(&mut self, deadline: Instant) -> Result<()> {
        let wait = self
            .config
            .time_update_interval()
            .min(deadline.saturating_duration_since(Instant::now()));
        match self.host_rx.recv_timeout(wait) {
            Ok(message) => self.accept(message),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.tick();
                Ok(())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CliError::WorkerDisconnected),
        }
    }

    fn drain_pending(&mut self) -> Result<()> {
        loop {
            match self.host_rx.try_recv() {
                Ok(message) => self.accept(message)?,
                Err(mpsc::TryRecvError::Empty) => return Ok(()),
                Err(mpsc::TryRecvError::Disconnected) => return Err(CliError::WorkerDisconnected),
            }
        }
    }

    fn accept(&mut self, message: HostMessage) -> Result<()> {
        match message {
            HostMessage::Session(command) => self.dispatch(command),
            HostMessage::Probed { path, .. } => {
                debug!(path = ?path, "ignoring late probe result");
            }
        }
        Ok(())
    }

    fn tick(&mut self) {
        if let Some(time) = self.session.player().tick() {
            self.dispatch(Command::PlaybackTimeUpdated(time));
            self.session.player_mut().pause_at_end();
        }
    }

    fn dispatch(&mut self, command: Command) {
        match self.session.handle_command(command) {
            Ok(events) => {
                for event in events {
                    self.present(event);
                }
            }
            Err(error) => self.present(Event::Error(ErrorEvent::from_error(&error))),
        }
    }

    fn present(&mut self, event: Event) {
        match event {
            Event::Scrub(ScrubEvent::ValueChanged { value }) => {
                self.summary.value_changes += 1;
                debug!(value, "value changed");
            }
            Event::Scrub(ScrubEvent::FramesUpdated { frame_count }) => {
                info!(frame_count, "strip ready");
            }
            Event::Scrub(ScrubEvent::PlaceholderReady) => {
                self.summary.placeholder_ready = true;
                debug!("placeholder ready");
            }
            Event::Scrub(ScrubEvent::TimeLabelChanged(label)) => debug!(%label, "time label"),
            Event::Scrub(event) => debug!(?event, "scrub event"),
            Event::PlayButtonChanged(button) => {
                let symbol = match button {
                    PlayButton::Play => "play",
                    PlayButton::Pause => "pause",
                };
                debug!(symbol, "play button");
            }
            Event::UiEnabledChanged(enabled) => info!(enabled, "controls toggled"),
            Event::Error(error) => {
                warn!(kind = ?error.kind, message = %error.message, "session error");
                self.summary.errors.push(error);
            }
        }
    }
}

impl RunSummary {
    /// Human-readable report printed at the end of a run.
    pub fn report(&self) -> String {
        let mut lines = vec![
            format!("duration      {}", format_time(self.duration_secs)),
            format!(
                "thumbnails    {} ({} failed, placeholder {})",
                self.frame_count,
                self.failed_frames,
                if self.placeholder_ready { "ready" } else { "missing" }
            ),
            format!("scrub updates {}", self.value_changes),
            format!("position      {} ({:.3}s)", self.time_label, self.final_value),
        ];
        lines.extend(
            self.errors
                .iter()
                .map(|error| format!("error         {:?}: {}", error.kind, error.message)),
        );
        lines.join("\n")
    }
}
