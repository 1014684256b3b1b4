use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::asset::{Asset, AssetProperties, FrameArrival};
use crate::config::ScrubberConfig;
use crate::controller::{ScrubController, ScrubEvent};
use crate::error::{Result, ScrubError};
use crate::seek::{Player, PlayerStatus, SeekDebouncer, TimeControlStatus};
use crate::time::MediaTime;

/// Commands accepted by the session.
#[derive(Debug, Clone)]
pub enum Command {
    /// Switches to a new asset once its properties are loaded.
    ///
    /// Fails with `AssetKeyFailed` or `AssetNotPlayable` and disables the UI
    /// when the properties do not describe a playable asset.
    LoadAsset {
        asset: Arc<dyn Asset>,
        properties: AssetProperties,
    },
    FrameArrived(FrameArrival),
    PlayerStatusChanged(PlayerStatus),
    TimeControlChanged(TimeControlStatus),
    /// Periodic playback position; applied only while ready and playing.
    PlaybackTimeUpdated(MediaTime),
    PlayPausePressed,
    DragBegan,
    ScrollChanged {
        raw_offset: f64,
    },
    DragEnded {
        will_decelerate: bool,
    },
    DecelerationEnded,
    StopScrolling,
    /// Jumps to `seconds` on behalf of the user, for example a keyboard step.
    ScrubTo {
        seconds: f64,
    },
    LayoutChanged {
        content_width: f64,
        inset_left: f64,
    },
    SeekCompleted {
        finished: bool,
    },
}

/// Symbol the play/pause button should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayButton {
    Play,
    Pause,
}

impl From<TimeControlStatus> for PlayButton {
    fn from(value: TimeControlStatus) -> Self {
        match value {
            TimeControlStatus::Playing => Self::Pause,
            TimeControlStatus::Paused | TimeControlStatus::WaitingToPlay => Self::Play,
        }
    }
}

/// Events emitted by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Scrub(ScrubEvent),
    PlayButtonChanged(PlayButton),
    UiEnabledChanged(bool),
    Error(ErrorEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AssetInvalid,
    Configuration,
    Media,
    Other,
}

impl From<&ScrubError> for ErrorKind {
    fn from(value: &ScrubError) -> Self {
        if value.is_asset_invalid() {
            return Self::AssetInvalid;
        }
        match value {
            ScrubError::InvalidConfig { .. }
            | ScrubError::ConfigIo { .. }
            | ScrubError::ConfigParse { .. } => Self::Configuration,
            ScrubError::Media(_) => Self::Media,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEvent {
    pub fn from_error(error: &ScrubError) -> Self {
        Self {
            kind: ErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Scrubber state for one player: strip, seek debouncing and play/pause.
///
/// Runs on a single event loop. Asynchronous work done by the host comes
/// back in as [`Command`]s.
#[derive(Debug)]
pub struct Session<P> {
    player: P,
    controller: ScrubController,
    debouncer: SeekDebouncer,
    timescale: i32,
    ui_enabled: bool,
    resume_after_drag: bool,
}

impl<P> Session<P>
where
    P: Player,
{
    /// Creates a session driving `player`. The UI starts disabled until the
    /// player reports it is ready.
    pub fn new(player: P, config: &ScrubberConfig) -> Result<Self> {
        Ok(Self {
            player,
            controller: ScrubController::new(config)?,
            debouncer: SeekDebouncer::new(),
            timescale: config.timescale,
            ui_enabled: false,
            resume_after_drag: false,
        })
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::LoadAsset { asset, properties } => self.load_asset(asset, properties),
            Command::FrameArrived(arrival) => Ok(scrub_events(self.controller.accept_frame(arrival))),
            Command::PlayerStatusChanged(status) => Ok(self.player_status_changed(status)),
            Command::TimeControlChanged(status) => {
                Ok(vec![Event::PlayButtonChanged(PlayButton::from(status))])
            }
            Command::PlaybackTimeUpdated(time) => Ok(self.playback_time_updated(time)),
            Command::PlayPausePressed => Ok(self.toggle_playback()),
            Command::DragBegan => Ok(self.drag_began()),
            Command::ScrollChanged { raw_offset } => {
                let events = self.controller.scroll_changed(raw_offset);
                self.seek_for_value_changes(events)
            }
            Command::DragEnded { will_decelerate } => {
                let events = self.controller.end_drag(will_decelerate);
                Ok(self.resume_if_drag_ended(events))
            }
            Command::DecelerationEnded => {
                let events = self.controller.end_deceleration();
                Ok(self.resume_if_drag_ended(events))
            }
            Command::StopScrolling => {
                let events = self.controller.stop_scrolling();
                Ok(self.resume_if_drag_ended(events))
            }
            Command::ScrubTo { seconds } => {
                let events = self.controller.set_value_from_drag(seconds);
                self.seek_for_value_changes(events)
            }
            Command::LayoutChanged {
                content_width,
                inset_left,
            } => Ok(scrub_events(
                self.controller.set_layout(content_width, inset_left),
            )),
            Command::SeekCompleted { finished } => {
                let completion = self.debouncer.seek_completed(finished, &mut self.player);
                debug!(?completion, "seek completed");
                Ok(Vec::new())
            }
        }
    }

    fn load_asset(
        &mut self,
        asset: Arc<dyn Asset>,
        properties: AssetProperties,
    ) -> Result<Vec<Event>> {
        let validated = properties.validate().and_then(|duration| {
            let reported = asset.duration();
            if reported == duration {
                Ok(duration)
            } else {
                Err(ScrubError::AssetKeyFailed {
                    key: "duration",
                    reason: format!("asset reports {reported}, loaded key says {duration}"),
                })
            }
        });
        let duration = match validated {
            Ok(duration) => duration,
            Err(error) => {
                warn!(%error, "asset rejected");
                self.ui_enabled = false;
                return Err(error);
            }
        };

        info!(%duration, "asset loaded");
        self.debouncer.reset();
        self.resume_after_drag = false;
        Ok(scrub_events(self.controller.set_asset(&asset)))
    }

    fn player_status_changed(&mut self, status: PlayerStatus) -> Vec<Event> {
        match status {
            PlayerStatus::ReadyToPlay => {
                let mut events = self.set_ui_enabled(true);
                if let Some(time) = self.debouncer.player_became_ready(&mut self.player) {
                    debug!(%time, "flushed pending seek");
                }
                events.extend(scrub_events(
                    self.controller
                        .set_value_from_playback(self.controller.value()),
                ));
                events
            }
            PlayerStatus::Failed(reason) => {
                self.present_error(&ScrubError::PlayerItemFailed { reason })
            }
            PlayerStatus::Unknown => self.set_ui_enabled(false),
        }
    }

    fn playback_time_updated(&mut self, time: MediaTime) -> Vec<Event> {
        let playing = self.player.status() == PlayerStatus::ReadyToPlay
            && self.player.time_control() == TimeControlStatus::Playing;
        if !playing {
            return Vec::new();
        }
        scrub_events(self.controller.set_value_from_playback(time.seconds()))
    }

    fn toggle_playback(&mut self) -> Vec<Event> {
        if !self.ui_enabled {
            debug!("play/pause ignored while the UI is disabled");
            return Vec::new();
        }
        match self.player.time_control() {
            TimeControlStatus::Paused => self.player.play(),
            TimeControlStatus::Playing | TimeControlStatus::WaitingToPlay => self.player.pause(),
        }
        Vec::new()
    }

    fn drag_began(&mut self) -> Vec<Event> {
        if !self.controller.is_dragging() {
            self.resume_after_drag = matches!(
                self.player.time_control(),
                TimeControlStatus::Playing | TimeControlStatus::WaitingToPlay
            );
        }
        scrub_events(self.controller.begin_drag())
    }

    fn seek_for_value_changes(&mut self, events: Vec<ScrubEvent>) -> Result<Vec<Event>> {
        for event in &events {
            if let ScrubEvent::ValueChanged { value } = event {
                let time = MediaTime::from_seconds(*value, self.timescale)?;
                let decision = self.debouncer.request_seek(time, &mut self.player);
                debug!(%time, ?decision, "scrub seek requested");
            }
        }
        Ok(scrub_events(events))
    }

    fn resume_if_drag_ended(&mut self, events: Vec<ScrubEvent>) -> Vec<Event> {
        if events.contains(&ScrubEvent::DragEnded) && self.resume_after_drag {
            self.resume_after_drag = false;
            debug!("resuming playback after drag");
            self.player.play();
        }
        scrub_events(events)
    }

    fn present_error(&mut self, error: &ScrubError) -> Vec<Event> {
        warn!(%error, "presenting error");
        let mut events = self.set_ui_enabled(false);
        events.push(Event::Error(ErrorEvent::from_error(error)));
        events
    }

    fn set_ui_enabled(&mut self, enabled: bool) -> Vec<Event> {
        if self.ui_enabled == enabled {
            return Vec::new();
        }
        self.ui_enabled = enabled;
        vec![Event::UiEnabledChanged(enabled)]
    }

    pub fn ui_enabled(&self) -> bool {
        self.ui_enabled
    }

    pub fn controller(&self) -> &ScrubController {
        &self.controller
    }

    pub fn debouncer(&self) -> &SeekDebouncer {
        &self.debouncer
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }
}

fn scrub_events(events: Vec<ScrubEvent>) -> Vec<Event> {
    events.into_iter().map(Event::Scrub).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Command, ErrorKind, Event, PlayButton, Session};
    use crate::asset::{Asset, AssetProperties, BatchPurpose, KeyStatus};
    use crate::config::ScrubberConfig;
    use crate::controller::ScrubEvent;
    use crate::error::ScrubError;
    use crate::seek::tests::{MockPlayer, PlayerCall};
    use crate::seek::{PlayerStatus, TimeControlStatus};
    use crate::thumbnails::tests::{MockAsset, arrival, image};
    use crate::time::MediaTime;

    fn properties(duration_secs: i64) -> AssetProperties {
        AssetProperties {
            duration: KeyStatus::Loaded(MediaTime::new(duration_secs, 1).expect("valid time")),
            playable: KeyStatus::Loaded(true),
            protected_content: KeyStatus::Loaded(false),
        }
    }

    fn ready_session(duration_secs: i64) -> (Session<MockPlayer>, Arc<MockAsset>) {
        let mut session =
            Session::new(MockPlayer::ready(), &ScrubberConfig::default()).expect("valid config");
        let mock = Arc::new(MockAsset::new(duration_secs));
        let asset: Arc<dyn Asset> = mock.clone();
        session
            .handle_command(Command::LoadAsset {
                asset,
                properties: properties(duration_secs),
            })
            .expect("asset loads");
        session
            .handle_command(Command::LayoutChanged {
                content_width: 200.0,
                inset_left: 50.0,
            })
            .expect("layout applies");
        session
            .handle_command(Command::PlayerStatusChanged(PlayerStatus::ReadyToPlay))
            .expect("status applies");
        (session, mock)
    }

    fn seek_seconds(player: &MockPlayer) -> Vec<f64> {
        player.seeks().iter().map(|time| time.seconds()).collect()
    }

    #[test]
    fn invalid_asset_is_rejected_and_ui_stays_disabled() {
        let mut session =
            Session::new(MockPlayer::ready(), &ScrubberConfig::default()).expect("valid config");
        let asset: Arc<dyn Asset> = Arc::new(MockAsset::new(10));

        let err = session
            .handle_command(Command::LoadAsset {
                asset,
                properties: AssetProperties {
                    playable: KeyStatus::Loaded(false),
                    ..properties(10)
                },
            })
            .expect_err("unplayable asset must fail");

        assert!(matches!(err, ScrubError::AssetNotPlayable));
        assert!(!session.ui_enabled());
    }

    #[test]
    fn error_kinds_group_asset_and_config_failures() {
        assert_eq!(
            ErrorKind::from(&ScrubError::PlayerItemFailed {
                reason: "gone".to_string()
            }),
            ErrorKind::AssetInvalid
        );
        assert_eq!(
            ErrorKind::from(&ScrubError::InvalidConfig {
                reason: "bad".to_string()
            }),
            ErrorKind::Configuration
        );
        assert_eq!(ErrorKind::from(&ScrubError::InvalidSeconds(f64::NAN)), ErrorKind::Other);
    }

    #[test]
    fn ready_player_enables_ui() {
        let mut session =
            Session::new(MockPlayer::ready(), &ScrubberConfig::default()).expect("valid config");

        let events = session
            .handle_command(Command::PlayerStatusChanged(PlayerStatus::ReadyToPlay))
            .expect("status applies");

        assert!(events.contains(&Event::UiEnabledChanged(true)));
        assert!(session.ui_enabled());
    }

    #[test]
    fn failed_player_item_presents_asset_error() {
        let (mut session, _asset) = ready_session(20);

        let events = session
            .handle_command(Command::PlayerStatusChanged(PlayerStatus::Failed(
                "decoder crashed".to_string(),
            )))
            .expect("status applies");

        assert!(events.contains(&Event::UiEnabledChanged(false)));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::Error(error) if error.kind == ErrorKind::AssetInvalid
        )));
    }

    #[test]
    fn dragging_seeks_and_resumes_playback_that_was_active() {
        let (mut session, _asset) = ready_session(20);
        session.player_mut().time_control = TimeControlStatus::Playing;
        let calls = session.player().calls();

        session.handle_command(Command::DragBegan).expect("drag begins");
        session
            .handle_command(Command::ScrollChanged { raw_offset: 0.0 })
            .expect("scroll applies");
        let events = session
            .handle_command(Command::DragEnded {
                will_decelerate: false,
            })
            .expect("drag ends");

        assert!(events.contains(&Event::Scrub(ScrubEvent::DragEnded)));
        assert_eq!(seek_seconds(session.player()), vec![5.0]);
        let calls = calls.lock().expect("calls lock");
        assert_eq!(calls.first(), Some(&PlayerCall::Pause));
        assert_eq!(calls.last(), Some(&PlayerCall::Play));
    }

    #[test]
    fn drag_does_not_resume_paused_playback() {
        let (mut session, _asset) = ready_session(20);
        let calls = session.player().calls();

        session.handle_command(Command::DragBegan).expect("drag begins");
        session
            .handle_command(Command::ScrollChanged { raw_offset: 50.0 })
            .expect("scroll applies");
        session
            .handle_command(Command::DragEnded {
                will_decelerate: true,
            })
            .expect("drag ends");
        session
            .handle_command(Command::DecelerationEnded)
            .expect("deceleration ends");

        assert!(!calls.lock().expect("calls lock").contains(&PlayerCall::Play));
    }

    #[test]
    fn resume_waits_for_momentum_to_stop() {
        let (mut session, _asset) = ready_session(20);
        session.player_mut().time_control = TimeControlStatus::Playing;
        let calls = session.player().calls();

        session.handle_command(Command::DragBegan).expect("drag begins");
        session
            .handle_command(Command::ScrollChanged { raw_offset: 10.0 })
            .expect("scroll applies");
        session
            .handle_command(Command::DragEnded {
                will_decelerate: true,
            })
            .expect("drag ends");
        assert!(!calls.lock().expect("calls lock").contains(&PlayerCall::Play));

        session.handle_command(Command::StopScrolling).expect("stop applies");
        assert_eq!(calls.lock().expect("calls lock").last(), Some(&PlayerCall::Play));
    }

    #[test]
    fn playback_updates_move_strip_without_seeking() {
        let (mut session, _asset) = ready_session(20);
        session.player_mut().time_control = TimeControlStatus::Playing;

        let events = session
            .handle_command(Command::PlaybackTimeUpdated(
                MediaTime::new(6_000, 600).expect("valid time"),
            ))
            .expect("time update applies");

        assert!(events.contains(&Event::Scrub(ScrubEvent::StripScrolled { raw_offset: 50.0 })));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::Scrub(ScrubEvent::ValueChanged { .. }))));
        assert!(session.player().seeks().is_empty());
    }

    #[test]
    fn playback_updates_are_ignored_while_paused() {
        let (mut session, _asset) = ready_session(20);

        let events = session
            .handle_command(Command::PlaybackTimeUpdated(
                MediaTime::new(6_000, 600).expect("valid time"),
            ))
            .expect("time update applies");

        assert!(events.is_empty());
        assert_eq!(session.controller().value(), 0.0);
    }

    #[test]
    fn play_pause_toggles_and_is_ignored_while_disabled() {
        let mut session =
            Session::new(MockPlayer::ready(), &ScrubberConfig::default()).expect("valid config");
        session
            .handle_command(Command::PlayPausePressed)
            .expect("press applies");
        assert_eq!(session.player().time_control, TimeControlStatus::Paused);

        session
            .handle_command(Command::PlayerStatusChanged(PlayerStatus::ReadyToPlay))
            .expect("status applies");
        session
            .handle_command(Command::PlayPausePressed)
            .expect("press applies");
        assert_eq!(session.player().time_control, TimeControlStatus::Playing);

        session
            .handle_command(Command::PlayPausePressed)
            .expect("press applies");
        assert_eq!(session.player().time_control, TimeControlStatus::Paused);
    }

    #[test]
    fn time_control_maps_to_play_button_symbol() {
        let (mut session, _asset) = ready_session(20);

        let playing = session
            .handle_command(Command::TimeControlChanged(TimeControlStatus::Playing))
            .expect("status applies");
        let waiting = session
            .handle_command(Command::TimeControlChanged(TimeControlStatus::WaitingToPlay))
            .expect("status applies");

        assert_eq!(playing, vec![Event::PlayButtonChanged(PlayButton::Pause)]);
        assert_eq!(waiting, vec![Event::PlayButtonChanged(PlayButton::Play)]);
    }

    #[test]
    fn scrub_to_seeks_through_debouncer() {
        let (mut session, _asset) = ready_session(20);

        session
            .handle_command(Command::ScrubTo { seconds: 4.0 })
            .expect("scrub applies");
        session
            .handle_command(Command::ScrubTo { seconds: 8.0 })
            .expect("scrub applies");
        session
            .handle_command(Command::ScrubTo { seconds: 12.0 })
            .expect("scrub applies");
        session
            .handle_command(Command::SeekCompleted { finished: true })
            .expect("completion applies");

        assert_eq!(seek_seconds(session.player()), vec![4.0, 12.0]);
    }

    #[test]
    fn switching_assets_keeps_the_running_seek_in_flight() {
        let (mut session, _first) = ready_session(20);
        session
            .handle_command(Command::ScrubTo { seconds: 4.0 })
            .expect("scrub applies");

        let second = Arc::new(MockAsset::new(30));
        let asset: Arc<dyn Asset> = second.clone();
        session
            .handle_command(Command::LoadAsset {
                asset,
                properties: properties(30),
            })
            .expect("asset loads");
        session
            .handle_command(Command::ScrubTo { seconds: 8.0 })
            .expect("scrub applies");
        assert_eq!(seek_seconds(session.player()), vec![4.0]);

        session
            .handle_command(Command::SeekCompleted { finished: true })
            .expect("completion applies");
        session
            .handle_command(Command::ScrubTo { seconds: 12.0 })
            .expect("scrub applies");
        assert_eq!(seek_seconds(session.player()), vec![4.0, 8.0]);
        assert!(session.debouncer().is_in_flight());

        session
            .handle_command(Command::SeekCompleted { finished: true })
            .expect("completion applies");
        assert_eq!(seek_seconds(session.player()), vec![4.0, 8.0, 12.0]);
    }

    #[test]
    fn asset_duration_must_match_loaded_duration() {
        let mut session =
            Session::new(MockPlayer::ready(), &ScrubberConfig::default()).expect("valid config");
        let asset: Arc<dyn Asset> = Arc::new(MockAsset::new(10));

        let err = session
            .handle_command(Command::LoadAsset {
                asset,
                properties: properties(12),
            })
            .expect_err("mismatched duration must fail");

        assert!(matches!(err, ScrubError::AssetKeyFailed { key: "duration", .. }));
        assert!(!session.ui_enabled());
        assert_eq!(session.controller().duration_seconds(), 0.0);
    }

    #[test]
    fn switching_assets_drops_frames_from_the_old_asset() {
        let (mut session, first) = ready_session(10);
        let stale = first
            .batches()
            .lock()
            .expect("batches lock")
            .iter()
            .find(|batch| batch.purpose == BatchPurpose::Strip)
            .cloned()
            .expect("strip batch");

        let second = Arc::new(MockAsset::new(10));
        let asset: Arc<dyn Asset> = second.clone();
        session
            .handle_command(Command::LoadAsset {
                asset,
                properties: properties(10),
            })
            .expect("asset loads");
        for index in 0..2 {
            let events = session
                .handle_command(Command::FrameArrived(arrival(&stale, index, Ok(image(1)))))
                .expect("arrival applies");
            assert!(events.is_empty());
        }

        let current = second
            .batches()
            .lock()
            .expect("batches lock")
            .iter()
            .find(|batch| batch.purpose == BatchPurpose::Strip)
            .cloned()
            .expect("strip batch");
        session
            .handle_command(Command::FrameArrived(arrival(&current, 0, Ok(image(2)))))
            .expect("arrival applies");
        let events = session
            .handle_command(Command::FrameArrived(arrival(&current, 1, Ok(image(2)))))
            .expect("arrival applies");

        assert!(events.contains(&Event::Scrub(ScrubEvent::FramesUpdated { frame_count: 2 })));
        assert!(session
            .controller()
            .frames()
            .iter()
            .all(|frame| frame.image.as_ref().expect("image").rgba[0] == 2));
    }
}
