use tracing::debug;

use crate::time::MediaTime;

/// Readiness of the player's current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    Unknown,
    ReadyToPlay,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlStatus {
    Paused,
    WaitingToPlay,
    Playing,
}

/// How far a seek may land from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTolerance {
    pub before: MediaTime,
    pub after: MediaTime,
}

impl SeekTolerance {
    /// Frame-accurate seeking.
    pub const ZERO: Self = Self {
        before: MediaTime::ZERO,
        after: MediaTime::ZERO,
    };

    pub fn is_exact(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Playback collaborator driven by the session.
///
/// `seek` returns at once; the host reports completion back to the session
/// as a seek-completed command.
pub trait Player {
    fn status(&self) -> PlayerStatus;
    fn time_control(&self) -> TimeControlStatus;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, to: MediaTime, tolerance: SeekTolerance);
}

/// What [`SeekDebouncer::request_seek`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDecision {
    /// Same time as the pending request.
    Unchanged,
    Issued,
    /// Recorded; issued once the in-flight seek completes.
    Queued,
    /// Recorded; issued once the player becomes ready.
    Deferred,
}

/// What [`SeekDebouncer::seek_completed`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekCompletion {
    /// The completed seek was the latest request.
    Settled { finished: bool },
    /// A newer request arrived in flight and was issued.
    Reissued { time: MediaTime },
    /// A newer request arrived but the player is not ready.
    Deferred,
    /// Nothing was in flight.
    Ignored,
}

/// Keeps at most one seek in flight and collapses intermediate requests so
/// only the latest requested time is ever issued after the current seek.
#[derive(Debug, Default)]
pub struct SeekDebouncer {
    requested: Option<MediaTime>,
    issued: Option<MediaTime>,
    in_flight: bool,
}

impl SeekDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses playback and asks for a seek to `time`.
    ///
    /// The debouncer never resumes playback.
    ///
    /// # Example
    /// ```
    /// use scrubber::{
    ///     MediaTime, Player, PlayerStatus, SeekDebouncer, SeekDecision, SeekTolerance,
    ///     TimeControlStatus,
    /// };
    ///
    /// #[derive(Default)]
    /// struct Recorder {
    ///     seeks: Vec<MediaTime>,
    /// }
    ///
    /// impl Player for Recorder {
    ///     fn status(&self) -> PlayerStatus {
    ///         PlayerStatus::ReadyToPlay
    ///     }
    ///     fn time_control(&self) -> TimeControlStatus {
    ///         TimeControlStatus::Paused
    ///     }
    ///     fn play(&mut self) {}
    ///     fn pause(&mut self) {}
    ///     fn seek(&mut self, to: MediaTime, _tolerance: SeekTolerance) {
    ///         self.seeks.push(to);
    ///     }
    /// }
    ///
    /// let mut player = Recorder::default();
    /// let mut debouncer = SeekDebouncer::new();
    /// let t1 = MediaTime::new(600, 600).expect("valid");
    /// let t2 = MediaTime::new(1_200, 600).expect("valid");
    ///
    /// assert_eq!(debouncer.request_seek(t1, &mut player), SeekDecision::Issued);
    /// assert_eq!(debouncer.request_seek(t2, &mut player), SeekDecision::Queued);
    /// debouncer.seek_completed(true, &mut player);
    /// assert_eq!(player.seeks, vec![t1, t2]);
    /// ```
    pub fn request_seek<P: Player + ?Sized>(
        &mut self,
        time: MediaTime,
        player: &mut P,
    ) -> SeekDecision {
        player.pause();
        if self.requested == Some(time) {
            return SeekDecision::Unchanged;
        }
        self.requested = Some(time);

        if self.in_flight {
            debug!(%time, "seek queued behind in-flight seek");
            return SeekDecision::Queued;
        }
        if self.issue(time, player) {
            SeekDecision::Issued
        } else {
            SeekDecision::Deferred
        }
    }

    /// Handles completion of the in-flight seek.
    pub fn seek_completed<P: Player + ?Sized>(
        &mut self,
        finished: bool,
        player: &mut P,
    ) -> SeekCompletion {
        if !self.in_flight {
            debug!(finished, "seek completion with nothing in flight");
            return SeekCompletion::Ignored;
        }
        let Some(latest) = self.requested else {
            self.in_flight = false;
            return SeekCompletion::Ignored;
        };
        if self.issued == Some(latest) {
            self.in_flight = false;
            debug!(time = %latest, finished, "seek settled");
            return SeekCompletion::Settled { finished };
        }

        if self.issue(latest, player) {
            SeekCompletion::Reissued { time: latest }
        } else {
            SeekCompletion::Deferred
        }
    }

    /// Issues a request that was recorded while the player was not ready.
    pub fn player_became_ready<P: Player + ?Sized>(
        &mut self,
        player: &mut P,
    ) -> Option<MediaTime> {
        if self.in_flight {
            return None;
        }
        let latest = self.requested?;
        if self.issued == Some(latest) {
            return None;
        }
        self.issue(latest, player).then_some(latest)
    }

    /// Forgets requests for the previous item.
    ///
    /// A seek still running against the player stays in flight; its
    /// completion issues whatever was requested since.
    pub fn reset(&mut self) {
        self.requested = None;
        self.issued = None;
    }

    pub fn requested(&self) -> Option<MediaTime> {
        self.requested
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    fn issue<P: Player + ?Sized>(&mut self, time: MediaTime, player: &mut P) -> bool {
        if player.status() != PlayerStatus::ReadyToPlay {
            debug!(%time, "player not ready, deferring seek");
            self.in_flight = false;
            return false;
        }
        debug!(%time, "issuing exact seek");
        player.seek(time, SeekTolerance::ZERO);
        self.issued = Some(time);
        self.in_flight = true;
        true
    }
}
