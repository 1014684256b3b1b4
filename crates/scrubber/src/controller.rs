use std::sync::{Arc, Weak};

use tracing::debug;

use crate::asset::{Asset, Frame, FrameArrival, Thumbnail, ThumbnailSize};
use crate::config::ScrubberConfig;
use crate::error::Result;
use crate::format::format_time;
use crate::mapping::{ItemSize, StripLayout, offset_for_value, value_for_offset};
use crate::thumbnails::{LoaderUpdate, ThumbnailLoader};

/// Gesture state of the strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    /// Finger lifted, strip still coasting.
    Decelerating,
}

/// Notifications for the shell drawing the strip.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrubEvent {
    DragStarted,
    DragEnded,
    /// The user moved the scrub position; the session seeks on this.
    ValueChanged { value: f64 },
    /// The strip must be scrolled to `raw_offset`.
    StripScrolled { raw_offset: f64 },
    /// The playhead and time label follow the strip past its ends by `dx`.
    PlayheadShifted { dx: f64 },
    TimeLabelChanged(String),
    FramesUpdated { frame_count: usize },
    PlaceholderReady,
}

/// Owns the scrub value and the strip frames for the current asset.
///
/// `value` only changes through [`Self::set_value_from_playback`],
/// [`Self::set_value_from_drag`] and scrolling during a drag. Only the user
/// paths emit [`ScrubEvent::ValueChanged`].
#[derive(Debug)]
pub struct ScrubController {
    asset: Option<Weak<dyn Asset>>,
    loader: ThumbnailLoader,
    item: ItemSize,
    layout: StripLayout,
    value: f64,
    phase: DragPhase,
    playhead_shift: f64,
    time_label: String,
}

impl ScrubController {
    pub fn new(config: &ScrubberConfig) -> Result<Self> {
        config.validate()?;
        let (width, height) = config.thumbnail_max_size();
        Ok(Self {
            asset: None,
            loader: ThumbnailLoader::new(config.frame_timing()?, ThumbnailSize { width, height }),
            item: config.item_size(),
            layout: StripLayout::default(),
            value: 0.0,
            phase: DragPhase::Idle,
            playhead_shift: 0.0,
            time_label: format_time(0.0),
        })
    }

    /// Switches to `asset`, restarting thumbnail loading and resetting the
    /// scrub value to zero.
    ///
    /// Only a weak reference is kept; once the host drops the asset its
    /// duration reads as zero.
    pub fn set_asset(&mut self, asset: &Arc<dyn Asset>) -> Vec<ScrubEvent> {
        self.asset = Some(Arc::downgrade(asset));
        self.phase = DragPhase::Idle;
        self.value = 0.0;

        let mut events = Vec::new();
        if let Some(update) = self.loader.load(asset.as_ref()) {
            events.push(loader_event(update));
        }
        events.extend(self.reposition(false));
        events
    }

    /// Stores one rendered thumbnail.
    pub fn accept_frame(&mut self, arrival: FrameArrival) -> Vec<ScrubEvent> {
        let Some(update) = self.loader.accept(arrival) else {
            return Vec::new();
        };

        let mut events = vec![loader_event(update)];
        if matches!(update, LoaderUpdate::StripCompleted { .. }) && self.phase == DragPhase::Idle {
            events.extend(self.reposition(false));
        }
        events
    }

    /// Idle to dragging. Grabbing a coasting strip resumes the same drag.
    pub fn begin_drag(&mut self) -> Vec<ScrubEvent> {
        let previous = self.phase;
        self.phase = DragPhase::Dragging;
        match previous {
            DragPhase::Idle => {
                debug!(value = self.value, "drag started");
                vec![ScrubEvent::DragStarted]
            }
            DragPhase::Dragging | DragPhase::Decelerating => Vec::new(),
        }
    }

    /// Handles a scroll position reported by the shell.
    ///
    /// Outside a drag this is a layout side effect and leaves `value` alone.
    pub fn scroll_changed(&mut self, raw_offset: f64) -> Vec<ScrubEvent> {
        let mut events = Vec::new();
        self.push_playhead_shift(raw_offset, &mut events);
        if self.phase == DragPhase::Idle {
            return events;
        }

        let offset = self.layout.normalized_offset(raw_offset);
        let value = value_for_offset(offset, self.content_width(), self.duration_seconds());
        self.value = value;
        self.push_time_label(&mut events);
        events.push(ScrubEvent::ValueChanged { value });
        events
    }

    /// Finger lifted. Without momentum the drag ends here.
    pub fn end_drag(&mut self, will_decelerate: bool) -> Vec<ScrubEvent> {
        if self.phase != DragPhase::Dragging {
            return Vec::new();
        }
        if will_decelerate {
            self.phase = DragPhase::Decelerating;
            return Vec::new();
        }
        self.finish_drag()
    }

    /// Momentum ran out.
    pub fn end_deceleration(&mut self) -> Vec<ScrubEvent> {
        if self.phase != DragPhase::Decelerating {
            return Vec::new();
        }
        self.finish_drag()
    }

    /// Halts a coasting strip, for example when playback is started mid-fling.
    pub fn stop_scrolling(&mut self) -> Vec<ScrubEvent> {
        self.end_deceleration()
    }

    /// Moves the strip to follow playback. Suppressed while the user holds
    /// or flings the strip; never emits [`ScrubEvent::ValueChanged`].
    pub fn set_value_from_playback(&mut self, seconds: f64) -> Vec<ScrubEvent> {
        if self.phase != DragPhase::Idle {
            return Vec::new();
        }
        self.value = self.clamp_value(seconds);
        self.reposition(false)
    }

    /// Moves the strip on behalf of the user and emits
    /// [`ScrubEvent::ValueChanged`].
    pub fn set_value_from_drag(&mut self, seconds: f64) -> Vec<ScrubEvent> {
        self.value = self.clamp_value(seconds);
        self.reposition(true)
    }

    /// Updates the strip geometry reported by the shell. A non-positive
    /// content width falls back to the width of the requested frames.
    pub fn set_layout(&mut self, content_width: f64, inset_left: f64) -> Vec<ScrubEvent> {
        self.layout = StripLayout {
            content_width,
            inset_left,
        };
        if self.phase != DragPhase::Idle {
            return Vec::new();
        }
        self.reposition(false)
    }

    /// Raw scroll offset that shows `seconds` under the playhead.
    pub fn raw_offset_for_value(&self, seconds: f64) -> f64 {
        let offset = offset_for_value(
            self.clamp_value(seconds),
            self.content_width(),
            self.duration_seconds(),
        );
        self.layout.raw_offset(offset)
    }

    /// Strip width: the shell's reported width, or the width of the requested
    /// frame count when the shell has not reported one.
    pub fn content_width(&self) -> f64 {
        if self.layout.content_width > 0.0 {
            self.layout.content_width
        } else {
            self.item.content_width(self.loader.requested_count())
        }
    }

    /// Duration of the current asset in seconds, zero without one.
    pub fn duration_seconds(&self) -> f64 {
        self.asset
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|asset| asset.duration().seconds())
            .unwrap_or(0.0)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase != DragPhase::Idle
    }

    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    pub fn item_size(&self) -> ItemSize {
        self.item
    }

    pub fn frames(&self) -> &[Frame] {
        self.loader.frames()
    }

    pub fn image_for_index(&self, index: usize) -> Option<&Thumbnail> {
        self.loader.image_for_index(index)
    }

    pub fn default_image(&self) -> Option<&Thumbnail> {
        self.loader.default_image()
    }

    pub fn loader(&self) -> &ThumbnailLoader {
        &self.loader
    }

    fn finish_drag(&mut self) -> Vec<ScrubEvent> {
        self.phase = DragPhase::Idle;
        debug!(value = self.value, "drag ended");
        vec![ScrubEvent::DragEnded]
    }

    fn reposition(&mut self, user_initiated: bool) -> Vec<ScrubEvent> {
        let raw_offset = self.raw_offset_for_value(self.value);
        let mut events = vec![ScrubEvent::StripScrolled { raw_offset }];
        self.push_playhead_shift(raw_offset, &mut events);
        self.push_time_label(&mut events);
        if user_initiated {
            events.push(ScrubEvent::ValueChanged { value: self.value });
        }
        events
    }

    fn clamp_value(&self, seconds: f64) -> f64 {
        if seconds.is_nan() {
            return 0.0;
        }
        seconds.clamp(0.0, self.duration_seconds().max(0.0))
    }

    fn push_playhead_shift(&mut self, raw_offset: f64, events: &mut Vec<ScrubEvent>) {
        let layout = StripLayout {
            content_width: self.content_width(),
            inset_left: self.layout.inset_left,
        };
        let dx = layout.overscroll(raw_offset);
        if dx != self.playhead_shift {
            self.playhead_shift = dx;
            events.push(ScrubEvent::PlayheadShifted { dx });
        }
    }

    fn push_time_label(&mut self, events: &mut Vec<ScrubEvent>) {
        let label = format_time(self.value);
        if label != self.time_label {
            self.time_label = label.clone();
            events.push(ScrubEvent::TimeLabelChanged(label));
        }
    }
}

fn loader_event(update: LoaderUpdate) -> ScrubEvent {
    match update {
        LoaderUpdate::PlaceholderReady => ScrubEvent::PlaceholderReady,
        LoaderUpdate::StripCompleted { frame_count } => ScrubEvent::FramesUpdated { frame_count },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{DragPhase, ScrubController, ScrubEvent};
    use crate::asset::Asset;
    use crate::config::ScrubberConfig;
    use crate::thumbnails::tests::MockAsset;

    fn controller_with(duration_secs: i64) -> (ScrubController, Arc<dyn Asset>) {
        let mut controller =
            ScrubController::new(&ScrubberConfig::default()).expect("valid config");
        let asset: Arc<dyn Asset> = Arc::new(MockAsset::new(duration_secs));
        controller.set_asset(&asset);
        controller.set_layout(200.0, 50.0);
        (controller, asset)
    }

    fn value_changes(events: &[ScrubEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|event| match event {
                ScrubEvent::ValueChanged { value } => Some(*value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn playback_updates_reposition_without_value_changed() {
        let (mut controller, _asset) = controller_with(20);

        let events = controller.set_value_from_playback(5.0);

        assert!(value_changes(&events).is_empty());
        assert!(events.contains(&ScrubEvent::StripScrolled { raw_offset: 0.0 }));
        assert!(events.contains(&ScrubEvent::TimeLabelChanged("00:05".to_string())));
        assert_eq!(controller.value(), 5.0);
    }

    #[test]
    fn drag_updates_always_emit_value_changed() {
        let (mut controller, _asset) = controller_with(20);

        let events = controller.set_value_from_drag(10.0);

        assert_eq!(value_changes(&events), vec![10.0]);
        assert!(events.contains(&ScrubEvent::StripScrolled { raw_offset: 50.0 }));
    }

    #[test]
    fn scrolling_while_dragging_maps_offset_to_value() {
        let (mut controller, _asset) = controller_with(20);

        assert_eq!(controller.begin_drag(), vec![ScrubEvent::DragStarted]);
        let events = controller.scroll_changed(0.0);

        assert_eq!(value_changes(&events), vec![5.0]);
        assert_eq!(controller.time_label(), "00:05");
    }

    #[test]
    fn scrolling_while_idle_leaves_value_alone() {
        let (mut controller, _asset) = controller_with(20);

        let events = controller.scroll_changed(100.0);

        assert!(value_changes(&events).is_empty());
        assert_eq!(controller.value(), 0.0);
    }

    #[test]
    fn playback_is_ignored_while_dragging_or_decelerating() {
        let (mut controller, _asset) = controller_with(20);
        controller.begin_drag();
        assert!(controller.set_value_from_playback(7.0).is_empty());

        assert!(controller.end_drag(true).is_empty());
        assert_eq!(controller.phase(), DragPhase::Decelerating);
        assert!(controller.set_value_from_playback(7.0).is_empty());

        assert_eq!(controller.end_deceleration(), vec![ScrubEvent::DragEnded]);
        assert!(!controller.set_value_from_playback(7.0).is_empty());
        assert_eq!(controller.value(), 7.0);
    }

    #[test]
    fn end_drag_without_momentum_goes_idle() {
        let (mut controller, _asset) = controller_with(20);
        controller.begin_drag();

        assert_eq!(controller.end_drag(false), vec![ScrubEvent::DragEnded]);
        assert_eq!(controller.phase(), DragPhase::Idle);
        assert!(controller.end_drag(false).is_empty());
    }

    #[test]
    fn grabbing_a_coasting_strip_does_not_restart_the_drag() {
        let (mut controller, _asset) = controller_with(20);
        controller.begin_drag();
        controller.end_drag(true);

        assert!(controller.begin_drag().is_empty());
        assert_eq!(controller.phase(), DragPhase::Dragging);
    }

    #[test]
    fn stop_scrolling_ends_deceleration() {
        let (mut controller, _asset) = controller_with(20);
        controller.begin_drag();
        controller.end_drag(true);

        assert_eq!(controller.stop_scrolling(), vec![ScrubEvent::DragEnded]);
        assert_eq!(controller.phase(), DragPhase::Idle);
    }

    #[test]
    fn overscroll_clamps_value_and_shifts_playhead() {
        let (mut controller, _asset) = controller_with(20);
        controller.begin_drag();

        let events = controller.scroll_changed(-80.0);
        assert_eq!(value_changes(&events), vec![0.0]);
        assert!(events.contains(&ScrubEvent::PlayheadShifted { dx: -30.0 }));

        let events = controller.scroll_changed(400.0);
        assert_eq!(value_changes(&events), vec![20.0]);
        assert!(events.contains(&ScrubEvent::PlayheadShifted { dx: 250.0 }));

        let events = controller.scroll_changed(10.0);
        assert!(events.contains(&ScrubEvent::PlayheadShifted { dx: 0.0 }));
    }

    #[test]
    fn programmatic_values_are_clamped_to_duration() {
        let (mut controller, _asset) = controller_with(20);

        controller.set_value_from_playback(99.0);
        assert_eq!(controller.value(), 20.0);

        controller.set_value_from_playback(-4.0);
        assert_eq!(controller.value(), 0.0);
    }

    #[test]
    fn content_width_falls_back_to_requested_frames() {
        let mut controller =
            ScrubController::new(&ScrubberConfig::default()).expect("valid config");
        let asset: Arc<dyn Asset> = Arc::new(MockAsset::new(23));
        controller.set_asset(&asset);

        let item = controller.item_size();
        assert_eq!(controller.content_width(), item.content_width(5));
    }

    #[test]
    fn dropped_asset_reads_as_zero_duration() {
        let (mut controller, asset) = controller_with(20);
        drop(asset);

        assert_eq!(controller.duration_seconds(), 0.0);
        controller.set_value_from_playback(5.0);
        assert_eq!(controller.value(), 0.0);
    }
}
