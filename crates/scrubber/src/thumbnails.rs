use tracing::{debug, info, warn};

use crate::asset::{
    Asset, BatchPurpose, Frame, FrameArrival, FrameBatch, Generation, Thumbnail, ThumbnailSize,
};
use crate::mapping::FrameTiming;
use crate::time::MediaTime;

/// Notification produced when the loader reaches a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderUpdate {
    PlaceholderReady,
    StripCompleted { frame_count: usize },
}

/// Requests strip thumbnails for one asset at a time and collects them in
/// request order.
#[derive(Debug)]
pub struct ThumbnailLoader {
    timing: FrameTiming,
    max_size: ThumbnailSize,
    generation: Generation,
    requested: Vec<MediaTime>,
    slots: Vec<Option<Frame>>,
    arrived: usize,
    frames: Vec<Frame>,
    completed: bool,
    placeholder_pending: bool,
    default_image: Option<Thumbnail>,
}

impl ThumbnailLoader {
    pub fn new(timing: FrameTiming, max_size: ThumbnailSize) -> Self {
        Self {
            timing,
            max_size,
            generation: Generation::default(),
            requested: Vec::new(),
            slots: Vec::new(),
            arrived: 0,
            frames: Vec::new(),
            completed: false,
            placeholder_pending: false,
            default_image: None,
        }
    }

    /// Starts a new load epoch for `asset`.
    ///
    /// Issues the placeholder batch and the strip batch. Frames of earlier
    /// loads still in flight are dropped when they arrive. An asset too short
    /// for a single thumbnail completes immediately.
    pub fn load(&mut self, asset: &dyn Asset) -> Option<LoaderUpdate> {
        self.generation = self.generation.next();
        self.requested = self.timing.strip_times(asset.duration());
        self.slots = vec![None; self.requested.len()];
        self.arrived = 0;
        self.frames.clear();
        self.completed = false;
        self.placeholder_pending = true;
        self.default_image = None;

        info!(
            generation = self.generation.0,
            frame_count = self.requested.len(),
            duration = %asset.duration(),
            "loading strip thumbnails"
        );

        asset.request_frames(FrameBatch {
            generation: self.generation,
            purpose: BatchPurpose::Placeholder,
            times: vec![self.timing.time_for_index(0)],
            max_size: self.max_size,
        });

        if self.requested.is_empty() {
            self.completed = true;
            return Some(LoaderUpdate::StripCompleted { frame_count: 0 });
        }

        asset.request_frames(FrameBatch {
            generation: self.generation,
            purpose: BatchPurpose::Strip,
            times: self.requested.clone(),
            max_size: self.max_size,
        });
        None
    }

    /// Stores one rendered frame.
    ///
    /// Returns an update when the placeholder image arrives or when the last
    /// strip slot is filled. Failed frames fill their slot without an image.
    pub fn accept(&mut self, arrival: FrameArrival) -> Option<LoaderUpdate> {
        if arrival.generation != self.generation {
            debug!(
                stale = arrival.generation.0,
                current = self.generation.0,
                "dropping thumbnail from an earlier load"
            );
            return None;
        }

        match arrival.purpose {
            BatchPurpose::Placeholder => self.accept_placeholder(arrival),
            BatchPurpose::Strip => self.accept_strip_frame(arrival),
        }
    }

    fn accept_placeholder(&mut self, arrival: FrameArrival) -> Option<LoaderUpdate> {
        if !self.placeholder_pending || arrival.index != 0 {
            debug!(index = arrival.index, "dropping unexpected placeholder frame");
            return None;
        }
        self.placeholder_pending = false;

        match arrival.result {
            Ok(image) => {
                self.default_image = Some(image);
                Some(LoaderUpdate::PlaceholderReady)
            }
            Err(reason) => {
                warn!(%reason, "placeholder thumbnail failed");
                None
            }
        }
    }

    fn accept_strip_frame(&mut self, arrival: FrameArrival) -> Option<LoaderUpdate> {
        let index = arrival.index;
        let Some(time) = self.requested.get(index).copied() else {
            debug!(index, requested = self.requested.len(), "dropping out-of-range thumbnail");
            return None;
        };
        let slot = self.slots.get_mut(index)?;
        if slot.is_some() {
            debug!(index, "dropping duplicate thumbnail");
            return None;
        }

        let image = match arrival.result {
            Ok(image) => Some(image),
            Err(reason) => {
                warn!(index, %time, %reason, "thumbnail failed, keeping placeholder slot");
                None
            }
        };
        *slot = Some(Frame { image, time });
        self.arrived += 1;

        if self.arrived < self.slots.len() || self.completed {
            return None;
        }
        self.completed = true;
        self.frames = self.slots.iter().flatten().cloned().collect();
        info!(
            generation = self.generation.0,
            frame_count = self.frames.len(),
            "strip thumbnails completed"
        );
        Some(LoaderUpdate::StripCompleted {
            frame_count: self.frames.len(),
        })
    }

    /// Completed strip frames in request order; empty until the load completes.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Strip frame covering `time`.
    pub fn frame_for_time(&self, time: MediaTime) -> Option<&Frame> {
        self.frames.get(self.timing.frame_index_for_time(time))
    }

    /// Image to draw in slot `index`: the frame's own image, or the
    /// placeholder when rendering failed.
    pub fn image_for_index(&self, index: usize) -> Option<&Thumbnail> {
        let frame = self.frames.get(index)?;
        frame.image.as_ref().or(self.default_image.as_ref())
    }

    pub fn default_image(&self) -> Option<&Thumbnail> {
        self.default_image.as_ref()
    }

    pub fn requested_count(&self) -> usize {
        self.requested.len()
    }

    pub fn arrived_count(&self) -> usize {
        self.arrived
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}
