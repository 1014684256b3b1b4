//! UI-agnostic film-strip scrubber: thumbnail strip loading, offset/time
//! mapping and debounced seeking for a video player screen.

pub mod asset;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod mapping;
pub mod seek;
pub mod session;
pub mod thumbnails;
pub mod time;

pub use asset::{
    Asset, AssetProperties, BatchPurpose, Frame, FrameArrival, FrameBatch, Generation, KeyStatus,
    Thumbnail, ThumbnailSize,
};
pub use config::ScrubberConfig;
pub use controller::{DragPhase, ScrubController, ScrubEvent};
pub use error::{Result, ScrubError};
pub use format::format_time;
pub use mapping::{FrameTiming, ItemSize, StripLayout, offset_for_value, value_for_offset};
pub use seek::{
    Player, PlayerStatus, SeekCompletion, SeekDebouncer, SeekDecision, SeekTolerance,
    TimeControlStatus,
};
pub use session::{Command, ErrorEvent, ErrorKind, Event, PlayButton, Session};
pub use thumbnails::{LoaderUpdate, ThumbnailLoader};
pub use time::{MediaTime, PREFERRED_TIMESCALE, rescale};
