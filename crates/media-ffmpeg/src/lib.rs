//! FFmpeg CLI backend used to probe video assets and render thumbnails.

mod decode;
mod error;
mod probe;
mod time;

pub use decode::{DecodedVideoFrame, ThumbnailSource, decode_video_frame_at_seconds, fit_within};
pub use error::{MediaFfmpegError, Result};
pub use probe::{MediaInfo, StreamInfo, StreamKind, probe_media};
pub use time::Rational;
