use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the scrubber crate.
pub type Result<T> = std::result::Result<T, ScrubError>;

/// Errors produced while configuring the scrubber or validating an asset.
#[derive(Debug)]
pub enum ScrubError {
    InvalidTimescale {
        timescale: i32,
    },
    InvalidSeconds(f64),
    AssetKeyFailed {
        key: &'static str,
        reason: String,
    },
    AssetNotPlayable,
    PlayerItemFailed {
        reason: String,
    },
    InvalidConfig {
        reason: String,
    },
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Media(media_ffmpeg::MediaFfmpegError),
}

impl ScrubError {
    /// Returns true for failures that make the current asset unusable.
    pub fn is_asset_invalid(&self) -> bool {
        matches!(
            self,
            Self::AssetKeyFailed { .. } | Self::AssetNotPlayable | Self::PlayerItemFailed { .. }
        )
    }
}

impl Display for ScrubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimescale { timescale } => write!(f, "invalid timescale {timescale}"),
            Self::InvalidSeconds(value) => write!(f, "invalid time in seconds: {value}"),
            Self::AssetKeyFailed { key, reason } => {
                write!(f, "the video failed to load the key \"{key}\": {reason}")
            }
            Self::AssetNotPlayable => {
                write!(f, "the video is not playable or has protected content")
            }
            Self::PlayerItemFailed { reason } => write!(f, "playback failed: {reason}"),
            Self::InvalidConfig { reason } => write!(f, "invalid scrubber config: {reason}"),
            Self::ConfigIo { path, source } => {
                write!(f, "failed to read config {} ({source})", path.display())
            }
            Self::ConfigParse { path, source } => {
                write!(f, "failed to parse config {} ({source})", path.display())
            }
            Self::Media(err) => write!(f, "media backend error: {err}"),
        }
    }
}

impl std::error::Error for ScrubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigParse { source, .. } => Some(source),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<media_ffmpeg::MediaFfmpegError> for ScrubError {
    fn from(value: media_ffmpeg::MediaFfmpegError) -> Self {
        Self::Media(value)
    }
}
