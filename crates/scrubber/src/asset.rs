use std::fmt::Debug;
use std::sync::Arc;

use media_ffmpeg::{DecodedVideoFrame, MediaInfo};

use crate::error::{Result, ScrubError};
use crate::time::MediaTime;

/// Decoded RGBA bitmap; clones share the pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl From<DecodedVideoFrame> for Thumbnail {
    fn from(frame: DecodedVideoFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            rgba: frame.rgba.into(),
        }
    }
}

/// One strip slot: the requested time and its image, if rendering succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub image: Option<Thumbnail>,
    pub time: MediaTime,
}

/// Pixel box a rendered thumbnail must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

/// Thumbnail load epoch. Arrivals tagged with an older generation are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPurpose {
    /// Single frame at time zero shown in place of missing thumbnails.
    Placeholder,
    Strip,
}

/// Frames the asset should render, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBatch {
    pub generation: Generation,
    pub purpose: BatchPurpose,
    pub times: Vec<MediaTime>,
    pub max_size: ThumbnailSize,
}

/// Result of rendering one frame of a [`FrameBatch`].
///
/// `index` is the position of `requested_time` inside the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameArrival {
    pub generation: Generation,
    pub purpose: BatchPurpose,
    pub index: usize,
    pub requested_time: MediaTime,
    pub result: std::result::Result<Thumbnail, String>,
}

/// Video the scrubber presents.
///
/// Owned by the host. Rendering is asynchronous: `request_frames` returns at
/// once and every frame comes back later as a [`FrameArrival`].
pub trait Asset: Debug + Send + Sync {
    fn duration(&self) -> MediaTime;
    fn request_frames(&self, batch: FrameBatch);
}

/// Outcome of loading one asset property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus<T> {
    Loaded(T),
    Failed(String),
}

impl<T: Clone> KeyStatus<T> {
    fn require(&self, key: &'static str) -> Result<T> {
        match self {
            Self::Loaded(value) => Ok(value.clone()),
            Self::Failed(reason) => Err(ScrubError::AssetKeyFailed {
                key,
                reason: reason.clone(),
            }),
        }
    }
}

/// Properties the host loads before handing an asset to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetProperties {
    pub duration: KeyStatus<MediaTime>,
    pub playable: KeyStatus<bool>,
    pub protected_content: KeyStatus<bool>,
}

impl AssetProperties {
    /// Checks every required key, then playability.
    ///
    /// Keys are checked in the order `playable`, `hasProtectedContent`,
    /// `duration`; the first failed key is reported.
    ///
    /// # Example
    /// ```
    /// use scrubber::{AssetProperties, KeyStatus, MediaTime};
    ///
    /// let properties = AssetProperties {
    ///     duration: KeyStatus::Loaded(MediaTime::new(23, 1).expect("valid")),
    ///     playable: KeyStatus::Loaded(true),
    ///     protected_content: KeyStatus::Loaded(false),
    /// };
    /// assert!(properties.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<MediaTime> {
        let playable = self.playable.require("playable")?;
        let protected = self.protected_content.require("hasProtectedContent")?;
        let duration = self.duration.require("duration")?;
        if !playable || protected {
            return Err(ScrubError::AssetNotPlayable);
        }
        Ok(duration)
    }

    /// Properties of a probed file. The FFmpeg backend has no DRM, so
    /// protected content always loads as `false`.
    pub fn from_media_info(info: &MediaInfo, timescale: i32) -> Self {
        let duration = match info.duration() {
            Some(seconds) => match MediaTime::from_seconds(seconds, timescale) {
                Ok(time) => KeyStatus::Loaded(time),
                Err(err) => KeyStatus::Failed(err.to_string()),
            },
            None => KeyStatus::Failed(format!(
                "no duration reported for {}",
                info.path.display()
            )),
        };

        Self {
            duration,
            playable: KeyStatus::Loaded(info.is_playable()),
            protected_content: KeyStatus::Loaded(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use media_ffmpeg::{MediaInfo, Rational, StreamInfo, StreamKind};

    use super::{AssetProperties, KeyStatus};
    use crate::error::ScrubError;
    use crate::time::MediaTime;

    fn loaded() -> AssetProperties {
        AssetProperties {
            duration: KeyStatus::Loaded(MediaTime::new(23, 1).expect("valid time")),
            playable: KeyStatus::Loaded(true),
            protected_content: KeyStatus::Loaded(false),
        }
    }

    #[test]
    fn failed_key_is_reported_by_name() {
        let properties = AssetProperties {
            protected_content: KeyStatus::Failed("timed out".to_string()),
            ..loaded()
        };

        let err = properties.validate().expect_err("failed key must be rejected");

        assert!(matches!(
            err,
            ScrubError::AssetKeyFailed { key: "hasProtectedContent", .. }
        ));
    }

    #[test]
    fn protected_or_unplayable_asset_is_rejected() {
        let protected = AssetProperties {
            protected_content: KeyStatus::Loaded(true),
            ..loaded()
        };
        let unplayable = AssetProperties {
            playable: KeyStatus::Loaded(false),
            ..loaded()
        };

        assert!(matches!(protected.validate(), Err(ScrubError::AssetNotPlayable)));
        assert!(matches!(unplayable.validate(), Err(ScrubError::AssetNotPlayable)));
    }

    #[test]
    fn media_info_without_duration_fails_the_duration_key() {
        let info = MediaInfo {
            path: PathBuf::from("clip.mp4"),
            streams: vec![StreamInfo {
                index: 0,
                kind: StreamKind::Video,
                codec_name: Some("h264".to_string()),
                time_base: Rational::new(1, 15_360).expect("valid time base"),
                width: Some(1280),
                height: Some(720),
                duration_ts: None,
            }],
            duration_seconds: None,
        };

        let properties = AssetProperties::from_media_info(&info, 600);

        assert_eq!(properties.playable, KeyStatus::Loaded(true));
        assert!(matches!(
            properties.validate(),
            Err(ScrubError::AssetKeyFailed { key: "duration", .. })
        ));
    }
}
