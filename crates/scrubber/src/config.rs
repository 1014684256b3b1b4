use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScrubError};
use crate::mapping::{FrameTiming, ItemSize};

/// Tunables for thumbnail spacing, strip geometry and playback ticks.
///
/// Missing JSON fields fall back to [`ScrubberConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubberConfig {
    /// Seconds of video covered by one strip thumbnail.
    pub target_frame_duration_secs: i64,
    /// Ticks per second for requested thumbnail times and seek targets.
    pub timescale: i32,
    pub thumbnail_height: f64,
    /// Thumbnail width divided by height.
    pub thumbnail_aspect_ratio: f64,
    pub item_spacing: f64,
    /// Pixels per point used when sizing rendered thumbnails.
    pub display_scale: f64,
    /// Periodic playback time updates per second.
    pub time_update_hz: u32,
}

impl Default for ScrubberConfig {
    fn default() -> Self {
        Self {
            target_frame_duration_secs: 5,
            timescale: crate::time::PREFERRED_TIMESCALE,
            thumbnail_height: 40.0,
            thumbnail_aspect_ratio: 16.0 / 9.0,
            item_spacing: 1.0,
            display_scale: 2.0,
            time_update_hz: 30,
        }
    }
}

impl ScrubberConfig {
    /// Parses and validates a JSON config.
    ///
    /// # Example
    /// ```
    /// use scrubber::ScrubberConfig;
    ///
    /// let config = ScrubberConfig::from_json_str(r#"{ "target_frame_duration_secs": 2 }"#)
    ///     .expect("valid config");
    /// assert_eq!(config.target_frame_duration_secs, 2);
    /// assert_eq!(config.timescale, 600);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| ScrubError::InvalidConfig {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ScrubError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ScrubError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = ?path, ?config, "scrubber config loaded");
        Ok(config)
    }

    /// Rejects values the mapper and loader cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.target_frame_duration_secs <= 0 {
            return Err(invalid(format!(
                "target_frame_duration_secs must be positive, got {}",
                self.target_frame_duration_secs
            )));
        }
        if self.timescale <= 0 {
            return Err(invalid(format!(
                "timescale must be positive, got {}",
                self.timescale
            )));
        }
        for (name, value) in [
            ("thumbnail_height", self.thumbnail_height),
            ("thumbnail_aspect_ratio", self.thumbnail_aspect_ratio),
            ("display_scale", self.display_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be a positive number, got {value}")));
            }
        }
        if !self.item_spacing.is_finite() || self.item_spacing < 0.0 {
            return Err(invalid(format!(
                "item_spacing must not be negative, got {}",
                self.item_spacing
            )));
        }
        if self.time_update_hz == 0 {
            return Err(invalid("time_update_hz must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn frame_timing(&self) -> Result<FrameTiming> {
        FrameTiming::new(self.target_frame_duration_secs, self.timescale)
    }

    pub fn item_size(&self) -> ItemSize {
        ItemSize::from_height(
            self.thumbnail_height,
            self.thumbnail_aspect_ratio,
            self.item_spacing,
        )
    }

    /// Pixel box rendered thumbnails must fit in: item size times display scale.
    pub fn thumbnail_max_size(&self) -> (u32, u32) {
        let item = self.item_size();
        let scale = |points: f64| (points * self.display_scale).round().max(1.0) as u32;
        (scale(item.width), scale(item.height))
    }

    /// Interval between periodic playback time updates.
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.time_update_hz.max(1)))
    }
}

fn invalid(reason: String) -> ScrubError {
    ScrubError::InvalidConfig { reason }
}
