//! Conversions between playback time, thumbnail index and strip offset.
//!
//! Offsets here are "normalized": `0` is the left edge of the first
//! thumbnail and `content_width` the right edge of the last one. Shells
//! report raw scroll offsets, which [`StripLayout`] shifts by the left inset.

use crate::error::{Result, ScrubError};
use crate::time::MediaTime;

/// Fixed spacing between strip thumbnails in media time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    step: MediaTime,
}

impl FrameTiming {
    /// Creates a timing of one thumbnail every `step_seconds` whole seconds,
    /// expressed at `timescale`.
    pub fn new(step_seconds: i64, timescale: i32) -> Result<Self> {
        if step_seconds <= 0 {
            return Err(ScrubError::InvalidConfig {
                reason: format!("thumbnail step must be positive, got {step_seconds}s"),
            });
        }
        let value = step_seconds
            .checked_mul(i64::from(timescale))
            .ok_or_else(|| ScrubError::InvalidConfig {
                reason: format!("thumbnail step {step_seconds}s overflows timescale {timescale}"),
            })?;
        Ok(Self {
            step: MediaTime::new(value, timescale)?,
        })
    }

    pub fn step(&self) -> MediaTime {
        self.step
    }

    /// Requested timestamp of thumbnail `index`.
    ///
    /// # Example
    /// ```
    /// use scrubber::FrameTiming;
    ///
    /// let timing = FrameTiming::new(5, 600).expect("valid");
    /// assert_eq!(timing.time_for_index(3).seconds(), 15.0);
    /// ```
    pub fn time_for_index(&self, index: usize) -> MediaTime {
        let count = i64::try_from(index).unwrap_or(i64::MAX);
        self.step.checked_mul(count).unwrap_or_else(|| {
            MediaTime::new(i64::MAX, self.step.timescale()).unwrap_or(self.step)
        })
    }

    /// Index of the thumbnail covering `time`: `floor(time / step)`.
    ///
    /// Times before zero map to the first thumbnail.
    pub fn frame_index_for_time(&self, time: MediaTime) -> usize {
        let numerator = i128::from(time.value()) * i128::from(self.step.timescale());
        let denominator = i128::from(self.step.value()) * i128::from(time.timescale());
        let index = numerator.div_euclid(denominator).max(0);
        usize::try_from(index).unwrap_or(usize::MAX)
    }

    /// Timestamps of the strip thumbnails covering `[0, duration)`.
    ///
    /// Stepping stops as soon as the next time would reach `duration`; the
    /// final partial interval gets no extra frame.
    ///
    /// # Example
    /// ```
    /// use scrubber::{FrameTiming, MediaTime};
    ///
    /// let timing = FrameTiming::new(5, 600).expect("valid");
    /// let duration = MediaTime::new(23, 1).expect("valid");
    /// let seconds: Vec<f64> = timing
    ///     .strip_times(duration)
    ///     .into_iter()
    ///     .map(|time| time.seconds())
    ///     .collect();
    /// assert_eq!(seconds, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
    /// ```
    pub fn strip_times(&self, duration: MediaTime) -> Vec<MediaTime> {
        let mut times = Vec::new();
        let mut next = MediaTime::new(0, self.step.timescale()).unwrap_or(MediaTime::ZERO);
        while next < duration {
            times.push(next);
            let Some(advanced) = next.checked_add(self.step) else {
                break;
            };
            next = advanced;
        }
        times
    }
}

/// Normalized strip offset for a scrub value.
///
/// `clamp(value / duration, 0, 1) * content_width`; a zero duration maps to 0.
///
/// # Example
/// ```
/// use scrubber::offset_for_value;
///
/// assert_eq!(offset_for_value(5.0, 200.0, 20.0), 50.0);
/// assert_eq!(offset_for_value(30.0, 200.0, 20.0), 200.0);
/// assert_eq!(offset_for_value(5.0, 200.0, 0.0), 0.0);
/// ```
pub fn offset_for_value(value: f64, content_width: f64, duration: f64) -> f64 {
    if duration <= 0.0 || content_width <= 0.0 {
        return 0.0;
    }
    normalized_ratio(value / duration) * content_width
}

/// Scrub value for a normalized strip offset, the inverse of
/// [`offset_for_value`].
///
/// # Example
/// ```
/// use scrubber::value_for_offset;
///
/// assert_eq!(value_for_offset(50.0, 200.0, 20.0), 5.0);
/// assert_eq!(value_for_offset(-40.0, 200.0, 20.0), 0.0);
/// ```
pub fn value_for_offset(offset: f64, content_width: f64, duration: f64) -> f64 {
    if duration <= 0.0 || content_width <= 0.0 {
        return 0.0;
    }
    normalized_ratio(offset / content_width) * duration
}

fn normalized_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// Size of one strip cell in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSize {
    pub width: f64,
    pub height: f64,
    pub spacing: f64,
}

impl ItemSize {
    /// Cell of `height` points at `aspect_ratio` (width / height).
    pub fn from_height(height: f64, aspect_ratio: f64, spacing: f64) -> Self {
        Self {
            width: height * aspect_ratio,
            height,
            spacing,
        }
    }

    /// Width of a strip holding `count` cells.
    ///
    /// # Example
    /// ```
    /// use scrubber::ItemSize;
    ///
    /// let item = ItemSize { width: 10.0, height: 5.0, spacing: 1.0 };
    /// assert_eq!(item.content_width(3), 32.0);
    /// assert_eq!(item.content_width(0), 0.0);
    /// ```
    pub fn content_width(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let count = count as f64;
        count * self.width + (count - 1.0) * self.spacing
    }
}

/// Geometry reported by the shell for the scrolling strip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StripLayout {
    pub content_width: f64,
    pub inset_left: f64,
}

impl StripLayout {
    /// Layout whose insets center the strip start under a playhead in the
    /// middle of a `viewport_width` wide view.
    pub fn centered(content_width: f64, viewport_width: f64, safe_area_left: f64) -> Self {
        Self {
            content_width,
            inset_left: viewport_width / 2.0 - safe_area_left,
        }
    }

    /// Converts a raw scroll offset into a normalized strip offset.
    pub fn normalized_offset(&self, raw_offset: f64) -> f64 {
        raw_offset + self.inset_left
    }

    /// Converts a normalized strip offset into a raw scroll offset.
    pub fn raw_offset(&self, normalized_offset: f64) -> f64 {
        normalized_offset - self.inset_left
    }

    /// Horizontal shift of the playhead and time label while the strip is
    /// rubber-banding past either end; zero inside the strip.
    ///
    /// # Example
    /// ```
    /// use scrubber::StripLayout;
    ///
    /// let layout = StripLayout { content_width: 100.0, inset_left: 50.0 };
    /// assert_eq!(layout.overscroll(-70.0), -20.0);
    /// assert_eq!(layout.overscroll(0.0), 0.0);
    /// assert_eq!(layout.overscroll(65.0), 15.0);
    /// ```
    pub fn overscroll(&self, raw_offset: f64) -> f64 {
        let offset = self.normalized_offset(raw_offset);
        if offset < 0.0 {
            offset
        } else if offset > self.content_width {
            offset - self.content_width
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameTiming, StripLayout, offset_for_value, value_for_offset};
    use crate::time::MediaTime;

    fn timing() -> FrameTiming {
        FrameTiming::new(5, 600).expect("valid timing")
    }

    #[test]
    fn frame_index_round_trips_time_for_index() {
        let timing = timing();
        for index in [0, 1, 2, 7, 119, 10_000] {
            assert_eq!(timing.frame_index_for_time(timing.time_for_index(index)), index);
        }
    }

    #[test]
    fn frame_index_floors_times_between_thumbnails() {
        let timing = timing();
        let time = MediaTime::from_seconds(9.99, 600).expect("valid time");

        assert_eq!(timing.frame_index_for_time(time), 1);
    }

    #[test]
    fn frame_index_for_negative_time_is_zero() {
        let time = MediaTime::new(-300, 600).expect("valid time");

        assert_eq!(timing().frame_index_for_time(time), 0);
    }

    #[test]
    fn strip_times_stop_before_reaching_duration() {
        let exact = MediaTime::new(20, 1).expect("valid time");
        assert_eq!(timing().strip_times(exact).len(), 4);

        let just_over = MediaTime::new(12_001, 600).expect("valid time");
        assert_eq!(timing().strip_times(just_over).len(), 5);
    }

    #[test]
    fn strip_times_are_empty_for_zero_duration() {
        assert!(timing().strip_times(MediaTime::ZERO).is_empty());
    }

    #[test]
    fn offset_round_trips_through_value() {
        let (width, duration) = (713.0, 23.4);
        for step in 0..=100 {
            let value = duration * f64::from(step) / 100.0;
            let round_trip =
                value_for_offset(offset_for_value(value, width, duration), width, duration);
            assert!((round_trip - value).abs() < 1e-9, "value {value} became {round_trip}");
        }
    }

    #[test]
    fn offset_for_value_is_monotonic() {
        let mut previous = f64::NEG_INFINITY;
        for step in -20..=140 {
            let offset = offset_for_value(f64::from(step) * 0.25, 500.0, 30.0);
            assert!(offset >= previous);
            previous = offset;
        }
    }

    #[test]
    fn out_of_range_offsets_clamp_to_duration_bounds() {
        for offset in [-1e9, -10.0, 0.0, 250.0, 500.0, 510.0, 1e9] {
            let value = value_for_offset(offset, 500.0, 30.0);
            assert!((0.0..=30.0).contains(&value));
        }
    }

    #[test]
    fn degenerate_inputs_map_to_zero() {
        assert_eq!(value_for_offset(10.0, 0.0, 30.0), 0.0);
        assert_eq!(value_for_offset(f64::NAN, 100.0, 30.0), 0.0);
        assert_eq!(offset_for_value(f64::NAN, 100.0, 30.0), 0.0);
    }

    #[test]
    fn centered_layout_puts_strip_start_under_midpoint() {
        let layout = StripLayout::centered(400.0, 390.0, 0.0);

        assert_eq!(layout.inset_left, 195.0);
        assert_eq!(layout.normalized_offset(-195.0), 0.0);
        assert_eq!(layout.raw_offset(400.0), 205.0);
    }
}
