use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use crate::error::{Result, ScrubError};

/// Ticks per second used for thumbnail timestamps and seek targets.
///
/// 600 is divisible by 24, 25 and 30, so frame boundaries of common frame
/// rates are exact.
pub const PREFERRED_TIMESCALE: i32 = 600;

/// Rational media time: `value / timescale` seconds.
///
/// Equality and ordering compare the represented instant, so `1/1` equals
/// `600/600`.
#[derive(Debug, Clone, Copy)]
pub struct MediaTime {
    value: i64,
    timescale: i32,
}

impl MediaTime {
    /// Time zero in the preferred timescale.
    pub const ZERO: Self = Self {
        value: 0,
        timescale: PREFERRED_TIMESCALE,
    };

    /// Creates a time of `value` ticks at `timescale` ticks per second.
    ///
    /// # Example
    /// ```
    /// use scrubber::MediaTime;
    ///
    /// let five = MediaTime::new(3_000, 600).expect("valid");
    /// assert_eq!(five.seconds(), 5.0);
    /// assert!(MediaTime::new(1, 0).is_err());
    /// ```
    pub fn new(value: i64, timescale: i32) -> Result<Self> {
        if timescale <= 0 {
            return Err(ScrubError::InvalidTimescale { timescale });
        }
        Ok(Self { value, timescale })
    }

    /// Converts seconds to the nearest tick at `timescale`.
    ///
    /// # Example
    /// ```
    /// use scrubber::MediaTime;
    ///
    /// let time = MediaTime::from_seconds(1.5, 600).expect("valid");
    /// assert_eq!(time.value(), 900);
    /// ```
    pub fn from_seconds(seconds: f64, timescale: i32) -> Result<Self> {
        if !seconds.is_finite() {
            return Err(ScrubError::InvalidSeconds(seconds));
        }
        if timescale <= 0 {
            return Err(ScrubError::InvalidTimescale { timescale });
        }
        let ticks = (seconds * f64::from(timescale)).round();
        Ok(Self {
            value: ticks.clamp(i64::MIN as f64, i64::MAX as f64) as i64,
            timescale,
        })
    }

    pub fn value(self) -> i64 {
        self.value
    }

    pub fn timescale(self) -> i32 {
        self.timescale
    }

    /// Floating seconds, for formatting and UI geometry only.
    pub fn seconds(self) -> f64 {
        self.value as f64 / f64::from(self.timescale)
    }

    /// Re-expresses this time at another timescale with nearest rounding.
    pub fn convert_scale(self, timescale: i32) -> Result<Self> {
        if timescale <= 0 {
            return Err(ScrubError::InvalidTimescale { timescale });
        }
        Ok(Self {
            value: rescale(self.value, self.timescale, timescale),
            timescale,
        })
    }

    /// Adds `rhs`, expressed in this time's timescale.
    ///
    /// Returns `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let rhs_value = rescale(rhs.value, rhs.timescale, self.timescale);
        self.value.checked_add(rhs_value).map(|value| Self {
            value,
            timescale: self.timescale,
        })
    }

    /// Multiplies by a whole count. Returns `None` on overflow.
    pub fn checked_mul(self, count: i64) -> Option<Self> {
        self.value.checked_mul(count).map(|value| Self {
            value,
            timescale: self.timescale,
        })
    }

    fn cross(self, other: Self) -> (i128, i128) {
        (
            i128::from(self.value) * i128::from(other.timescale),
            i128::from(other.value) * i128::from(self.timescale),
        )
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        let (lhs, rhs) = self.cross(*other);
        lhs == rhs
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = self.cross(*other);
        lhs.cmp(&rhs)
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Display for MediaTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.value, self.timescale)
    }
}

/// Rescales `ticks` between two timescales with nearest rounding.
///
/// # Example
/// ```
/// use scrubber::rescale;
///
/// assert_eq!(rescale(3_000, 600, 90_000), 450_000);
/// assert_eq!(rescale(1_001, 30_000, 600), 20);
/// ```
pub fn rescale(ticks: i64, from_timescale: i32, to_timescale: i32) -> i64 {
    let numerator = i128::from(ticks) * i128::from(to_timescale);
    let denominator = i128::from(from_timescale);
    let rounded = div_round_nearest(numerator, denominator);
    rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

fn div_round_nearest(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);

    let abs_num = num.abs();
    let mut out = abs_num / den;
    let remainder = abs_num % den;
    if remainder.saturating_mul(2) >= den {
        out += 1;
    }

    if num < 0 { -out } else { out }
}
