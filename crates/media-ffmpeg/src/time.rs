use crate::error::{MediaFfmpegError, Result};

/// Stream time base as reported by `ffprobe` (`num/den` seconds per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Creates a time base. Both parts must be positive.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::Rational;
    ///
    /// let tb = Rational::new(1, 15_360).expect("valid");
    /// assert_eq!(tb.den, 15_360);
    /// assert!(Rational::new(1, 0).is_err());
    /// ```
    pub fn new(num: i32, den: i32) -> Result<Self> {
        if num <= 0 || den <= 0 {
            return Err(MediaFfmpegError::InvalidRational { num, den });
        }

        Ok(Self { num, den })
    }

    /// Parses `num/den` text such as `1/90000`.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::Rational;
    ///
    /// let tb = Rational::parse("1/90000").expect("valid");
    /// assert_eq!(tb, Rational::new(1, 90_000).expect("valid"));
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let (num, den) = input
            .split_once('/')
            .ok_or_else(|| MediaFfmpegError::Parse {
                context: "rational",
                value: input.to_string(),
            })?;
        let num = parse_i32(num, "rational num")?;
        let den = parse_i32(den, "rational den")?;
        Self::new(num, den)
    }

    /// Converts seconds into the nearest tick of this time base.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::Rational;
    ///
    /// let tb = Rational::new(1, 90_000).expect("valid");
    /// assert_eq!(tb.ticks_from_seconds(0.5), 45_000);
    /// ```
    pub fn ticks_from_seconds(self, seconds: f64) -> i64 {
        let ticks = seconds * f64::from(self.den) / f64::from(self.num);
        ticks.round() as i64
    }

    /// Converts ticks of this time base into seconds.
    pub fn seconds_from_ticks(self, ticks: i64) -> f64 {
        ticks as f64 * f64::from(self.num) / f64::from(self.den)
    }
}

fn parse_i32(value: &str, context: &'static str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| MediaFfmpegError::Parse {
            context,
            value: value.to_string(),
        })
}
