use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{MediaFfmpegError, Result};
use crate::probe::{probe_media, run_ffprobe};
use crate::time::Rational;

const INPUT_SEEK_MARGIN_SECS: f64 = 2.0;

/// A decoded video frame in RGBA format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub best_effort_timestamp: i64,
    pub time_base: Rational,
}

/// Video file prepared for repeated frame rendering.
///
/// Opening probes the first video stream and indexes its frame timestamps
/// once, so a batch of thumbnails costs one `ffmpeg` run per frame and no
/// extra probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSource {
    path: PathBuf,
    width: u32,
    height: u32,
    time_base: Rational,
    timestamps: Vec<i64>,
}

impl ThumbnailSource {
    /// Probes `path` and indexes its video frame timestamps.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let media = probe_media(path)?;
        let video = media
            .first_video()
            .ok_or_else(|| MediaFfmpegError::MissingVideoStream(path.to_path_buf()))?;
        let width = video
            .width
            .ok_or_else(|| MediaFfmpegError::MissingVideoDimensions(path.to_path_buf()))?;
        let height = video
            .height
            .ok_or_else(|| MediaFfmpegError::MissingVideoDimensions(path.to_path_buf()))?;

        let timestamps = read_video_best_effort_timestamps(path)?;
        if timestamps.is_empty() {
            return Err(MediaFfmpegError::NoVideoFrames(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            time_base: video.time_base,
            timestamps,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source dimensions of the video stream.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Renders the first frame at-or-after `at_seconds`.
    ///
    /// With `max_size`, the frame is scaled down to fit inside the box while
    /// keeping its aspect ratio; frames already inside the box keep their size.
    ///
    /// # Example
    /// ```no_run
    /// use media_ffmpeg::ThumbnailSource;
    ///
    /// let source = ThumbnailSource::open("sample.mp4").expect("open should succeed");
    /// let frame = source.decode_at(5.0, Some((142, 80))).expect("decode should succeed");
    /// assert!(frame.width <= 142 && frame.height <= 80);
    /// ```
    pub fn decode_at(&self, at_seconds: f64, max_size: Option<(u32, u32)>) -> Result<DecodedVideoFrame> {
        if !at_seconds.is_finite() || at_seconds < 0.0 {
            return Err(MediaFfmpegError::InvalidTimestampSeconds(at_seconds));
        }

        let (width, height) = match max_size {
            Some((max_width, max_height)) => {
                fit_within(self.width, self.height, max_width, max_height)?
            }
            None => (self.width, self.height),
        };

        let target = self.time_base.ticks_from_seconds(at_seconds);
        let best_effort_timestamp = select_timestamp_at_or_after(&self.timestamps, target)
            .ok_or_else(|| MediaFfmpegError::NoVideoFrames(self.path.clone()))?;

        let first = self.timestamps.first().copied().unwrap_or(best_effort_timestamp);
        let seek_from = input_seek_seconds(self.time_base, first, best_effort_timestamp);
        let rgba = render_rgba_frame(&self.path, best_effort_timestamp, seek_from, width, height)?;
        let expected_size = width as usize * height as usize * 4;
        if rgba.len() != expected_size {
            return Err(MediaFfmpegError::Parse {
                context: "decoded rgba size",
                value: format!("expected {expected_size} bytes, got {}", rgba.len()),
            });
        }

        Ok(DecodedVideoFrame {
            width,
            height,
            rgba,
            best_effort_timestamp,
            time_base: self.time_base,
        })
    }
}

/// Decodes the full-size frame at-or-after `at_seconds`.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::decode_video_frame_at_seconds;
///
/// let frame = decode_video_frame_at_seconds("sample.mp4", 0.5)
///     .expect("decode should succeed");
/// assert!(!frame.rgba.is_empty());
/// ```
pub fn decode_video_frame_at_seconds(
    path: impl AsRef<Path>,
    at_seconds: f64,
) -> Result<DecodedVideoFrame> {
    if !at_seconds.is_finite() || at_seconds < 0.0 {
        return Err(MediaFfmpegError::InvalidTimestampSeconds(at_seconds));
    }
    ThumbnailSource::open(path)?.decode_at(at_seconds, None)
}

/// Fits `width`x`height` inside `max_width`x`max_height`, keeping the aspect
/// ratio and never scaling up.
///
/// # Example
/// ```
/// use media_ffmpeg::fit_within;
///
/// assert_eq!(fit_within(1280, 720, 142, 80).expect("valid"), (142, 80));
/// assert_eq!(fit_within(100, 50, 142, 80).expect("valid"), (100, 50));
/// ```
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Result<(u32, u32)> {
    if max_width == 0 || max_height == 0 {
        return Err(MediaFfmpegError::InvalidThumbnailSize {
            width: max_width,
            height: max_height,
        });
    }
    if width <= max_width && height <= max_height {
        return Ok((width, height));
    }

    let factor = (f64::from(max_width) / f64::from(width)).min(f64::from(max_height) / f64::from(height));
    let scaled_width = (f64::from(width) * factor).round().max(1.0) as u32;
    let scaled_height = (f64::from(height) * factor).round().max(1.0) as u32;
    Ok((scaled_width.min(max_width), scaled_height.min(max_height)))
}

fn read_video_best_effort_timestamps(path: &Path) -> Result<Vec<i64>> {
    let stdout = run_ffprobe(
        path,
        &[
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_frames",
            "-show_entries",
            "frame=best_effort_timestamp",
            "-of",
            "csv=p=0",
        ],
        "ffprobe show_frames",
    )?;

    let mut timestamps = Vec::new();
    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        let Some(raw_ts) = line.split(',').next() else {
            continue;
        };
        if raw_ts.is_empty() || raw_ts == "N/A" {
            continue;
        }
        let ts = raw_ts.parse::<i64>().map_err(|_| MediaFfmpegError::Parse {
            context: "best_effort_timestamp",
            value: raw_ts.to_string(),
        })?;
        timestamps.push(ts);
    }
    timestamps.sort_unstable();
    Ok(timestamps)
}

fn select_timestamp_at_or_after(timestamps: &[i64], target: i64) -> Option<i64> {
    let index = timestamps.partition_point(|timestamp| *timestamp < target);
    timestamps
        .get(index)
        .or_else(|| timestamps.last())
        .copied()
}

/// Seconds of input to skip before decoding toward `timestamp`.
///
/// Measured from the first frame and backed off by
/// [`INPUT_SEEK_MARGIN_SECS`] so the demuxer lands on a keyframe before the
/// target.
fn input_seek_seconds(time_base: Rational, first_timestamp: i64, timestamp: i64) -> f64 {
    let offset = time_base.seconds_from_ticks(timestamp.saturating_sub(first_timestamp));
    (offset - INPUT_SEEK_MARGIN_SECS).max(0.0)
}

fn render_rgba_frame(
    path: &Path,
    timestamp: i64,
    seek_from: f64,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let filter = format!("select=gte(pts\\,{timestamp}),scale={width}:{height},format=rgba");
    // -copyts keeps source pts so the select filter still matches after seeking.
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-v", "error", "-noaccurate_seek", "-copyts", "-ss"])
        .arg(format!("{seek_from:.3}"))
        .arg("-i")
        .arg(path)
        .args(["-vf", &filter, "-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffmpeg render frame",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffmpeg render frame {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}
