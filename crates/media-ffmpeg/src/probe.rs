use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{MediaFfmpegError, Result};
use crate::time::Rational;

/// Stream kind discovered by probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

/// Stream metadata read from `ffprobe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: u32,
    pub kind: StreamKind,
    pub codec_name: Option<String>,
    pub time_base: Rational,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_ts: Option<i64>,
}

/// Media probe result.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub streams: Vec<StreamInfo>,
    pub duration_seconds: Option<f64>,
}

impl MediaInfo {
    /// Returns the first video stream.
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|stream| stream.kind == StreamKind::Video)
    }

    /// Container duration, falling back to the longest stream duration.
    pub fn duration(&self) -> Option<f64> {
        if let Some(seconds) = self.duration_seconds {
            return Some(seconds);
        }

        self.streams
            .iter()
            .filter_map(|stream| {
                stream
                    .duration_ts
                    .map(|ticks| stream.time_base.seconds_from_ticks(ticks))
            })
            .reduce(f64::max)
    }

    /// Returns true when the first video stream has a known decoder and
    /// non-zero dimensions, so frames can be rendered from it.
    ///
    /// # Example
    /// ```
    /// use std::path::PathBuf;
    ///
    /// use media_ffmpeg::{MediaInfo, Rational, StreamInfo, StreamKind};
    ///
    /// let info = MediaInfo {
    ///     path: PathBuf::from("clip.mp4"),
    ///     streams: vec![StreamInfo {
    ///         index: 0,
    ///         kind: StreamKind::Video,
    ///         codec_name: Some("h264".to_string()),
    ///         time_base: Rational::new(1, 15_360).expect("valid"),
    ///         width: Some(1280),
    ///         height: Some(720),
    ///         duration_ts: None,
    ///     }],
    ///     duration_seconds: Some(23.0),
    /// };
    /// assert!(info.is_playable());
    /// ```
    pub fn is_playable(&self) -> bool {
        let Some(video) = self.first_video() else {
            return false;
        };
        let has_codec = video
            .codec_name
            .as_deref()
            .is_some_and(|codec| !codec.is_empty());
        let has_size = matches!((video.width, video.height), (Some(w), Some(h)) if w > 0 && h > 0);
        has_codec && has_size
    }
}

/// Probes a media file via `ffprobe`.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::probe_media;
///
/// let info = probe_media("sample.mp4").expect("probe should succeed");
/// assert!(!info.streams.is_empty());
/// ```
pub fn probe_media(path: impl AsRef<Path>) -> Result<MediaInfo> {
    let path = path.as_ref();

    let stdout = run_ffprobe(
        path,
        &[
            "-v",
            "error",
            "-show_entries",
            "stream=index,codec_type,codec_name,time_base,width,height,duration_ts",
            "-of",
            "compact=p=0:nk=0",
        ],
        "ffprobe stream probe",
    )?;

    let streams = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_stream_line)
        .collect::<Result<Vec<_>>>()?;

    if streams.is_empty() {
        return Err(MediaFfmpegError::Parse {
            context: "streams",
            value: "no streams found".to_string(),
        });
    }

    let duration_seconds = probe_duration_seconds(path)?;
    Ok(MediaInfo {
        path: path.to_path_buf(),
        streams,
        duration_seconds,
    })
}

pub(crate) fn run_ffprobe(path: &Path, args: &[&str], context: &'static str) -> Result<String> {
    let output = Command::new("ffprobe")
        .args(args)
        .arg(path)
        .output()
        .map_err(|source| MediaFfmpegError::Io { context, source })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("{context}: ffprobe {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8(output.stdout)?)
}

fn parse_stream_line(line: &str) -> Result<StreamInfo> {
    let mut map = HashMap::<&str, &str>::new();
    for field in line.split('|') {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| MediaFfmpegError::Parse {
                context: "stream field",
                value: field.to_string(),
            })?;
        map.insert(key.trim(), value.trim().trim_matches('"'));
    }

    let kind = match map.get("codec_type").copied() {
        Some("video") => StreamKind::Video,
        Some("audio") => StreamKind::Audio,
        Some(_) => StreamKind::Other,
        None => {
            return Err(MediaFfmpegError::Parse {
                context: "codec_type",
                value: line.to_string(),
            });
        }
    };

    let index = parse_field::<u32>(map.get("index").copied(), "stream index")?.ok_or_else(|| {
        MediaFfmpegError::Parse {
            context: "stream index",
            value: line.to_string(),
        }
    })?;
    let time_base = match map.get("time_base").copied() {
        Some(raw) if !is_unset(raw) && raw != "0/0" => Rational::parse(raw)?,
        _ => {
            return Err(MediaFfmpegError::Parse {
                context: "time_base",
                value: line.to_string(),
            });
        }
    };

    Ok(StreamInfo {
        index,
        kind,
        codec_name: map
            .get("codec_name")
            .filter(|value| !is_unset(value))
            .map(|value| value.to_string()),
        time_base,
        width: parse_field(map.get("width").copied(), "width")?,
        height: parse_field(map.get("height").copied(), "height")?,
        duration_ts: parse_field(map.get("duration_ts").copied(), "duration_ts")?,
    })
}

fn probe_duration_seconds(path: &Path) -> Result<Option<f64>> {
    let stdout = run_ffprobe(
        path,
        &[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=nokey=1:noprint_wrappers=1",
        ],
        "ffprobe duration probe",
    )?;

    let value = stdout.trim();
    if is_unset(value) {
        return Ok(None);
    }
    let duration = value.parse::<f64>().map_err(|_| MediaFfmpegError::Parse {
        context: "format duration seconds",
        value: value.to_string(),
    })?;
    Ok(Some(duration))
}

fn parse_field<T: std::str::FromStr>(
    value: Option<&str>,
    context: &'static str,
) -> Result<Option<T>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if is_unset(raw) {
        return Ok(None);
    }

    raw.parse::<T>()
        .map(Some)
        .map_err(|_| MediaFfmpegError::Parse {
            context,
            value: raw.to_string(),
        })
}

fn is_unset(value: &str) -> bool {
    value.is_empty() || value == "N/A"
}
