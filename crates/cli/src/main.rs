mod asset;
mod bridge;
mod error;
mod host;
mod player;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use scrubber::ScrubberConfig;

use error::{CliError, Result};
use host::{Scenario, ScrubHost};

const USAGE: &str = "\
Usage: scrub <VIDEO> [--config FILE] [--play SECS] [--scrub S1,S2,...] [--tick-hz N]

Loads the film strip for VIDEO, optionally plays it for SECS seconds, then
drags the strip to each scrub position in turn.";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
struct Args {
    video: PathBuf,
    config: Option<PathBuf>,
    play_secs: Option<f64>,
    scrub: Vec<f64>,
    tick_hz: Option<u32>,
}

fn main() -> ExitCode {
    init_tracing();

    let mut raw = pico_args::Arguments::from_env();
    if raw.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match parse_args(raw).and_then(run) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("scrub: {error}");
            if matches!(
                error,
                CliError::Args(_)
                    | CliError::InvalidArgument { .. }
                    | CliError::UnexpectedArgument(_)
            ) {
                eprintln!("{USAGE}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn run(args: Args) -> Result<String> {
    let mut config = match &args.config {
        Some(path) => ScrubberConfig::load(path)?,
        None => ScrubberConfig::default(),
    };
    if let Some(tick_hz) = args.tick_hz {
        config.time_update_hz = tick_hz;
        config.validate()?;
    }

    let scenario = Scenario {
        video: args.video,
        play_for: args.play_secs.map(Duration::from_secs_f64),
        scrub_targets: args.scrub,
    };
    let summary = ScrubHost::new(config)?.run(&scenario)?;
    Ok(summary.report())
}

fn parse_args(mut raw: pico_args::Arguments) -> Result<Args> {
    let config = raw.opt_value_from_os_str("--config", |value| {
        Ok::<_, std::convert::Infallible>(PathBuf::from(value))
    })?;
    let play_secs = raw
        .opt_value_from_fn("--play", parse_seconds)
        .map_err(|err| invalid("--play", err))?;
    let scrub = raw
        .opt_value_from_fn("--scrub", parse_seconds_list)
        .map_err(|err| invalid("--scrub", err))?
        .unwrap_or_default();
    let tick_hz = raw.opt_value_from_str("--tick-hz")?;

    let mut free = raw.finish().into_iter();
    let video = free.next().map(PathBuf::from).ok_or(CliError::Args(
        pico_args::Error::MissingArgument,
    ))?;
    if let Some(extra) = free.next() {
        return Err(CliError::UnexpectedArgument(
            extra.to_string_lossy().into_owned(),
        ));
    }

    Ok(Args {
        video,
        config,
        play_secs,
        scrub,
        tick_hz,
    })
}

fn invalid(flag: &'static str, err: pico_args::Error) -> CliError {
    match err {
        pico_args::Error::Utf8ArgumentParsingFailed { cause, .. } => {
            CliError::InvalidArgument { flag, reason: cause }
        }
        other => CliError::Args(other),
    }
}

fn parse_seconds(value: &str) -> std::result::Result<f64, String> {
    let seconds = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("{value:?} is not a number of seconds ({err})"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("{value:?} must be a non-negative number of seconds"));
    }
    Ok(seconds)
}

fn parse_seconds_list(value: &str) -> std::result::Result<Vec<f64>, String> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_seconds)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use super::{Args, parse_args, parse_seconds_list};
    use crate::error::CliError;

    fn args_from(values: &[&str]) -> pico_args::Arguments {
        pico_args::Arguments::from_vec(values.iter().map(OsString::from).collect())
    }

    #[test]
    fn parses_all_flags() {
        let args = parse_args(args_from(&[
            "--config",
            "scrub.json",
            "--play",
            "2.5",
            "--scrub",
            "1,7.5,3",
            "--tick-hz",
            "60",
            "clip.mp4",
        ]))
        .expect("valid arguments");

        assert_eq!(
            args,
            Args {
                video: PathBuf::from("clip.mp4"),
                config: Some(PathBuf::from("scrub.json")),
                play_secs: Some(2.5),
                scrub: vec![1.0, 7.5, 3.0],
                tick_hz: Some(60),
            }
        );
    }

    #[test]
    fn video_is_required() {
        let err = parse_args(args_from(&["--play", "1"])).expect_err("missing video must fail");

        assert!(matches!(err, CliError::Args(_)));
    }

    #[test]
    fn second_video_path_is_rejected() {
        let err = parse_args(args_from(&["clip.mp4", "other.mp4"]))
            .expect_err("extra positional argument must fail");

        assert!(matches!(err, CliError::UnexpectedArgument(arg) if arg == "other.mp4"));
    }

    #[test]
    fn negative_scrub_positions_are_rejected() {
        let err = parse_args(args_from(&["--scrub", "1,-2", "clip.mp4"]))
            .expect_err("negative position must fail");

        assert!(matches!(err, CliError::InvalidArgument { flag: "--scrub", .. }));
    }

    #[test]
    fn scrub_list_skips_empty_entries() {
        assert_eq!(parse_seconds_list("4,,8,").expect("valid list"), vec![4.0, 8.0]);
    }
}
