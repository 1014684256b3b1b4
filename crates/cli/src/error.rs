use std::fmt::{Display, Formatter};

use scrubber::ScrubError;

/// Result type used by the `scrub` binary.
pub type Result<T> = std::result::Result<T, CliError>;

/// Failures that end a `scrub` run.
#[derive(Debug)]
pub enum CliError {
    Args(pico_args::Error),
    InvalidArgument { flag: &'static str, reason: String },
    UnexpectedArgument(String),
    Scrub(ScrubError),
    /// The media worker stopped before the run finished.
    WorkerDisconnected,
    Timeout { waiting_for: &'static str },
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Args(err) => write!(f, "invalid arguments: {err}"),
            Self::InvalidArgument { flag, reason } => write!(f, "invalid {flag}: {reason}"),
            Self::UnexpectedArgument(arg) => write!(f, "unexpected argument: {arg}"),
            Self::Scrub(err) => write!(f, "{err}"),
            Self::WorkerDisconnected => write!(f, "media worker stopped unexpectedly"),
            Self::Timeout { waiting_for } => write!(f, "timed out waiting for {waiting_for}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Args(err) => Some(err),
            Self::Scrub(err) => Some(err),
            _ => None,
        }
    }
}

impl From<pico_args::Error> for CliError {
    fn from(value: pico_args::Error) -> Self {
        Self::Args(value)
    }
}

impl From<ScrubError> for CliError {
    fn from(value: ScrubError) -> Self {
        Self::Scrub(value)
    }
}
