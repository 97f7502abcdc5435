use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// The compressed artifact and the compressor's log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compressed {
    pub output: Vec<u8>,
    /// Everything the compressor wrote to stdout.
    pub stdout: String,
    /// Suggested download name, `<sanitized name>.compressed`.
    pub file_name: String,
}

/// Machine-readable failure classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    LaunchError,
    CompressorError,
    ContractViolation,
    IoError,
    TimedOut,
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::LaunchError => "launch_error",
            Self::CompressorError => "compressor_error",
            Self::ContractViolation => "contract_violation",
            Self::IoError => "io_error",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Failure {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("compressor could not be launched: {0}")]
    Launch(#[source] squash_platform::Error),

    #[error("compressor failed ({}): {}", describe_exit(.exit_code, .signal), .stderr.trim())]
    Compressor {
        exit_code: Option<i32>,
        signal: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("compressor exited successfully but wrote no output to '{expected}'")]
    ContractViolation {
        expected: PathBuf,
        stdout: String,
        stderr: String,
    },

    #[error("staging failed: {0}")]
    Staging(#[from] squash_fs::Error),

    #[error("lost track of the compressor process: {0}")]
    Wait(#[source] squash_platform::Error),

    #[error("compressor did not finish within {after:?}")]
    TimedOut { after: Duration, stderr: String },

    #[error("compression was cancelled")]
    Cancelled,
}

fn describe_exit(exit_code: &Option<i32>, signal: &Option<i32>) -> String {
    match (*exit_code, *signal) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(signal)) => format!("killed by signal {signal}"),
        (None, None) => "killed".to_string(),
    }
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::Launch(_) => FailureKind::LaunchError,
            Self::Compressor { .. } => FailureKind::CompressorError,
            Self::ContractViolation { .. } => FailureKind::ContractViolation,
            Self::Staging(_) | Self::Wait(_) => FailureKind::IoError,
            Self::TimedOut { .. } => FailureKind::TimedOut,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Compressor { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Diagnostic text the compressor wrote to stderr, when it ran.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Compressor { stderr, .. }
            | Self::ContractViolation { stderr, .. }
            | Self::TimedOut { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind(),
            message: self.to_string(),
            exit_code: self.exit_code(),
            stderr: self.stderr().map(str::to_string),
        }
    }
}

/// Serializable view of a [`Failure`] for callers outside the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

/// Result of one request: exactly one of the two variants.
#[derive(Debug)]
pub enum CompressionOutcome {
    Success(Compressed),
    Failure(Failure),
}

impl CompressionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind()),
        }
    }

    pub fn into_result(self) -> Result<Compressed, Failure> {
        self.into()
    }
}

impl From<Result<Compressed, Failure>> for CompressionOutcome {
    fn from(result: Result<Compressed, Failure>) -> Self {
        match result {
            Ok(compressed) => Self::Success(compressed),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl From<CompressionOutcome> for Result<Compressed, Failure> {
    fn from(outcome: CompressionOutcome) -> Self {
        match outcome {
            CompressionOutcome::Success(compressed) => Ok(compressed),
            CompressionOutcome::Failure(failure) => Err(failure),
        }
    }
}
