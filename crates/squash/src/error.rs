use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while setting up an orchestrator, before any request runs.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error("compressor path is empty")]
    EmptyCompressor,

    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("invalid allowed extension '{0}'")]
    InvalidExtension(String),

    #[error(transparent)]
    WorkDir(#[from] squash_fs::Error),
}
