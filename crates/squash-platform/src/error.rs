use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("executable path is empty")]
    EmptyExecutable,

    #[error("executable path contains a NUL byte: {0:?}")]
    InvalidExecutable(String),

    #[error("executable not found: {name}: {source}")]
    ExecutableNotFound { name: String, source: which::Error },

    #[error("failed to launch '{cmd}': {source}")]
    Launch { cmd: PathBuf, source: std::io::Error },

    #[error("failed while waiting on '{cmd}': {source}")]
    Wait { cmd: PathBuf, source: std::io::Error },
}

impl Error {
    /// True for failures that happened before the child process existed.
    pub fn is_launch_failure(&self) -> bool {
        !matches!(self, Self::Wait { .. })
    }
}
