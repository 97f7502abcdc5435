use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid file name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// True when the underlying I/O error reports a missing path.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::CreateDir { source, .. }
            | Self::Write { source, .. }
            | Self::Read { source, .. }
            | Self::Remove { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::InvalidName { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
