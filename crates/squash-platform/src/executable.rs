use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Validate a configured executable and turn it into the path to launch.
///
/// A path with a directory component is taken as given; whether it exists is
/// left to launch time so a missing binary surfaces as a launch failure. A bare
/// name is looked up on `PATH`.
pub fn resolve_executable(executable: impl AsRef<Path>) -> Result<PathBuf> {
    let executable = executable.as_ref();
    let display = executable.to_string_lossy();

    if display.trim().is_empty() {
        return Err(Error::EmptyExecutable);
    }
    if display.contains('\0') {
        return Err(Error::InvalidExecutable(display.into_owned()));
    }

    if executable.is_absolute() || executable.components().count() > 1 {
        return Ok(executable.to_path_buf());
    }

    let resolved = which::which(executable).map_err(|source| Error::ExecutableNotFound {
        name: display.into_owned(),
        source,
    })?;
    debug!(name = %executable.display(), path = %resolved.display(), "resolved executable on PATH");
    Ok(resolved)
}
