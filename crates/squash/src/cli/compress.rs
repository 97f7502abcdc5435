use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use squash::{CompressionOutcome, CompressionRequest, FailureKind, Orchestrator};
use squash_fs::{AtomicWriteOptions, atomic_write_from};
use tracing::info;

use crate::cli::app::CompressArg;

pub fn run(config_file: Option<&Path>, arg: CompressArg) -> Result<ExitCode> {
    let config = super::load_config(config_file, &arg.overrides)?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let name = match arg.name {
        Some(name) => name,
        None => arg
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("'{}' has no file name", arg.file.display()))?,
    };
    let file = File::open(&arg.file)
        .with_context(|| format!("failed to open '{}'", arg.file.display()))?;

    match orchestrator.compress(CompressionRequest::from_reader(name, file)) {
        CompressionOutcome::Success(done) => {
            let dest = arg.output.unwrap_or_else(|| PathBuf::from(&done.file_name));
            atomic_write_from(&dest, &mut done.output.as_slice(), AtomicWriteOptions::new())
                .with_context(|| format!("failed to write '{}'", dest.display()))?;
            if !done.stdout.is_empty() {
                print!("{}", done.stdout);
            }
            info!(path = %dest.display(), bytes = done.output.len(), "wrote compressed file");
            Ok(ExitCode::SUCCESS)
        }
        CompressionOutcome::Failure(failure) => {
            if arg.json {
                println!("{}", serde_json::to_string_pretty(&failure.report())?);
            } else {
                eprintln!("error[{}]: {failure}", failure.kind());
                // Compressor errors already carry stderr in their message.
                if failure.kind() != FailureKind::CompressorError {
                    if let Some(stderr) = failure.stderr().filter(|s| !s.trim().is_empty()) {
                        eprintln!("{}", stderr.trim_end());
                    }
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
