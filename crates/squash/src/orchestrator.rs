//! The compress-one-file workflow.
//!
//! Stage the upload, run the compressor exactly once, read back its output,
//! and classify whatever went wrong. Staged files are removed on every path
//! out of [`Orchestrator::compress`].

use std::time::Duration;

use squash_fs::{OUTPUT_SUFFIX, StagedFile, WorkDir, sanitize_file_name};
use squash_platform::{CancelToken, RunControl, Termination};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::outcome::{CompressionOutcome, Compressed, Failure};
use crate::request::{CompressionRequest, Source};
use crate::runner::{CompressorRunner, ProcessRunner};

/// Runs compression requests against one working directory and compressor.
///
/// Holds no per-request state, so one instance can serve concurrent calls
/// from many threads.
#[derive(Debug)]
pub struct Orchestrator<R = ProcessRunner> {
    workdir: WorkDir,
    runner: R,
    timeout: Option<Duration>,
    allowed_extensions: Vec<String>,
}

impl Orchestrator<ProcessRunner> {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let workdir = WorkDir::open(&config.work_dir)?;
        let mut orchestrator = Self::new(workdir, ProcessRunner::new(&config.compressor))
            .allowed_extensions(config.allowed_extensions.clone());
        if let Some(timeout) = config.timeout() {
            orchestrator = orchestrator.timeout(timeout);
        }
        Ok(orchestrator)
    }
}

impl<R: CompressorRunner> Orchestrator<R> {
    pub fn new(workdir: WorkDir, runner: R) -> Self {
        Self {
            workdir,
            runner,
            timeout: None,
            allowed_extensions: Vec::new(),
        }
    }

    /// Kill the compressor when it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Only accept names with one of these extensions (case-insensitive,
    /// without the dot). Empty accepts any name.
    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn compress(&self, request: CompressionRequest) -> CompressionOutcome {
        self.compress_inner(request, None)
    }

    /// Like [`compress`](Self::compress), but `cancel` may stop the
    /// compressor from another thread. Staged files are still removed.
    pub fn compress_with(
        &self,
        request: CompressionRequest,
        cancel: &CancelToken,
    ) -> CompressionOutcome {
        self.compress_inner(request, Some(cancel))
    }

    fn compress_inner(
        &self,
        request: CompressionRequest,
        cancel: Option<&CancelToken>,
    ) -> CompressionOutcome {
        let name = request.name().to_string();
        let result = self.run(request, cancel);
        match &result {
            Ok(done) => info!(
                name = %name,
                output_bytes = done.output.len(),
                "compression succeeded"
            ),
            Err(failure) => warn!(
                name = %name,
                kind = %failure.kind(),
                error = %failure,
                "compression failed"
            ),
        }
        result.into()
    }

    fn run(
        &self,
        request: CompressionRequest,
        cancel: Option<&CancelToken>,
    ) -> std::result::Result<Compressed, Failure> {
        let (name, source) = request.into_parts();

        let safe_name =
            sanitize_file_name(&name).map_err(|e| Failure::InvalidInput(e.to_string()))?;
        self.check_extension(&safe_name)?;

        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Failure::Cancelled);
        }

        let staged = self.stage(source, &name)?;
        let compressed = self.invoke(&staged, cancel);
        // Bytes are in memory (or the request failed); remove both files now.
        staged.cleanup();
        compressed
    }

    fn check_extension(&self, safe_name: &str) -> std::result::Result<(), Failure> {
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }
        let ext = safe_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if self.allowed_extensions.contains(&ext) {
            Ok(())
        } else {
            Err(Failure::InvalidInput(format!(
                "file type '{ext}' is not accepted (allowed: {})",
                self.allowed_extensions.join(", ")
            )))
        }
    }

    fn stage(&self, source: Source, name: &str) -> std::result::Result<StagedFile, Failure> {
        let staged = match source {
            Source::Bytes(bytes) => self.workdir.stage(&mut bytes.as_slice(), name),
            Source::Reader(mut reader) => self.workdir.stage(&mut reader, name),
        };
        staged.map_err(|e| match e {
            squash_fs::Error::InvalidName { .. } => Failure::InvalidInput(e.to_string()),
            other => Failure::Staging(other),
        })
    }

    fn invoke(
        &self,
        staged: &StagedFile,
        cancel: Option<&CancelToken>,
    ) -> std::result::Result<Compressed, Failure> {
        // Without a token or deadline the runner can block in a plain wait.
        let mut control = RunControl::new();
        if let Some(cancel) = cancel {
            control = control.cancel_token(cancel.clone());
        }
        if let Some(timeout) = self.timeout {
            control = control.timeout(timeout);
        }

        debug!(
            request_id = %staged.id(),
            input = %staged.input_path().display(),
            output = %staged.output_path().display(),
            "invoking compressor"
        );
        let process = self
            .runner
            .run(staged.input_path(), staged.output_path(), &control)
            .map_err(|e| {
                if e.is_launch_failure() {
                    Failure::Launch(e)
                } else {
                    Failure::Wait(e)
                }
            })?;

        match process.termination {
            Termination::Exited(0) => {}
            Termination::Exited(code) => {
                return Err(Failure::Compressor {
                    exit_code: Some(code),
                    signal: None,
                    stdout: process.stdout,
                    stderr: process.stderr,
                });
            }
            Termination::Signaled(signal) => {
                return Err(Failure::Compressor {
                    exit_code: None,
                    signal,
                    stdout: process.stdout,
                    stderr: process.stderr,
                });
            }
            Termination::TimedOut => {
                return Err(Failure::TimedOut {
                    after: self.timeout.unwrap_or_default(),
                    stderr: process.stderr,
                });
            }
            Termination::Cancelled => return Err(Failure::Cancelled),
        }

        let Some(output) = staged.read_output()? else {
            return Err(Failure::ContractViolation {
                expected: staged.output_path().to_path_buf(),
                stdout: process.stdout,
                stderr: process.stderr,
            });
        };

        debug!(
            request_id = %staged.id(),
            input_bytes = staged.size(),
            output_bytes = output.len(),
            "read compressor output"
        );
        Ok(Compressed {
            output,
            stdout: process.stdout,
            file_name: format!("{}{OUTPUT_SUFFIX}", staged.name()),
        })
    }
}
