use std::path::{Path, PathBuf};

use squash_platform::{Command, ProcessOutput, RunControl, resolve_executable};

/// The seam between the orchestrator and the external compressor.
///
/// Implementations run the compressor once as `<compressor> <input>
/// <output>`. Any error returned means the compressor never started.
pub trait CompressorRunner: Send + Sync {
    fn run(
        &self,
        input: &Path,
        output: &Path,
        control: &RunControl,
    ) -> squash_platform::Result<ProcessOutput>;
}

impl<F> CompressorRunner for F
where
    F: Fn(&Path, &Path, &RunControl) -> squash_platform::Result<ProcessOutput> + Send + Sync,
{
    fn run(
        &self,
        input: &Path,
        output: &Path,
        control: &RunControl,
    ) -> squash_platform::Result<ProcessOutput> {
        self(input, output, control)
    }
}

/// Runs a real executable as a child process.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    executable: PathBuf,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl CompressorRunner for ProcessRunner {
    fn run(
        &self,
        input: &Path,
        output: &Path,
        control: &RunControl,
    ) -> squash_platform::Result<ProcessOutput> {
        let program = resolve_executable(&self.executable)?;
        Command::new(program).arg(input).arg(output).run(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squash_platform::{Error, Termination};

    #[test]
    fn test_missing_executable_fails_to_launch() {
        let runner = ProcessRunner::new("/nonexistent/bin/compress");
        let err = runner
            .run(Path::new("in"), Path::new("out"), &RunControl::new())
            .unwrap_err();
        assert!(matches!(err, Error::Launch { .. }));
    }

    #[test]
    fn test_closure_runner() {
        let runner = |input: &Path, output: &Path, _: &RunControl| {
            Ok::<_, Error>(ProcessOutput {
                termination: Termination::Exited(0),
                stdout: format!("{} -> {}", input.display(), output.display()),
                stderr: String::new(),
            })
        };
        let out = CompressorRunner::run(&runner, Path::new("a"), Path::new("b"), &RunControl::new())
            .unwrap();
        assert_eq!(out.stdout, "a -> b");
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_with_positional_paths() {
        let runner = ProcessRunner::new("echo");
        let out = runner
            .run(Path::new("/w/in.txt"), Path::new("/w/in.txt.compressed"), &RunControl::new())
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "/w/in.txt /w/in.txt.compressed\n");
    }
}
