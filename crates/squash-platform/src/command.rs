use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, warn};

use crate::control::RunControl;
use crate::error::{Error, Result};

/// How a launched child process came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own with this code.
    Exited(i32),
    /// Killed by a signal it did not ask for (unix only). Carries the signal
    /// number when known.
    Signaled(Option<i32>),
    /// Killed because the deadline in [`RunControl`] passed.
    TimedOut,
    /// Killed because the caller's cancel token fired.
    Cancelled,
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Self::Signaled(status.signal())
        }
        #[cfg(not(unix))]
        {
            Self::Signaled(None)
        }
    }
}

/// Everything observed from a child that was successfully launched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutput {
    pub termination: Termination,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.termination == Termination::Exited(0)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited(code) => Some(code),
            _ => None,
        }
    }
}

/// A child process invocation. Arguments are handed to the OS as a discrete
/// list and are never interpreted by a shell.
#[derive(Debug)]
pub struct Command {
    inner: StdCommand,
    program: PathBuf,
}

impl Command {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            inner: StdCommand::new(&program),
            program,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    /// Launch the child, capture both streams as text and wait for it to end.
    ///
    /// `Err(Error::Launch)` means the child never started. Once it has
    /// started, every ending (including timeout and cancellation, which kill
    /// the child) is reported through [`ProcessOutput::termination`].
    ///
    /// On unix a bounded run puts the child in its own process group, and a
    /// timeout or cancellation kills the whole group, so helpers the child
    /// forked cannot keep the output pipes open.
    pub fn run(mut self, control: &RunControl) -> Result<ProcessOutput> {
        #[cfg(unix)]
        if !control.is_unbounded() {
            use std::os::unix::process::CommandExt;
            self.inner.process_group(0);
        }

        let mut child = self
            .inner
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Launch {
                cmd: self.program.clone(),
                source: e,
            })?;
        debug!(cmd = %self.program.display(), pid = child.id(), "launched child process");

        let stdout = drain(child.stdout.take(), "stdout");
        let stderr = drain(child.stderr.take(), "stderr");

        let termination = if control.is_unbounded() {
            child.wait().map(Termination::from)
        } else {
            wait_controlled(&mut child, control)
        }
        .map_err(|e| {
            kill_and_reap(&mut child, !control.is_unbounded());
            Error::Wait {
                cmd: self.program.clone(),
                source: e,
            }
        })?;

        let output = ProcessOutput {
            termination,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };
        debug!(
            cmd = %self.program.display(),
            termination = ?output.termination,
            "child process finished"
        );
        Ok(output)
    }
}

fn wait_controlled(child: &mut Child, control: &RunControl) -> std::io::Result<Termination> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.into());
        }
        if control.is_cancelled() {
            kill_and_reap(child, true);
            return Ok(Termination::Cancelled);
        }
        if let Some(timeout) = control.get_timeout() {
            if started.elapsed() >= timeout {
                warn!(pid = child.id(), ?timeout, "child process exceeded its deadline");
                kill_and_reap(child, true);
                return Ok(Termination::TimedOut);
            }
        }
        thread::sleep(control.get_poll_interval());
    }
}

fn kill_and_reap(child: &mut Child, own_group: bool) {
    #[cfg(unix)]
    if own_group {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        // The group id equals the leader's pid, which stays reserved until
        // the wait below reaps it.
        if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
            debug!(pid = child.id(), error = %e, "failed to signal process group");
        }
    }
    #[cfg(not(unix))]
    let _ = own_group;

    // Fails only when the child already exited, which the wait below handles.
    let _ = child.kill();
    if let Err(e) = child.wait() {
        warn!(pid = child.id(), error = %e, "failed to reap child process");
    }
}

fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
    stream: &'static str,
) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                warn!(stream, error = %e, bytes = buf.len(), "captured output is incomplete");
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
