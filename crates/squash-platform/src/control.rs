use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared flag a caller flips to stop a running child process.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long a child may run and who may stop it early.
///
/// The default waits forever and cannot be cancelled.
#[derive(Clone, Debug)]
pub struct RunControl {
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
    poll_interval: Duration,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            timeout: None,
            cancel: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Neither a deadline nor a token: a plain blocking wait suffices.
    pub fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.cancel.is_none()
    }
}
