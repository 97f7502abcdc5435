pub use command::{Command, ProcessOutput, Termination};
pub use control::{CancelToken, RunControl};
pub use error::{Error, Result};
pub use executable::resolve_executable;

pub mod command;
pub mod control;
mod error;
mod executable;
