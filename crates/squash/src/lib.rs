//! squash: stage an uploaded file, run an external compressor on it, and hand
//! back either the compressed bytes or a classified failure.
//!
//! ```rust,no_run
//! use squash::{CompressionRequest, Config, Orchestrator};
//!
//! let config = Config::load(None)?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let outcome = orchestrator.compress(CompressionRequest::new("notes.txt", b"hello".to_vec()));
//! match outcome.into_result() {
//!     Ok(done) => println!("{} bytes as {}", done.output.len(), done.file_name),
//!     Err(failure) => eprintln!("error[{}]: {failure}", failure.kind()),
//! }
//! # Ok::<(), squash::Error>(())
//! ```

pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use outcome::{CompressionOutcome, Compressed, Failure, FailureKind, FailureReport};
pub use request::{CompressionRequest, Source};
pub use runner::{CompressorRunner, ProcessRunner};

pub use squash_platform::{CancelToken, ProcessOutput, RunControl, Termination};

pub mod config;
mod error;
mod orchestrator;
mod outcome;
mod request;
mod runner;
