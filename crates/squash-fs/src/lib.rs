//! Private working directory and staging primitives.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Untrusted file name validation and cleanup
//! - `primitives/` - Streamed write-then-rename and buffered read-back
//! - `workdir.rs` - The dedicated directory and per-request staged files

pub use error::{Error, Result};
pub use primitives::{AtomicWriteOptions, atomic_read, atomic_write_from, remove_if_exists};
pub use sanitize::{MAX_NAME_LEN, sanitize_file_name};
pub use workdir::{OUTPUT_SUFFIX, StagedFile, WorkDir};

mod error;
pub mod primitives;
mod sanitize;
mod workdir;
