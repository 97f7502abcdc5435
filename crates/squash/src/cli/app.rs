use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "squash",
    version = env!("CARGO_PKG_VERSION"),
    about,
    long_about = None,
    propagate_version = true
)]
pub struct App {
    /// Configuration file; replaces the default `squash.toml` lookup.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Compress one file with the external compressor.
    #[command(alias = "c", name = "compress")]
    Compress(CompressArg),
    /// Validate configuration and locate the compressor.
    #[command(name = "check")]
    Check(CheckArg),
}

/// Settings that, when given on the command line, win over every other
/// configuration layer.
#[derive(Clone, Debug, Default, Args, Serialize)]
pub struct Overrides {
    /// Compressor executable.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressor: Option<PathBuf>,

    /// Working directory for staged files.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,

    /// Kill the compressor after this many seconds.
    #[arg(long = "timeout", value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Accepted file extensions, comma separated.
    #[arg(long = "allow", value_name = "EXT", value_delimiter = ',')]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct CompressArg {
    /// File to compress.
    pub file: PathBuf,

    /// Name to present to the compressor; defaults to the file's own name.
    #[arg(long)]
    pub name: Option<String>,

    /// Where to write the result; defaults to `<name>.compressed`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print failures as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Clone, Debug, Args)]
pub struct CheckArg {
    #[command(flatten)]
    pub overrides: Overrides,
}
