use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use squash_fs::WorkDir;
use squash_platform::resolve_executable;

use crate::cli::app::CheckArg;

pub fn run(config_file: Option<&Path>, arg: CheckArg) -> Result<ExitCode> {
    let config = super::load_config(config_file, &arg.overrides)?;

    let compressor = resolve_executable(&config.compressor)
        .with_context(|| format!("compressor '{}' is not usable", config.compressor.display()))?;
    if !compressor.is_file() {
        anyhow::bail!("compressor '{}' does not exist", compressor.display());
    }
    let workdir = WorkDir::open(&config.work_dir)?;

    println!("work_dir    {}", workdir.path().display());
    println!("compressor  {}", compressor.display());
    match config.timeout_secs {
        Some(secs) => println!("timeout     {secs}s"),
        None => println!("timeout     none"),
    }
    if config.allowed_extensions.is_empty() {
        println!("allowed     any");
    } else {
        println!("allowed     {}", config.allowed_extensions.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}
