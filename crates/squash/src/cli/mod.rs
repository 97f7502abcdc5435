use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use figment::providers::Serialized;
use squash::Config;

use crate::cli::app::{App, Commands, Overrides};

pub mod app;
mod check;
mod compress;

pub fn run(app: App) -> Result<ExitCode> {
    match app.cmd {
        Commands::Compress(arg) => compress::run(app.config.as_deref(), arg),
        Commands::Check(arg) => check::run(app.config.as_deref(), arg),
    }
}

/// Defaults, files and environment, with command-line flags layered on top.
fn load_config(file: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let figment = Config::figment(file).merge(Serialized::defaults(overrides));
    Ok(Config::from_figment(figment)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::path::PathBuf;

    #[test]
    fn test_flags_win_over_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("SQUASH_COMPRESSOR", "/env/compress");
            jail.set_env("SQUASH_TIMEOUT_SECS", "10");
            let overrides = Overrides {
                compressor: Some(PathBuf::from("/flag/compress")),
                ..Overrides::default()
            };
            let config = load_config(None, &overrides).unwrap();
            assert_eq!(config.compressor, PathBuf::from("/flag/compress"));
            assert_eq!(config.timeout_secs, Some(10));
            Ok(())
        });
    }
}
