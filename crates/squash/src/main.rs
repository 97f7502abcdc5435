use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::EnvFilter;

use crate::cli::app::App;

mod cli;

const LOG_ENV: &str = "SQUASH_LOG";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let app = App::parse();
    match cli::run(app) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
