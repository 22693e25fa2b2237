use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod display;

/// Environment variable for configuring the log filter.
const LOG_ENV: &str = "PC98_MBR_LOG";

/// Initialize logging to `stderr`, filtered according to [`LOG_ENV`].
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .event_format(format)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    ExitCode::from(cli::run(std::env::args_os()))
}
