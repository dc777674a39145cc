use clap::Parser;
use tasklane::cli::commands::Cli;
use tasklane::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `TL_LOG=debug`)
const LOG_ENV: &str = "TL_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
