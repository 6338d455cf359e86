//! CLI entry point for the tiling parameter search

use clap::Parser;
use tilesolve::io::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> tilesolve::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_unset| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    cli.run(&mut stdout.lock())?;
    Ok(())
}
