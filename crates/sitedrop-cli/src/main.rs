//! Sitedrop CLI - Command-line front end for sandboxed static site
//! deployment.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    init_logging(cli.log_level.as_deref(), cli.verbose);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let show_progress = !cli.quiet && !cli.json;

    match &cli.command {
        cli::Commands::Deploy(args) => commands::deploy::execute(args, &*formatter, show_progress),
        cli::Commands::Inspect(args) => commands::inspect::execute(args, &*formatter),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `--log-level` wins over `RUST_LOG`; without either, only warnings are
/// shown (`info` with `--verbose`).
fn init_logging(log_level: Option<&str>, verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = log_level
        .map(EnvFilter::try_new)
        .and_then(std::result::Result::ok)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
