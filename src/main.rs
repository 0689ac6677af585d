//! Bullpen - per-environment secrets synced with a policy-scoped store.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bullpen::cli::output;
use bullpen::cli::{execute, Cli};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("BULLPEN_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("bullpen=debug")
        } else {
            EnvFilter::new("bullpen=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, cli.globals) {
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
