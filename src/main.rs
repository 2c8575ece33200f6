use clap::Parser;
use colored::Colorize;

use zenmosaic::cli::{self, Cli};

fn main() {
    // Debug output goes through tracing; user-facing messages stay on the
    // CLI helpers. RUST_LOG=zenmosaic=debug surfaces stage diagnostics.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
