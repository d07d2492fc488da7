//! meta-trace CLI - Off-policy prediction experiments with adaptive traces
//!
//! This CLI provides a unified interface for:
//! - Training true-online GTD(λ) with a fixed λ
//! - Training with meta-trace adaptation of λ(x)
//! - Exporting learning curves and run summaries

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "meta-trace")]
#[command(version, about = "Off-policy prediction with adaptive eligibility traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a random-walk prediction experiment
    Train(Box<meta_trace::cli::commands::train::TrainArgs>),
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => meta_trace::cli::commands::train::execute(*args),
    }
}
