//! GHA CLI - Command-line interface for Generalized Harmonic Analysis.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gha")]
#[command(author, version, about = "Generalized Harmonic Analysis CLI", long_about = None)]
struct Cli {
    /// Log debug events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the dominant tone of a frame
    Analyze(commands::analyze::AnalyzeArgs),

    /// Extract several tones one after another
    Extract(commands::extract::ExtractArgs),

    /// Decode the two tones of a DTMF frame
    Dtmf(commands::dtmf::DtmfArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Dtmf(args) => commands::dtmf::run(args),
    }
}
