//! UniTex CLI - Command-line interface for Unity texture tools

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "unitex")]
#[command(version, about = "UniTex: Unity Texture2D tools for .assets and .bundle files", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Run the UniTex CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    cli.command.execute()?;

    Ok(())
}
