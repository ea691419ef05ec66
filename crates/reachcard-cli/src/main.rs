//! reachcard CLI - resolve, validate and simulate sound card descriptions.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reachcard")]
#[command(author, version, about = "AudioReach sound card topology tool", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a card description and print its link table
    Resolve(commands::resolve::ResolveArgs),

    /// Check a card description for problems
    Validate(commands::validate::ValidateArgs),

    /// Run every link through a full session on mock hardware
    Simulate(commands::simulate::SimulateArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
    }
}
