//! NEATPONG CLI - Command-line interface
//!
//! Commands:
//! - train: Evolve paddle agents with NEAT
//! - play: Play against a trained champion in the terminal
//! - bench: Measure episode throughput

use clap::{Parser, Subcommand};

mod bench;
mod play;
mod train;

#[derive(Parser)]
#[command(name = "neatpong")]
#[command(about = "NEAT-trained Pong paddle agents")]
struct Cli {
    /// RNG seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve paddle agents with NEAT
    Train(train::TrainArgs),
    /// Play against a trained champion
    Play(play::PlayArgs),
    /// Measure episode throughput
    Bench(bench::BenchArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => train::run(args, cli.seed),
        Commands::Play(args) => play::run(args, cli.seed),
        Commands::Bench(args) => bench::run(args, cli.seed),
    }
}
