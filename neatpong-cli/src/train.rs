//! Train command - evolve paddle agents with NEAT
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_or_create_population(), run_training(), save_results()
//! - Level 3: evaluate_population(), compile_networks()
//! - Level 4: file I/O, formatting utilities

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};

use neatpong_evolve::{
    load_checkpoint, save_checkpoint, FitnessMap, GenerationStats, Genome, GenomeId, NeatConfig,
    Network, Population,
};
use neatpong_tournament::{evaluate_generation, EpisodeConfig, EvalConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TrainArgs {
    /// Population size
    #[arg(long, default_value = "50")]
    pub population: usize,

    /// Number of generations to run
    #[arg(long, default_value = "100")]
    pub generations: u32,

    /// Left-paddle hit count that ends an episode
    #[arg(long, default_value = "50")]
    pub hit_cap: u32,

    /// Number of elite individuals to preserve per species
    #[arg(long, default_value = "2")]
    pub elitism: usize,

    /// Resume from a population checkpoint
    #[arg(long, value_name = "FILE")]
    pub resume: Option<PathBuf>,

    /// Write a checkpoint every N generations (0 disables)
    #[arg(long, default_value = "1")]
    pub checkpoint_every: u32,

    /// Directory for population checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Output directory for the champion and fitness history
    #[arg(long, default_value = "models")]
    pub output: PathBuf,

    /// Evaluate episodes on one thread instead of the rayon pool
    #[arg(long)]
    pub sequential: bool,

    /// Output final results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Trained champion as stored on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChampionFile {
    /// Winning genome
    pub genome: Genome,
    /// Fitness at the generation it won
    pub fitness: f64,
    /// Generation it was evaluated in
    pub generation: u32,
    /// When training finished
    pub trained_at: DateTime<Utc>,
}

impl ChampionFile {
    /// Load a champion from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read champion: {}", path.display()))?;
        let file = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse champion: {}", path.display()))?;
        Ok(file)
    }

    /// Save a champion as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write champion: {}", path.display()))?;
        Ok(())
    }
}

/// Best genome seen so far during a run
struct ChampionRecord {
    genome: Genome,
    fitness: f64,
    generation: u32,
}

/// Everything a finished run reports
struct TrainingOutcome {
    champion: Option<ChampionRecord>,
    history: Vec<GenerationStats>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run training command
///
/// This function reads like a table of contents:
/// 1. Create or resume the population
/// 2. Run the generation loop
/// 3. Save champion and fitness history
pub fn run(args: TrainArgs, seed: Option<u64>) -> Result<()> {
    let run_seed = seed.unwrap_or_else(rand::random);

    tracing::info!(
        "Starting training: pop={}, gen={}, hit_cap={}, seed={}",
        args.population,
        args.generations,
        args.hit_cap,
        run_seed
    );

    let mut population = load_or_create_population(&args, run_seed)?;
    let outcome = run_training(&mut population, &args, run_seed)?;

    save_results(&outcome, &args)?;

    if args.json {
        print_json_results(&outcome)?;
    } else {
        print_summary(&outcome, &args);
    }

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Resume from a checkpoint or seed a fresh population
fn load_or_create_population(args: &TrainArgs, run_seed: u64) -> Result<Population> {
    match &args.resume {
        Some(path) => {
            let population = load_checkpoint(path)
                .with_context(|| format!("Failed to load checkpoint: {}", path.display()))?;
            tracing::info!(
                "Resumed at generation {} with {} members",
                population.generation(),
                population.size()
            );
            Ok(population)
        }
        None => {
            let mut config = NeatConfig::default().with_population_size(args.population);
            config.elitism = args.elitism;
            Ok(Population::new(config, run_seed))
        }
    }
}

/// Run the generation loop, tracking the best genome ever evaluated
fn run_training(
    population: &mut Population,
    args: &TrainArgs,
    run_seed: u64,
) -> Result<TrainingOutcome> {
    let abort = AtomicBool::new(false);
    let mut history = Vec::with_capacity(args.generations as usize);
    let mut champion: Option<ChampionRecord> = None;

    for _ in 0..args.generations {
        let generation = population.generation();
        let fitness = evaluate_population(population, args, run_seed, &abort);

        let stats = population.stats(&fitness);
        tracing::info!(
            "Generation {}: best={:.3}, mean={:.3}, species={}",
            generation,
            stats.best,
            stats.mean,
            stats.species
        );
        history.push(stats);

        if let Some((id, genome)) = population.champion(&fitness) {
            let best = fitness.get(&id).copied().unwrap_or(0.0);
            if champion.as_ref().map_or(true, |c| best > c.fitness) {
                champion = Some(ChampionRecord {
                    genome: genome.clone(),
                    fitness: best,
                    generation,
                });
            }
        }

        population.reproduce(&fitness);

        if args.checkpoint_every > 0 && population.generation() % args.checkpoint_every == 0 {
            let path = checkpoint_path(&args.checkpoint_dir, population.generation());
            save_checkpoint(population, &path)
                .with_context(|| format!("Failed to write checkpoint: {}", path.display()))?;
            tracing::debug!("Saved checkpoint to {}", path.display());
        }
    }

    Ok(TrainingOutcome { champion, history })
}

/// Save champion and fitness history to the output directory
fn save_results(outcome: &TrainingOutcome, args: &TrainArgs) -> Result<()> {
    std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    match &outcome.champion {
        Some(record) => {
            let file = ChampionFile {
                genome: record.genome.clone(),
                fitness: record.fitness,
                generation: record.generation,
                trained_at: Utc::now(),
            };
            let path = args.output.join("best.json");
            file.save(&path)?;
            tracing::info!("Saved champion to {}", path.display());
        }
        None => {
            tracing::warn!("No champion to save; no generation was evaluated");
        }
    }

    save_fitness_history(&outcome.history, &args.output)?;

    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Evaluate the current generation and return its fitness map
fn evaluate_population(
    population: &Population,
    args: &TrainArgs,
    run_seed: u64,
    abort: &AtomicBool,
) -> FitnessMap {
    let agents = compile_networks(population);
    let config = EvalConfig {
        episode: EpisodeConfig::default().with_hit_cap(args.hit_cap),
        parallel: !args.sequential,
        // The 10000 spacing keeps generations from sharing episode seeds
        base_seed: run_seed.wrapping_add(population.generation() as u64 * 10_000),
    };
    evaluate_generation(&agents, &config, abort)
}

/// Compile every member genome into a feed-forward network
fn compile_networks(population: &Population) -> Vec<(GenomeId, Network)> {
    population
        .members()
        .iter()
        .map(|(id, genome)| (*id, Network::from_genome(genome)))
        .collect()
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Checkpoint file path for a generation
fn checkpoint_path(dir: &Path, generation: u32) -> PathBuf {
    dir.join(format!("neat-checkpoint-{generation}.json"))
}

/// Save fitness history to CSV
fn save_fitness_history(history: &[GenerationStats], output: &Path) -> Result<()> {
    let path = output.join("fitness_history.csv");
    let mut content = String::from("generation,best,mean,species\n");

    for stats in history {
        content.push_str(&format!(
            "{},{:.4},{:.4},{}\n",
            stats.generation, stats.best, stats.mean, stats.species
        ));
    }

    std::fs::write(&path, content).context("Failed to write fitness history")?;
    tracing::info!("Saved fitness history to {}", path.display());

    Ok(())
}

/// Print JSON results to stdout
fn print_json_results(outcome: &TrainingOutcome) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput {
        generations_run: usize,
        best_fitness: f64,
        champion_nodes: usize,
        champion_conns: usize,
    }

    let output = JsonOutput {
        generations_run: outcome.history.len(),
        best_fitness: outcome.champion.as_ref().map_or(0.0, |c| c.fitness),
        champion_nodes: outcome.champion.as_ref().map_or(0, |c| c.genome.node_count()),
        champion_conns: outcome
            .champion
            .as_ref()
            .map_or(0, |c| c.genome.enabled_conn_count()),
    };

    let json = serde_json::to_string_pretty(&output)?;
    println!("{}", json);

    Ok(())
}

/// Print summary to console
fn print_summary(outcome: &TrainingOutcome, args: &TrainArgs) {
    println!("\n=== Training Complete ===");
    println!("Generations: {}", outcome.history.len());

    if let Some(record) = &outcome.champion {
        println!("Best fitness: {:.4} (generation {})", record.fitness, record.generation);
        println!(
            "Champion topology: {} nodes, {} enabled connections",
            record.genome.node_count(),
            record.genome.enabled_conn_count()
        );
    }

    if let Some(last) = outcome.history.last() {
        println!("Final species count: {}", last.species);
    }

    println!("Output directory: {}", args.output.display());
}

// ============================================================================
// TESTS
// ============================================================================
