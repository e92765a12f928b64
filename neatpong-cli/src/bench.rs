//! Bench command - compare sequential vs parallel generation evaluation
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_sequential_benchmark(), run_parallel_benchmark(), report_results()
//! - Level 3: benchmark_evaluation()
//! - Level 4: agent construction, timing utilities, formatting

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use neatpong_evolve::{Genome, GenomeId, InnovationTracker, Network, NUM_INPUTS, NUM_OUTPUTS};
use neatpong_tournament::{evaluate_generation, pairings, EpisodeConfig, EvalConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    /// Number of agents in the benchmarked generation
    #[arg(long, default_value = "20")]
    pub agents: usize,

    /// Times each mode evaluates the full generation
    #[arg(long, default_value = "3")]
    pub rounds: usize,

    /// Left-paddle hit count that ends an episode
    #[arg(long, default_value = "50")]
    pub hit_cap: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Results of a single benchmark run
#[derive(Clone, Debug)]
struct BenchResult {
    name: String,
    episodes: usize,
    total_time: Duration,
    avg_time_per_episode: Duration,
    episodes_per_second: f64,
    notes: String,
}

/// All benchmark results
#[derive(Clone, Debug)]
struct AllResults {
    results: Vec<BenchResult>,
    system_info: String,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
///
/// This function reads like a table of contents:
/// 1. Build a generation of minimal agents
/// 2. Time sequential evaluation
/// 3. Time parallel evaluation
/// 4. Report all results
pub fn run(args: BenchArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        "Starting benchmarks: {} agents, {} rounds per mode",
        args.agents,
        args.rounds
    );

    let bench_seed = seed.unwrap_or(42);
    let agents = build_agents(args.agents.max(2), bench_seed);

    let mut all_results = AllResults {
        results: Vec::new(),
        system_info: get_system_info(),
    };

    run_sequential_benchmark(&args, &agents, bench_seed, &mut all_results);
    run_parallel_benchmark(&args, &agents, bench_seed, &mut all_results);

    report_results(&all_results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Time round-robin evaluation on a single thread
fn run_sequential_benchmark(
    args: &BenchArgs,
    agents: &[(GenomeId, Network)],
    seed: u64,
    results: &mut AllResults,
) {
    tracing::info!("Benchmarking sequential evaluation...");
    let config = eval_config(args, seed, false);
    let result = benchmark_evaluation("Sequential", agents, &config, args.rounds);
    results.results.push(result);
}

/// Time round-robin evaluation across the rayon pool
fn run_parallel_benchmark(
    args: &BenchArgs,
    agents: &[(GenomeId, Network)],
    seed: u64,
    results: &mut AllResults,
) {
    tracing::info!("Benchmarking parallel evaluation...");
    let config = eval_config(args, seed, true);
    let result = benchmark_evaluation("Parallel", agents, &config, args.rounds);
    results.results.push(result);
}

/// Report all benchmark results
fn report_results(results: &AllResults, args: &BenchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Evaluate the full generation `rounds` times and time it
fn benchmark_evaluation(
    name: &str,
    agents: &[(GenomeId, Network)],
    config: &EvalConfig,
    rounds: usize,
) -> BenchResult {
    let abort = AtomicBool::new(false);
    let episodes_per_round = pairings(agents.len()).len();
    let episodes = episodes_per_round * rounds.max(1);

    let start = Instant::now();
    let mut best = f64::MIN;
    for _ in 0..rounds.max(1) {
        let fitness = evaluate_generation(agents, config, &abort);
        for &value in fitness.values() {
            if value > best {
                best = value;
            }
        }
    }
    let total_time = start.elapsed();

    BenchResult {
        name: name.to_string(),
        episodes,
        total_time,
        avg_time_per_episode: total_time / episodes.max(1) as u32,
        episodes_per_second: episodes as f64 / total_time.as_secs_f64().max(f64::MIN_POSITIVE),
        notes: format!("best fitness: {:.3}", best),
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Episode and evaluation settings shared by both modes
fn eval_config(args: &BenchArgs, seed: u64, parallel: bool) -> EvalConfig {
    EvalConfig {
        episode: EpisodeConfig::default().with_hit_cap(args.hit_cap),
        parallel,
        base_seed: seed,
    }
}

/// Compile a generation of minimal genomes into playable networks
fn build_agents(count: usize, seed: u64) -> Vec<(GenomeId, Network)> {
    let mut tracker = InnovationTracker::new((NUM_INPUTS + NUM_OUTPUTS) as u32, 0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let genome = Genome::minimal(&mut tracker, &mut rng);
            (GenomeId(i as u64), Network::from_genome(&genome))
        })
        .collect()
}

/// Get system information string
fn get_system_info() -> String {
    format!(
        "Rust {}, {} CPUs",
        env!("CARGO_PKG_VERSION"),
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1)
    )
}

/// Format duration for display
fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 60 {
        format!(
            "{}m {:.1}s",
            d.as_secs() / 60,
            (d.as_secs() % 60) as f64 + d.subsec_millis() as f64 / 1000.0
        )
    } else if d.as_secs() >= 1 {
        format!("{:.2}s", d.as_secs_f64())
    } else if d.as_millis() >= 1 {
        format!("{:.1}ms", d.as_secs_f64() * 1000.0)
    } else {
        format!("{:.1}us", d.as_secs_f64() * 1_000_000.0)
    }
}

/// Print results as JSON
fn print_json_results(results: &AllResults) {
    #[derive(serde::Serialize)]
    struct JsonBenchmark {
        name: String,
        episodes: usize,
        total_time_ms: u64,
        avg_time_ms: f64,
        episodes_per_second: f64,
        notes: String,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        system_info: String,
        benchmarks: Vec<JsonBenchmark>,
    }

    let output = JsonOutput {
        system_info: results.system_info.clone(),
        benchmarks: results
            .results
            .iter()
            .map(|r| JsonBenchmark {
                name: r.name.clone(),
                episodes: r.episodes,
                total_time_ms: r.total_time.as_millis() as u64,
                avg_time_ms: r.avg_time_per_episode.as_secs_f64() * 1000.0,
                episodes_per_second: r.episodes_per_second,
                notes: r.notes.clone(),
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text table
fn print_text_results(results: &AllResults) {
    println!("\n=== NEATPONG Benchmark Results ===");
    println!("System: {}\n", results.system_info);

    println!(
        "{:<12} {:>10} {:>12} {:>12} {:>12}  {}",
        "Benchmark", "Episodes", "Total Time", "Avg/Episode", "Episodes/s", "Notes"
    );
    println!("{}", "-".repeat(80));

    for r in &results.results {
        println!(
            "{:<12} {:>10} {:>12} {:>12} {:>12.2}  {}",
            r.name,
            r.episodes,
            format_duration(r.total_time),
            format_duration(r.avg_time_per_episode),
            r.episodes_per_second,
            r.notes
        );
    }

    let parallel = results.results.iter().find(|r| r.name == "Parallel");
    let sequential = results.results.iter().find(|r| r.name == "Sequential");

    if let (Some(par), Some(seq)) = (parallel, sequential) {
        if par.episodes_per_second > 0.0 && seq.episodes_per_second > 0.0 {
            let speedup = par.episodes_per_second / seq.episodes_per_second;
            println!("\nParallel speedup vs sequential: {:.1}x", speedup);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert!(format_duration(Duration::from_millis(500)).contains("ms"));
        assert!(format_duration(Duration::from_secs(5)).contains("s"));
        assert!(format_duration(Duration::from_secs(90)).contains("m"));
    }

    #[test]
    fn test_build_agents_compiles_requested_count() {
        let agents = build_agents(5, 42);
        assert_eq!(agents.len(), 5);
        // Ids are distinct, so fitness merging never collides
        for (i, (id, _)) in agents.iter().enumerate() {
            assert_eq!(*id, GenomeId(i as u64));
        }
    }

    #[test]
    fn test_get_system_info() {
        let info = get_system_info();
        assert!(info.contains("Rust"));
        assert!(info.contains("CPUs"));
    }

    #[test]
    fn test_benchmark_evaluation_counts_episodes() {
        let agents = build_agents(4, 7);
        let config = EvalConfig {
            episode: EpisodeConfig::default().with_hit_cap(1),
            parallel: false,
            base_seed: 7,
        };

        let result = benchmark_evaluation("Sequential", &agents, &config, 2);
        // 4 agents pair into 6 episodes, twice
        assert_eq!(result.episodes, 12);
        assert!(result.total_time > Duration::ZERO);
    }
}
