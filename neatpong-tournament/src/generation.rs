//! Generation evaluation: every agent pair plays exactly one episode
//!
//! Level 1 - Orchestration
//!
//! Episodes are independent, so evaluation can fan out across threads.
//! Each episode gets its own game and its own copies of the two networks,
//! reports its deltas by value, and the merge happens afterward on one
//! thread.

use std::sync::atomic::AtomicBool;

use rayon::prelude::*;

use neatpong_evolve::{FitnessMap, GenomeId, Network};

use crate::config::EvalConfig;
use crate::episode::{run_episode, EpisodeStatus};
use crate::fitness::apply_deltas;

/// All unordered index pairs (i, j) with i < j, each exactly once
pub fn pairings(count: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(count.saturating_sub(1) * count / 2);
    for i in 0..count {
        for j in (i + 1)..count {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Play one generation of pairwise episodes and return the fitness map.
///
/// Every agent starts the generation at zero fitness, plays each other
/// agent once, and collects shaping penalties plus end rewards from every
/// episode it completes. Episode k runs under `base_seed + k`, so a
/// generation is reproducible for a fixed agent list and seed. Aborted
/// episodes contribute nothing.
///
/// # Arguments
///
/// * `agents` - The population's compiled networks, keyed by genome id
/// * `config` - Evaluation settings
/// * `abort` - Cooperative early-stop signal checked inside each episode
pub fn evaluate_generation(
    agents: &[(GenomeId, Network)],
    config: &EvalConfig,
    abort: &AtomicBool,
) -> FitnessMap {
    let pairs = pairings(agents.len());

    let outcomes: Vec<((GenomeId, GenomeId), EpisodeStatus)> = if config.parallel {
        pairs
            .par_iter()
            .enumerate()
            .map(|(k, &(i, j))| run_pairing(agents, i, j, k, config, abort))
            .collect()
    } else {
        pairs
            .iter()
            .enumerate()
            .map(|(k, &(i, j))| run_pairing(agents, i, j, k, config, abort))
            .collect()
    };

    let mut fitness: FitnessMap = agents.iter().map(|(id, _)| (*id, 0.0)).collect();
    for ((left, right), status) in outcomes {
        if let EpisodeStatus::Completed(report) = status {
            apply_deltas(&mut fitness, left, right, &report.deltas);
        }
    }
    fitness
}

/// Run one pairing: agent i on the left, agent j on the right
fn run_pairing(
    agents: &[(GenomeId, Network)],
    i: usize,
    j: usize,
    k: usize,
    config: &EvalConfig,
    abort: &AtomicBool,
) -> ((GenomeId, GenomeId), EpisodeStatus) {
    let (left_id, left_net) = &agents[i];
    let (right_id, right_net) = &agents[j];

    let mut left = left_net.clone();
    let mut right = right_net.clone();
    let seed = config.base_seed.wrapping_add(k as u64);

    let status = run_episode(&mut left, &mut right, &config.episode, seed, abort);
    ((*left_id, *right_id), status)
}
