//! NEATPONG Tournament - Fitness evaluation through episode play
//!
//! This crate provides the training side of the sandbox:
//! - Observations, actions, and the decider seam
//! - The per-tick episode loop with fitness shaping
//! - Pairwise generation evaluation, sequential or parallel
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: evaluate_generation (orchestration)
//! - Level 2: run_episode (phases)
//! - Level 3: decisions, fitness deltas (steps)
//! - Level 4: configuration

mod config;
mod decision;
mod episode;
mod fitness;
mod generation;

pub use config::{EpisodeConfig, EvalConfig};
pub use decision::{Action, Decider, FnDecider, Observation};
pub use episode::{run_episode, EpisodeReport, EpisodeResult, EpisodeStatus};
pub use fitness::{apply_deltas, end_rewards, FitnessDeltas};
pub use generation::{evaluate_generation, pairings};
