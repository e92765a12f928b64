//! Fitness shaping
//!
//! Level 3 - Step-level implementation
//!
//! Episodes never touch an agent's fitness directly. They accumulate a
//! [`FitnessDeltas`] value pair and hand it back; the caller merges the pair
//! into its fitness map. Aborted episodes are simply never merged.

use neatpong_core::Side;
use neatpong_evolve::{FitnessMap, GenomeId};

use crate::episode::EpisodeResult;

/// Fitness adjustments for the two sides of one episode
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FitnessDeltas {
    /// Left agent adjustment
    pub left: f64,
    /// Right agent adjustment
    pub right: f64,
}

impl FitnessDeltas {
    /// Add to one side's delta
    pub fn add(&mut self, side: Side, amount: f64) {
        match side {
            Side::Left => self.left += amount,
            Side::Right => self.right += amount,
        }
    }

    /// One side's delta
    pub fn for_side(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Fold another episode's deltas into this one
    pub fn combine(&mut self, other: &FitnessDeltas) {
        self.left += other.left;
        self.right += other.right;
    }
}

/// End-of-episode reward: each side banks its own hit count plus the
/// episode's elapsed seconds. Hits reward rallying, seconds reward staying
/// in the game.
pub fn end_rewards(result: &EpisodeResult) -> FitnessDeltas {
    FitnessDeltas {
        left: result.left_hits as f64 + result.elapsed_seconds,
        right: result.right_hits as f64 + result.elapsed_seconds,
    }
}

/// Merge one completed episode's deltas into the fitness map
pub fn apply_deltas(
    fitness: &mut FitnessMap,
    left: GenomeId,
    right: GenomeId,
    deltas: &FitnessDeltas,
) {
    *fitness.entry(left).or_insert(0.0) += deltas.left;
    *fitness.entry(right).or_insert(0.0) += deltas.right;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_rewards_add_hits_and_elapsed() {
        let result = EpisodeResult {
            left_hits: 12,
            right_hits: 7,
            left_score: 1,
            right_score: 0,
            ticks: 1800,
            elapsed_seconds: 30.0,
        };

        let rewards = end_rewards(&result);

        assert!((rewards.left - 42.0).abs() < 1e-9);
        assert!((rewards.right - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_deltas_accumulates_per_agent() {
        let mut fitness = FitnessMap::default();
        fitness.insert(GenomeId(0), 5.0);

        let deltas = FitnessDeltas {
            left: 2.5,
            right: -1.0,
        };
        apply_deltas(&mut fitness, GenomeId(0), GenomeId(1), &deltas);

        assert!((fitness[&GenomeId(0)] - 7.5).abs() < 1e-9);
        assert!((fitness[&GenomeId(1)] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_combine_sums_both_sides() {
        let mut deltas = FitnessDeltas {
            left: 1.0,
            right: 2.0,
        };
        deltas.combine(&FitnessDeltas {
            left: 0.5,
            right: -2.0,
        });

        assert!((deltas.left - 1.5).abs() < 1e-9);
        assert!(deltas.right.abs() < 1e-9);
        assert!((deltas.for_side(Side::Left) - 1.5).abs() < 1e-9);
    }
}
