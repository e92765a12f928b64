//! Episode and evaluation configuration
//!
//! Level 4 - Utilities and configuration

use serde::{Deserialize, Serialize};

/// Knobs for a single training episode
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Left-paddle hit count that ends the episode
    pub hit_cap: u32,
    /// Fitness subtracted each tick an agent holds still
    pub stay_penalty: f64,
    /// Fitness subtracted when a requested move is rejected at a wall
    pub invalid_move_penalty: f64,
    /// Simulated seconds per tick
    pub tick_seconds: f64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            hit_cap: 50,
            stay_penalty: 0.01,
            invalid_move_penalty: 1.0,
            tick_seconds: 1.0 / 60.0,
        }
    }
}

impl EpisodeConfig {
    pub fn with_hit_cap(mut self, hit_cap: u32) -> Self {
        self.hit_cap = hit_cap;
        self
    }

    pub fn with_tick_seconds(mut self, tick_seconds: f64) -> Self {
        self.tick_seconds = tick_seconds;
        self
    }
}

/// Knobs for evaluating a whole generation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Per-episode settings
    pub episode: EpisodeConfig,
    /// Run episodes across threads
    pub parallel: bool,
    /// Base seed; episode k plays under `base_seed.wrapping_add(k)`
    pub base_seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            episode: EpisodeConfig::default(),
            parallel: true,
            base_seed: 0,
        }
    }
}

impl EvalConfig {
    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_defaults() {
        let config = EpisodeConfig::default();

        assert_eq!(config.hit_cap, 50);
        assert!((config.stay_penalty - 0.01).abs() < 1e-12);
        assert!((config.invalid_move_penalty - 1.0).abs() < 1e-12);
        assert!((config.tick_seconds - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_builders_override_fields() {
        let config = EvalConfig::default().with_base_seed(9).with_parallel(false);

        assert_eq!(config.base_seed, 9);
        assert!(!config.parallel);

        let episode = EpisodeConfig::default().with_hit_cap(5).with_tick_seconds(0.5);
        assert_eq!(episode.hit_cap, 5);
        assert!((episode.tick_seconds - 0.5).abs() < 1e-12);
    }
}
