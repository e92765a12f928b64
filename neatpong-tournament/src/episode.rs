//! Training-episode control loop
//!
//! Level 2 - Phase-level implementation
//!
//! One episode is one match between two deciders on a fresh game, stepped
//! until a side scores or the left paddle reaches the hit cap. Each tick
//! both sides observe, decide, and act. Passivity and rejected moves cost
//! fitness immediately; hits and survival pay out once at termination.
//!
//! Episodes own their whole state. Fitness leaves only as the returned
//! [`FitnessDeltas`], so callers can run episodes on any thread and merge
//! results afterward, and an aborted episode leaves no trace.

use std::sync::atomic::{AtomicBool, Ordering};

use neatpong_core::{PongGame, Side};
use serde::{Deserialize, Serialize};

use crate::config::EpisodeConfig;
use crate::decision::{Decider, Observation};
use crate::fitness::{end_rewards, FitnessDeltas};

/// Final counters from a completed episode
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    /// Left paddle hits
    pub left_hits: u32,
    /// Right paddle hits
    pub right_hits: u32,
    /// Left player score
    pub left_score: u32,
    /// Right player score
    pub right_score: u32,
    /// Ticks simulated
    pub ticks: u64,
    /// Simulated duration, ticks times the configured tick length
    pub elapsed_seconds: f64,
}

/// A completed episode: final counters plus the fitness it earned
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeReport {
    /// Terminal game state
    pub result: EpisodeResult,
    /// Shaping penalties plus end rewards for both sides
    pub deltas: FitnessDeltas,
}

/// How an episode ended
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EpisodeStatus {
    /// Reached a terminal state
    Completed(EpisodeReport),
    /// Stopped by the abort flag before termination; nothing is recorded
    Aborted,
}

impl EpisodeStatus {
    /// The report, if the episode completed
    pub fn report(&self) -> Option<&EpisodeReport> {
        match self {
            EpisodeStatus::Completed(report) => Some(report),
            EpisodeStatus::Aborted => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, EpisodeStatus::Aborted)
    }
}

/// Run one episode between two deciders.
///
/// The abort flag is polled at the top of every tick. Once it reads true
/// the episode stops and reports [`EpisodeStatus::Aborted`]; its partial
/// fitness is discarded with it.
///
/// # Arguments
///
/// * `left` - Controller for the left paddle
/// * `right` - Controller for the right paddle
/// * `config` - Episode settings
/// * `seed` - Game seed fixing the ball launch sequence
/// * `abort` - Cooperative early-stop signal
pub fn run_episode<L, R>(
    left: &mut L,
    right: &mut R,
    config: &EpisodeConfig,
    seed: u64,
    abort: &AtomicBool,
) -> EpisodeStatus
where
    L: Decider,
    R: Decider,
{
    let mut game = PongGame::new(seed);
    let mut deltas = FitnessDeltas::default();
    let mut ticks: u64 = 0;

    loop {
        if abort.load(Ordering::Relaxed) {
            return EpisodeStatus::Aborted;
        }

        let snapshot = game.tick();
        ticks += 1;

        step_side(&mut game, Side::Left, left, config, &mut deltas);
        step_side(&mut game, Side::Right, right, config, &mut deltas);

        if snapshot.left_score >= 1
            || snapshot.right_score >= 1
            || snapshot.left_hits >= config.hit_cap
        {
            let result = EpisodeResult {
                left_hits: snapshot.left_hits,
                right_hits: snapshot.right_hits,
                left_score: snapshot.left_score,
                right_score: snapshot.right_score,
                ticks,
                elapsed_seconds: ticks as f64 * config.tick_seconds,
            };
            deltas.combine(&end_rewards(&result));
            return EpisodeStatus::Completed(EpisodeReport { result, deltas });
        }
    }
}

/// One side's observe, decide, act step
fn step_side<D: Decider>(
    game: &mut PongGame,
    side: Side,
    decider: &mut D,
    config: &EpisodeConfig,
    deltas: &mut FitnessDeltas,
) {
    let observation = Observation::from_game(game, side);
    let action = decider.decide(observation);
    match action.paddle_dir() {
        None => deltas.add(side, -config.stay_penalty),
        Some(dir) => {
            if !game.move_paddle(side, dir) {
                deltas.add(side, -config.invalid_move_penalty);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Action, FnDecider};
    use neatpong_core::PaddleDir;

    fn stay(_: Observation) -> Action {
        Action::Stay
    }

    /// Simple ball tracker, enough to sustain a rally
    fn tracker(observation: Observation) -> Action {
        let middle = observation.paddle_y + 50.0;
        if observation.ball_y < middle - 4.0 {
            Action::MoveUp
        } else if observation.ball_y > middle + 4.0 {
            Action::MoveDown
        } else {
            Action::Stay
        }
    }

    #[test]
    fn test_episode_terminates() {
        let abort = AtomicBool::new(false);
        let status = run_episode(
            &mut FnDecider(stay),
            &mut FnDecider(stay),
            &EpisodeConfig::default(),
            17,
            &abort,
        );

        let report = status.report().expect("episode should complete");
        let result = report.result;
        assert!(result.ticks < 100_000);
        assert!(
            result.left_score >= 1 || result.right_score >= 1 || result.left_hits >= 50,
            "termination must come from a score or the hit cap"
        );
    }

    #[test]
    fn test_hit_cap_is_inclusive() {
        // A cap of zero is met immediately, so the episode ends on tick one
        let config = EpisodeConfig::default().with_hit_cap(0);
        let abort = AtomicBool::new(false);

        let status = run_episode(&mut FnDecider(stay), &mut FnDecider(stay), &config, 17, &abort);

        let result = status.report().unwrap().result;
        assert_eq!(result.ticks, 1);
        assert_eq!(result.left_hits, 0);
    }

    #[test]
    fn test_ten_stay_ticks_cost_a_tenth() {
        let mut game = PongGame::new(5);
        let mut deltas = FitnessDeltas::default();
        let config = EpisodeConfig::default();

        let mut decider = FnDecider(stay);
        for _ in 0..10 {
            game.tick();
            step_side(&mut game, Side::Left, &mut decider, &config, &mut deltas);
        }

        assert!((deltas.left + 0.10).abs() < 1e-9);
        assert_eq!(deltas.right, 0.0);
    }

    #[test]
    fn test_rejected_move_costs_full_penalty() {
        let mut game = PongGame::new(5);
        while game.move_paddle(Side::Left, PaddleDir::Up) {}

        let mut deltas = FitnessDeltas::default();
        let mut decider = FnDecider(|_: Observation| Action::MoveUp);
        step_side(
            &mut game,
            Side::Left,
            &mut decider,
            &EpisodeConfig::default(),
            &mut deltas,
        );

        assert!((deltas.left + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_rewards_fold_in_exactly_once() {
        // One tick, no hits, one simulated second: each side nets the
        // elapsed reward minus its stay penalty
        let config = EpisodeConfig::default()
            .with_hit_cap(0)
            .with_tick_seconds(1.0);
        let abort = AtomicBool::new(false);

        let status = run_episode(&mut FnDecider(stay), &mut FnDecider(stay), &config, 17, &abort);

        let report = status.report().unwrap();
        assert!((report.result.elapsed_seconds - 1.0).abs() < 1e-9);
        assert!((report.deltas.left - 0.99).abs() < 1e-9);
        assert!((report.deltas.right - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_abort_reports_nothing() {
        let abort = AtomicBool::new(true);
        let status = run_episode(
            &mut FnDecider(tracker),
            &mut FnDecider(tracker),
            &EpisodeConfig::default(),
            17,
            &abort,
        );

        assert!(status.is_aborted());
        assert!(status.report().is_none());
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let abort = AtomicBool::new(false);
        let config = EpisodeConfig::default();

        let a = run_episode(&mut FnDecider(tracker), &mut FnDecider(tracker), &config, 99, &abort);
        let b = run_episode(&mut FnDecider(tracker), &mut FnDecider(tracker), &config, 99, &abort);

        assert_eq!(a, b);
    }
}
