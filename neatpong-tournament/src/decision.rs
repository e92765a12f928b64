//! Observations and actions at the agent boundary
//!
//! Level 3 - Step-level implementation

use neatpong_core::{PaddleDir, PongGame, Side};
use neatpong_evolve::Network;
use serde::{Deserialize, Serialize};

/// What an agent sees before each decision, from its own side of the court
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Own paddle top edge y
    pub paddle_y: f64,
    /// Horizontal distance from own paddle to the ball
    pub ball_dx: f64,
    /// Ball center y
    pub ball_y: f64,
}

impl Observation {
    /// Capture one side's view of the game
    pub fn from_game(game: &PongGame, side: Side) -> Self {
        let paddle = game.paddle(side);
        Self {
            paddle_y: paddle.y,
            ball_dx: (paddle.x - game.ball.x).abs(),
            ball_y: game.ball.y,
        }
    }

    /// Network input order: paddle y, ball dx, ball y
    pub fn as_array(&self) -> [f64; 3] {
        [self.paddle_y, self.ball_dx, self.ball_y]
    }
}

/// One paddle action per tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Hold position
    Stay,
    /// Move toward the top wall
    MoveUp,
    /// Move toward the bottom wall
    MoveDown,
}

impl Action {
    /// Map network outputs to an action by argmax. Ties keep the earliest
    /// index, so `Stay` beats `MoveUp` beats `MoveDown` on equal scores.
    pub fn from_outputs(outputs: &[f64]) -> Self {
        debug_assert!(outputs.len() >= 3, "need one output per action");

        let mut best = 0;
        for (i, &value) in outputs.iter().enumerate().take(3).skip(1) {
            if value > outputs[best] {
                best = i;
            }
        }
        match best {
            1 => Action::MoveUp,
            2 => Action::MoveDown,
            _ => Action::Stay,
        }
    }

    /// Paddle movement this action requests, if any
    pub fn paddle_dir(self) -> Option<PaddleDir> {
        match self {
            Action::Stay => None,
            Action::MoveUp => Some(PaddleDir::Up),
            Action::MoveDown => Some(PaddleDir::Down),
        }
    }
}

/// A per-tick paddle controller
pub trait Decider {
    /// Choose an action for this observation
    fn decide(&mut self, observation: Observation) -> Action;
}

impl Decider for Network {
    fn decide(&mut self, observation: Observation) -> Action {
        let outputs = self.activate(&observation.as_array());
        Action::from_outputs(&outputs)
    }
}

/// Decider built from a closure, for scripted opponents and tests
pub struct FnDecider<F>(pub F);

impl<F> Decider for FnDecider<F>
where
    F: FnMut(Observation) -> Action,
{
    fn decide(&mut self, observation: Observation) -> Action {
        (self.0)(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatpong_core::COURT_WIDTH;

    #[test]
    fn test_observation_is_side_relative() {
        let game = PongGame::new(3);

        let left = Observation::from_game(&game, Side::Left);
        let right = Observation::from_game(&game, Side::Right);

        assert!(left.ball_dx > 0.0);
        assert!(right.ball_dx > 0.0);
        assert!(left.ball_dx < COURT_WIDTH);
        assert_eq!(left.ball_y, game.ball.y);
        assert_eq!(left.paddle_y, game.left_paddle.y);
        assert_eq!(right.paddle_y, game.right_paddle.y);
    }

    #[test]
    fn test_argmax_picks_strict_maximum() {
        assert_eq!(Action::from_outputs(&[0.9, 0.1, 0.2]), Action::Stay);
        assert_eq!(Action::from_outputs(&[0.1, 0.9, 0.3]), Action::MoveUp);
        assert_eq!(Action::from_outputs(&[0.0, 0.1, 0.2]), Action::MoveDown);
    }

    #[test]
    fn test_argmax_tie_keeps_earliest_index() {
        assert_eq!(Action::from_outputs(&[0.5, 0.5, 0.2]), Action::Stay);
        assert_eq!(Action::from_outputs(&[0.1, 0.4, 0.4]), Action::MoveUp);
        assert_eq!(Action::from_outputs(&[0.3, 0.3, 0.3]), Action::Stay);
    }

    #[test]
    fn test_paddle_dir_mapping() {
        assert_eq!(Action::Stay.paddle_dir(), None);
        assert_eq!(Action::MoveUp.paddle_dir(), Some(PaddleDir::Up));
        assert_eq!(Action::MoveDown.paddle_dir(), Some(PaddleDir::Down));
    }
}
