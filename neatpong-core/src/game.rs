//! Court state and tick advancement

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ball::{Ball, BALL_MAX_VEL, BALL_RADIUS};
use crate::paddle::{Paddle, PaddleDir, PADDLE_HEIGHT, PADDLE_SPEED, PADDLE_WIDTH};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Court width in units
pub const COURT_WIDTH: f64 = 800.0;

/// Court height in units
pub const COURT_HEIGHT: f64 = 600.0;

/// Gap between each court edge and the back of its paddle
pub const PADDLE_MARGIN: f64 = 10.0;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Court side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Cumulative counters reported after every tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Times the left paddle has struck the ball
    pub left_hits: u32,
    /// Times the right paddle has struck the ball
    pub right_hits: u32,
    /// Points scored past the right paddle
    pub left_score: u32,
    /// Points scored past the left paddle
    pub right_score: u32,
}

impl GameSnapshot {
    /// Hit count for one side
    pub fn hits_for(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_hits,
            Side::Right => self.right_hits,
        }
    }

    /// Score for one side
    pub fn score_for(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_score,
            Side::Right => self.right_score,
        }
    }
}

/// One Pong court: ball, two paddles, cumulative counters, and the RNG
/// that serves the ball
#[derive(Clone, Debug)]
pub struct PongGame {
    /// The ball
    pub ball: Ball,
    /// Left paddle
    pub left_paddle: Paddle,
    /// Right paddle
    pub right_paddle: Paddle,
    /// Times the left paddle has struck the ball
    pub left_hits: u32,
    /// Times the right paddle has struck the ball
    pub right_hits: u32,
    /// Points scored past the right paddle
    pub left_score: u32,
    /// Points scored past the left paddle
    pub right_score: u32,
    rng: ChaCha8Rng,
}

impl PongGame {
    /// Create a court with centered paddles and a freshly served ball.
    /// The seed fixes every serve angle, so identical seeds replay
    /// identical games under identical paddle inputs.
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ball = Ball::launch(COURT_WIDTH / 2.0, COURT_HEIGHT / 2.0, &mut rng);
        let paddle_y = COURT_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;

        Self {
            ball,
            left_paddle: Paddle::new(PADDLE_MARGIN, paddle_y),
            right_paddle: Paddle::new(COURT_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH, paddle_y),
            left_hits: 0,
            right_hits: 0,
            left_score: 0,
            right_score: 0,
            rng,
        }
    }

    /// Advance one fixed time step: move the ball, resolve wall and paddle
    /// collisions, score balls past either edge. Returns the updated
    /// cumulative counters.
    pub fn tick(&mut self) -> GameSnapshot {
        self.ball.advance();
        self.handle_collision();

        if self.ball.x < 0.0 {
            self.right_score += 1;
            self.ball
                .relaunch(COURT_WIDTH / 2.0, COURT_HEIGHT / 2.0, &mut self.rng);
        } else if self.ball.x > COURT_WIDTH {
            self.left_score += 1;
            self.ball
                .relaunch(COURT_WIDTH / 2.0, COURT_HEIGHT / 2.0, &mut self.rng);
        }

        self.snapshot()
    }

    /// Request one tick of paddle movement. Returns false and leaves the
    /// paddle unmoved when the move would cross a court wall.
    pub fn move_paddle(&mut self, side: Side, dir: PaddleDir) -> bool {
        let paddle = match side {
            Side::Left => &mut self.left_paddle,
            Side::Right => &mut self.right_paddle,
        };

        let legal = match dir {
            PaddleDir::Up => paddle.y - PADDLE_SPEED >= 0.0,
            PaddleDir::Down => paddle.y + PADDLE_HEIGHT + PADDLE_SPEED <= COURT_HEIGHT,
        };

        if legal {
            paddle.shift(dir);
        }
        legal
    }

    /// Current cumulative counters
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            left_hits: self.left_hits,
            right_hits: self.right_hits,
            left_score: self.left_score,
            right_score: self.right_score,
        }
    }

    /// Paddle for one side
    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left_paddle,
            Side::Right => &self.right_paddle,
        }
    }

    /// Recenter paddles, zero all counters, and serve a fresh ball
    pub fn reset(&mut self) {
        let paddle_y = COURT_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;
        self.left_paddle = Paddle::new(PADDLE_MARGIN, paddle_y);
        self.right_paddle = Paddle::new(COURT_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH, paddle_y);
        self.ball = Ball::launch(COURT_WIDTH / 2.0, COURT_HEIGHT / 2.0, &mut self.rng);
        self.left_hits = 0;
        self.right_hits = 0;
        self.left_score = 0;
        self.right_score = 0;
    }

    // ========================================================================
    // Collision resolution
    // ========================================================================

    fn handle_collision(&mut self) {
        // Ceiling and floor
        if self.ball.y + BALL_RADIUS >= COURT_HEIGHT || self.ball.y - BALL_RADIUS <= 0.0 {
            self.ball.y_vel *= -1.0;
        }

        // Only the paddle the ball is travelling toward can strike it
        if self.ball.x_vel < 0.0 {
            let (top, bottom) = self.left_paddle.span();
            if self.ball.y >= top
                && self.ball.y <= bottom
                && self.ball.x - BALL_RADIUS <= self.left_paddle.x + PADDLE_WIDTH
            {
                self.bounce_off(Side::Left);
            }
        } else {
            let (top, bottom) = self.right_paddle.span();
            if self.ball.y >= top
                && self.ball.y <= bottom
                && self.ball.x + BALL_RADIUS >= self.right_paddle.x
            {
                self.bounce_off(Side::Right);
            }
        }
    }

    /// Reverse the ball off a paddle face, angling the return by how far
    /// from the paddle middle it struck.
    fn bounce_off(&mut self, side: Side) {
        let middle_y = self.paddle(side).middle_y();

        self.ball.x_vel *= -1.0;
        let reduction = (PADDLE_HEIGHT / 2.0) / BALL_MAX_VEL;
        self.ball.y_vel = -((middle_y - self.ball.y) / reduction);

        match side {
            Side::Left => self.left_hits += 1,
            Side::Right => self.right_hits += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered_game() -> PongGame {
        PongGame::new(42)
    }

    #[test]
    fn test_new_game_layout() {
        let game = centered_game();
        assert_eq!(game.left_paddle.x, PADDLE_MARGIN);
        assert_eq!(
            game.right_paddle.x,
            COURT_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH
        );
        assert_eq!(game.left_paddle.y, game.right_paddle.y);
        assert_eq!(game.ball.x, COURT_WIDTH / 2.0);
        assert_eq!(game.ball.y, COURT_HEIGHT / 2.0);
        assert_eq!(game.snapshot(), GameSnapshot::default());
    }

    #[test]
    fn test_move_paddle_rejected_at_top() {
        let mut game = centered_game();
        game.left_paddle.y = 0.0;

        assert!(!game.move_paddle(Side::Left, PaddleDir::Up));
        assert_eq!(game.left_paddle.y, 0.0);

        // The other direction is still open
        assert!(game.move_paddle(Side::Left, PaddleDir::Down));
        assert_eq!(game.left_paddle.y, PADDLE_SPEED);
    }

    #[test]
    fn test_move_paddle_rejected_at_bottom() {
        let mut game = centered_game();
        game.right_paddle.y = COURT_HEIGHT - PADDLE_HEIGHT;

        assert!(!game.move_paddle(Side::Right, PaddleDir::Down));
        assert_eq!(game.right_paddle.y, COURT_HEIGHT - PADDLE_HEIGHT);
        assert!(game.move_paddle(Side::Right, PaddleDir::Up));
    }

    #[test]
    fn test_wall_bounce_flips_vertical_velocity() {
        let mut game = centered_game();
        game.ball.x = COURT_WIDTH / 2.0;
        game.ball.y = COURT_HEIGHT - BALL_RADIUS - 1.0;
        game.ball.x_vel = 0.0;
        game.ball.y_vel = 3.0;

        game.tick();
        assert!(game.ball.y_vel < 0.0);
    }

    #[test]
    fn test_paddle_collision_counts_hit_and_reverses_ball() {
        let mut game = centered_game();
        let face_x = game.left_paddle.x + PADDLE_WIDTH;
        game.ball.x = face_x + BALL_RADIUS + 2.0;
        game.ball.y = game.left_paddle.middle_y();
        game.ball.x_vel = -5.0;
        game.ball.y_vel = 0.0;

        let snapshot = game.tick();
        assert_eq!(snapshot.left_hits, 1);
        assert_eq!(snapshot.right_hits, 0);
        assert!(game.ball.x_vel > 0.0);
    }

    #[test]
    fn test_ball_past_edge_scores_for_opponent() {
        let mut game = centered_game();
        // Slip past the left paddle outside its span
        game.ball.x = 3.0;
        game.ball.y = 100.0;
        game.ball.x_vel = -5.0;
        game.ball.y_vel = 0.0;

        let snapshot = game.tick();
        assert_eq!(snapshot.right_score, 1);
        assert_eq!(snapshot.left_score, 0);
        // Ball is back in play from the center
        assert_eq!(game.ball.x, COURT_WIDTH / 2.0);
        assert_eq!(game.ball.y, COURT_HEIGHT / 2.0);
    }

    #[test]
    fn test_snapshot_side_accessors() {
        let snapshot = GameSnapshot {
            left_hits: 12,
            right_hits: 7,
            left_score: 1,
            right_score: 0,
        };
        assert_eq!(snapshot.hits_for(Side::Left), 12);
        assert_eq!(snapshot.hits_for(Side::Right), 7);
        assert_eq!(snapshot.score_for(Side::Left), 1);
        assert_eq!(snapshot.score_for(Side::Right), 0);
    }

    #[test]
    fn test_identical_seeds_replay_identical_games() {
        let mut a = PongGame::new(9);
        let mut b = PongGame::new(9);

        for _ in 0..200 {
            assert_eq!(a.tick(), b.tick());
            assert_eq!(a.ball, b.ball);
        }
    }

    #[test]
    fn test_reset_clears_counters_and_recenters() {
        let mut game = centered_game();
        game.left_hits = 5;
        game.right_score = 1;
        game.left_paddle.y = 0.0;

        game.reset();
        assert_eq!(game.snapshot(), GameSnapshot::default());
        assert_eq!(game.ball.x, COURT_WIDTH / 2.0);
        assert_eq!(
            game.left_paddle.y,
            COURT_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0
        );
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Left.opponent(), Side::Right);
        assert_eq!(Side::Right.opponent(), Side::Left);
    }
}
