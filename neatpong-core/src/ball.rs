//! Ball entity with seeded launch angles

use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Ball radius in court units
pub const BALL_RADIUS: f64 = 7.0;

/// Maximum velocity along either axis, per tick
pub const BALL_MAX_VEL: f64 = 5.0;

/// Launch angles are drawn from +/- this many degrees, excluding zero
const LAUNCH_ARC_DEG: i32 = 30;

// ============================================================================
// CORE TYPES
// ============================================================================

/// The ball, positioned by its center
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Horizontal center
    pub x: f64,
    /// Vertical center
    pub y: f64,
    /// Horizontal velocity per tick
    pub x_vel: f64,
    /// Vertical velocity per tick
    pub y_vel: f64,
}

impl Ball {
    /// Launch a ball from (cx, cy) at a random angle in the serve arc,
    /// toward a random horizontal direction.
    pub fn launch(cx: f64, cy: f64, rng: &mut impl Rng) -> Self {
        let angle = random_launch_angle(rng);
        let dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        Self {
            x: cx,
            y: cy,
            x_vel: dir * (angle.cos() * BALL_MAX_VEL).abs(),
            y_vel: angle.sin() * BALL_MAX_VEL,
        }
    }

    /// Advance one tick of straight-line motion
    pub(crate) fn advance(&mut self) {
        self.x += self.x_vel;
        self.y += self.y_vel;
    }

    /// Recenter at (cx, cy) and serve again with a fresh angle, horizontal
    /// direction reversed so the serve alternates sides.
    pub(crate) fn relaunch(&mut self, cx: f64, cy: f64, rng: &mut impl Rng) {
        let angle = random_launch_angle(rng);
        let dir = if self.x_vel > 0.0 { -1.0 } else { 1.0 };
        self.x = cx;
        self.y = cy;
        self.x_vel = dir * (angle.cos() * BALL_MAX_VEL).abs();
        self.y_vel = angle.sin() * BALL_MAX_VEL;
    }
}

/// Draw a whole-degree angle in [-LAUNCH_ARC_DEG, LAUNCH_ARC_DEG), rejecting
/// the flat zero-degree serve, and convert to radians.
fn random_launch_angle(rng: &mut impl Rng) -> f64 {
    let mut deg = 0i32;
    while deg == 0 {
        deg = rng.gen_range(-LAUNCH_ARC_DEG..LAUNCH_ARC_DEG);
    }
    f64::from(deg).to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_launch_within_serve_arc() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let ball = Ball::launch(400.0, 300.0, &mut rng);
            // Never a flat serve, never faster than the cap
            assert!(ball.y_vel != 0.0);
            assert!(ball.x_vel.abs() <= BALL_MAX_VEL);
            assert!(ball.y_vel.abs() <= BALL_MAX_VEL);
            // 30 degrees keeps the horizontal component dominant
            assert!(ball.x_vel.abs() >= ball.y_vel.abs());
        }
    }

    #[test]
    fn test_launch_deterministic_for_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(Ball::launch(400.0, 300.0, &mut a), Ball::launch(400.0, 300.0, &mut b));
    }

    #[test]
    fn test_advance_applies_velocity() {
        let mut ball = Ball {
            x: 100.0,
            y: 200.0,
            x_vel: 5.0,
            y_vel: -2.0,
        };
        ball.advance();
        assert_eq!(ball.x, 105.0);
        assert_eq!(ball.y, 198.0);
    }

    #[test]
    fn test_relaunch_reverses_direction() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ball = Ball::launch(400.0, 300.0, &mut rng);
        let was_rightward = ball.x_vel > 0.0;
        ball.relaunch(400.0, 300.0, &mut rng);
        assert_eq!(ball.x, 400.0);
        assert_eq!(ball.y, 300.0);
        assert_ne!(ball.x_vel > 0.0, was_rightward);
    }
}
