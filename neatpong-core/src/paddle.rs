//! Paddle entity and movement direction

use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Paddle width in court units
pub const PADDLE_WIDTH: f64 = 20.0;

/// Paddle height in court units
pub const PADDLE_HEIGHT: f64 = 100.0;

/// Vertical distance a paddle covers in one tick
pub const PADDLE_SPEED: f64 = 4.0;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Direction of a requested paddle move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaddleDir {
    Up,
    Down,
}

/// A paddle, positioned by its top-left corner
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    /// Horizontal position of the left edge
    pub x: f64,
    /// Vertical position of the top edge
    pub y: f64,
}

impl Paddle {
    /// Create a paddle at the given top-left position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vertical center of the paddle face
    pub fn middle_y(&self) -> f64 {
        self.y + PADDLE_HEIGHT / 2.0
    }

    /// Translate by one tick of movement, without bounds checking.
    /// Legality lives in `PongGame::move_paddle`.
    pub(crate) fn shift(&mut self, dir: PaddleDir) {
        match dir {
            PaddleDir::Up => self.y -= PADDLE_SPEED,
            PaddleDir::Down => self.y += PADDLE_SPEED,
        }
    }

    /// Vertical span [top, bottom] occupied by the paddle
    pub fn span(&self) -> (f64, f64) {
        (self.y, self.y + PADDLE_HEIGHT)
    }
}
