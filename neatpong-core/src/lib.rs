//! NEATPONG Core - Pong court engine
//!
//! This crate provides the game engine the training loop drives:
//! - Ball motion with seeded serve angles
//! - Paddle movement with wall-clamp validity reporting
//! - Tick advancement with collision, hit, and score accounting
//!
//! The engine knows nothing about agents or fitness; it reports cumulative
//! counters after every tick and validates paddle moves, nothing more.

pub mod ball;
pub mod game;
pub mod paddle;

// Re-exports for convenient access
pub use ball::{Ball, BALL_MAX_VEL, BALL_RADIUS};
pub use game::{GameSnapshot, PongGame, Side, COURT_HEIGHT, COURT_WIDTH, PADDLE_MARGIN};
pub use paddle::{Paddle, PaddleDir, PADDLE_HEIGHT, PADDLE_SPEED, PADDLE_WIDTH};
