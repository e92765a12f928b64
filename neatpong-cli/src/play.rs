//! Play command - human versus a trained champion in the terminal
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_loop(), draw()
//! - Level 3: Input (raw-mode keys), Screen (ANSI drawing)
//! - Level 4: court-to-grid mapping
//!
//! The human drives the left paddle with w/s or the arrow keys; the
//! champion network drives the right paddle. Scores accumulate until q or
//! Esc quits. No fitness is tracked in this mode.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use neatpong_core::{
    Ball, Paddle, PongGame, Side, COURT_HEIGHT, COURT_WIDTH, PADDLE_HEIGHT, PADDLE_WIDTH,
};
use neatpong_evolve::Network;
use neatpong_tournament::{Action, Decider, Observation};

use crate::train::ChampionFile;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Champion JSON file to play against
    #[arg(long, default_value = "models/best.json")]
    pub model: PathBuf,

    /// Frames per second
    #[arg(long, default_value = "60")]
    pub fps: u64,

    /// Side the human controls: left or right
    #[arg(long, default_value = "left")]
    pub human_side: String,
}

// Character grid the court is scaled onto
const GRID_COLS: usize = 80;
const GRID_ROWS: usize = 20;

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// This function reads like a table of contents:
/// 1. Load the champion and compile its network
/// 2. Enter raw mode and hide the cursor
/// 3. Run the frame loop until quit
/// 4. Restore the terminal
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let human_side = parse_side(&args.human_side)?;
    let champion = ChampionFile::load(&args.model)?;
    let mut network = Network::from_genome(&champion.genome);
    tracing::info!(
        "Loaded champion: fitness={:.3}, generation={}",
        champion.fitness,
        champion.generation
    );

    let game_seed = seed.unwrap_or_else(rand::random);
    let mut game = PongGame::new(game_seed);

    let mut input = Input::new().context("Failed to enable raw mode")?;
    let mut screen = Screen::new();
    screen
        .hide_cursor()
        .and_then(Screen::flush)
        .context("Failed to prepare terminal")?;

    let frame = Duration::from_micros(1_000_000 / args.fps.max(1));
    let outcome = play_loop(
        &mut game,
        &mut network,
        human_side,
        &mut input,
        &mut screen,
        frame,
    );

    let _ = screen.show_cursor().and_then(Screen::flush);
    let _ = input.cleanup();

    outcome
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Fixed-rate frame loop: poll keys, tick, move both paddles, draw
fn play_loop(
    game: &mut PongGame,
    network: &mut Network,
    human_side: Side,
    input: &mut Input,
    screen: &mut Screen,
    frame: Duration,
) -> Result<()> {
    let ai_side = human_side.opponent();

    loop {
        let started = Instant::now();

        let keys = input.poll_frame()?;
        if keys.quit {
            return Ok(());
        }

        game.tick();

        // Human keys go through the same action mapping agents use; a
        // rejected move just does nothing
        if let Some(dir) = keys.action.and_then(Action::paddle_dir) {
            game.move_paddle(human_side, dir);
        }

        let observation = Observation::from_game(game, ai_side);
        if let Some(dir) = network.decide(observation).paddle_dir() {
            game.move_paddle(ai_side, dir);
        }

        draw(screen, game, human_side)?;

        let elapsed = started.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }
}

/// Redraw the whole court
fn draw(screen: &mut Screen, game: &PongGame, human_side: Side) -> Result<()> {
    let mut grid = [[' '; GRID_COLS]; GRID_ROWS];

    for row in (0..GRID_ROWS).step_by(2) {
        grid[row][GRID_COLS / 2] = '·';
    }
    stamp_paddle(&mut grid, &game.left_paddle);
    stamp_paddle(&mut grid, &game.right_paddle);
    stamp_ball(&mut grid, &game.ball);

    screen.clear()?;
    screen.move_to(1, 1)?.write(format_args!(
        "LEFT {:>3}   RIGHT {:>3}   rally {} : {}",
        game.left_score, game.right_score, game.left_hits, game.right_hits
    ))?;

    screen.move_to(2, 1)?.write(format_args!(
        "┌{:─<width$}┐",
        "",
        width = GRID_COLS
    ))?;
    for (i, row) in grid.iter().enumerate() {
        let line: String = row.iter().collect();
        screen
            .move_to(3 + i, 1)?
            .write(format_args!("│{line}│"))?;
    }
    screen.move_to(3 + GRID_ROWS, 1)?.write(format_args!(
        "└{:─<width$}┘",
        "",
        width = GRID_COLS
    ))?;

    screen.move_to(4 + GRID_ROWS, 1)?.write(format_args!(
        "You play {}. w/s or arrows to move, q to quit",
        side_label(human_side)
    ))?;
    screen.flush()?;

    Ok(())
}

// ============================================================================
// LEVEL 3 - INPUT AND SCREEN
// ============================================================================

/// Keys collected during one frame, already mapped to an action
#[derive(Clone, Copy, Debug, Default)]
struct FrameKeys {
    action: Option<Action>,
    quit: bool,
}

/// Raw-mode keyboard handle; restores the terminal on drop
struct Input {
    disabled: bool,
}

impl Input {
    fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { disabled: false })
    }

    fn cleanup(mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        self.disabled = true;
        Ok(())
    }

    /// Drain everything typed since the last frame. Key auto-repeat keeps
    /// the held movement key fresh between frames.
    fn poll_frame(&mut self) -> io::Result<FrameKeys> {
        let mut keys = FrameKeys::default();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    keys.quit = true;
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => keys.quit = true,
                    code => {
                        if let Some(action) = action_for(code) {
                            keys.action = Some(action);
                        }
                    }
                }
            }
        }
        Ok(keys)
    }
}

impl Drop for Input {
    fn drop(&mut self) {
        if !self.disabled {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Terminal drawing with plain ANSI escapes
struct Screen {
    writer: BufWriter<io::Stdout>,
}

impl Screen {
    fn new() -> Self {
        Self {
            writer: BufWriter::new(io::stdout()),
        }
    }

    fn clear(&mut self) -> io::Result<&mut Self> {
        write!(self.writer, "\x1b[2J\x1b[H")?;
        Ok(self)
    }

    fn hide_cursor(&mut self) -> io::Result<&mut Self> {
        write!(self.writer, "\x1b[?25l")?;
        Ok(self)
    }

    fn show_cursor(&mut self) -> io::Result<&mut Self> {
        write!(self.writer, "\x1b[?25h")?;
        Ok(self)
    }

    /// Move cursor to a 1-indexed position
    fn move_to(&mut self, row: usize, col: usize) -> io::Result<&mut Self> {
        write!(self.writer, "\x1b[{};{}H", row, col)?;
        Ok(self)
    }

    fn write(&mut self, text: impl std::fmt::Display) -> io::Result<&mut Self> {
        write!(self.writer, "{text}")?;
        Ok(self)
    }

    fn flush(&mut self) -> io::Result<&mut Self> {
        self.writer.flush()?;
        Ok(self)
    }
}

// ============================================================================
// LEVEL 4 - GRID MAPPING
// ============================================================================

/// Action for a movement key, so the human path matches the agent path
fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('w') | KeyCode::Up => Some(Action::MoveUp),
        KeyCode::Char('s') | KeyCode::Down => Some(Action::MoveDown),
        _ => None,
    }
}

/// Parse a side name from the command line
fn parse_side(name: &str) -> Result<Side> {
    match name.to_ascii_lowercase().as_str() {
        "left" => Ok(Side::Left),
        "right" => Ok(Side::Right),
        other => anyhow::bail!("Unknown side '{}', expected left or right", other),
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Left => "LEFT",
        Side::Right => "RIGHT",
    }
}

/// Map court coordinates to a grid cell
fn cell(x: f64, y: f64) -> (usize, usize) {
    let col = ((x / COURT_WIDTH) * GRID_COLS as f64) as usize;
    let row = ((y / COURT_HEIGHT) * GRID_ROWS as f64) as usize;
    (col.min(GRID_COLS - 1), row.min(GRID_ROWS - 1))
}

fn stamp_paddle(grid: &mut [[char; GRID_COLS]; GRID_ROWS], paddle: &Paddle) {
    let (col, top_row) = cell(paddle.x + PADDLE_WIDTH / 2.0, paddle.y);
    let (_, bottom_row) = cell(paddle.x, paddle.y + PADDLE_HEIGHT - 1.0);
    for row in grid.iter_mut().take(bottom_row + 1).skip(top_row) {
        row[col] = '█';
    }
}

fn stamp_ball(grid: &mut [[char; GRID_COLS]; GRID_ROWS], ball: &Ball) {
    let (col, row) = cell(ball.x, ball.y);
    grid[row][col] = '●';
}

// ============================================================================
// TESTS
// ============================================================================
