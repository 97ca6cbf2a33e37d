//! Maze Quiz - walk a tile maze, answer the question behind every door
//!
//! Core modules:
//! - `sim`: Deterministic gameplay core (map, movement, doors, scoring, level loop)
//! - `questions`: Puzzle data and the sources that supply it
//! - `settings`: Player-tunable configuration

pub mod questions;
pub mod settings;
pub mod sim;

pub use questions::{FallbackSource, Puzzle, QuestionSource, QuestionStore, Subject};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Ticks per countdown second
    pub const COUNTDOWN_TICKS: u32 = 60;

    /// Doors (and therefore questions) per level
    pub const TOTAL_QUESTIONS: u32 = 5;
    /// Best possible score
    pub const MAX_MARKS: u32 = 5;

    /// Tile edge length in pixels
    pub const TILE_SIZE: f32 = 45.0;
    /// Visual radius of the player avatar
    pub const PLAYER_RADIUS: f32 = 20.0;
    /// Player speed in pixels per second (2.8 px per frame)
    pub const PLAYER_SPEED: f32 = 168.0;
    /// Collision radius as a fraction of the visual radius
    pub const COLLISION_RADIUS_FACTOR: f32 = 0.5;

    /// Viewport the map is centred in
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Locked-exit advisory fires inside this many tiles of the exit centre
    pub const EXIT_ADVISORY_RANGE: f32 = 0.8;
    /// ...and re-arms beyond this many tiles
    pub const EXIT_ADVISORY_RESET: f32 = 1.5;

    /// Default time budget for stored questions without one (seconds)
    pub const DEFAULT_TIME_LIMIT: u32 = 30;
}

/// Convert a world position to (row, col) tile indices.
///
/// Uses floor division, so positions above or left of `origin` give negative
/// indices instead of collapsing onto row/col 0.
#[inline]
pub fn world_to_tile(pos: Vec2, origin: Vec2, tile_size: f32) -> (i32, i32) {
    let local = (pos - origin) / tile_size;
    (local.y.floor() as i32, local.x.floor() as i32)
}

/// World position of the centre of tile (row, col)
#[inline]
pub fn tile_center(row: i32, col: i32, origin: Vec2, tile_size: f32) -> Vec2 {
    origin + Vec2::new((col as f32 + 0.5) * tile_size, (row as f32 + 0.5) * tile_size)
}
