//! Deterministic gameplay core
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (doors by index)
//! - No rendering or platform dependencies

pub mod actor;
pub mod collision;
pub mod door;
pub mod level;
pub mod map;
pub mod progress;
pub mod tick;

pub use actor::Actor;
pub use collision::{Aabb, circle_overlaps_aabb};
pub use door::{DoorOutcome, DoorState, DoorTicket, PuzzleDoor};
pub use level::{
    LevelController, LevelError, LevelEvent, LevelPhase, LevelSummary, fetch_puzzles, load_map,
    pad_puzzles,
};
pub use map::{LEVEL_ONE, MapError, TileKind, TileMap};
pub use progress::{ProgressTracker, ScoreSnapshot, SubjectStats, SubjectTally, grade_for};
pub use tick::{TickInput, tick};
