//! Puzzle data and where it comes from
//!
//! A level asks a `QuestionSource` for a fixed-size batch once, at load time.
//! Sources are best-effort: they may fail or come back short, and the level
//! fills the gaps from the built-in bank.

pub mod fallback;
pub mod puzzle;
pub mod store;

pub use fallback::{DOOR_POSITIONS, FallbackSource, fallback_puzzles};
pub use puzzle::{Puzzle, PuzzleError, Subject};
pub use store::{QuestionRow, QuestionStore};

/// Why a source could not produce puzzles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("question source unavailable: {0}")]
    Unavailable(String),
    #[error("question source returned malformed data: {0}")]
    Malformed(String),
}

/// Supplier of puzzles for a level
pub trait QuestionSource {
    /// Up to `count` puzzles, already placed on door tiles
    fn load_puzzles(&self, count: usize) -> Result<Vec<Puzzle>, SourceError>;

    /// Re-check an answer against persisted truth. Unknown or non-persisted
    /// ids are never valid.
    fn validate_answer(&self, puzzle_id: &str, choice: usize) -> bool;
}
