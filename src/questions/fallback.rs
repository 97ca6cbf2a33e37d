//! Built-in question bank
//!
//! Used whenever the question store is unavailable or returns a short batch.
//! The table is fixed so every level built from it is identical.

use super::puzzle::{Puzzle, Subject};
use super::{QuestionSource, SourceError};

/// Door tiles (row, col) shared by stored and fallback puzzles, in slot order
pub const DOOR_POSITIONS: [(i32, i32); 5] = [(3, 3), (5, 5), (7, 8), (9, 6), (11, 10)];

struct FallbackEntry {
    id: &'static str,
    subject: Subject,
    prompt: &'static str,
    choices: [&'static str; 4],
    answer: usize,
    time_limit: u32,
}

const FALLBACK_TABLE: [FallbackEntry; 5] = [
    FallbackEntry {
        id: "sample1",
        subject: Subject::Math,
        prompt: "What is 15 + 27?",
        choices: ["40", "42", "44", "46"],
        answer: 1,
        time_limit: 20,
    },
    FallbackEntry {
        id: "sample2",
        subject: Subject::English,
        prompt: "Choose the correct word: The weather is _____ today.",
        choices: ["beautiful", "beautifull", "beutiful", "beatiful"],
        answer: 0,
        time_limit: 25,
    },
    FallbackEntry {
        id: "sample3",
        subject: Subject::Science,
        prompt: "What planet is known as the Red Planet?",
        choices: ["Venus", "Mars", "Jupiter", "Saturn"],
        answer: 1,
        time_limit: 20,
    },
    FallbackEntry {
        id: "sample4",
        subject: Subject::Math,
        prompt: "What is 7 × 9?",
        choices: ["56", "63", "72", "81"],
        answer: 1,
        time_limit: 25,
    },
    FallbackEntry {
        id: "sample5",
        subject: Subject::English,
        prompt: "What is the plural of 'child'?",
        choices: ["childs", "childes", "children", "childrens"],
        answer: 2,
        time_limit: 20,
    },
];

/// The fallback bank, each puzzle on its fixed door tile
pub fn fallback_puzzles() -> Vec<Puzzle> {
    FALLBACK_TABLE
        .iter()
        .zip(DOOR_POSITIONS)
        .filter_map(|(entry, (row, col))| {
            let choices = entry.choices.iter().map(|c| c.to_string()).collect();
            Puzzle::new(
                entry.id,
                entry.subject,
                entry.prompt,
                choices,
                entry.answer,
                entry.time_limit,
                row,
                col,
            )
            .map_err(|e| log::error!("Bad fallback puzzle: {e}"))
            .ok()
        })
        .collect()
}

/// Question source serving only the built-in bank
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSource;

impl QuestionSource for FallbackSource {
    fn load_puzzles(&self, count: usize) -> Result<Vec<Puzzle>, SourceError> {
        let mut puzzles = fallback_puzzles();
        puzzles.truncate(count);
        Ok(puzzles)
    }

    /// Built-in puzzles have no persisted truth to re-check against
    fn validate_answer(&self, _puzzle_id: &str, _choice: usize) -> bool {
        false
    }
}
