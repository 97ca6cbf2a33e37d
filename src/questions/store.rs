//! Persisted question store
//!
//! One row per question, mirroring the `puzzles` table layout:
//! `{id, subject, question, option1..option4, correct_answer, difficulty, time_limit}`
//! with a 1-based `correct_answer`. Rows are kept in a JSON array on disk.

use std::path::Path;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::fallback::DOOR_POSITIONS;
use super::puzzle::{Puzzle, PuzzleError, Subject};
use super::{QuestionSource, SourceError};
use crate::consts::DEFAULT_TIME_LIMIT;

/// Id prefix marking a puzzle as backed by a stored row
pub const STORED_ID_PREFIX: &str = "db_";

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT
}

/// A stored question row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: u32,
    pub subject: String,
    pub question: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    /// 1-based index of the correct option
    pub correct_answer: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
}

impl QuestionRow {
    /// Convert to a puzzle placed on the given door tile
    pub fn to_puzzle(&self, row: i32, col: i32) -> Result<Puzzle, PuzzleError> {
        let id = format!("{STORED_ID_PREFIX}{}", self.id);
        let subject =
            Subject::from_name(&self.subject).ok_or_else(|| PuzzleError::UnknownSubject {
                id: id.clone(),
                subject: self.subject.clone(),
            })?;
        let choices = vec![
            self.option1.clone(),
            self.option2.clone(),
            self.option3.clone(),
            self.option4.clone(),
        ];
        // 0 would underflow; map it past the end so validation rejects it
        let answer = (self.correct_answer as usize).checked_sub(1).unwrap_or(usize::MAX);
        Puzzle::new(
            id,
            subject,
            self.question.clone(),
            choices,
            answer,
            self.time_limit,
            row,
            col,
        )
    }

    /// Zero-based correct option
    fn answer_index(&self) -> Option<usize> {
        (self.correct_answer as usize).checked_sub(1)
    }
}

/// Question rows plus the seed used to draw a level's batch
#[derive(Debug, Clone)]
pub struct QuestionStore {
    rows: Vec<QuestionRow>,
    seed: u64,
}

impl QuestionStore {
    pub fn from_rows(rows: Vec<QuestionRow>, seed: u64) -> Self {
        Self { rows, seed }
    }

    /// Read a JSON array of rows
    pub fn open(path: &Path, seed: u64) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))?;
        let rows: Vec<QuestionRow> = serde_json::from_str(&json)
            .map_err(|e| SourceError::Malformed(format!("{}: {e}", path.display())))?;
        log::info!("Opened question store {} ({} rows)", path.display(), rows.len());
        Ok(Self::from_rows(rows, seed))
    }

    fn find(&self, id: u32) -> Option<&QuestionRow> {
        self.rows.iter().find(|r| r.id == id)
    }
}

impl QuestionSource for QuestionStore {
    /// Draw up to `count` rows in seeded random order. Invalid rows are
    /// skipped, so the batch may come back short.
    fn load_puzzles(&self, count: usize) -> Result<Vec<Puzzle>, SourceError> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        let mut rng = Pcg32::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let count = count.min(DOOR_POSITIONS.len());
        let mut puzzles = Vec::with_capacity(count);
        for &i in order.iter().take(count) {
            let (row, col) = DOOR_POSITIONS[puzzles.len()];
            match self.rows[i].to_puzzle(row, col) {
                Ok(puzzle) => {
                    log::debug!("Loaded puzzle {}: {}", puzzle.id(), puzzle.prompt());
                    puzzles.push(puzzle);
                }
                Err(e) => log::warn!("Skipping stored question: {e}"),
            }
        }
        Ok(puzzles)
    }

    fn validate_answer(&self, puzzle_id: &str, choice: usize) -> bool {
        let Some(id) = puzzle_id
            .strip_prefix(STORED_ID_PREFIX)
            .and_then(|n| n.parse::<u32>().ok())
        else {
            return false;
        };
        self.find(id)
            .and_then(QuestionRow::answer_index)
            .is_some_and(|answer| answer == choice)
    }
}
