//! Quiz items placed on the map
//!
//! A `Puzzle` is built once when a level loads and is read-only afterwards.

use serde::{Deserialize, Serialize};

/// Question categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Subject {
    Math,
    English,
    Science,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Math => "MATH",
            Subject::English => "ENGLISH",
            Subject::Science => "SCIENCE",
        }
    }

    /// Case-insensitive lookup of a stored subject column
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MATH" | "MATHS" => Some(Subject::Math),
            "ENGLISH" => Some(Subject::English),
            "SCIENCE" => Some(Subject::Science),
            _ => None,
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a puzzle cannot be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("puzzle {id}: needs at least 2 choices, got {found}")]
    TooFewChoices { id: String, found: usize },
    #[error("puzzle {id}: answer index {index} is not one of {choices} choices")]
    AnswerOutOfRange { id: String, index: usize, choices: usize },
    #[error("puzzle {id}: time limit must be at least one second")]
    ZeroTimeLimit { id: String },
    #[error("puzzle {id}: unknown subject {subject:?}")]
    UnknownSubject { id: String, subject: String },
}

/// One multiple-choice question and the tile its door sits on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Puzzle {
    id: String,
    subject: Subject,
    prompt: String,
    choices: Vec<String>,
    answer: usize,
    time_limit: u32,
    row: i32,
    col: i32,
}

impl Puzzle {
    /// Build a puzzle, checking its choices, answer index and time budget
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        subject: Subject,
        prompt: impl Into<String>,
        choices: Vec<String>,
        answer: usize,
        time_limit: u32,
        row: i32,
        col: i32,
    ) -> Result<Self, PuzzleError> {
        let id = id.into();
        if choices.len() < 2 {
            return Err(PuzzleError::TooFewChoices {
                id,
                found: choices.len(),
            });
        }
        if answer >= choices.len() {
            return Err(PuzzleError::AnswerOutOfRange {
                id,
                index: answer,
                choices: choices.len(),
            });
        }
        if time_limit == 0 {
            return Err(PuzzleError::ZeroTimeLimit { id });
        }
        Ok(Self {
            id,
            subject,
            prompt: prompt.into(),
            choices,
            answer,
            time_limit,
            row,
            col,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Zero-based index of the correct choice
    pub fn answer(&self) -> usize {
        self.answer
    }

    /// Seconds allowed before the door times out
    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    /// (row, col) of the door tile
    pub fn tile(&self) -> (i32, i32) {
        (self.row, self.col)
    }

    /// Out-of-range indices are simply wrong
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }
}
