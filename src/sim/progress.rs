//! Score and progress through a level's questions
//!
//! `ProgressTracker` notifies subscribed listeners after every call that
//! changes it, so a HUD can redraw without polling.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::consts::{MAX_MARKS, TOTAL_QUESTIONS};
use crate::questions::Subject;

/// Point-in-time copy of the tracker's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScoreSnapshot {
    pub marks: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub answered: u32,
}

impl ScoreSnapshot {
    pub fn percentage(&self) -> f64 {
        self.marks as f64 * 100.0 / MAX_MARKS as f64
    }

    pub fn grade(&self) -> &'static str {
        grade_for(self.percentage())
    }
}

/// Letter grade for a percentage
pub fn grade_for(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A+"
    } else if percentage >= 80.0 {
        "A"
    } else if percentage >= 70.0 {
        "B"
    } else if percentage >= 60.0 {
        "C"
    } else if percentage >= 50.0 {
        "D"
    } else {
        "F"
    }
}

type ScoreListener = Box<dyn FnMut(&ScoreSnapshot)>;

/// Running tally of answers against the level's fixed question count
#[derive(Default)]
pub struct ProgressTracker {
    score: ScoreSnapshot,
    listeners: Vec<ScoreListener>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("score", &self.score)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the new counters after every change
    pub fn subscribe(&mut self, listener: impl FnMut(&ScoreSnapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        let snapshot = self.score;
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
    }

    /// Answers past the level's question count are dropped
    fn has_room(&self) -> bool {
        if self.score.answered >= TOTAL_QUESTIONS {
            log::warn!("All {TOTAL_QUESTIONS} questions already answered; ignoring result");
            return false;
        }
        true
    }

    /// +1 mark (capped), +1 correct, +1 answered
    pub fn record_correct(&mut self) -> bool {
        if !self.has_room() {
            return false;
        }
        if self.score.marks < MAX_MARKS {
            self.score.marks += 1;
        }
        self.score.correct += 1;
        self.score.answered += 1;
        log::info!("Correct! Marks: {}/{}", self.score.marks, MAX_MARKS);
        self.notify();
        true
    }

    /// -1 mark (floored at 0), +1 incorrect, +1 answered
    pub fn record_wrong(&mut self) -> bool {
        self.record_incorrect(true)
    }

    /// +1 incorrect, +1 answered; the mark only comes off when `deduct`
    pub fn record_incorrect(&mut self, deduct: bool) -> bool {
        if !self.has_room() {
            return false;
        }
        if deduct {
            self.score.marks = self.score.marks.saturating_sub(1);
        }
        self.score.incorrect += 1;
        self.score.answered += 1;
        log::info!("Wrong! Marks: {}/{}", self.score.marks, MAX_MARKS);
        self.notify();
        true
    }

    pub fn marks(&self) -> u32 {
        self.score.marks
    }

    pub fn correct(&self) -> u32 {
        self.score.correct
    }

    pub fn incorrect(&self) -> u32 {
        self.score.incorrect
    }

    pub fn answered(&self) -> u32 {
        self.score.answered
    }

    pub fn total_questions(&self) -> u32 {
        TOTAL_QUESTIONS
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.score.answered >= TOTAL_QUESTIONS
    }

    pub fn percentage(&self) -> f64 {
        self.score.percentage()
    }

    pub fn grade(&self) -> &'static str {
        self.score.grade()
    }

    /// Zero every counter. Listeners stay subscribed.
    pub fn reset(&mut self) {
        self.score = ScoreSnapshot::default();
        log::info!("Progress reset");
        self.notify();
    }
}

impl std::fmt::Display for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Score: {}/{} | Correct: {} | Wrong: {} | Grade: {}",
            self.score.marks,
            MAX_MARKS,
            self.score.correct,
            self.score.incorrect,
            self.grade()
        )
    }
}

/// Attempts and solves for one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SubjectTally {
    pub attempted: u32,
    pub solved: u32,
}

/// Per-subject results for a level
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SubjectStats {
    tallies: BTreeMap<Subject, SubjectTally>,
}

impl SubjectStats {
    pub fn record(&mut self, subject: Subject, solved: bool) {
        let tally = self.tallies.entry(subject).or_default();
        tally.attempted += 1;
        if solved {
            tally.solved += 1;
        }
    }

    pub fn get(&self, subject: Subject) -> SubjectTally {
        self.tallies.get(&subject).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subject, SubjectTally)> + '_ {
        self.tallies.iter().map(|(s, t)| (*s, *t))
    }

    pub fn clear(&mut self) {
        self.tallies.clear();
    }
}
