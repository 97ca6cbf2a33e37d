//! Puzzle doors
//!
//! Each door wraps one puzzle and runs a small state machine:
//!
//! ```text
//! Idle --activate--> Active --answer/timeout--> Resolved* --consume--> Consumed
//! ```
//!
//! Every activation hands out a `DoorTicket`. Answers and countdown ticks
//! must present the current ticket, so stale callbacks (a late timer after
//! an answer, a second answer, anything after a restart) are ignored.

use serde::Serialize;

use crate::consts::{COUNTDOWN_TICKS, SIM_DT};
use crate::questions::Puzzle;

/// Door lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DoorState {
    Idle,
    /// Question showing, countdown running
    Active,
    ResolvedCorrect,
    ResolvedWrong,
    ResolvedTimeout,
    /// Outcome applied; never reactivates
    Consumed,
}

impl DoorState {
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            DoorState::ResolvedCorrect | DoorState::ResolvedWrong | DoorState::ResolvedTimeout
        )
    }
}

/// How an activation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DoorOutcome {
    Correct,
    Wrong,
    Timeout,
}

impl DoorOutcome {
    pub fn solved(&self) -> bool {
        *self == DoorOutcome::Correct
    }

    fn state(&self) -> DoorState {
        match self {
            DoorOutcome::Correct => DoorState::ResolvedCorrect,
            DoorOutcome::Wrong => DoorState::ResolvedWrong,
            DoorOutcome::Timeout => DoorState::ResolvedTimeout,
        }
    }
}

/// Identifies one activation of one door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DoorTicket {
    /// Index of the door in its level
    pub door: usize,
    pub generation: u64,
}

/// Per-second countdown owned by an active door
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    /// Whole seconds left
    pub remaining: u32,
    /// Simulation ticks counted toward the next second
    elapsed_ticks: u32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            elapsed_ticks: 0,
        }
    }

    /// Count `dt` as whole `SIM_DT` ticks; returns how many seconds have passed
    fn accumulate(&mut self, dt: f32) -> u32 {
        self.elapsed_ticks += (dt.max(0.0) / SIM_DT).round() as u32;
        let fired = self.elapsed_ticks / COUNTDOWN_TICKS;
        self.elapsed_ticks %= COUNTDOWN_TICKS;
        fired
    }
}

/// Result of one countdown second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Ticket no longer current or no countdown running
    Ignored,
    /// Still running with this many seconds left
    Remaining(u32),
    /// Hit zero; the door is now `ResolvedTimeout`
    Expired,
}

/// A door placed on the map
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleDoor {
    index: usize,
    puzzle: Puzzle,
    state: DoorState,
    /// Set the first time a wrong answer or timeout is reported
    marks_already_deducted: bool,
    #[serde(skip)]
    countdown: Option<Countdown>,
    /// Bumped on every activation and cancellation
    generation: u64,
}

impl PuzzleDoor {
    pub fn new(index: usize, puzzle: Puzzle) -> Self {
        Self {
            index,
            puzzle,
            state: DoorState::Idle,
            marks_already_deducted: false,
            countdown: None,
            generation: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn tile(&self) -> (i32, i32) {
        self.puzzle.tile()
    }

    pub fn is_active(&self) -> bool {
        self.state == DoorState::Active
    }

    pub fn is_consumed(&self) -> bool {
        self.state == DoorState::Consumed
    }

    pub fn marks_already_deducted(&self) -> bool {
        self.marks_already_deducted
    }

    /// Seconds left on the running countdown
    pub fn remaining(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining)
    }

    fn ticket(&self) -> DoorTicket {
        DoorTicket {
            door: self.index,
            generation: self.generation,
        }
    }

    /// Whether `ticket` belongs to the activation currently running
    pub fn accepts(&self, ticket: DoorTicket) -> bool {
        self.state == DoorState::Active
            && ticket.door == self.index
            && ticket.generation == self.generation
    }

    /// Idle → Active. Starts the countdown from the puzzle's time budget.
    pub fn activate(&mut self) -> Option<DoorTicket> {
        if self.state != DoorState::Idle {
            return None;
        }
        self.generation += 1;
        self.state = DoorState::Active;
        self.countdown = Some(Countdown::new(self.puzzle.time_limit()));
        log::info!(
            "Door {} active: {} ({}s)",
            self.index,
            self.puzzle.subject(),
            self.puzzle.time_limit()
        );
        Some(self.ticket())
    }

    /// Active → ResolvedCorrect / ResolvedWrong. The countdown is cancelled.
    /// Returns `None` for a stale ticket.
    pub fn submit(&mut self, ticket: DoorTicket, choice: usize) -> Option<DoorOutcome> {
        if !self.accepts(ticket) {
            log::debug!("Door {}: ignoring answer for stale ticket {:?}", self.index, ticket);
            return None;
        }
        let outcome = if self.puzzle.is_correct(choice) {
            DoorOutcome::Correct
        } else {
            DoorOutcome::Wrong
        };
        Some(self.resolve(outcome))
    }

    /// Question UI closed without an answer: resolves as wrong
    pub fn abandon(&mut self, ticket: DoorTicket) -> Option<DoorOutcome> {
        if !self.accepts(ticket) {
            return None;
        }
        Some(self.resolve(DoorOutcome::Wrong))
    }

    /// One second of the countdown
    pub fn countdown_tick(&mut self, ticket: DoorTicket) -> CountdownStep {
        if !self.accepts(ticket) {
            log::debug!("Door {}: ignoring late countdown tick", self.index);
            return CountdownStep::Ignored;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return CountdownStep::Ignored;
        };
        countdown.remaining = countdown.remaining.saturating_sub(1);
        if countdown.remaining == 0 {
            log::info!("Door {}: time up for puzzle {}", self.index, self.puzzle.id());
            self.resolve(DoorOutcome::Timeout);
            CountdownStep::Expired
        } else {
            CountdownStep::Remaining(countdown.remaining)
        }
    }

    /// Advance the countdown by `dt` seconds, firing one step per whole second
    pub fn advance(&mut self, dt: f32) -> Vec<CountdownStep> {
        let ticket = self.ticket();
        let fired = match self.countdown.as_mut() {
            Some(countdown) if self.state == DoorState::Active => countdown.accumulate(dt),
            _ => 0,
        };
        let mut steps = Vec::new();
        for _ in 0..fired {
            let step = self.countdown_tick(ticket);
            if step == CountdownStep::Ignored {
                break;
            }
            steps.push(step);
            if step == CountdownStep::Expired {
                break;
            }
        }
        steps
    }

    fn resolve(&mut self, outcome: DoorOutcome) -> DoorOutcome {
        self.cancel_countdown();
        self.state = outcome.state();
        log::info!(
            "Door {}: puzzle {} resolved {:?}",
            self.index,
            self.puzzle.id(),
            outcome
        );
        outcome
    }

    /// Claim the single mark deduction this door may cause.
    /// True only the first time.
    pub fn take_deduction(&mut self) -> bool {
        if self.marks_already_deducted {
            return false;
        }
        self.marks_already_deducted = true;
        true
    }

    /// Resolved* → Consumed
    pub fn consume(&mut self) -> bool {
        if !self.state.is_resolved() {
            return false;
        }
        self.state = DoorState::Consumed;
        true
    }

    /// Stop the countdown and invalidate the outstanding ticket
    pub fn cancel_countdown(&mut self) {
        self.countdown = None;
        self.generation += 1;
    }

    /// Back to Idle for a level restart
    pub fn reset(&mut self) {
        self.cancel_countdown();
        self.state = DoorState::Idle;
        self.marks_already_deducted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::Subject;

    fn door(time_limit: u32) -> PuzzleDoor {
        let choices = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let puzzle =
            Puzzle::new("test1", Subject::Math, "1+1?", choices, 1, time_limit, 0, 0).unwrap();
        PuzzleDoor::new(0, puzzle)
    }

    #[test]
    fn test_correct_answer() {
        let mut d = door(10);
        let ticket = d.activate().unwrap();
        assert_eq!(d.state(), DoorState::Active);
        assert_eq!(d.remaining(), Some(10));
        assert_eq!(d.submit(ticket, 1), Some(DoorOutcome::Correct));
        assert_eq!(d.state(), DoorState::ResolvedCorrect);
        assert_eq!(d.remaining(), None);
        assert!(d.consume());
        assert!(d.is_consumed());
    }

    #[test]
    fn test_wrong_and_out_of_range_answers() {
        let mut d = door(10);
        let t = d.activate().unwrap();
        assert_eq!(d.submit(t, 7), Some(DoorOutcome::Wrong));
        assert_eq!(d.state(), DoorState::ResolvedWrong);
    }

    #[test]
    fn test_only_idle_doors_activate() {
        let mut d = door(10);
        let t = d.activate().unwrap();
        assert!(d.activate().is_none());
        d.submit(t, 0);
        assert!(d.activate().is_none());
        d.consume();
        assert!(d.activate().is_none());
    }

    #[test]
    fn test_second_resolution_ignored() {
        let mut d = door(5);
        let t = d.activate().unwrap();
        assert_eq!(d.submit(t, 1), Some(DoorOutcome::Correct));
        assert_eq!(d.submit(t, 0), None);
        // Late timer after the answer
        assert_eq!(d.countdown_tick(t), CountdownStep::Ignored);
        assert_eq!(d.state(), DoorState::ResolvedCorrect);
        d.consume();
        assert_eq!(d.countdown_tick(t), CountdownStep::Ignored);
        assert!(d.advance(10.0).is_empty());
        assert_eq!(d.state(), DoorState::Consumed);
    }

    #[test]
    fn test_timeout_after_budget() {
        let mut d = door(5);
        let t = d.activate().unwrap();
        for left in (1..5).rev() {
            assert_eq!(d.countdown_tick(t), CountdownStep::Remaining(left));
        }
        assert_eq!(d.countdown_tick(t), CountdownStep::Expired);
        assert_eq!(d.state(), DoorState::ResolvedTimeout);
        assert_eq!(d.submit(t, 1), None);
    }

    #[test]
    fn test_advance_accumulates_fractional_seconds() {
        let mut d = door(3);
        d.activate().unwrap();
        assert!(d.advance(0.6).is_empty());
        assert_eq!(d.advance(0.6), vec![CountdownStep::Remaining(2)]);
        assert_eq!(
            d.advance(5.0),
            vec![CountdownStep::Remaining(1), CountdownStep::Expired]
        );
        assert_eq!(d.state(), DoorState::ResolvedTimeout);
    }

    #[test]
    fn test_first_second_takes_sixty_ticks() {
        let mut d = door(20);
        d.activate().unwrap();
        for _ in 0..59 {
            assert!(d.advance(SIM_DT).is_empty());
        }
        assert_eq!(d.advance(SIM_DT), vec![CountdownStep::Remaining(19)]);
        for _ in 0..60 {
            d.advance(SIM_DT);
        }
        assert_eq!(d.remaining(), Some(18));
    }

    #[test]
    fn test_reset_invalidates_ticket() {
        let mut d = door(5);
        let t = d.activate().unwrap();
        d.reset();
        assert_eq!(d.state(), DoorState::Idle);
        assert_eq!(d.submit(t, 1), None);
        let t2 = d.activate().unwrap();
        assert_ne!(t, t2);
        assert_eq!(d.submit(t2, 1), Some(DoorOutcome::Correct));
    }

    #[test]
    fn test_deduction_claimed_once() {
        let mut d = door(5);
        assert!(d.take_deduction());
        assert!(!d.take_deduction());
        assert!(d.marks_already_deducted());
    }
}
