//! One level: map, player, doors, score and the exit barrier
//!
//! `LevelController` exclusively owns all mutable gameplay state. The
//! presentation layer drives it through `tick`, answers puzzles with the
//! ticket it got from `LevelEvent::DoorActivated`, and drains events to
//! render. Score changes are pushed to `subscribe_score` listeners.

use std::collections::HashSet;

use glam::Vec2;
use serde::Serialize;

use super::actor::Actor;
use super::door::{CountdownStep, DoorOutcome, DoorTicket, PuzzleDoor};
use super::map::{MapError, TileKind, TileMap};
use super::progress::{ProgressTracker, ScoreSnapshot, SubjectStats, SubjectTally};
use crate::consts::{EXIT_ADVISORY_RANGE, EXIT_ADVISORY_RESET, MAX_MARKS, TOTAL_QUESTIONS};
use crate::questions::{Puzzle, QuestionSource, Subject, fallback_puzzles};
use crate::settings::Settings;

/// Level load failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LevelError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("cannot read map {path}: {message}")]
    MapFile { path: String, message: String },
    #[error("door {id} at ({row}, {col}) is not on a floor tile")]
    DoorOffFloor { id: String, row: i32, col: i32 },
    #[error("door {id} at ({row}, {col}) cannot be reached from spawn")]
    DoorUnreachable { id: String, row: i32, col: i32 },
    #[error("more than one door on tile ({row}, {col})")]
    DuplicateDoorTile { row: i32, col: i32 },
}

/// Where the level is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelPhase {
    /// Normal play, including while a door is active
    Exploring,
    Paused,
    /// Player walked out through the unlocked exit
    Complete,
}

/// Final results shown when the level ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub marks: u32,
    pub max_marks: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub answered: u32,
    pub total_questions: u32,
    pub percentage: f64,
    pub grade: &'static str,
    pub subjects: Vec<(Subject, SubjectTally)>,
}

/// Things the presentation layer should react to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LevelEvent {
    /// Show the question; answer with `submit_answer(ticket, ..)`
    DoorActivated { ticket: DoorTicket, puzzle: Puzzle },
    CountdownTick { ticket: DoorTicket, remaining: u32 },
    /// Sent exactly once per activation
    DoorResolved {
        ticket: DoorTicket,
        outcome: DoorOutcome,
        solved: bool,
    },
    /// Remove the door's visual
    DoorConsumed { door: usize },
    ExitUnlocked,
    /// Player touched the exit while it is still locked
    ExitLocked,
    LevelComplete(LevelSummary),
    Paused,
    Resumed,
    Restarted,
}

/// Read the configured map file, or the built-in level
pub fn load_map(settings: &Settings) -> Result<TileMap, LevelError> {
    let map = match &settings.map_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| LevelError::MapFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            TileMap::parse(&text, settings.tile_size)?
        }
        None => TileMap::level_one(settings.tile_size)?,
    };
    Ok(map.centered_in(settings.viewport()))
}

/// Ask `source` for a full batch; an unavailable source yields the fallback bank
pub fn fetch_puzzles(source: &dyn QuestionSource) -> Vec<Puzzle> {
    match source.load_puzzles(TOTAL_QUESTIONS as usize) {
        Ok(puzzles) => puzzles,
        Err(e) => {
            log::warn!("{e}; using fallback puzzles");
            fallback_puzzles()
        }
    }
}

/// Make the batch exactly `TOTAL_QUESTIONS` long. Missing slots are filled
/// from the fallback bank entry for that slot, on its fixed tile.
pub fn pad_puzzles(mut puzzles: Vec<Puzzle>) -> Vec<Puzzle> {
    let total = TOTAL_QUESTIONS as usize;
    if puzzles.len() > total {
        log::warn!("{} puzzles supplied, keeping the first {total}", puzzles.len());
        puzzles.truncate(total);
    }
    if puzzles.len() < total {
        log::warn!(
            "Only {} puzzles supplied, padding {} from the fallback bank",
            puzzles.len(),
            total - puzzles.len()
        );
        let fallback = fallback_puzzles();
        let missing = fallback.into_iter().skip(puzzles.len());
        puzzles.extend(missing.take(total - puzzles.len()));
    }
    puzzles
}

/// Gameplay state for a single level
pub struct LevelController {
    pub(crate) map: TileMap,
    pub(crate) actor: Actor,
    spawn: Vec2,
    pub(crate) doors: Vec<PuzzleDoor>,
    progress: ProgressTracker,
    stats: SubjectStats,
    pub(crate) exit_unlocked: bool,
    pub(crate) phase: LevelPhase,
    /// Only one door may be active at a time
    pub(crate) active_door: Option<DoorTicket>,
    /// Door resolved; actor stays frozen until movement input
    pub(crate) waiting_for_input: bool,
    /// Movement held since activation does not count as fresh input
    pub(crate) awaiting_release: bool,
    exit_advisory_shown: bool,
    pub(crate) player_speed: f32,
    pub(crate) time_ticks: u64,
    events: Vec<LevelEvent>,
}

impl LevelController {
    /// Load a level, padding a short or failed batch from the fallback bank
    pub fn load(
        map: TileMap,
        source: &dyn QuestionSource,
        settings: &Settings,
    ) -> Result<Self, LevelError> {
        Self::with_puzzles(map, fetch_puzzles(source), settings)
    }

    /// Build a level from an explicit batch (padded to `TOTAL_QUESTIONS`)
    pub fn with_puzzles(
        map: TileMap,
        puzzles: Vec<Puzzle>,
        settings: &Settings,
    ) -> Result<Self, LevelError> {
        let puzzles = pad_puzzles(puzzles);
        check_door_placement(&map, &puzzles)?;

        let (row, col) = map.spawn_tile();
        let spawn = map.tile_center(row, col);
        let actor = Actor::new(spawn, settings.player_radius)
            .with_collision_factor(settings.collision_radius_factor);
        let doors = puzzles
            .into_iter()
            .enumerate()
            .map(|(i, p)| PuzzleDoor::new(i, p))
            .collect::<Vec<_>>();

        for door in &doors {
            let (r, c) = door.tile();
            log::debug!("Placed door {} ({}) at row={r} col={c}", door.index(), door.puzzle().id());
        }
        log::info!(
            "Level loaded: {}x{} map, {} doors, exit at {:?}",
            map.rows(),
            map.cols(),
            doors.len(),
            map.exit_tile()
        );

        Ok(Self {
            map,
            actor,
            spawn,
            doors,
            progress: ProgressTracker::new(),
            stats: SubjectStats::default(),
            exit_unlocked: false,
            phase: LevelPhase::Exploring,
            active_door: None,
            waiting_for_input: false,
            awaiting_release: false,
            exit_advisory_shown: false,
            player_speed: settings.player_speed,
            time_ticks: 0,
            events: Vec::new(),
        })
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn doors(&self) -> &[PuzzleDoor] {
        &self.doors
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn subject_stats(&self) -> &SubjectStats {
        &self.stats
    }

    pub fn exit_unlocked(&self) -> bool {
        self.exit_unlocked
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == LevelPhase::Complete
    }

    /// Ticket of the door currently showing its question
    pub fn active_door(&self) -> Option<DoorTicket> {
        self.active_door
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.waiting_for_input
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Register a HUD listener for score changes
    pub fn subscribe_score(&mut self, listener: impl FnMut(&ScoreSnapshot) + 'static) {
        self.progress.subscribe(listener);
    }

    /// Take all events queued since the last call
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> LevelSummary {
        let score = self.progress.snapshot();
        LevelSummary {
            marks: score.marks,
            max_marks: MAX_MARKS,
            correct: score.correct,
            incorrect: score.incorrect,
            answered: score.answered,
            total_questions: self.progress.total_questions(),
            percentage: score.percentage(),
            grade: score.grade(),
            subjects: self.stats.iter().collect(),
        }
    }

    /// Answer the active door. Stale or repeated tickets are ignored.
    pub fn submit_answer(&mut self, ticket: DoorTicket, choice: usize) -> bool {
        if self.active_door != Some(ticket) {
            log::debug!("Ignoring answer for inactive ticket {ticket:?}");
            return false;
        }
        let Some(outcome) = self
            .doors
            .get_mut(ticket.door)
            .and_then(|door| door.submit(ticket, choice))
        else {
            return false;
        };
        self.apply_outcome(ticket, outcome);
        true
    }

    /// Close the question without answering; counts as wrong
    pub fn abandon_puzzle(&mut self, ticket: DoorTicket) -> bool {
        if self.active_door != Some(ticket) {
            return false;
        }
        let Some(outcome) = self.doors.get_mut(ticket.door).and_then(|d| d.abandon(ticket)) else {
            return false;
        };
        self.apply_outcome(ticket, outcome);
        true
    }

    /// One-second countdown callback for the active door.
    ///
    /// `tick` calls this as time accumulates; an external one-second timer
    /// may call it instead. Late calls for a resolved door do nothing.
    pub fn on_countdown_tick(&mut self, ticket: DoorTicket) -> bool {
        if self.active_door != Some(ticket) {
            log::debug!("Ignoring countdown tick for inactive ticket {ticket:?}");
            return false;
        }
        let Some(door) = self.doors.get_mut(ticket.door) else {
            return false;
        };
        let step = door.countdown_tick(ticket);
        self.apply_countdown_step(ticket, step)
    }

    /// Advance the active door's countdown by `dt` seconds
    pub(crate) fn advance_countdown(&mut self, dt: f32) {
        let Some(ticket) = self.active_door else {
            return;
        };
        let Some(door) = self.doors.get_mut(ticket.door) else {
            return;
        };
        for step in door.advance(dt) {
            self.apply_countdown_step(ticket, step);
        }
    }

    fn apply_countdown_step(&mut self, ticket: DoorTicket, step: CountdownStep) -> bool {
        match step {
            CountdownStep::Ignored => false,
            CountdownStep::Remaining(remaining) => {
                self.events.push(LevelEvent::CountdownTick { ticket, remaining });
                true
            }
            CountdownStep::Expired => {
                self.events.push(LevelEvent::CountdownTick { ticket, remaining: 0 });
                self.apply_outcome(ticket, DoorOutcome::Timeout);
                true
            }
        }
    }

    /// Score a resolved door, consume it and update the exit barrier
    fn apply_outcome(&mut self, ticket: DoorTicket, outcome: DoorOutcome) {
        let door = &mut self.doors[ticket.door];
        let subject = door.puzzle().subject();
        match outcome {
            DoorOutcome::Correct => {
                self.progress.record_correct();
            }
            DoorOutcome::Wrong | DoorOutcome::Timeout => {
                let deduct = door.take_deduction();
                if !deduct {
                    log::info!("Door {}: marks already deducted", ticket.door);
                }
                self.progress.record_incorrect(deduct);
            }
        }
        self.stats.record(subject, outcome.solved());
        self.events.push(LevelEvent::DoorResolved {
            ticket,
            outcome,
            solved: outcome.solved(),
        });
        if door.consume() {
            self.events.push(LevelEvent::DoorConsumed { door: ticket.door });
        }

        self.active_door = None;
        self.waiting_for_input = true;
        log::info!("{}", self.progress);

        if self.progress.is_complete() && !self.exit_unlocked {
            self.exit_unlocked = true;
            log::info!("All questions answered, exit unlocked");
            self.events.push(LevelEvent::ExitUnlocked);
        }
    }

    /// Activate the first unconsumed door under the actor, if any
    pub(crate) fn check_doors(&mut self) {
        if self.active_door.is_some() {
            return;
        }
        let tile = self.actor.tile(&self.map);
        let Some(door) = self
            .doors
            .iter_mut()
            .find(|d| !d.is_consumed() && d.tile() == tile)
        else {
            return;
        };
        let Some(ticket) = door.activate() else {
            return;
        };
        let puzzle = door.puzzle().clone();
        self.active_door = Some(ticket);
        self.waiting_for_input = false;
        self.awaiting_release = true;
        self.actor.freeze();
        self.events.push(LevelEvent::DoorActivated { ticket, puzzle });
    }

    /// Finish on an unlocked exit; otherwise maybe warn that it is locked
    pub(crate) fn check_exit(&mut self) {
        let pos = self.actor.pos;
        if self.exit_unlocked {
            if self.map.is_on_exit(pos) {
                self.phase = LevelPhase::Complete;
                self.actor.freeze();
                let summary = self.summary();
                log::info!("Level complete: {}", self.progress);
                self.events.push(LevelEvent::LevelComplete(summary));
            }
            return;
        }

        let (row, col) = self.map.exit_tile();
        let dist = pos.distance(self.map.tile_center(row, col));
        let tile = self.map.tile_size();
        if dist < tile * EXIT_ADVISORY_RANGE {
            if !self.exit_advisory_shown {
                self.exit_advisory_shown = true;
                log::info!("Exit blocked, quiz is not over");
                self.events.push(LevelEvent::ExitLocked);
            }
        } else if dist > tile * EXIT_ADVISORY_RESET {
            self.exit_advisory_shown = false;
        }
    }

    /// Toggle pause. No effect once the level is complete.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            LevelPhase::Exploring => {
                self.phase = LevelPhase::Paused;
                self.events.push(LevelEvent::Paused);
            }
            LevelPhase::Paused => {
                self.phase = LevelPhase::Exploring;
                self.events.push(LevelEvent::Resumed);
            }
            LevelPhase::Complete => {}
        }
    }

    /// Start the level over with the same puzzles
    pub fn restart(&mut self) {
        for door in &mut self.doors {
            door.reset();
        }
        self.progress.reset();
        self.stats.clear();
        self.exit_unlocked = false;
        self.active_door = None;
        self.waiting_for_input = false;
        self.awaiting_release = false;
        self.exit_advisory_shown = false;
        self.actor.respawn(self.spawn);
        self.phase = LevelPhase::Exploring;
        self.time_ticks = 0;
        log::info!("Level restarted, progress reset");
        self.events.push(LevelEvent::Restarted);
    }
}

impl std::fmt::Debug for LevelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelController")
            .field("phase", &self.phase)
            .field("actor", &self.actor)
            .field("progress", &self.progress)
            .field("exit_unlocked", &self.exit_unlocked)
            .field("active_door", &self.active_door)
            .finish_non_exhaustive()
    }
}

/// Doors must sit on distinct, reachable floor tiles
fn check_door_placement(map: &TileMap, puzzles: &[Puzzle]) -> Result<(), LevelError> {
    let mut seen = HashSet::new();
    for p in puzzles {
        let (row, col) = p.tile();
        if !map.in_bounds(row, col) || map.tile_at(row, col) != TileKind::Floor {
            return Err(LevelError::DoorOffFloor {
                id: p.id().to_string(),
                row,
                col,
            });
        }
        if !seen.insert((row, col)) {
            return Err(LevelError::DuplicateDoorTile { row, col });
        }
        // Doors have to be answered before the exit opens
        if !map.is_reachable(map.spawn_tile(), (row, col), false) {
            return Err(LevelError::DoorUnreachable {
                id: p.id().to_string(),
                row,
                col,
            });
        }
    }
    Ok(())
}
