//! Fixed timestep simulation tick
//!
//! Advances a level by one step: input, movement, countdown, door trigger,
//! exit check.

use glam::Vec2;

use super::level::{LevelController, LevelPhase};

/// Input commands for a single tick (held keys)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    /// Sum of held directions in screen space (+y is down). Not normalised,
    /// so diagonals cover more ground.
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir
    }

    pub fn has_movement(&self) -> bool {
        self.direction() != Vec2::ZERO
    }
}

/// Advance the level by one fixed timestep
pub fn tick(level: &mut LevelController, input: &TickInput, dt: f32) {
    if input.pause {
        level.toggle_pause();
    }
    if level.phase != LevelPhase::Exploring {
        return;
    }
    level.time_ticks += 1;

    // Keys held through a question don't release the actor afterwards
    if !input.has_movement() {
        level.awaiting_release = false;
    }
    if level.waiting_for_input && input.has_movement() && !level.awaiting_release {
        level.waiting_for_input = false;
        level.actor.unfreeze();
        log::debug!("Movement resumed");
    }

    if !level.actor.is_frozen() {
        let step = input.direction() * level.player_speed * dt;
        level
            .actor
            .attempt_move(step.x, step.y, &level.map, level.exit_unlocked);
    }

    level.advance_countdown(dt);
    level.check_doors();
    level.check_exit();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::consts::SIM_DT;
    use crate::questions::{FallbackSource, Puzzle, Subject, fallback_puzzles};
    use crate::sim::door::{DoorOutcome, DoorState};
    use crate::sim::level::LevelEvent;
    use crate::sim::map::TileMap;

    fn level() -> LevelController {
        let map = TileMap::level_one(45.0).unwrap();
        LevelController::load(map, &FallbackSource, &Settings::default()).unwrap()
    }

    fn stand_on(level: &mut LevelController, (row, col): (i32, i32)) {
        level.actor.pos = level.map.tile_center(row, col);
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn down() -> TickInput {
        TickInput {
            down: true,
            ..Default::default()
        }
    }

    /// Step onto door `i` and return the ticket it hands out
    fn open_door(level: &mut LevelController, i: usize) -> crate::sim::DoorTicket {
        let tile = level.doors()[i].tile();
        stand_on(level, tile);
        tick(level, &idle(), SIM_DT);
        level.active_door().unwrap()
    }

    #[test]
    fn test_direction_is_unnormalised() {
        let input = TickInput {
            up: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(input.direction(), Vec2::new(1.0, -1.0));
        let cancel = TickInput {
            left: true,
            right: true,
            ..Default::default()
        };
        assert!(!cancel.has_movement());
    }

    #[test]
    fn test_walking_moves_at_player_speed() {
        let mut level = level();
        let start = level.actor().pos;
        tick(&mut level, &down(), SIM_DT);
        let moved = level.actor().pos - start;
        assert!((moved.y - 2.8).abs() < 1e-4);
        assert_eq!(moved.x, 0.0);
        assert!(level.actor().is_moving());
    }

    #[test]
    fn test_four_right_one_wrong_unlocks_exit() {
        let mut level = level();
        let answers = [1, 0, 1, 1, 2];

        // Wrong first, while marks are still at zero
        let t = open_door(&mut level, 0);
        assert!(!level.is_waiting_for_input());
        assert!(level.submit_answer(t, 0));
        for (i, &answer) in answers.iter().enumerate().skip(1) {
            let t = open_door(&mut level, i);
            assert!(level.actor().is_frozen());
            assert!(level.submit_answer(t, answer));
        }

        assert_eq!(level.progress().marks(), 4);
        assert_eq!(level.progress().correct(), 4);
        assert_eq!(level.progress().incorrect(), 1);
        assert_eq!(level.progress().grade(), "A");
        assert!(level.exit_unlocked());
        assert!(level.doors().iter().all(|d| d.state() == DoorState::Consumed));

        let events = level.drain_events();
        let unlocks = events.iter().filter(|e| **e == LevelEvent::ExitUnlocked).count();
        assert_eq!(unlocks, 1);

        // Release, then walk south from the last door into the exit
        tick(&mut level, &idle(), SIM_DT);
        for _ in 0..60 {
            tick(&mut level, &down(), SIM_DT);
            if level.is_complete() {
                break;
            }
        }
        assert!(level.is_complete());
        let summary = level.summary();
        assert_eq!(summary.marks, 4);
        assert_eq!(summary.percentage, 80.0);
        assert!(
            level
                .drain_events()
                .iter()
                .any(|e| matches!(e, LevelEvent::LevelComplete(s) if s.grade == "A"))
        );

        // Nothing moves once complete
        let pos = level.actor().pos;
        tick(&mut level, &down(), SIM_DT);
        assert_eq!(level.actor().pos, pos);
    }

    #[test]
    fn test_countdown_expiry_deducts() {
        let choices = vec!["a".to_string(), "b".to_string()];
        let quick = Puzzle::new("quick", Subject::Math, "?", choices, 0, 5, 3, 3).unwrap();
        let map = TileMap::level_one(45.0).unwrap();
        let mut level = LevelController::with_puzzles(map, vec![quick], &Settings::default()).unwrap();
        // Pad fills the remaining slots from the fallback bank
        assert_eq!(level.doors()[1].puzzle(), &fallback_puzzles()[1]);

        let ticket = open_door(&mut level, 0);
        level.drain_events();
        for _ in 0..5 {
            tick(&mut level, &idle(), 1.0);
        }

        let events = level.drain_events();
        let remaining: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                LevelEvent::CountdownTick { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);
        assert!(events.contains(&LevelEvent::DoorResolved {
            ticket,
            outcome: DoorOutcome::Timeout,
            solved: false,
        }));
        assert_eq!(level.doors()[0].state(), DoorState::Consumed);
        assert_eq!(level.progress().marks(), 0);
        assert_eq!(level.progress().incorrect(), 1);
        assert!(level.doors()[0].marks_already_deducted());

        // A late answer changes nothing
        assert!(!level.submit_answer(ticket, 0));
        assert_eq!(level.progress().answered(), 1);
    }

    #[test]
    fn test_timeout_after_correct_answer_takes_the_mark() {
        let choices = vec!["a".to_string(), "b".to_string()];
        let (row, col) = fallback_puzzles()[1].tile();
        let quick = Puzzle::new("quick", Subject::Science, "?", choices, 1, 5, row, col).unwrap();
        let first = fallback_puzzles().remove(0);
        let map = TileMap::level_one(45.0).unwrap();
        let mut level =
            LevelController::with_puzzles(map, vec![first, quick], &Settings::default()).unwrap();

        let t = open_door(&mut level, 0);
        assert!(level.submit_answer(t, 1));
        assert_eq!(level.progress().marks(), 1);

        let ticket = open_door(&mut level, 1);
        for _ in 0..5 * 60 - 1 {
            tick(&mut level, &idle(), SIM_DT);
        }
        assert_eq!(level.active_door(), Some(ticket));
        assert_eq!(level.doors()[1].remaining(), Some(1));

        tick(&mut level, &idle(), SIM_DT);
        assert_eq!(level.active_door(), None);
        assert_eq!(level.doors()[1].state(), DoorState::Consumed);
        assert_eq!(level.progress().marks(), 0);
        assert_eq!(level.progress().correct(), 1);
        assert_eq!(level.progress().incorrect(), 1);
        assert!(level.drain_events().contains(&LevelEvent::DoorResolved {
            ticket,
            outcome: DoorOutcome::Timeout,
            solved: false,
        }));
    }

    #[test]
    fn test_one_door_active_at_a_time() {
        let mut level = level();
        let first = open_door(&mut level, 0);
        let tile = level.doors()[1].tile();
        stand_on(&mut level, tile);
        tick(&mut level, &idle(), SIM_DT);
        assert_eq!(level.active_door(), Some(first));
        assert_eq!(level.doors()[1].state(), DoorState::Idle);
    }

    #[test]
    fn test_held_key_must_be_released() {
        let mut level = level();
        let tile = level.doors()[0].tile();
        stand_on(&mut level, tile);
        tick(&mut level, &down(), SIM_DT);
        let ticket = level.active_door().unwrap();
        tick(&mut level, &down(), SIM_DT);
        level.submit_answer(ticket, 1);

        let pos = level.actor().pos;
        tick(&mut level, &down(), SIM_DT);
        assert!(level.actor().is_frozen());
        assert_eq!(level.actor().pos, pos);

        tick(&mut level, &idle(), SIM_DT);
        tick(&mut level, &down(), SIM_DT);
        assert!(!level.actor().is_frozen());
        assert!(level.actor().pos.y > pos.y);
    }

    #[test]
    fn test_consumed_door_does_not_reactivate() {
        let mut level = level();
        let t = open_door(&mut level, 0);
        level.submit_answer(t, 1);
        tick(&mut level, &idle(), SIM_DT);
        assert_eq!(level.active_door(), None);
        assert_eq!(level.progress().answered(), 1);
    }

    #[test]
    fn test_locked_exit_advisory_fires_once() {
        let mut level = level();
        let t = open_door(&mut level, 4);
        level.abandon_puzzle(t);
        level.drain_events();

        let near_exit = level.map().tile_center(11, 10) + Vec2::new(0.0, 12.0);
        level.actor.pos = near_exit;
        tick(&mut level, &idle(), SIM_DT);
        tick(&mut level, &idle(), SIM_DT);
        let count = |events: Vec<LevelEvent>| {
            events.iter().filter(|e| **e == LevelEvent::ExitLocked).count()
        };
        assert_eq!(count(level.drain_events()), 1);

        // Re-arms after walking away
        stand_on(&mut level, (1, 1));
        tick(&mut level, &idle(), SIM_DT);
        level.actor.pos = near_exit;
        tick(&mut level, &idle(), SIM_DT);
        assert_eq!(count(level.drain_events()), 1);
        assert!(!level.is_complete());
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut level = level();
        let ticket = open_door(&mut level, 0);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut level, &pause, SIM_DT);
        assert_eq!(level.phase(), LevelPhase::Paused);

        let ticks = level.time_ticks();
        for _ in 0..10 {
            tick(&mut level, &idle(), 10.0);
        }
        assert_eq!(level.time_ticks(), ticks);
        assert_eq!(level.doors()[0].remaining(), Some(20));

        tick(&mut level, &pause, SIM_DT);
        assert_eq!(level.phase(), LevelPhase::Exploring);
        assert!(level.submit_answer(ticket, 1));
        let events = level.drain_events();
        assert!(events.contains(&LevelEvent::Paused));
        assert!(events.contains(&LevelEvent::Resumed));
    }

    #[test]
    fn test_restart_reuses_puzzles() {
        let mut level = level();
        let ids: Vec<String> = level.doors().iter().map(|d| d.puzzle().id().to_string()).collect();
        let t = open_door(&mut level, 0);
        level.submit_answer(t, 1);
        let stale = open_door(&mut level, 1);

        level.restart();
        assert_eq!(level.progress().answered(), 0);
        assert_eq!(level.active_door(), None);
        assert!(!level.exit_unlocked());
        assert!(!level.actor().is_frozen());
        assert_eq!(level.actor().tile(level.map()), (1, 1));
        assert!(level.doors().iter().all(|d| d.state() == DoorState::Idle));
        let again: Vec<&str> = level.doors().iter().map(|d| d.puzzle().id()).collect();
        assert_eq!(again, ids);

        // Tickets from before the restart are dead
        assert!(!level.submit_answer(stale, 0));
        assert!(!level.on_countdown_tick(stale));
    }
}
