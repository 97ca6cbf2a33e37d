//! The player avatar
//!
//! Movement is a direct displacement per step (no velocity), resolved
//! against the map with axis-separated sliding.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::map::TileMap;
use crate::consts::COLLISION_RADIUS_FACTOR;

/// The player's avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub pos: Vec2,
    /// Visual radius
    pub radius: f32,
    /// Fraction of `radius` used for wall tests (keeps corridors comfortable)
    pub collision_factor: f32,
    /// Frozen actors ignore movement entirely
    frozen: bool,
    /// Whether the last step moved (drives the walk animation)
    moving: bool,
}

impl Actor {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            collision_factor: COLLISION_RADIUS_FACTOR,
            frozen: false,
            moving: false,
        }
    }

    pub fn with_collision_factor(mut self, factor: f32) -> Self {
        self.collision_factor = factor;
        self
    }

    /// Radius used against walls
    pub fn collision_radius(&self) -> f32 {
        self.radius * self.collision_factor
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
        self.moving = false;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Place at `pos`, free to move
    pub fn respawn(&mut self, pos: Vec2) {
        self.pos = pos;
        self.frozen = false;
        self.moving = false;
    }

    /// Try to move by (dx, dy).
    ///
    /// The full diagonal is tried first. If it is blocked, the horizontal
    /// and then the vertical part are tried on their own so the actor slides
    /// along walls. A coordinate only changes when its test passes, so the
    /// actor never ends a step overlapping a solid tile it was clear of.
    pub fn attempt_move(&mut self, dx: f32, dy: f32, map: &TileMap, exit_unlocked: bool) {
        if self.frozen {
            return;
        }
        if dx == 0.0 && dy == 0.0 {
            self.moving = false;
            return;
        }

        let r = self.collision_radius();
        let start = self.pos;
        let full = start + Vec2::new(dx, dy);
        if !map.collides(full, r, exit_unlocked) {
            self.pos = full;
        } else {
            let horizontal = Vec2::new(start.x + dx, start.y);
            if dx != 0.0 && !map.collides(horizontal, r, exit_unlocked) {
                self.pos.x = horizontal.x;
            }
            let vertical = Vec2::new(self.pos.x, start.y + dy);
            if dy != 0.0 && !map.collides(vertical, r, exit_unlocked) {
                self.pos.y = vertical.y;
            }
        }
        self.moving = self.pos != start;
    }

    /// Tile the actor's centre is on
    pub fn tile(&self, map: &TileMap) -> (i32, i32) {
        map.tile_of(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 11×11 open field with a 3×3 wall block centred on tile (5, 5)
    fn block_map() -> TileMap {
        let mut text = String::new();
        for r in 0..11 {
            for c in 0..11 {
                let ch = if (4..=6).contains(&r) && (4..=6).contains(&c) {
                    '#'
                } else if (r, c) == (10, 10) {
                    'E'
                } else {
                    '.'
                };
                text.push(ch);
            }
            text.push('\n');
        }
        TileMap::parse(&text, 10.0).unwrap()
    }

    /// Collision radius 3
    fn actor_at(x: f32, y: f32) -> Actor {
        Actor::new(Vec2::new(x, y), 6.0)
    }

    #[test]
    fn test_move_into_block_is_rejected() {
        let map = block_map();
        let mut actor = actor_at(25.0, 55.0);
        assert_eq!(actor.collision_radius(), 3.0);
        // Straight at the block's centre (55, 55)
        actor.attempt_move(30.0, 0.0, &map, false);
        assert_eq!(actor.pos, Vec2::new(25.0, 55.0));
        assert!(!actor.is_moving());
    }

    #[test]
    fn test_slides_along_wall_face() {
        let map = block_map();
        // 3.5 px left of the block's west face at x = 40
        let mut actor = actor_at(36.5, 55.0);
        actor.attempt_move(2.0, 2.0, &map, false);
        assert_eq!(actor.pos.x, 36.5);
        assert_eq!(actor.pos.y, 57.0);
        assert!(actor.is_moving());
    }

    #[test]
    fn test_diagonal_commits_when_clear() {
        let map = block_map();
        let mut actor = actor_at(15.0, 15.0);
        actor.attempt_move(2.0, 3.0, &map, false);
        assert_eq!(actor.pos, Vec2::new(17.0, 18.0));
    }

    #[test]
    fn test_frozen_actor_ignores_input() {
        let map = block_map();
        let mut actor = actor_at(15.0, 15.0);
        actor.freeze();
        actor.attempt_move(2.0, 0.0, &map, false);
        assert_eq!(actor.pos, Vec2::new(15.0, 15.0));
        actor.unfreeze();
        actor.attempt_move(2.0, 0.0, &map, false);
        assert_eq!(actor.pos, Vec2::new(17.0, 15.0));
    }

    #[test]
    fn test_zero_move_stops() {
        let map = block_map();
        let mut actor = actor_at(15.0, 15.0);
        actor.attempt_move(1.0, 0.0, &map, false);
        assert!(actor.is_moving());
        actor.attempt_move(0.0, 0.0, &map, false);
        assert!(!actor.is_moving());
    }

    #[test]
    fn test_locked_exit_blocks_entry() {
        let map = block_map();
        // Tile (10, 9) centre, heading east into the exit at (10, 10)
        let mut actor = actor_at(95.0, 105.0);
        actor.attempt_move(8.0, 0.0, &map, false);
        assert_eq!(actor.pos.x, 95.0);
        actor.attempt_move(8.0, 0.0, &map, true);
        assert_eq!(actor.pos.x, 103.0);
        assert!(map.is_on_exit(actor.pos));
    }

    proptest! {
        #[test]
        fn prop_never_ends_inside_wall(
            moves in proptest::collection::vec((-4.0f32..4.0, -4.0f32..4.0), 1..60)
        ) {
            let map = block_map();
            let mut actor = actor_at(15.0, 15.0);
            for (dx, dy) in moves {
                actor.attempt_move(dx, dy, &map, false);
                prop_assert!(!map.collides(actor.pos, actor.collision_radius(), false));
            }
        }
    }
}
