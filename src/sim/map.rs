//! Static tile grid and the geometric queries movement relies on
//!
//! Rows grow downward, columns to the right. World coordinates are pixels
//! with `origin` at the top-left corner of tile (0, 0).

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, circle_overlaps_aabb};
use crate::{tile_center, world_to_tile};

/// Built-in first level. Doors sit on the fixed door tiles
/// (3,3) (5,5) (7,8) (9,6) (11,10); the exit is on the south wall.
pub const LEVEL_ONE: &str = "\
###############
#.....#.......#
#.###.#.#####.#
#.#.....#...#.#
#.#.###.#.#.#.#
#...#.....#...#
###.#.#####.###
#.....#.....#.#
#.###.#.#.###.#
#.#.........#.#
#.#.#####.#.#.#
#...#.........#
##########E####";

/// What a tile is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Floor,
    Wall,
    Exit,
}

impl TileKind {
    /// Map file glyph
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' | ' ' => Some(TileKind::Floor),
            '#' => Some(TileKind::Wall),
            'E' => Some(TileKind::Exit),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            TileKind::Floor => '.',
            TileKind::Wall => '#',
            TileKind::Exit => 'E',
        }
    }

    /// Walls always block; the exit blocks until unlocked
    pub fn is_solid(&self, exit_unlocked: bool) -> bool {
        match self {
            TileKind::Wall => true,
            TileKind::Exit => !exit_unlocked,
            TileKind::Floor => false,
        }
    }
}

/// Map integrity failures. A level cannot start on a map that has any.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("map has no tiles")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown tile {ch:?} at row {row}, col {col}")]
    UnknownTile { ch: char, row: usize, col: usize },
    #[error("map has no floor tile to spawn on")]
    NoSpawn,
    #[error("map has no exit tile")]
    NoExit,
    #[error("exit at {exit:?} cannot be reached from spawn at {spawn:?}")]
    ExitUnreachable { spawn: (i32, i32), exit: (i32, i32) },
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(f32),
}

/// Immutable grid of tiles
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    tiles: Vec<TileKind>,
    rows: usize,
    cols: usize,
    tile_size: f32,
    origin: Vec2,
    spawn: (i32, i32),
    exit: (i32, i32),
}

impl TileMap {
    /// Build from rows of tiles, checking integrity
    pub fn new(grid: Vec<Vec<TileKind>>, tile_size: f32) -> Result<Self, MapError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(MapError::InvalidTileSize(tile_size));
        }
        let rows = grid.len();
        let cols = grid.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(MapError::Empty);
        }
        if let Some((row, r)) = grid.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(MapError::Ragged {
                row,
                expected: cols,
                found: r.len(),
            });
        }
        let tiles: Vec<TileKind> = grid.into_iter().flatten().collect();

        let find = |kind: TileKind| {
            tiles
                .iter()
                .position(|&t| t == kind)
                .map(|i| ((i / cols) as i32, (i % cols) as i32))
        };
        let spawn = find(TileKind::Floor).ok_or(MapError::NoSpawn)?;
        let exit = find(TileKind::Exit).ok_or(MapError::NoExit)?;

        let map = Self {
            tiles,
            rows,
            cols,
            tile_size,
            origin: Vec2::ZERO,
            spawn,
            exit,
        };
        if !map.is_reachable(spawn, exit, true) {
            return Err(MapError::ExitUnreachable { spawn, exit });
        }
        Ok(map)
    }

    /// Parse an ASCII map: `#` wall, `.` or space floor, `E` exit
    pub fn parse(text: &str, tile_size: f32) -> Result<Self, MapError> {
        let mut grid = Vec::new();
        for (row, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let tiles = line
                .chars()
                .enumerate()
                .map(|(col, ch)| TileKind::from_char(ch).ok_or(MapError::UnknownTile { ch, row, col }))
                .collect::<Result<Vec<_>, _>>()?;
            grid.push(tiles);
        }
        Self::new(grid, tile_size)
    }

    /// The built-in first level
    pub fn level_one(tile_size: f32) -> Result<Self, MapError> {
        Self::parse(LEVEL_ONE, tile_size)
    }

    /// Move the map so its top-left corner sits at `origin`
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Centre the map inside a viewport of the given size
    pub fn centered_in(self, viewport: Vec2) -> Self {
        let origin = (viewport - Vec2::new(self.width(), self.height())) * 0.5;
        self.with_origin(origin)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width in pixels
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.tile_size
    }

    /// Height in pixels
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    /// First floor tile in row-major order
    pub fn spawn_tile(&self) -> (i32, i32) {
        self.spawn
    }

    /// First exit tile in row-major order
    pub fn exit_tile(&self) -> (i32, i32) {
        self.exit
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Tile at (row, col). Everything outside the grid reads as wall.
    pub fn tile_at(&self, row: i32, col: i32) -> TileKind {
        if self.in_bounds(row, col) {
            self.tiles[row as usize * self.cols + col as usize]
        } else {
            TileKind::Wall
        }
    }

    /// (row, col) of the tile containing a world position
    pub fn tile_of(&self, pos: Vec2) -> (i32, i32) {
        world_to_tile(pos, self.origin, self.tile_size)
    }

    /// World position of a tile's centre
    pub fn tile_center(&self, row: i32, col: i32) -> Vec2 {
        tile_center(row, col, self.origin, self.tile_size)
    }

    /// World-space box covered by a tile
    pub fn tile_bounds(&self, row: i32, col: i32) -> Aabb {
        let min = self.origin + Vec2::new(col as f32, row as f32) * self.tile_size;
        Aabb::square(min, self.tile_size)
    }

    pub fn is_on_exit(&self, pos: Vec2) -> bool {
        let (row, col) = self.tile_of(pos);
        self.in_bounds(row, col) && self.tile_at(row, col) == TileKind::Exit
    }

    /// Whether a circle at `pos` overlaps any solid tile in the 3×3
    /// neighbourhood of the tile it is centred on
    pub fn collides(&self, pos: Vec2, radius: f32, exit_unlocked: bool) -> bool {
        let (row, col) = self.tile_of(pos);
        for r in row - 1..=row + 1 {
            for c in col - 1..=col + 1 {
                if !self.tile_at(r, c).is_solid(exit_unlocked) {
                    continue;
                }
                if circle_overlaps_aabb(pos, radius, &self.tile_bounds(r, c)) {
                    return true;
                }
            }
        }
        false
    }

    /// 4-way flood fill over tiles the actor can walk on. With the exit
    /// locked it counts as a wall, so nothing behind it is reachable.
    pub fn is_reachable(&self, from: (i32, i32), to: (i32, i32), exit_unlocked: bool) -> bool {
        let walkable =
            |(r, c): (i32, i32)| self.in_bounds(r, c) && !self.tile_at(r, c).is_solid(exit_unlocked);
        if !walkable(from) || !walkable(to) {
            return false;
        }
        let mut seen = vec![false; self.tiles.len()];
        let mut queue = VecDeque::from([from]);
        seen[from.0 as usize * self.cols + from.1 as usize] = true;
        while let Some((r, c)) = queue.pop_front() {
            if (r, c) == to {
                return true;
            }
            for next in [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)] {
                if !walkable(next) {
                    continue;
                }
                let idx = next.0 as usize * self.cols + next.1 as usize;
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }
}
