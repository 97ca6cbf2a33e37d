//! Game settings
//!
//! Read from a JSON file next to the game. Any field left out of the file
//! takes its default, and a missing or broken file means all defaults.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Settings file failures
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Map ===
    /// Tile edge in pixels
    pub tile_size: f32,
    /// ASCII map file; the built-in level when unset
    pub map_path: Option<PathBuf>,
    /// Width and height the map is centred in
    pub viewport: [f32; 2],

    // === Player ===
    /// Visual radius in pixels
    pub player_radius: f32,
    /// Pixels per second
    pub player_speed: f32,
    /// Fraction of the radius used for wall collision, in (0, 1]
    pub collision_radius_factor: f32,

    // === Questions ===
    /// JSON question store; the fallback bank when unset or unreadable
    pub question_bank: Option<PathBuf>,
    /// Seed for the question draw order
    pub shuffle_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            map_path: None,
            viewport: [VIEWPORT_WIDTH, VIEWPORT_HEIGHT],

            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            collision_radius_factor: COLLISION_RADIUS_FACTOR,

            question_bank: None,
            shuffle_seed: 0x5eed,
        }
    }
}

impl Settings {
    pub fn viewport(&self) -> Vec2 {
        Vec2::from(self.viewport)
    }

    /// Effective collision radius
    pub fn collision_radius(&self) -> f32 {
        self.player_radius * self.collision_radius_factor
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("tile_size", self.tile_size),
            ("player_radius", self.player_radius),
            ("player_speed", self.player_speed),
            ("viewport width", self.viewport[0]),
            ("viewport height", self.viewport[1]),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SettingsError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        let f = self.collision_radius_factor;
        if !f.is_finite() || f <= 0.0 || f > 1.0 {
            return Err(SettingsError::Invalid(format!(
                "collision_radius_factor must be in (0, 1], got {f}"
            )));
        }
        if self.collision_radius() * 2.0 >= self.tile_size {
            return Err(SettingsError::Invalid(format!(
                "collision radius {} does not fit a {} px corridor",
                self.collision_radius(),
                self.tile_size
            )));
        }
        Ok(())
    }

    /// Parse and validate without falling back
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`, or defaults if that fails
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
