use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::direction::Direction;
use super::state::{Position, Snake};

/// Errors raised while loading or validating a [`GameConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,

    #[error("initial snake length must be at least 1")]
    EmptySnake,

    #[error(
        "a snake of length {length} starting at {start} heading {direction:?} \
         does not fit in a {width}x{height} grid"
    )]
    StartOutOfBounds {
        start: Position,
        direction: Direction,
        length: usize,
        width: usize,
        height: usize,
    },

    #[error("a {width}x{height} grid exceeds the {max}-cell limit per side")]
    GridTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    #[error("a {width}x{height} grid leaves no room for food next to a snake of length {length}")]
    GridTooSmall {
        width: usize,
        height: usize,
        length: usize,
    },
}

/// Largest grid side accepted, in cells
pub const MAX_GRID_SIDE: usize = 500;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,
    /// Cell occupied by the head when a game starts
    pub start_position: Position,
    /// Direction of travel when a game starts
    pub initial_direction: Direction,
    /// Points awarded per food eaten
    pub food_score: u32,
    /// Milliseconds between simulation ticks
    pub tick_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            initial_snake_length: 1,
            start_position: Position::new(5, 5),
            initial_direction: Direction::Right,
            food_score: 10,
            tick_interval_ms: 150,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check that a game can be started with this configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.initial_snake_length == 0 {
            return Err(ConfigError::EmptySnake);
        }

        if self.grid_width > MAX_GRID_SIDE || self.grid_height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                width: self.grid_width,
                height: self.grid_height,
                max: MAX_GRID_SIDE,
            });
        }

        let cells = self.grid_width.saturating_mul(self.grid_height);
        if cells <= self.initial_snake_length {
            return Err(ConfigError::GridTooSmall {
                width: self.grid_width,
                height: self.grid_height,
                length: self.initial_snake_length,
            });
        }

        let snake = Snake::new(
            self.start_position,
            self.initial_direction,
            self.initial_snake_length,
        );
        let fits = snake.body.iter().all(|pos| {
            pos.x >= 0
                && pos.y >= 0
                && (pos.x as usize) < self.grid_width
                && (pos.y as usize) < self.grid_height
        });
        if !fits {
            return Err(ConfigError::StartOutOfBounds {
                start: self.start_position,
                direction: self.initial_direction,
                length: self.initial_snake_length,
                width: self.grid_width,
                height: self.grid_height,
            });
        }

        Ok(())
    }
}
