//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The engine owns the state; views only ever see `&GameState`.

pub mod config;
pub mod direction;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use config::{ConfigError, GameConfig};
pub use direction::Direction;
pub use engine::{GameEngine, TickOutcome};
pub use state::{GameOverCause, GameState, Phase, Position, Snake};
