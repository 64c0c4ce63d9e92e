//! Grid Snake - a fixed-tick snake game for the terminal
//!
//! This library provides:
//! - Core game logic: state, tick, input rules, food placement (game module)
//! - Keyboard decoding (input module)
//! - Screen mapping and TUI rendering (render module)
//! - Session statistics (metrics module)
//! - The interactive terminal session (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
