//! Keyboard decoding for the terminal session

pub mod handler;

pub use handler::{InputHandler, KeyAction};
