//! Terminal view of the game state

pub mod renderer;
pub mod scene;

pub use renderer::Renderer;
pub use scene::{CELL_SIZE, CellSize, Scene, ScreenPoint, Sprite, SpriteKind, to_screen};
