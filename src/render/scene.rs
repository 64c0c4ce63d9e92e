//! Screen-space layout of a game state.
//!
//! Every grid coordinate maps to `coordinate * cell size` on screen. A pixel
//! view uses [`CELL_SIZE`]-sized square cells; the terminal view uses
//! [`CellSize::TERMINAL`], two columns by one row so cells look square.

use crate::game::{GameState, Position};

/// Side of a grid cell in pixels
pub const CELL_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    pub const TERMINAL: CellSize = CellSize {
        width: 2,
        height: 1,
    };

    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::square(CELL_SIZE)
    }
}

/// Top-left corner of a cell on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: u32,
    pub y: u32,
}

/// Map a grid position to the top-left corner of its cell.
///
/// Returns `None` for positions left of or above the grid, or too far out to
/// address.
pub fn to_screen(pos: Position, cell: CellSize) -> Option<ScreenPoint> {
    let x = u32::try_from(pos.x).ok()?;
    let y = u32::try_from(pos.y).ok()?;

    Some(ScreenPoint {
        x: x.checked_mul(cell.width)?,
        y: y.checked_mul(cell.height)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Food,
    Body,
    Head,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub origin: ScreenPoint,
}

/// Everything a view needs to draw one frame of the playfield
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub cell: CellSize,
    pub columns: u32,
    pub rows: u32,
    /// Painted in order, so later sprites cover earlier ones
    pub sprites: Vec<Sprite>,
}

impl Scene {
    pub fn from_state(state: &GameState, cell: CellSize) -> Self {
        let mut sprites = Vec::with_capacity(state.snake.len() + 1);

        if let Some(origin) = to_screen(state.food, cell) {
            sprites.push(Sprite {
                kind: SpriteKind::Food,
                origin,
            });
        }

        // Tail first so the head ends up on top
        for (i, segment) in state.snake.body.iter().enumerate().rev() {
            let kind = if i == 0 {
                SpriteKind::Head
            } else {
                SpriteKind::Body
            };
            if let Some(origin) = to_screen(*segment, cell) {
                sprites.push(Sprite { kind, origin });
            }
        }

        Self {
            cell,
            columns: u32::try_from(state.grid_width).unwrap_or(u32::MAX),
            rows: u32::try_from(state.grid_height).unwrap_or(u32::MAX),
            sprites,
        }
    }

    /// Size of the playfield on screen
    pub fn size(&self) -> (u32, u32) {
        (
            self.columns.saturating_mul(self.cell.width),
            self.rows.saturating_mul(self.cell.height),
        )
    }
}
