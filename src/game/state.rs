use std::fmt;

use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Current direction of movement
    pub direction: Direction,
}

impl Snake {
    /// Create a new snake with given starting position and direction.
    ///
    /// Extra segments are laid out behind the head, opposite to `direction`.
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let mut body = vec![head];

        for i in 1..length {
            let prev = body[i - 1];
            body.push(prev.moved_in_direction(direction.opposite()));
        }

        Self { body, direction }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Check if position is covered by any segment, head and tail included
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Move snake in current direction, growing if should_grow is true
    pub fn move_snake(&mut self, should_grow: bool) {
        let new_head = self.head().moved_in_direction(self.direction);
        self.body.insert(0, new_head);

        if !should_grow {
            self.body.pop();
        }
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCause {
    /// Snake hit a wall
    Wall,
    /// Snake hit itself
    SelfCollision,
    /// Snake covers every cell, so no food can be placed
    BoardFilled,
}

/// Lifecycle phase, derived from the state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    pub grid_width: usize,
    pub grid_height: usize,
    pub score: u32,
    pub steps: u32,
    pub game_over: bool,
    pub is_paused: bool,
    pub is_playing: bool,
    pub game_over_cause: Option<GameOverCause>,
}

impl GameState {
    /// Create a new game state, not yet playing
    pub fn new(snake: Snake, food: Position, grid_width: usize, grid_height: usize) -> Self {
        Self {
            snake,
            food,
            grid_width,
            grid_height,
            score: 0,
            steps: 0,
            game_over: false,
            is_paused: false,
            is_playing: false,
            game_over_cause: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.game_over {
            Phase::GameOver
        } else if !self.is_playing {
            Phase::Idle
        } else if self.is_paused {
            Phase::Paused
        } else {
            Phase::Running
        }
    }

    /// Current direction of travel
    pub fn direction(&self) -> Direction {
        self.snake.direction
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x < self.grid_width as i32
            && pos.y >= 0
            && pos.y < self.grid_height as i32
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }

    /// Every grid cell not covered by the snake, in row-major order
    pub fn free_cells(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.grid_width as i32;
        let height = self.grid_height as i32;

        (0..height)
            .flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
            .filter(|pos| !self.is_occupied_by_snake(*pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_by(0, 1), Position::new(5, 6));
        assert_eq!(pos.moved_by(0, -1), Position::new(5, 4));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, -1).to_string(), "(3, -1)");
    }

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(snake.body[1], Position::new(4, 5));
        assert_eq!(snake.body[2], Position::new(3, 5));
    }

    #[test]
    fn test_single_segment_snake() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 1);
        assert_eq!(snake.body, vec![Position::new(5, 5)]);
    }

    #[test]
    fn test_snake_movement() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3);

        // Move without growing
        snake.move_snake(false);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(6, 5));

        // Move with growing
        snake.move_snake(true);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.head(), Position::new(7, 5));
        assert_eq!(snake.body[3], Position::new(4, 5));
    }

    #[test]
    fn test_occupancy_includes_head_and_tail() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        assert!(snake.occupies(Position::new(5, 5)));
        assert!(snake.occupies(Position::new(3, 5)));
        assert!(!snake.occupies(Position::new(10, 10)));
    }

    #[test]
    fn test_bounds_checking() {
        let state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 3),
            Position::new(10, 10),
            20,
            20,
        );

        assert!(state.is_in_bounds(Position::new(0, 0)));
        assert!(state.is_in_bounds(Position::new(19, 19)));
        assert!(!state.is_in_bounds(Position::new(-1, 0)));
        assert!(!state.is_in_bounds(Position::new(20, 0)));
        assert!(!state.is_in_bounds(Position::new(0, 20)));
    }

    #[test]
    fn test_phase_derivation() {
        let mut state = GameState::new(
            Snake::new(Position::new(1, 1), Direction::Right, 1),
            Position::new(3, 3),
            5,
            5,
        );
        assert_eq!(state.phase(), Phase::Idle);

        state.is_playing = true;
        assert_eq!(state.phase(), Phase::Running);

        state.is_paused = true;
        assert_eq!(state.phase(), Phase::Paused);

        state.game_over = true;
        assert_eq!(state.phase(), Phase::GameOver);
    }

    #[test]
    fn test_free_cells_exclude_snake() {
        let state = GameState::new(
            Snake::new(Position::new(1, 0), Direction::Right, 2),
            Position::new(2, 1),
            3,
            2,
        );

        let free: Vec<Position> = state.free_cells().collect();
        assert_eq!(
            free,
            vec![
                Position::new(2, 0),
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(2, 1),
            ]
        );
    }
}
