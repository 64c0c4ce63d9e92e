use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use super::{
    config::{ConfigError, GameConfig},
    direction::Direction,
    state::{GameOverCause, GameState, Phase, Position, Snake},
};

/// What a call to [`GameEngine::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The engine was idle, paused or over; nothing changed
    Skipped,
    /// The snake moved one cell
    Moved,
    /// The snake moved onto the food and grew
    Ate,
    /// The game ended this tick
    GameOver(GameOverCause),
}

/// The game engine: sole owner of the game state
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    pending_direction: Option<Direction>,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new idle engine seeded from the OS
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a new idle engine with reproducible food placement
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = Self::initial_state(&config);
        let mut engine = Self {
            config,
            state,
            pending_direction: None,
            rng,
        };
        engine.respawn_food();

        Ok(engine)
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Direction queued for the next tick, if any
    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending_direction
    }

    /// Reset to the initial state and begin playing
    pub fn start(&mut self) {
        self.reset_state();
        self.state.is_playing = true;
        debug!(food = %self.state.food, "game started");
    }

    /// Reset to the initial state without playing
    pub fn reset(&mut self) {
        self.reset_state();
        debug!("game reset");
    }

    /// Queue a direction change for the next tick.
    ///
    /// Ignored when not playing, after game over, or when `direction` would
    /// reverse the snake onto itself. Returns whether the change was queued.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if !self.state.is_playing || self.state.game_over {
            return false;
        }
        if self.state.snake.direction.is_opposite(direction) {
            trace!(?direction, "reversal rejected");
            return false;
        }

        self.pending_direction = Some(direction);
        true
    }

    /// Pause or resume. Returns whether the toggle was applied.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.state.is_playing || self.state.game_over {
            return false;
        }

        self.state.is_paused = !self.state.is_paused;
        debug!(paused = self.state.is_paused, "pause toggled");
        true
    }

    /// Advance the simulation by one step
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.phase() != Phase::Running {
            return TickOutcome::Skipped;
        }

        if let Some(direction) = self.pending_direction.take() {
            if !self.state.snake.direction.is_opposite(direction) {
                self.state.snake.direction = direction;
            }
        }

        let new_head = self
            .state
            .snake
            .head()
            .moved_in_direction(self.state.snake.direction);

        if !self.state.is_in_bounds(new_head) {
            return self.end_game(GameOverCause::Wall);
        }
        // The tail still counts: it has not moved out of the way yet
        if self.state.is_occupied_by_snake(new_head) {
            return self.end_game(GameOverCause::SelfCollision);
        }

        let ate_food = new_head == self.state.food;
        self.state.snake.move_snake(ate_food);
        self.state.steps += 1;

        if !ate_food {
            trace!(head = %new_head, "moved");
            return TickOutcome::Moved;
        }

        self.state.score += self.config.food_score;
        debug!(score = self.state.score, length = self.state.snake.len(), "food eaten");

        if self.respawn_food() {
            TickOutcome::Ate
        } else {
            TickOutcome::GameOver(GameOverCause::BoardFilled)
        }
    }

    /// Pick a cell for food uniformly among the cells the snake does not cover.
    ///
    /// Returns `None` when the snake covers the whole grid.
    pub fn place_food(&mut self) -> Option<Position> {
        let free: Vec<Position> = self.state.free_cells().collect();
        free.choose(&mut self.rng).copied()
    }

    fn initial_state(config: &GameConfig) -> GameState {
        let snake = Snake::new(
            config.start_position,
            config.initial_direction,
            config.initial_snake_length,
        );
        // Placeholder until the first placement
        let food = snake.head();

        GameState::new(snake, food, config.grid_width, config.grid_height)
    }

    fn reset_state(&mut self) {
        self.state = Self::initial_state(&self.config);
        self.pending_direction = None;
        self.respawn_food();
    }

    /// Move the food to a free cell, ending the game if there is none
    fn respawn_food(&mut self) -> bool {
        match self.place_food() {
            Some(food) => {
                self.state.food = food;
                true
            }
            None => {
                self.end_game(GameOverCause::BoardFilled);
                false
            }
        }
    }

    fn end_game(&mut self, cause: GameOverCause) -> TickOutcome {
        self.state.game_over = true;
        self.state.game_over_cause = Some(cause);
        self.pending_direction = None;
        debug!(?cause, score = self.state.score, steps = self.state.steps, "game over");
        TickOutcome::GameOver(cause)
    }
}
