use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stderr, stderr};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info, warn};

use crate::game::{GameConfig, GameEngine, Phase, TickOutcome};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;

/// Interactive session: keyboard in, terminal frames out
pub struct HumanMode {
    engine: GameEngine,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig, seed: Option<u64>) -> Result<Self> {
        let engine = match seed {
            Some(seed) => GameEngine::with_seed(config, seed),
            None => GameEngine::new(config),
        }
        .context("Invalid game configuration")?;

        Ok(Self {
            engine,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal; the guard undoes it on every way out of this function
        let _guard = TerminalGuard::enter()?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        self.run_game_loop(&mut terminal).await
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Armed only while the engine is running
        let mut tick_timer: Option<Interval> = None;

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(err)) => return Err(err).context("Failed to read terminal event"),
                        None => self.should_quit = true,
                    }
                }

                // Game logic tick
                _ = next_tick(&mut tick_timer) => {
                    self.update_game();
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update(self.engine.phase() == Phase::Running);
                    terminal.draw(|frame| {
                        self.renderer.render(frame, self.engine.state(), &self.metrics);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                info!(games = self.metrics.games_played, best = self.metrics.high_score, "quitting");
                break;
            }

            self.sync_tick_timer(&mut tick_timer);
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            self.apply(action);
        }
    }

    /// Route a decoded key to the engine
    fn apply(&mut self, action: KeyAction) {
        match action {
            KeyAction::Steer(direction) => {
                self.engine.set_direction(direction);
            }
            KeyAction::TogglePause => {
                self.engine.toggle_pause();
            }
            KeyAction::Play => {
                if self.engine.phase() == Phase::Idle {
                    self.start_game();
                }
            }
            KeyAction::Replay => {
                if self.engine.phase() == Phase::GameOver {
                    self.engine.reset();
                    self.start_game();
                }
            }
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::None => {}
        }
    }

    fn update_game(&mut self) {
        if let TickOutcome::GameOver(cause) = self.engine.tick() {
            let score = self.engine.state().score;
            debug!(?cause, score, "game finished");
            self.metrics.on_game_over(score);
        }
    }

    fn start_game(&mut self) {
        self.engine.start();
        self.metrics.on_game_start();
    }

    /// Arm the tick timer on entering Running, drop it on leaving
    fn sync_tick_timer(&self, tick_timer: &mut Option<Interval>) {
        let running = self.engine.phase() == Phase::Running;

        match (running, tick_timer.is_some()) {
            (true, false) => {
                let period = self.engine.config().tick_interval();
                let mut timer = interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *tick_timer = Some(timer);
                debug!(?period, "tick timer armed");
            }
            (false, true) => {
                *tick_timer = None;
                debug!("tick timer released");
            }
            _ => {}
        }
    }
}

/// Raw mode, alternate screen and hidden cursor, restored on drop
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stderr = stderr();
        // Every step runs, even after an earlier one fails
        let failures = report_failures([
            ("disable raw mode", disable_raw_mode()),
            ("leave alternate screen", execute!(stderr, LeaveAlternateScreen)),
            ("show cursor", execute!(stderr, cursor::Show)),
        ]);
        if failures > 0 {
            warn!(failures, "terminal not fully restored");
        }
    }
}

/// Log each failed step and return how many failed
fn report_failures(steps: impl IntoIterator<Item = (&'static str, io::Result<()>)>) -> usize {
    let mut failures = 0;
    for (step, result) in steps {
        if let Err(err) = result {
            warn!(step, %err, "terminal restore step failed");
            failures += 1;
        }
    }
    failures
}

/// Resolves on the next tick, or never when no timer is armed
async fn next_tick(tick_timer: &mut Option<Interval>) {
    match tick_timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Direction;

    fn mode() -> HumanMode {
        HumanMode::new(GameConfig::default(), Some(11)).unwrap()
    }

    #[test]
    fn test_game_initialization() {
        let mode = mode();
        assert_eq!(mode.engine.phase(), Phase::Idle);
        assert_eq!(mode.engine.state().score, 0);
    }

    #[test]
    fn test_invalid_config() {
        let config = GameConfig::new(2, 2);
        assert!(HumanMode::new(config, None).is_err());
    }

    #[test]
    fn test_play_starts_only_from_idle() {
        let mut mode = mode();

        mode.apply(KeyAction::Steer(Direction::Up));
        assert_eq!(mode.engine.pending_direction(), None);

        mode.apply(KeyAction::Play);
        assert_eq!(mode.engine.phase(), Phase::Running);

        mode.apply(KeyAction::Steer(Direction::Up));
        mode.apply(KeyAction::Play);
        assert_eq!(mode.engine.pending_direction(), Some(Direction::Up));
    }

    #[test]
    fn test_space_pauses_and_resumes() {
        let mut mode = mode();
        mode.apply(KeyAction::Play);

        mode.apply(KeyAction::TogglePause);
        assert_eq!(mode.engine.phase(), Phase::Paused);

        mode.apply(KeyAction::TogglePause);
        assert_eq!(mode.engine.phase(), Phase::Running);
    }

    #[test]
    fn test_replay_after_game_over() {
        let mut mode = mode();

        // Replay does nothing before a game has ended
        mode.apply(KeyAction::Replay);
        assert_eq!(mode.engine.phase(), Phase::Idle);

        mode.apply(KeyAction::Play);
        mode.apply(KeyAction::Steer(Direction::Up));
        while mode.engine.phase() != Phase::GameOver {
            mode.update_game();
        }
        assert_eq!(mode.metrics.games_played, 1);

        mode.apply(KeyAction::Replay);
        assert_eq!(mode.engine.phase(), Phase::Running);
        assert_eq!(mode.engine.state().score, 0);
    }

    #[test]
    fn test_quit() {
        let mut mode = mode();
        mode.apply(KeyAction::Quit);
        assert!(mode.should_quit);
    }

    #[test]
    fn test_restore_failures_do_not_stop_later_steps() {
        let mut visited = Vec::new();
        let steps = ["first", "second", "third"].map(|step| {
            visited.push(step);
            let result = if step == "first" {
                Err(io::Error::other("no tty"))
            } else {
                Ok(())
            };
            (step, result)
        });

        assert_eq!(report_failures(steps), 1);
        assert_eq!(visited, ["first", "second", "third"]);
    }

    #[test]
    fn test_restore_counts_every_failure() {
        let failures = report_failures([
            ("disable raw mode", Err(io::Error::other("a"))),
            ("leave alternate screen", Err(io::Error::other("b"))),
            ("show cursor", Ok(())),
        ]);
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn test_tick_timer_follows_phase() {
        let mut mode = mode();
        let mut timer = None;

        mode.sync_tick_timer(&mut timer);
        assert!(timer.is_none());

        mode.apply(KeyAction::Play);
        mode.sync_tick_timer(&mut timer);
        assert!(timer.is_some());

        mode.apply(KeyAction::TogglePause);
        mode.sync_tick_timer(&mut timer);
        assert!(timer.is_none());

        mode.apply(KeyAction::TogglePause);
        mode.sync_tick_timer(&mut timer);
        assert!(timer.is_some());

        mode.apply(KeyAction::Steer(Direction::Up));
        while mode.engine.phase() != Phase::GameOver {
            mode.update_game();
        }
        mode.sync_tick_timer(&mut timer);
        assert!(timer.is_none());
    }
}
