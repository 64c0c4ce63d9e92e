use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use super::scene::{CellSize, Scene, ScreenPoint, SpriteKind};
use crate::game::{GameOverCause, GameState, Phase};
use crate::metrics::GameMetrics;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, state: &GameState, metrics: &GameMetrics) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(state, metrics);
        frame.render_widget(stats, chunks[0]);

        match state.phase() {
            Phase::Idle => {
                let welcome = self.render_welcome();
                frame.render_widget(welcome, centered(chunks[1], 50, 9));
            }
            phase => {
                let scene = Scene::from_state(state, CellSize::TERMINAL);
                let (width, height) = scene.size();
                let board = centered(chunks[1], framed(width), framed(height));

                let title = if phase == Phase::Paused {
                    " Snake - PAUSED "
                } else {
                    " Snake "
                };
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title);
                let inner = block.inner(board);
                frame.render_widget(block, board);
                frame.render_widget(Playfield { scene: &scene }, inner);

                if phase == Phase::GameOver {
                    let popup = centered(board, 36, 8);
                    frame.render_widget(Clear, popup);
                    frame.render_widget(self.render_game_over(state), popup);
                }
            }
        }

        let controls = self.render_controls(state.phase());
        frame.render_widget(controls, chunks[2]);
    }

    fn render_stats(&self, state: &GameState, metrics: &GameMetrics) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Best: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                metrics.high_score.max(state.score).to_string(),
                Style::default().fg(Color::White),
            ),
            Span::raw("    "),
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.format_time(), Style::default().fg(Color::White)),
        ])];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM))
    }

    fn render_welcome(&self) -> Paragraph<'_> {
        let text = vec![
            Line::from(Span::styled(
                "Welcome to Snake!",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Use the arrow keys to steer the snake."),
            Line::from("Eat the food to grow and score points!"),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Enter",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to play", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Green)),
        )
    }

    fn render_game_over(&self, state: &GameState) -> Paragraph<'_> {
        let reason = match state.game_over_cause {
            Some(GameOverCause::Wall) => "You hit the wall",
            Some(GameOverCause::SelfCollision) => "You ran into yourself",
            Some(GameOverCause::BoardFilled) => "No room left on the board",
            None => "",
        };

        let text = vec![
            Line::from(vec![Span::styled(
                "Game Over!",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(Span::styled(reason, Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to play again", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self, phase: Phase) -> Paragraph<'_> {
        let pause_label = if phase == Phase::Paused {
            " to resume | "
        } else {
            " to pause | "
        };

        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to move | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(pause_label),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws a [`Scene`] glyph by glyph, one glyph per cell origin
struct Playfield<'a> {
    scene: &'a Scene,
}

impl Widget for Playfield<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cell = self.scene.cell;
        let empty = Style::default().fg(Color::DarkGray);

        // Cells past the visible area are clipped anyway
        let rows = self
            .scene
            .rows
            .min(u32::from(area.height) / cell.height.max(1) + 1);
        let columns = self
            .scene
            .columns
            .min(u32::from(area.width) / cell.width.max(1) + 1);

        for row in 0..rows {
            for column in 0..columns {
                let origin = ScreenPoint {
                    x: column * cell.width,
                    y: row * cell.height,
                };
                paint(area, buf, origin, "·", empty);
            }
        }

        for sprite in &self.scene.sprites {
            let (symbol, style) = match sprite.kind {
                SpriteKind::Head => (
                    "■",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                SpriteKind::Body => ("□", Style::default().fg(Color::Green)),
                SpriteKind::Food => (
                    "●",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
            };
            paint(area, buf, sprite.origin, symbol, style);
        }
    }
}

fn paint(area: Rect, buf: &mut Buffer, origin: ScreenPoint, symbol: &str, style: Style) {
    let x = u32::from(area.x).saturating_add(origin.x);
    let y = u32::from(area.y).saturating_add(origin.y);
    if x >= u32::from(area.right()) || y >= u32::from(area.bottom()) {
        return;
    }

    if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
        cell.set_symbol(symbol).set_style(style);
    }
}

/// Size of a playfield side plus its border, clamped to what a terminal can address
fn framed(side: u32) -> u16 {
    u16::try_from(side).unwrap_or(u16::MAX).saturating_add(2)
}

/// A `width` x `height` rect centered in `area`, shrunk to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, Position, Snake};
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(state: &GameState) -> String {
        draw_sized(state, 70, 32)
    }

    fn draw_sized(state: &GameState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let renderer = Renderer::new();
        let metrics = GameMetrics::new();

        terminal
            .draw(|frame| renderer.render(frame, state, &metrics))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn playing_state() -> GameState {
        let mut state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 3),
            Position::new(10, 10),
            20,
            20,
        );
        state.is_playing = true;
        state.score = 30;
        state
    }

    #[test]
    fn test_welcome_screen_when_idle() {
        let mut state = playing_state();
        state.is_playing = false;

        let text = draw(&state);
        assert!(text.contains("Welcome to Snake!"));
        assert!(text.contains("Enter"));
        assert!(!text.contains("■"));
    }

    #[test]
    fn test_playfield_when_running() {
        let text = draw(&playing_state());

        assert!(text.contains("Score: 30"));
        assert!(text.contains(" Snake "));
        assert_eq!(text.matches('■').count(), 1);
        assert_eq!(text.matches('□').count(), 2);
        assert_eq!(text.matches('●').count(), 1);
    }

    #[test]
    fn test_head_and_body_share_a_row() {
        let text = draw(&playing_state());
        let row = text.lines().find(|line| line.contains('■')).unwrap();

        assert_eq!(row.matches('□').count(), 2);
        assert!(row.find('□').unwrap() < row.find('■').unwrap());
    }

    #[test]
    fn test_paused_title() {
        let mut state = playing_state();
        state.is_paused = true;

        let text = draw(&state);
        assert!(text.contains("PAUSED"));
        assert!(text.contains("to resume"));
    }

    #[test]
    fn test_game_over_overlay() {
        let mut state = playing_state();
        state.game_over = true;
        state.game_over_cause = Some(GameOverCause::Wall);

        let text = draw(&state);
        assert!(text.contains("Game Over!"));
        assert!(text.contains("You hit the wall"));
        assert!(text.contains("Final Score: 30"));
    }

    #[test]
    fn test_grid_wider_than_terminal() {
        let mut state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 3),
            Position::new(40, 10),
            32767,
            20,
        );
        state.is_playing = true;

        let text = draw_sized(&state, 80, 30);
        assert!(text.contains("Score: 0"));
        assert_eq!(text.matches('■').count(), 1);
    }

    #[test]
    fn test_framed_side_saturates() {
        assert_eq!(framed(40), 42);
        assert_eq!(framed(65534), u16::MAX);
        assert_eq!(framed(1_000_000), u16::MAX);
    }

    #[test]
    fn test_centered_rect_shrinks_to_fit() {
        let area = Rect::new(0, 0, 10, 4);
        assert_eq!(centered(area, 4, 2), Rect::new(3, 1, 4, 2));
        assert_eq!(centered(area, 20, 20), area);
    }
}
