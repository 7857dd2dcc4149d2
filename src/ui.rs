use crossterm::{cursor, execute};
use ratatui::{prelude::*, widgets::*, TerminalOptions, Viewport};
use std::io;

use crate::durations::{DurationTable, TICKS_PER_SECOND};
use crate::timer::{IntervalKind, State, Timer};

const VIEWPORT_HEIGHT: u16 = 4;
const HELP_LINES: [&str; 2] = [
    "[s] start/stop  [f] skip current timer  [r] reset current timer",
    "[+/-] adjust current timer length  [q] save and quit",
];

// ============================================================================
// Formatting
// ============================================================================

fn clock(remaining: u32) -> String {
    let secs = remaining / TICKS_PER_SECOND;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn pomodoros(n: u32) -> String {
    if n == 1 { "1 pomodoro".into() } else { format!("{n} pomodoros") }
}

/// The one-line description of `state` shown under the status line.
pub fn status_line(state: &State, durations: &DurationTable) -> String {
    match state {
        State::Running(t) => format!("#{} {}", t.completed_focus_count, clock(t.remaining)),
        State::Paused(t) => format!("#{} {} (paused)", t.completed_focus_count, clock(t.remaining)),
        State::BetweenIntervals(t) => between_prompt(t, durations),
    }
}

fn between_prompt(t: &Timer, durations: &DurationTable) -> String {
    let next = t.next_interval(durations);
    match t.kind {
        IntervalKind::Focus => format!(
            "Focus over, {} so far. Press [s] to start {}",
            pomodoros(t.completed_focus_count),
            next.kind
        ),
        IntervalKind::ShortBreak | IntervalKind::LongBreak => format!(
            "Break over, press [s] to start pomodoro #{}",
            next.completed_focus_count
        ),
    }
}

fn kind_color(kind: IntervalKind) -> Color {
    match kind {
        IntervalKind::Focus => Color::Rgb(255, 99, 71),
        IntervalKind::ShortBreak => Color::Rgb(100, 181, 246),
        IntervalKind::LongBreak => Color::Rgb(0, 255, 150),
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Everything drawn in one redraw.
pub struct Screen<'a> {
    pub state: &'a State,
    pub durations: &'a DurationTable,
    pub message: Option<&'a str>,
}

pub trait Renderer {
    fn render(&mut self, screen: &Screen<'_>) -> io::Result<()>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, screen: &Screen<'_>) -> io::Result<()> {
        (**self).render(screen)
    }
}

/// Redraws a few lines in place below the prompt instead of taking over the
/// whole screen.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalRenderer {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::with_options(backend, TerminalOptions {
            viewport: Viewport::Inline(VIEWPORT_HEIGHT),
        })?;
        Ok(Self { terminal })
    }

    /// Clears the drawn lines and brings the cursor back.
    pub fn restore(&mut self) -> io::Result<()> {
        self.terminal.clear()?;
        execute!(self.terminal.backend_mut(), cursor::Show)
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, screen: &Screen<'_>) -> io::Result<()> {
        let timer = screen.state.timer();
        let style = Style::default().fg(kind_color(timer.kind));
        let style = match screen.state {
            State::Running(_) => style.add_modifier(Modifier::BOLD),
            State::Paused(_) => style.add_modifier(Modifier::DIM),
            State::BetweenIntervals(_) => style.add_modifier(Modifier::SLOW_BLINK),
        };

        let lines = vec![
            Line::from(Span::styled(
                screen.message.unwrap_or_default().to_owned(),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(Span::styled(status_line(screen.state, screen.durations), style)),
            Line::from(Span::styled(HELP_LINES[0], Style::default().fg(Color::DarkGray))),
            Line::from(Span::styled(HELP_LINES[1], Style::default().fg(Color::DarkGray))),
        ];

        self.terminal.draw(|f| f.render_widget(Paragraph::new(lines), f.size()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(kind: IntervalKind, remaining: u32, count: u32) -> Timer {
        Timer { kind, remaining, completed_focus_count: count }
    }

    #[test]
    fn running_and_paused_show_count_and_clock() {
        let durations = DurationTable::default();
        let t = timer(IntervalKind::Focus, 1499, 3);
        assert_eq!(status_line(&State::Running(t), &durations), "#3 24:59");
        assert_eq!(status_line(&State::Paused(t), &durations), "#3 24:59 (paused)");
        assert_eq!(
            status_line(&State::Running(timer(IntervalKind::ShortBreak, 7, 0)), &durations),
            "#0 00:07"
        );
    }

    #[test]
    fn focus_done_names_the_coming_break() {
        let durations = DurationTable::default();
        assert_eq!(
            status_line(&State::BetweenIntervals(timer(IntervalKind::Focus, 0, 1)), &durations),
            "Focus over, 1 pomodoro so far. Press [s] to start short break"
        );
        assert_eq!(
            status_line(&State::BetweenIntervals(timer(IntervalKind::Focus, 0, 4)), &durations),
            "Focus over, 4 pomodoros so far. Press [s] to start long break"
        );
    }

    #[test]
    fn first_focus_of_a_fresh_session_counts_itself() {
        let durations = DurationTable::default();
        let mut state = State::Running(Timer::fresh(&durations));
        assert_eq!(status_line(&state, &durations), "#1 25:00");

        while !matches!(state, State::BetweenIntervals(_)) {
            state = state.tick();
        }
        assert_eq!(
            status_line(&state, &durations),
            "Focus over, 1 pomodoro so far. Press [s] to start short break"
        );
    }

    #[test]
    fn break_done_names_the_next_pomodoro() {
        let durations = DurationTable::default();
        assert_eq!(
            status_line(&State::BetweenIntervals(timer(IntervalKind::LongBreak, 0, 4)), &durations),
            "Break over, press [s] to start pomodoro #5"
        );
    }

    #[test]
    fn long_durations_keep_counting_minutes() {
        assert_eq!(clock(150 * 60 * TICKS_PER_SECOND), "150:00");
    }
}
