use notify_rust::{Notification, Urgency};
use std::{path::PathBuf, time::Duration};
use tokio::{sync::mpsc, time};
use tracing::{debug, info, warn};

use crate::durations::{DurationTable, TICKS_PER_SECOND};
use crate::input::{Command, Input};
use crate::save::{self, SaveError};
use crate::timer::{IntervalKind, State};
use crate::ui::{Renderer, Screen};

const TICK_PERIOD: Duration = Duration::from_millis(1000 / TICKS_PER_SECOND as u64);

// ============================================================================
// Application State
// ============================================================================

pub struct App<R> {
    state: State,
    durations: DurationTable,
    save_path: PathBuf,
    renderer: R,
    message: Option<String>,
    notifications: bool,
}

impl<R: Renderer> App<R> {
    pub fn new(state: State, durations: DurationTable, save_path: PathBuf, renderer: R) -> Self {
        Self {
            state,
            durations,
            save_path,
            renderer,
            message: None,
            notifications: false,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn durations(&self) -> &DurationTable {
        &self.durations
    }

    /// Drives the timer until the reader asks to quit, one event at a time.
    ///
    /// The session is written before the quit is acknowledged. A failed save
    /// still acknowledges so the terminal gets restored, and is returned.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<Input>) -> Result<(), SaveError> {
        let mut clock = time::interval(TICK_PERIOD);
        clock.tick().await;

        loop {
            self.draw();

            tokio::select! {
                _ = clock.tick() => self.on_tick(),
                input = rx.recv() => match input {
                    Some(Input::Key(byte)) => self.on_key(byte),
                    Some(Input::Quit(ack)) => {
                        let saved = self.save();
                        let _ = ack.send(());
                        return saved;
                    }
                    None => {
                        warn!("input closed without a quit request");
                        return self.save();
                    }
                },
            }
        }
    }

    fn draw(&mut self) {
        let screen = Screen {
            state: &self.state,
            durations: &self.durations,
            message: self.message.as_deref(),
        };
        if let Err(e) = self.renderer.render(&screen) {
            warn!(error = %e, "render failed");
        }
    }

    fn save(&mut self) -> Result<(), SaveError> {
        let result = save::store(&self.save_path, self.state.timer(), &self.durations);
        if let Err(e) = &result {
            warn!(error = %e, "saving session failed");
        }
        result
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    fn on_tick(&mut self) {
        let before = self.state;
        self.state = before.tick();

        if let (State::Running(t), State::BetweenIntervals(_)) = (before, self.state) {
            info!(kind = %t.kind, count = t.completed_focus_count, "interval finished");
            if self.notifications {
                notify(t.kind);
            }
        }
    }

    fn on_key(&mut self, byte: u8) {
        let Some(command) = Command::from_byte(byte) else {
            return;
        };
        debug!(?command, state = ?self.state, "key");
        self.message = None;

        self.state = match command {
            Command::Pause => self.state.pause(&self.durations),
            Command::Skip => self.state.skip(&self.durations),
            Command::Reset => self.state.reset(&self.durations),
            Command::Lengthen => return self.adjust(1),
            Command::Shorten => return self.adjust(-1),
        };
    }

    fn adjust(&mut self, delta: i64) {
        let kind = self.state.timer().kind;
        self.message = Some(match self.durations.adjust(kind, delta) {
            Ok(minutes) => {
                info!(%kind, minutes, "duration changed");
                format!("{} set to {minutes} min, applies from the next {kind}", capitalize(kind))
            }
            Err(e) => {
                debug!(error = %e, "duration change rejected");
                format!("Cannot change {kind}: {e}")
            }
        });
    }
}

fn capitalize(kind: IntervalKind) -> String {
    let name = kind.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

// ============================================================================
// Utilities
// ============================================================================

fn notify(finished: IntervalKind) {
    let (title, body) = if finished.is_break() {
        ("Break over ☕", "Back to work! Press [s] to start the next pomodoro.")
    } else {
        ("Focus over 🍅", "Time for a break. Press [s] when ready.")
    };

    std::thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(title)
            .body(body)
            .appname("pomo")
            .icon("alarm-clock")
            .urgency(Urgency::Critical)
            .show()
        {
            warn!(error = %e, "desktop notification failed");
        }
    });
}
