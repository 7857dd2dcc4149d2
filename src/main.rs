mod app;
mod durations;
mod input;
mod logging;
mod save;
mod timer;
mod ui;

use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info};

use app::App;
use durations::MAX_MINUTES;
use timer::{IntervalKind, State, Timer};
use ui::TerminalRenderer;

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const INPUT_QUEUE: usize = 32;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "🍅 pomo - a terminal Pomodoro timer that picks up where you left off")]
struct Args {
    /// Focus length, e.g. 25, 25m or 1h30m
    #[arg(long, value_parser = parse_minutes)]
    focus: Option<i64>,
    /// Short break length
    #[arg(long, value_parser = parse_minutes)]
    short_break: Option<i64>,
    /// Long break length
    #[arg(long, value_parser = parse_minutes)]
    long_break: Option<i64>,
    #[arg(long, default_value = "./data.json")]
    save_file: PathBuf,
    #[arg(long, default_value = "./pomo.log")]
    log_file: PathBuf,
    /// Start a new cycle instead of resuming the saved timer
    #[arg(long)]
    fresh: bool,
    /// No desktop notifications
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> [(IntervalKind, Option<i64>); 3] {
        [
            (IntervalKind::Focus, self.focus),
            (IntervalKind::ShortBreak, self.short_break),
            (IntervalKind::LongBreak, self.long_break),
        ]
    }
}

/// Whole minutes from `25`, `25m`, `2h` or `1h15m`.
fn parse_minutes(s: &str) -> std::result::Result<i64, String> {
    let s = s.trim().to_lowercase();
    let mut total: i64 = 0;
    let mut num = String::new();

    for c in s.chars() {
        match c {
            '0'..='9' => num.push(c),
            'h' => { total += num.parse::<i64>().map_err(|_| "Invalid hours")? * 60; num.clear(); }
            'm' => { total += num.parse::<i64>().map_err(|_| "Invalid minutes")?; num.clear(); }
            _ => return Err("Invalid format, use whole minutes like 25, 25m or 1h30m".into()),
        }
    }
    if !num.is_empty() {
        total += num.parse::<i64>().map_err(|_| "Invalid minutes")?;
    }

    if (1..=MAX_MINUTES).contains(&total) {
        Ok(total)
    } else {
        Err(format!("Duration must be between 1 and {MAX_MINUTES} minutes"))
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(&args.log_file);

    enable_raw_mode()?;
    let mut renderer = match TerminalRenderer::new() {
        Ok(renderer) => renderer,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
    };

    let res = run(&args, &mut renderer).await;

    let restored = renderer.restore();
    disable_raw_mode()?;
    restored?;

    if let Err(e) = &res {
        error!(error = %e, "exiting after failed save");
    }
    res
}

async fn run(args: &Args, renderer: &mut TerminalRenderer) -> Result<()> {
    let session = save::load(&args.save_file);
    let mut durations = session.durations;
    let mut message = session.notice;

    for (kind, minutes) in args.overrides() {
        if let Some(minutes) = minutes {
            if let Err(e) = durations.set(kind, minutes) {
                message = Some(e.to_string());
            }
        }
    }

    let state = match session.timer {
        Some(timer) if !args.fresh => {
            if message.is_none() {
                message = session
                    .saved_at
                    .map(|at| format!("Resumed session saved {}", at.format("%a %b %d, %H:%M")));
            }
            State::Paused(timer)
        }
        _ => State::Paused(Timer::fresh(&durations)),
    };
    info!(?state, ?durations, "starting");

    let (tx, rx) = mpsc::channel(INPUT_QUEUE);
    let reader = input::spawn(tx);

    let mut app = App::new(state, durations, args.save_file.clone(), renderer)
        .with_message(message)
        .with_notifications(!args.quiet);
    let saved = app.run(rx).await;
    info!(state = ?app.state(), durations = ?app.durations(), "session ended");

    // The loop acknowledged the quit; the reader is on its way out.
    input::join(reader);
    saved.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_minutes() {
        assert_eq!(parse_minutes("25"), Ok(25));
        assert_eq!(parse_minutes("25m"), Ok(25));
        assert_eq!(parse_minutes(" 2H "), Ok(120));
        assert_eq!(parse_minutes("1h30m"), Ok(90));
        assert_eq!(parse_minutes("1h5"), Ok(65));
    }

    #[test]
    fn rejects_bad_minutes() {
        assert!(parse_minutes("0").is_err());
        assert!(parse_minutes("").is_err());
        assert!(parse_minutes("90s").is_err());
        assert!(parse_minutes("1.5m").is_err());
        assert!(parse_minutes("-5").is_err());
        assert!(parse_minutes("25h").is_err());
    }

    #[test]
    fn cli_overrides_are_collected_by_kind() {
        let args = Args::parse_from(["pomo", "--focus", "50m", "--long-break", "20"]);
        assert_eq!(
            args.overrides(),
            [
                (IntervalKind::Focus, Some(50)),
                (IntervalKind::ShortBreak, None),
                (IntervalKind::LongBreak, Some(20)),
            ]
        );
        assert_eq!(args.save_file, PathBuf::from("./data.json"));
        assert!(!args.fresh);
    }

    #[test]
    fn cli_rejects_zero_duration() {
        assert!(Args::try_parse_from(["pomo", "--short-break", "0"]).is_err());
    }
}
