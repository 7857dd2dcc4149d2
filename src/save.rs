use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::{Path, PathBuf}};
use thiserror::Error;
use tracing::{info, warn};

use crate::durations::DurationTable;
use crate::timer::{IntervalKind, Timer};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed save file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("saved timer is invalid: {0}")]
    Corrupt(String),
}

// ============================================================================
// On-disk Format
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SavedTimer {
    #[serde(rename = "TimerType")]
    timer_type: i64,
    #[serde(rename = "TimeRemaining")]
    time_remaining: i64,
    #[serde(rename = "PomodoroCount")]
    pomodoro_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
struct SavedDurations {
    #[serde(rename = "Focus")]
    focus: i64,
    #[serde(rename = "ShortBreak")]
    short_break: i64,
    #[serde(rename = "LongBreak")]
    long_break: i64,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct SaveFile {
    #[serde(rename = "Timer", default)]
    timer: SavedTimer,
    #[serde(rename = "TimerDuration", default)]
    durations: SavedDurations,
    #[serde(rename = "SavedAt", default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Local>>,
}

impl From<&Timer> for SavedTimer {
    fn from(t: &Timer) -> Self {
        Self {
            timer_type: t.kind.index(),
            time_remaining: i64::from(t.remaining),
            pomodoro_count: i64::from(t.completed_focus_count),
        }
    }
}

impl TryFrom<SavedTimer> for Timer {
    type Error = SaveError;

    fn try_from(saved: SavedTimer) -> Result<Self, Self::Error> {
        let kind = IntervalKind::from_index(saved.timer_type)
            .map_err(|e| SaveError::Corrupt(e.to_string()))?;
        let remaining = u32::try_from(saved.time_remaining)
            .map_err(|_| SaveError::Corrupt(format!("time remaining {}", saved.time_remaining)))?;
        let completed_focus_count = u32::try_from(saved.pomodoro_count)
            .map_err(|_| SaveError::Corrupt(format!("pomodoro count {}", saved.pomodoro_count)))?;

        Ok(Self { kind, remaining, completed_focus_count })
    }
}

impl From<&DurationTable> for SavedDurations {
    fn from(durations: &DurationTable) -> Self {
        Self {
            focus: durations.minutes(IntervalKind::Focus),
            short_break: durations.minutes(IntervalKind::ShortBreak),
            long_break: durations.minutes(IntervalKind::LongBreak),
        }
    }
}

impl SavedDurations {
    /// `(TimerType, minutes)` pairs in on-disk order.
    fn entries(&self) -> [(i64, i64); 3] {
        [(0, self.focus), (1, self.short_break), (2, self.long_break)]
    }
}

// ============================================================================
// Session
// ============================================================================

/// What a load produced. `timer` is `None` when nothing usable was saved.
#[derive(Debug, Default)]
pub struct Session {
    pub timer: Option<Timer>,
    pub durations: DurationTable,
    pub saved_at: Option<DateTime<Local>>,
    pub notice: Option<String>,
}

/// Loads the session at `path`, falling back to defaults on any failure.
pub fn load(path: &Path) -> Session {
    match read(path) {
        Ok(session) => session,
        Err(SaveError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no saved session, starting fresh");
            Session {
                notice: Some("No saved session found, starting fresh".into()),
                ..Session::default()
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring saved session");
            Session {
                notice: Some(format!("Error loading saved session: {e}")),
                ..Session::default()
            }
        }
    }
}

fn read(path: &Path) -> Result<Session, SaveError> {
    let data = fs::read_to_string(path).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SaveFile = serde_json::from_str(&data)?;

    let mut durations = DurationTable::default();
    for (index, minutes) in file.durations.entries() {
        if let Err(e) = durations.set_index(index, minutes) {
            warn!(error = %e, "keeping default duration");
        }
    }

    let mut notice = None;
    // Files without a timestamp may carry an all-zero timer meaning "none
    // saved". Anything this program writes has `SavedAt`, so a zeroed timer
    // there is the real Between(Focus, 0, 0).
    let timer = if file.saved_at.is_none() && file.timer == SavedTimer::default() {
        None
    } else {
        match Timer::try_from(file.timer) {
            Ok(timer) => Some(timer),
            Err(e) => {
                warn!(error = %e, "discarding saved timer");
                notice = Some(format!("Saved timer discarded: {e}"));
                None
            }
        }
    };

    info!(path = %path.display(), restored_timer = timer.is_some(), "loaded saved session");
    Ok(Session {
        timer,
        durations,
        saved_at: file.saved_at,
        notice,
    })
}

/// Writes the session through a sibling temp file so a crash never leaves
/// a half-written save behind.
pub fn store(path: &Path, timer: &Timer, durations: &DurationTable) -> Result<(), SaveError> {
    let file = SaveFile {
        timer: timer.into(),
        durations: durations.into(),
        saved_at: Some(Local::now()),
    };
    let data = serde_json::to_string_pretty(&file)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let io_err = |source: io::Error| SaveError::Io { path: path.to_path_buf(), source };

    fs::write(&tmp, data).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    info!(path = %path.display(), "session saved");
    Ok(())
}
