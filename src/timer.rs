use std::fmt;

use crate::durations::{DurationError, DurationTable};

// ============================================================================
// Data Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl IntervalKind {
    pub fn from_index(index: i64) -> Result<Self, DurationError> {
        match index {
            0 => Ok(Self::Focus),
            1 => Ok(Self::ShortBreak),
            2 => Ok(Self::LongBreak),
            other => Err(DurationError::InvalidKind(other)),
        }
    }

    pub fn index(self) -> i64 {
        match self {
            Self::Focus => 0,
            Self::ShortBreak => 1,
            Self::LongBreak => 2,
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Self::Focus)
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short break",
            Self::LongBreak => "long break",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: IntervalKind,
    pub remaining: u32,
    pub completed_focus_count: u32,
}

impl Timer {
    /// A full focus interval for the first pomodoro of a cycle.
    ///
    /// The count is seeded at 1 so it matches the focus interval in
    /// progress, which puts the first long break after the 4th focus.
    pub fn fresh(durations: &DurationTable) -> Self {
        Self {
            kind: IntervalKind::Focus,
            remaining: durations.get(IntervalKind::Focus),
            completed_focus_count: 1,
        }
    }

    /// The interval that follows this one in the 4-cycle.
    pub fn next_interval(&self, durations: &DurationTable) -> Self {
        let count = self.completed_focus_count;
        let (kind, completed_focus_count) = match self.kind {
            IntervalKind::Focus if count > 0 && count % 4 == 0 => (IntervalKind::LongBreak, count),
            IntervalKind::Focus => (IntervalKind::ShortBreak, count),
            IntervalKind::ShortBreak | IntervalKind::LongBreak => {
                (IntervalKind::Focus, count.saturating_add(1))
            }
        };

        Self {
            kind,
            remaining: durations.get(kind),
            completed_focus_count,
        }
    }

    fn restarted(&self, durations: &DurationTable) -> Self {
        Self {
            remaining: durations.get(self.kind),
            ..*self
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running(Timer),
    Paused(Timer),
    /// The interval in the payload has just run out; resuming moves on.
    BetweenIntervals(Timer),
}

impl State {
    pub fn timer(&self) -> &Timer {
        match self {
            Self::Running(t) | Self::Paused(t) | Self::BetweenIntervals(t) => t,
        }
    }

    pub fn tick(self) -> Self {
        match self {
            Self::Running(t) => {
                let remaining = t.remaining.saturating_sub(1);
                if remaining == 0 {
                    Self::BetweenIntervals(Timer { remaining: 0, ..t })
                } else {
                    Self::Running(Timer { remaining, ..t })
                }
            }
            other => other,
        }
    }

    pub fn pause(self, durations: &DurationTable) -> Self {
        match self {
            Self::Running(t) => Self::Paused(t),
            Self::Paused(t) => Self::Running(t),
            Self::BetweenIntervals(t) => Self::Running(t.next_interval(durations)),
        }
    }

    pub fn skip(self, durations: &DurationTable) -> Self {
        match self {
            Self::Running(t) | Self::Paused(t) => Self::Paused(t.next_interval(durations)),
            between @ Self::BetweenIntervals(_) => between,
        }
    }

    pub fn reset(self, durations: &DurationTable) -> Self {
        Self::Paused(self.timer().restarted(durations))
    }
}
