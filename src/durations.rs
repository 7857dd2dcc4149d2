use thiserror::Error;

use crate::timer::IntervalKind;

// ============================================================================
// Constants
// ============================================================================

pub const TICKS_PER_SECOND: u32 = 1;
pub const TICKS_PER_MINUTE: u32 = TICKS_PER_SECOND * 60;
pub const MAX_MINUTES: i64 = 24 * 60;

const DEFAULT_FOCUS_MINUTES: u32 = 25;
const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("unknown interval kind {0}")]
    InvalidKind(i64),
    #[error("invalid duration of {minutes} minutes for {kind} (expected 1..={max})", max = MAX_MINUTES)]
    InvalidDuration { kind: IntervalKind, minutes: i64 },
}

// ============================================================================
// Duration Table
// ============================================================================

/// Tick counts for each interval kind.
///
/// Owned by the event loop and lent to the state machine on every
/// transition, so a change made mid-interval shows up at the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationTable {
    focus: u32,
    short_break: u32,
    long_break: u32,
}

impl Default for DurationTable {
    fn default() -> Self {
        Self {
            focus: DEFAULT_FOCUS_MINUTES * TICKS_PER_MINUTE,
            short_break: DEFAULT_SHORT_BREAK_MINUTES * TICKS_PER_MINUTE,
            long_break: DEFAULT_LONG_BREAK_MINUTES * TICKS_PER_MINUTE,
        }
    }
}

impl DurationTable {
    pub fn get(&self, kind: IntervalKind) -> u32 {
        match kind {
            IntervalKind::Focus => self.focus,
            IntervalKind::ShortBreak => self.short_break,
            IntervalKind::LongBreak => self.long_break,
        }
    }

    pub fn minutes(&self, kind: IntervalKind) -> i64 {
        i64::from(self.get(kind) / TICKS_PER_MINUTE)
    }

    pub fn set(&mut self, kind: IntervalKind, minutes: i64) -> Result<(), DurationError> {
        if minutes <= 0 || minutes > MAX_MINUTES {
            return Err(DurationError::InvalidDuration { kind, minutes });
        }

        // Bounded by MAX_MINUTES above, so the cast and product cannot overflow.
        let ticks = minutes as u32 * TICKS_PER_MINUTE;
        match kind {
            IntervalKind::Focus => self.focus = ticks,
            IntervalKind::ShortBreak => self.short_break = ticks,
            IntervalKind::LongBreak => self.long_break = ticks,
        }
        Ok(())
    }

    /// Same as [`set`](Self::set) but for a raw kind index, as stored on disk.
    pub fn set_index(&mut self, index: i64, minutes: i64) -> Result<(), DurationError> {
        let kind = IntervalKind::from_index(index)?;
        self.set(kind, minutes)
    }

    /// Shift the duration of `kind` by `delta` minutes.
    pub fn adjust(&mut self, kind: IntervalKind, delta: i64) -> Result<i64, DurationError> {
        let minutes = self.minutes(kind) + delta;
        self.set(kind, minutes)?;
        Ok(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stored_in_ticks() {
        let table = DurationTable::default();
        assert_eq!(table.get(IntervalKind::Focus), 25 * TICKS_PER_MINUTE);
        assert_eq!(table.get(IntervalKind::ShortBreak), 5 * TICKS_PER_MINUTE);
        assert_eq!(table.get(IntervalKind::LongBreak), 15 * TICKS_PER_MINUTE);
        assert_eq!(table.minutes(IntervalKind::Focus), 25);
    }

    #[test]
    fn set_converts_minutes_to_ticks() {
        let mut table = DurationTable::default();
        table.set(IntervalKind::ShortBreak, 7).unwrap();
        assert_eq!(table.get(IntervalKind::ShortBreak), 7 * TICKS_PER_MINUTE);
    }

    #[test]
    fn zero_minutes_is_rejected_and_table_unchanged() {
        let mut table = DurationTable::default();
        let err = table.set(IntervalKind::Focus, 0).unwrap_err();
        assert_eq!(
            err,
            DurationError::InvalidDuration { kind: IntervalKind::Focus, minutes: 0 }
        );
        assert_eq!(table, DurationTable::default());
    }

    #[test]
    fn negative_and_oversized_minutes_are_rejected() {
        let mut table = DurationTable::default();
        assert!(table.set(IntervalKind::LongBreak, -3).is_err());
        assert!(table.set(IntervalKind::LongBreak, MAX_MINUTES + 1).is_err());
        assert!(table.set(IntervalKind::LongBreak, MAX_MINUTES).is_ok());
    }

    #[test]
    fn unknown_kind_index_is_rejected() {
        let mut table = DurationTable::default();
        assert_eq!(table.set_index(3, 10), Err(DurationError::InvalidKind(3)));
        assert_eq!(table.set_index(-1, 10), Err(DurationError::InvalidKind(-1)));
        assert_eq!(table, DurationTable::default());

        table.set_index(2, 20).unwrap();
        assert_eq!(table.minutes(IntervalKind::LongBreak), 20);
    }

    #[test]
    fn adjust_stops_at_one_minute() {
        let mut table = DurationTable::default();
        table.set(IntervalKind::ShortBreak, 1).unwrap();
        assert!(table.adjust(IntervalKind::ShortBreak, -1).is_err());
        assert_eq!(table.minutes(IntervalKind::ShortBreak), 1);
        assert_eq!(table.adjust(IntervalKind::ShortBreak, 1), Ok(2));
    }
}
