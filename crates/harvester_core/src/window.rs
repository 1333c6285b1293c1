use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Half-open `[start, end)` slice of the harvest range.
///
/// `start < end` holds for every window built through [`TimeWindow::new`]. A window
/// produced by [`TimeWindow::advance`] past the global end collapses to `start == end`
/// and is reported as done by [`TimeWindow::is_done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::EmptyRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First window of a range: `[start, min(start + step, global_end))`.
    pub fn first(
        start: DateTime<Utc>,
        step: TimeDelta,
        global_end: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        if step <= TimeDelta::zero() {
            return Err(ConfigError::NonPositiveStep);
        }
        let end = start
            .checked_add_signed(step)
            .map_or(global_end, |end| end.min(global_end));
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Shift forward: the next window starts where this one ended and spans
    /// `step`, clipped so it never reaches past `global_end`.
    pub fn advance(&self, step: TimeDelta, global_end: DateTime<Utc>) -> TimeWindow {
        let start = self.end;
        let unclipped = start.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let end = unclipped.min(global_end).max(start);
        TimeWindow { start, end }
    }

    pub fn is_done(&self, global_end: DateTime<Utc>) -> bool {
        self.start >= global_end || self.start >= self.end
    }
}

/// Tracks the active window of one session and moves it across the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowCursor {
    current: TimeWindow,
    step: TimeDelta,
    global_end: DateTime<Utc>,
}

impl WindowCursor {
    pub fn new(
        global_start: DateTime<Utc>,
        global_end: DateTime<Utc>,
        step: TimeDelta,
    ) -> Result<Self, ConfigError> {
        let current = TimeWindow::first(global_start, step, global_end)?;
        Ok(Self {
            current,
            step,
            global_end,
        })
    }

    pub fn current(&self) -> TimeWindow {
        self.current
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn global_end(&self) -> DateTime<Utc> {
        self.global_end
    }

    pub fn advance(&mut self) {
        self.current = self.current.advance(self.step, self.global_end);
    }

    pub fn is_done(&self) -> bool {
        self.current.is_done(self.global_end)
    }

    /// Moves the global end forward to `now` for continuous harvesting. Callers pass
    /// the clock minus whatever lag the provider needs.
    ///
    /// When the cursor had run out of range, the next window restarts at the last
    /// covered end. Returns `true` when there is a non-empty window to fetch.
    pub fn rearm(&mut self, now: DateTime<Utc>) -> bool {
        if now <= self.global_end {
            return !self.is_done();
        }
        self.global_end = now;
        if self.current.start >= self.current.end {
            let start = self.current.start;
            let end = start
                .checked_add_signed(self.step)
                .map_or(now, |end| end.min(now));
            self.current = TimeWindow { start, end };
        }
        !self.is_done()
    }
}
