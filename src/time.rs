// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Source of the wall-clock time at which a route starts, used to evaluate
/// time-conditional road access.
///
/// Times are local to the routed area, as opening hours are.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// [TimeSource] backed by the local system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// [TimeSource] always returning the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl TimeSource for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Moves `start` forward by a (possibly fractional) number of seconds.
///
/// Offsets which are not finite, or which overflow the calendar, leave `start` unchanged.
pub fn advance(start: NaiveDateTime, seconds: f64) -> NaiveDateTime {
    if !seconds.is_finite() {
        return start;
    }

    TimeDelta::try_milliseconds((seconds * 1000.0) as i64)
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(start)
}
