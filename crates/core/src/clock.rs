// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::{PoisonError, RwLock};
use time::{Date, Month, OffsetDateTime};

/// Source of the current instant.
///
/// The calendar day is not the clock's business: the engine derives it from
/// `now` in the configured timezone, see [`local_date`].
pub trait Clock: Send + Sync {
    /// The instant recorded on history entries and audit events.
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<OffsetDateTime>,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: OffsetDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The calendar day `instant` falls on in `timezone`.
///
/// Falls back to the UTC day if the instant is outside chrono's range.
#[must_use]
pub fn local_date(instant: OffsetDateTime, timezone: Tz) -> Date {
    DateTime::<Utc>::from_timestamp(instant.unix_timestamp(), instant.nanosecond())
        .map(|utc| utc.with_timezone(&timezone).date_naive())
        .and_then(to_time_date)
        .unwrap_or_else(|| instant.to_offset(time::UtcOffset::UTC).date())
}

fn to_time_date(date: NaiveDate) -> Option<Date> {
    let month: Month = u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())?;
    let day: u8 = u8::try_from(date.day()).ok()?;
    Date::from_calendar_date(date.year(), month, day).ok()
}
