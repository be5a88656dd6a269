// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic periods and their enrollment windows.
//!
//! A period is *active* while today falls inside `[start_date, end_date]`.
//! Enrollment is *open* only while the period is active and today also falls
//! inside the enrollment window. A window with either bound missing is
//! treated as closed.
//!
//! "Today" is always supplied by the caller; nothing here reads the clock.

use crate::error::DomainError;
use crate::types::PeriodCode;
use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

/// An academic period (term).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct AcademicPeriod {
    code: PeriodCode,
    #[serde(with = "calendar_date")]
    start_date: Date,
    #[serde(with = "calendar_date")]
    end_date: Date,
    #[serde(with = "calendar_date::option")]
    enrollment_window_start: Option<Date>,
    #[serde(with = "calendar_date::option")]
    enrollment_window_end: Option<Date>,
}

#[derive(Deserialize)]
struct RawPeriod {
    code: PeriodCode,
    #[serde(with = "calendar_date")]
    start_date: Date,
    #[serde(with = "calendar_date")]
    end_date: Date,
    #[serde(default, with = "calendar_date::option")]
    enrollment_window_start: Option<Date>,
    #[serde(default, with = "calendar_date::option")]
    enrollment_window_end: Option<Date>,
}

impl TryFrom<RawPeriod> for AcademicPeriod {
    type Error = DomainError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.code, raw.start_date, raw.end_date)?
            .with_enrollment_window(raw.enrollment_window_start, raw.enrollment_window_end)
    }
}

impl AcademicPeriod {
    /// Creates a period without an enrollment window.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` if the end date precedes the start date.
    pub fn new(code: PeriodCode, start_date: Date, end_date: Date) -> Result<Self, DomainError> {
        if end_date < start_date {
            return Err(DomainError::InvalidPeriod {
                code,
                reason: format!("end date {end_date} precedes start date {start_date}"),
            });
        }
        Ok(Self {
            code,
            start_date,
            end_date,
            enrollment_window_start: None,
            enrollment_window_end: None,
        })
    }

    /// Sets the enrollment window bounds.
    ///
    /// Either bound may be left unset, in which case enrollment is never open.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` if both bounds are set and the
    /// window end precedes its start.
    pub fn with_enrollment_window(
        mut self,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Self, DomainError> {
        if let (Some(window_start), Some(window_end)) = (start, end) {
            if window_end < window_start {
                return Err(DomainError::InvalidPeriod {
                    code: self.code,
                    reason: format!(
                        "enrollment window end {window_end} precedes its start {window_start}"
                    ),
                });
            }
        }
        self.enrollment_window_start = start;
        self.enrollment_window_end = end;
        Ok(self)
    }

    #[must_use]
    pub const fn code(&self) -> &PeriodCode {
        &self.code
    }

    #[must_use]
    pub const fn start_date(&self) -> Date {
        self.start_date
    }

    #[must_use]
    pub const fn end_date(&self) -> Date {
        self.end_date
    }

    #[must_use]
    pub const fn enrollment_window(&self) -> (Option<Date>, Option<Date>) {
        (self.enrollment_window_start, self.enrollment_window_end)
    }

    /// Returns whether `today` falls within the period.
    #[must_use]
    pub fn is_active(&self, today: Date) -> bool {
        self.start_date <= today && today <= self.end_date
    }

    /// Returns whether enrollment is open on `today`.
    #[must_use]
    pub fn is_enrollment_open(&self, today: Date) -> bool {
        if !self.is_active(today) {
            return false;
        }
        match (self.enrollment_window_start, self.enrollment_window_end) {
            (Some(start), Some(end)) => start <= today && today <= end,
            _ => false,
        }
    }
}
