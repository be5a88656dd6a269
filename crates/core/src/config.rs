// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use chrono_tz::Tz;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// The institution's timezone; decides which calendar day "today" is.
    pub timezone: Tz,
    /// Upper bound on pending requests per decanate. `None` is unbounded.
    pub max_pending_per_decanate: Option<usize>,
}

impl EngineConfig {
    /// Builds a configuration from an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTimezone` if the name is not a known zone.
    pub fn new(timezone: &str, max_pending_per_decanate: Option<usize>) -> Result<Self, CoreError> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))?;
        Ok(Self {
            timezone,
            max_pending_per_decanate,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            max_pending_per_decanate: None,
        }
    }
}
