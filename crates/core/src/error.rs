// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use enrollment_domain::{DomainError, ViolationKind};

/// Errors that can occur while applying a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A domain rule was violated.
    #[error("Domain violation: {0}")]
    DomainViolation(#[from] DomainError),
    /// An entity with the same identifier is already registered.
    #[error("{entity} '{id}' is already registered")]
    DuplicateEntity {
        /// The kind of entity (e.g., "group").
        entity: &'static str,
        /// The identifier that clashed.
        id: String,
    },
    /// A thread panicked while holding the lock on an entity.
    #[error("Lock on {0} was poisoned")]
    LockPoisoned(&'static str),
    /// The configured timezone name is not a known IANA zone.
    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),
}

impl CoreError {
    /// Returns the violation category when the error is a domain violation.
    #[must_use]
    pub const fn violation_kind(&self) -> Option<ViolationKind> {
        match self {
            Self::DomainViolation(err) => Some(err.kind()),
            Self::DuplicateEntity { .. } | Self::InvalidTimezone(_) => {
                Some(ViolationKind::InvalidArgument)
            }
            Self::LockPoisoned(_) => None,
        }
    }
}
