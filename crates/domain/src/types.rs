// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::prerequisite::PrerequisiteRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declares a string-backed identifier.
///
/// Identifiers are normalized to uppercase so that lookups are case-insensitive.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, normalized to uppercase.
            #[must_use]
            pub fn new(value: &str) -> Self {
                Self(value.trim().to_uppercase())
            }

            /// Returns the identifier value.
            #[must_use]
            pub fn value(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifies a student.
    StudentId
);
string_id!(
    /// Identifies a subject in the catalog.
    SubjectId
);
string_id!(
    /// Identifies a group (section) of a subject.
    GroupId
);
string_id!(
    /// Identifies a career. Each career is served by exactly one decanate.
    CareerId
);
string_id!(
    /// Identifies a professor assigned to a group.
    ProfessorId
);
string_id!(
    /// Identifies an academic period (e.g., "2026-1").
    PeriodCode
);

/// Identifies an academic request.
///
/// Request identifiers are assigned sequentially by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A final grade on the 0.0 to 5.0 scale.
///
/// Stored in tenths so that grades compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Grade(u8);

impl Grade {
    /// The highest grade on the scale, in tenths.
    pub const MAX_TENTHS: u8 = 50;
    /// The lowest passing grade, in tenths.
    pub const PASSING_TENTHS: u8 = 30;

    /// Creates a grade from a value on the 0.0 to 5.0 scale.
    ///
    /// The value is rounded to the nearest tenth.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidGrade` if the value is not finite or is
    /// outside the scale.
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || !(0.0..=5.0).contains(&value) {
            return Err(DomainError::InvalidGrade(format!(
                "Grade must be between 0.0 and 5.0, got {value}"
            )));
        }
        // Range checked above, so the rounded value fits in 0..=50.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let tenths: u8 = (value * 10.0).round() as u8;
        Ok(Self(tenths))
    }

    /// Creates a grade from tenths (e.g., 35 for 3.5).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidGrade` if the value exceeds 50.
    pub fn from_tenths(tenths: u8) -> Result<Self, DomainError> {
        if tenths > Self::MAX_TENTHS {
            return Err(DomainError::InvalidGrade(format!(
                "Grade must be at most {} tenths, got {tenths}",
                Self::MAX_TENTHS
            )));
        }
        Ok(Self(tenths))
    }

    /// Returns the grade in tenths.
    #[must_use]
    pub const fn tenths(&self) -> u8 {
        self.0
    }

    /// Returns the grade on the 0.0 to 5.0 scale.
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Returns whether this grade passes the subject.
    #[must_use]
    pub const fn is_passing(&self) -> bool {
        self.0 >= Self::PASSING_TENTHS
    }
}

impl TryFrom<f64> for Grade {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Grade> for f64 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// A subject in the catalog.
///
/// The subject owns the set of groups opened for it; the groups themselves
/// live in the engine registry and refer back to the subject by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    id: SubjectId,
    name: String,
    credits: u32,
    #[serde(default)]
    groups: BTreeSet<GroupId>,
    #[serde(default)]
    prerequisites: Vec<PrerequisiteRule>,
}

impl Subject {
    /// Creates a new subject with no groups.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty
    /// - The credit count is zero
    pub fn new(
        id: SubjectId,
        name: &str,
        credits: u32,
        prerequisites: Vec<PrerequisiteRule>,
    ) -> Result<Self, DomainError> {
        let subject: Self = Self {
            id,
            name: name.trim().to_string(),
            credits,
            groups: BTreeSet::new(),
            prerequisites,
        };
        subject.validate()?;
        Ok(subject)
    }

    /// Checks the field constraints of a subject.
    ///
    /// Used for subjects that arrive through deserialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the credit count is zero.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::InvalidName(String::from(
                "Subject name cannot be empty",
            )));
        }
        if self.credits == 0 {
            return Err(DomainError::InvalidCredits {
                subject: self.id.clone(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn id(&self) -> &SubjectId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn credits(&self) -> u32 {
        self.credits
    }

    #[must_use]
    pub fn prerequisites(&self) -> &[PrerequisiteRule] {
        &self.prerequisites
    }

    /// Returns the groups opened for this subject.
    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.iter()
    }

    /// Returns whether the group was opened for this subject.
    #[must_use]
    pub fn offers(&self, group: &GroupId) -> bool {
        self.groups.contains(group)
    }

    /// Records a group opened for this subject.
    ///
    /// Returns `false` if the group was already recorded.
    pub fn add_group(&mut self, group: GroupId) -> bool {
        self.groups.insert(group)
    }
}
