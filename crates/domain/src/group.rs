// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Groups (sections) of a subject and their open/closed status.
//!
//! ## Invariants
//!
//! - The roster never holds more students than the capacity
//! - Enrollment and unenrollment keep `Closed` iff the roster is full
//! - Capacity can only be set while the roster is empty
//! - The administrative open/close override never admits past capacity

use crate::error::DomainError;
use crate::schedule::Schedule;
use crate::types::{GroupId, PeriodCode, ProfessorId, StudentId, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether a group accepts new students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    #[default]
    Open,
    Closed,
}

impl GroupStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn accepts_students(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled offering of a subject in one academic period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: GroupId,
    subject: SubjectId,
    capacity: u32,
    enrolled: BTreeSet<StudentId>,
    schedules: Vec<Schedule>,
    professor: Option<ProfessorId>,
    period: PeriodCode,
    status: GroupStatus,
}

impl Group {
    /// Opens a new, empty group.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCapacity` if the capacity is zero.
    pub fn new(
        id: GroupId,
        subject: SubjectId,
        capacity: u32,
        schedules: Vec<Schedule>,
        professor: Option<ProfessorId>,
        period: PeriodCode,
    ) -> Result<Self, DomainError> {
        if capacity == 0 {
            return Err(DomainError::InvalidCapacity {
                group: id,
                capacity,
            });
        }
        Ok(Self {
            id,
            subject,
            capacity,
            enrolled: BTreeSet::new(),
            schedules,
            professor,
            period,
            status: GroupStatus::Open,
        })
    }

    #[must_use]
    pub const fn id(&self) -> &GroupId {
        &self.id
    }

    #[must_use]
    pub const fn subject(&self) -> &SubjectId {
        &self.subject
    }

    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    #[must_use]
    pub const fn professor(&self) -> Option<&ProfessorId> {
        self.professor.as_ref()
    }

    #[must_use]
    pub const fn period(&self) -> &PeriodCode {
        &self.period
    }

    #[must_use]
    pub const fn status(&self) -> GroupStatus {
        self.status
    }

    /// Returns a read-only view of the roster.
    pub fn enrolled_students(&self) -> impl Iterator<Item = &StudentId> {
        self.enrolled.iter()
    }

    #[must_use]
    pub fn enrolled_count(&self) -> usize {
        self.enrolled.len()
    }

    #[must_use]
    pub fn is_enrolled(&self, student: &StudentId) -> bool {
        self.enrolled.contains(student)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.enrolled_count() >= self.capacity_usize()
    }

    #[must_use]
    pub fn available_seats(&self) -> usize {
        self.capacity_usize().saturating_sub(self.enrolled_count())
    }

    /// Checks that the student could be added right now without changing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the student is already on the roster, the group
    /// is full, or the group is closed.
    pub fn check_can_enroll(&self, student: &StudentId) -> Result<(), DomainError> {
        if self.is_enrolled(student) {
            return Err(DomainError::StudentAlreadyEnrolled {
                group: self.id.clone(),
                student: student.clone(),
            });
        }
        if self.is_full() {
            return Err(DomainError::GroupFull {
                group: self.id.clone(),
                capacity: self.capacity,
            });
        }
        if !self.status.accepts_students() {
            return Err(DomainError::GroupClosed {
                group: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Adds a student to the roster, closing the group when it fills up.
    ///
    /// # Errors
    ///
    /// See [`Group::check_can_enroll`].
    pub fn enroll_student(&mut self, student: StudentId) -> Result<(), DomainError> {
        self.check_can_enroll(&student)?;
        self.enrolled.insert(student);
        if self.is_full() {
            self.status = GroupStatus::Closed;
        }
        Ok(())
    }

    /// Removes a student from the roster, reopening a full group.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StudentNotEnrolled` if the student is not on the roster.
    pub fn unenroll_student(&mut self, student: &StudentId) -> Result<(), DomainError> {
        if !self.enrolled.remove(student) {
            return Err(DomainError::StudentNotEnrolled {
                group: self.id.clone(),
                student: student.clone(),
            });
        }
        if self.status == GroupStatus::Closed && !self.is_full() {
            self.status = GroupStatus::Open;
        }
        Ok(())
    }

    /// Closes the group regardless of the roster size.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the group is already closed.
    pub fn close_group(&mut self) -> Result<(), DomainError> {
        if self.status == GroupStatus::Closed {
            return Err(self.transition_error("close", "group is already closed"));
        }
        self.status = GroupStatus::Closed;
        Ok(())
    }

    /// Reopens the group regardless of the roster size.
    ///
    /// A full group that is reopened still rejects enrollments until a seat
    /// frees up.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the group is already open.
    pub fn open_group(&mut self) -> Result<(), DomainError> {
        if self.status == GroupStatus::Open {
            return Err(self.transition_error("open", "group is already open"));
        }
        self.status = GroupStatus::Open;
        Ok(())
    }

    /// Sets the capacity of an empty group.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The capacity is zero
    /// - Any student is already enrolled
    pub fn set_capacity(&mut self, capacity: u32) -> Result<(), DomainError> {
        if capacity == 0 {
            return Err(DomainError::InvalidCapacity {
                group: self.id.clone(),
                capacity,
            });
        }
        if !self.enrolled.is_empty() {
            return Err(DomainError::CapacityLocked {
                group: self.id.clone(),
                enrolled: self.enrolled.len(),
            });
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Returns whether any meeting of this group overlaps a meeting of `other`.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.first_overlap(other.schedules()).is_some()
    }

    /// Returns the first slot of this group that overlaps any of `schedules`.
    #[must_use]
    pub fn first_overlap(&self, schedules: &[Schedule]) -> Option<Schedule> {
        self.schedules
            .iter()
            .find(|mine| schedules.iter().any(|theirs| mine.overlaps(theirs)))
            .copied()
    }

    fn capacity_usize(&self) -> usize {
        usize::try_from(self.capacity).unwrap_or(usize::MAX)
    }

    fn transition_error(&self, operation: &'static str, reason: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            entity: format!("group '{}'", self.id),
            from: self.status.as_str(),
            operation,
            reason,
        }
    }
}
