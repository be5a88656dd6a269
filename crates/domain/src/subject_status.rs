// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-student subject status tracking and transition logic.
//!
//! Each subject in a student's study plan has one `SubjectEnrollment`
//! binding. The binding is mutated only through the transition operations
//! below; every successful transition appends exactly one snapshot to its
//! history, and a rejected transition changes nothing.
//!
//! ```text
//! NotTaken --enroll--> InProgress --approve--> Approved
//!    ^                  |     |
//!    +----withdraw------+     +--fail--> Failed --enroll--> InProgress
//! ```

use crate::error::DomainError;
use crate::types::{Grade, GroupId, SubjectId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Academic status of a subject for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    /// The student has never taken the subject, or withdrew from it.
    #[default]
    NotTaken,
    /// The student is currently taking the subject in a group.
    InProgress,
    /// The student passed the subject. Terminal.
    Approved,
    /// The student failed the subject and may take it again.
    Failed,
}

/// Operations that move a subject between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectOperation {
    Enroll,
    Approve,
    Fail,
    Withdraw,
}

impl SubjectOperation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enroll => "enroll in",
            Self::Approve => "approve",
            Self::Fail => "fail",
            Self::Withdraw => "withdraw from",
        }
    }
}

impl SubjectStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotTaken => "not_taken",
            Self::InProgress => "in_progress",
            Self::Approved => "approved",
            Self::Failed => "failed",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "not_taken" => Ok(Self::NotTaken),
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::InvalidName(format!(
                "Unknown subject status '{s}'"
            ))),
        }
    }

    #[must_use]
    pub const fn can_enroll(&self) -> bool {
        matches!(self, Self::NotTaken | Self::Failed)
    }

    #[must_use]
    pub const fn can_approve(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn can_fail(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn can_drop_subject(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns whether a group is bound to the subject in this status.
    ///
    /// An approved subject keeps the group it was passed in.
    #[must_use]
    pub const fn has_assigned_group(&self) -> bool {
        matches!(self, Self::InProgress | Self::Approved)
    }

    /// Returns whether grade, semester and group may be edited.
    #[must_use]
    pub const fn allows_field_changes(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Computes the status an operation leads to.
    ///
    /// # Errors
    ///
    /// Returns the reason the current status rejects the operation.
    pub const fn next(&self, operation: SubjectOperation) -> Result<Self, &'static str> {
        match (self, operation) {
            (Self::NotTaken | Self::Failed, SubjectOperation::Enroll) => Ok(Self::InProgress),
            (Self::InProgress, SubjectOperation::Approve) => Ok(Self::Approved),
            (Self::InProgress, SubjectOperation::Fail) => Ok(Self::Failed),
            (Self::InProgress, SubjectOperation::Withdraw) => Ok(Self::NotTaken),
            (Self::InProgress, SubjectOperation::Enroll) => Err("already enrolled"),
            (Self::Approved, _) => Err("subject already approved"),
            (Self::NotTaken | Self::Failed, _) => Err("subject is not in progress"),
        }
    }
}

impl FromStr for SubjectStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The binding as it stood right after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: SubjectStatus,
    pub semester: Option<u8>,
    pub group: Option<GroupId>,
    pub grade: Option<Grade>,
    pub at: OffsetDateTime,
}

/// The state of one subject for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectEnrollment {
    subject: SubjectId,
    status: SubjectStatus,
    semester: Option<u8>,
    grade: Option<Grade>,
    current_group: Option<GroupId>,
    history: Vec<StatusSnapshot>,
}

impl SubjectEnrollment {
    /// Creates a `NotTaken` binding with an empty history.
    #[must_use]
    pub const fn new(subject: SubjectId) -> Self {
        Self {
            subject,
            status: SubjectStatus::NotTaken,
            semester: None,
            grade: None,
            current_group: None,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn subject(&self) -> &SubjectId {
        &self.subject
    }

    #[must_use]
    pub const fn status(&self) -> SubjectStatus {
        self.status
    }

    #[must_use]
    pub const fn semester(&self) -> Option<u8> {
        self.semester
    }

    #[must_use]
    pub const fn grade(&self) -> Option<Grade> {
        self.grade
    }

    #[must_use]
    pub const fn current_group(&self) -> Option<&GroupId> {
        self.current_group.as_ref()
    }

    /// Returns the transition history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StatusSnapshot] {
        &self.history
    }

    /// Enrolls the student in the subject through `group`.
    ///
    /// A retake after failing starts without a grade.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is already in progress or approved.
    pub fn enroll(&mut self, group: GroupId, at: OffsetDateTime) -> Result<(), DomainError> {
        let next: SubjectStatus = self.next_status(SubjectOperation::Enroll)?;
        self.status = next;
        self.current_group = Some(group);
        self.grade = None;
        self.push_snapshot(at);
        Ok(())
    }

    /// Marks the subject as passed, locking semester, group and grade.
    ///
    /// # Errors
    ///
    /// Returns an error unless the subject is in progress.
    pub fn approve(&mut self, at: OffsetDateTime) -> Result<(), DomainError> {
        self.status = self.next_status(SubjectOperation::Approve)?;
        self.push_snapshot(at);
        Ok(())
    }

    /// Marks the subject as failed and releases the group.
    ///
    /// # Errors
    ///
    /// Returns an error unless the subject is in progress.
    pub fn fail(&mut self, at: OffsetDateTime) -> Result<(), DomainError> {
        self.status = self.next_status(SubjectOperation::Fail)?;
        self.current_group = None;
        self.push_snapshot(at);
        Ok(())
    }

    /// Drops the subject, returning it to `NotTaken` and releasing the group.
    ///
    /// # Errors
    ///
    /// Returns an error unless the subject is in progress.
    pub fn withdraw(&mut self, at: OffsetDateTime) -> Result<(), DomainError> {
        self.status = self.next_status(SubjectOperation::Withdraw)?;
        self.current_group = None;
        self.push_snapshot(at);
        Ok(())
    }

    /// Records the final grade and closes the subject accordingly.
    ///
    /// A passing grade approves the subject. Any other grade fails it and
    /// releases the group. Only one snapshot is appended.
    ///
    /// # Errors
    ///
    /// Returns an error unless the subject is in progress.
    pub fn record_outcome(&mut self, grade: Grade, at: OffsetDateTime) -> Result<(), DomainError> {
        let operation: SubjectOperation = if grade.is_passing() {
            SubjectOperation::Approve
        } else {
            SubjectOperation::Fail
        };
        let next: SubjectStatus = self.next_status(operation)?;
        self.grade = Some(grade);
        self.status = next;
        if !next.has_assigned_group() {
            self.current_group = None;
        }
        self.push_snapshot(at);
        Ok(())
    }

    /// Sets the grade while the subject is in progress.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldLocked` in any other status.
    pub fn set_grade(&mut self, grade: Grade) -> Result<(), DomainError> {
        self.ensure_editable("grade")?;
        self.grade = Some(grade);
        Ok(())
    }

    /// Sets the semester while the subject is in progress.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldLocked` in any other status.
    pub fn set_semester(&mut self, semester: u8) -> Result<(), DomainError> {
        self.ensure_editable("semester")?;
        self.semester = Some(semester);
        Ok(())
    }

    /// Moves the subject to another group while it is in progress.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldLocked` in any other status.
    pub fn set_group(&mut self, group: GroupId) -> Result<(), DomainError> {
        self.ensure_editable("group")?;
        self.current_group = Some(group);
        Ok(())
    }

    fn next_status(&self, operation: SubjectOperation) -> Result<SubjectStatus, DomainError> {
        match self.status.next(operation) {
            Ok(next) => Ok(next),
            Err(_) if operation == SubjectOperation::Enroll
                && self.status == SubjectStatus::InProgress =>
            {
                Err(DomainError::SubjectAlreadyInProgress {
                    subject: self.subject.clone(),
                })
            }
            Err(reason) => Err(DomainError::InvalidTransition {
                entity: format!("subject '{}'", self.subject),
                from: self.status.as_str(),
                operation: operation.as_str(),
                reason,
            }),
        }
    }

    fn ensure_editable(&self, field: &'static str) -> Result<(), DomainError> {
        if self.status.allows_field_changes() {
            Ok(())
        } else {
            Err(DomainError::FieldLocked {
                subject: self.subject.clone(),
                status: self.status.as_str(),
                field,
            })
        }
    }

    fn push_snapshot(&mut self, at: OffsetDateTime) {
        self.history.push(StatusSnapshot {
            status: self.status,
            semester: self.semester,
            group: self.current_group.clone(),
            grade: self.grade,
            at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const ALL: [SubjectStatus; 4] = [
        SubjectStatus::NotTaken,
        SubjectStatus::InProgress,
        SubjectStatus::Approved,
        SubjectStatus::Failed,
    ];

    const OPERATIONS: [SubjectOperation; 4] = [
        SubjectOperation::Enroll,
        SubjectOperation::Approve,
        SubjectOperation::Fail,
        SubjectOperation::Withdraw,
    ];

    fn at() -> OffsetDateTime {
        datetime!(2026-02-03 10:00 UTC)
    }

    fn in_progress() -> SubjectEnrollment {
        let mut binding: SubjectEnrollment = SubjectEnrollment::new(SubjectId::new("CALC"));
        binding.enroll(GroupId::new("CALC-01"), at()).unwrap();
        binding
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in ALL {
            match SubjectStatus::parse_str(status.as_str()) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {status}: {e}"),
            }
        }
        assert!(SubjectStatus::from_str("passed").is_err());
    }

    #[test]
    fn test_every_operation_has_a_defined_outcome() {
        for status in ALL {
            for operation in OPERATIONS {
                let mut binding: SubjectEnrollment = SubjectEnrollment::new(SubjectId::new("X"));
                binding.status = status;
                let result = match operation {
                    SubjectOperation::Enroll => binding.enroll(GroupId::new("G"), at()),
                    SubjectOperation::Approve => binding.approve(at()),
                    SubjectOperation::Fail => binding.fail(at()),
                    SubjectOperation::Withdraw => binding.withdraw(at()),
                };
                match status.next(operation) {
                    Ok(next) => {
                        assert!(result.is_ok());
                        assert_eq!(binding.status(), next);
                        assert_eq!(binding.history().len(), 1);
                    }
                    Err(_) => {
                        assert!(result.is_err());
                        assert_eq!(binding.status(), status);
                        assert!(binding.history().is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_capabilities_per_status() {
        assert!(SubjectStatus::NotTaken.can_enroll());
        assert!(SubjectStatus::Failed.can_enroll());
        assert!(!SubjectStatus::InProgress.can_enroll());
        assert!(!SubjectStatus::Approved.can_enroll());

        for status in ALL {
            let in_progress: bool = status == SubjectStatus::InProgress;
            assert_eq!(status.can_approve(), in_progress);
            assert_eq!(status.can_fail(), in_progress);
            assert_eq!(status.can_drop_subject(), in_progress);
        }

        assert!(SubjectStatus::InProgress.has_assigned_group());
        assert!(SubjectStatus::Approved.has_assigned_group());
        assert!(!SubjectStatus::NotTaken.has_assigned_group());
        assert!(!SubjectStatus::Failed.has_assigned_group());
    }

    #[test]
    fn test_enroll_sets_group_and_appends_snapshot() {
        let binding: SubjectEnrollment = in_progress();
        assert_eq!(binding.status(), SubjectStatus::InProgress);
        assert_eq!(binding.current_group(), Some(&GroupId::new("CALC-01")));
        assert_eq!(binding.history().len(), 1);
        assert_eq!(binding.history()[0].status, SubjectStatus::InProgress);
        assert_eq!(binding.history()[0].group, Some(GroupId::new("CALC-01")));
    }

    #[test]
    fn test_enroll_twice_reports_already_enrolled() {
        let mut binding: SubjectEnrollment = in_progress();
        let err = binding.enroll(GroupId::new("CALC-02"), at()).unwrap_err();
        assert!(matches!(err, DomainError::SubjectAlreadyInProgress { .. }));
        assert_eq!(binding.current_group(), Some(&GroupId::new("CALC-01")));
        assert_eq!(binding.history().len(), 1);
    }

    #[test]
    fn test_approved_is_terminal() {
        let mut binding: SubjectEnrollment = in_progress();
        binding.approve(at()).unwrap();

        assert!(matches!(
            binding.enroll(GroupId::new("CALC-02"), at()),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(binding.fail(at()).is_err());
        assert!(binding.withdraw(at()).is_err());
        assert!(binding.approve(at()).is_err());
        assert_eq!(binding.history().len(), 2);
    }

    #[test]
    fn test_failed_can_be_retaken() {
        let mut binding: SubjectEnrollment = in_progress();
        binding.set_grade(Grade::from_tenths(20).unwrap()).unwrap();
        binding.fail(at()).unwrap();
        assert_eq!(binding.status(), SubjectStatus::Failed);
        assert_eq!(binding.current_group(), None);

        binding.enroll(GroupId::new("CALC-01"), at()).unwrap();
        assert_eq!(binding.status(), SubjectStatus::InProgress);
        assert_eq!(binding.grade(), None);
        assert_eq!(binding.history().len(), 3);
    }

    #[test]
    fn test_withdraw_clears_group() {
        let mut binding: SubjectEnrollment = in_progress();
        binding.withdraw(at()).unwrap();
        assert_eq!(binding.status(), SubjectStatus::NotTaken);
        assert_eq!(binding.current_group(), None);
        assert_eq!(binding.history().len(), 2);
    }

    #[test]
    fn test_fields_locked_outside_in_progress() {
        let mut binding: SubjectEnrollment = SubjectEnrollment::new(SubjectId::new("CALC"));
        let err = binding.set_semester(3).unwrap_err();
        assert_eq!(
            err,
            DomainError::FieldLocked {
                subject: SubjectId::new("CALC"),
                status: "not_taken",
                field: "semester",
            }
        );

        let mut binding: SubjectEnrollment = in_progress();
        binding.set_semester(3).unwrap();
        binding.set_grade(Grade::from_tenths(41).unwrap()).unwrap();
        binding.approve(at()).unwrap();

        assert!(matches!(
            binding.set_grade(Grade::from_tenths(50).unwrap()),
            Err(DomainError::FieldLocked { field: "grade", .. })
        ));
        assert!(matches!(
            binding.set_group(GroupId::new("CALC-09")),
            Err(DomainError::FieldLocked { field: "group", .. })
        ));
        assert!(matches!(
            binding.set_semester(4),
            Err(DomainError::FieldLocked { field: "semester", .. })
        ));
        assert_eq!(binding.semester(), Some(3));
        assert_eq!(binding.grade(), Grade::from_tenths(41).ok());
    }

    #[test]
    fn test_setters_do_not_append_history() {
        let mut binding: SubjectEnrollment = in_progress();
        binding.set_semester(2).unwrap();
        binding.set_group(GroupId::new("CALC-02")).unwrap();
        assert_eq!(binding.history().len(), 1);
    }

    #[test]
    fn test_record_outcome_passing_and_failing() {
        let mut passed: SubjectEnrollment = in_progress();
        passed
            .record_outcome(Grade::new(3.0).unwrap(), at())
            .unwrap();
        assert_eq!(passed.status(), SubjectStatus::Approved);
        assert_eq!(passed.history().len(), 2);
        assert_eq!(passed.history()[1].grade, Grade::new(3.0).ok());

        let mut failed: SubjectEnrollment = in_progress();
        failed
            .record_outcome(Grade::new(2.9).unwrap(), at())
            .unwrap();
        assert_eq!(failed.status(), SubjectStatus::Failed);
        assert_eq!(failed.current_group(), None);
        assert_eq!(failed.grade(), Grade::new(2.9).ok());
        assert_eq!(passed.current_group(), Some(&GroupId::new("CALC-01")));

        let mut not_taken: SubjectEnrollment = SubjectEnrollment::new(SubjectId::new("CALC"));
        assert!(
            not_taken
                .record_outcome(Grade::new(4.0).unwrap(), at())
                .is_err()
        );
        assert_eq!(not_taken.grade(), None);
    }
}
