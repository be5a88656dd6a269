// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::prerequisite::PrerequisiteRule;
use crate::schedule::{Day, Schedule};
use crate::types::{CareerId, GroupId, PeriodCode, RequestId, StudentId, SubjectId};
use time::{Date, Time};

/// The category of a rule violation.
///
/// Callers translate a kind into a user-facing response; the detailed
/// `DomainError` variant carries the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A state machine rejected the operation in its current state.
    InvalidTransition,
    /// A group (or decanate queue) has no room left.
    CapacityExceeded,
    AlreadyEnrolled,
    NotEnrolled,
    PrerequisiteNotMet,
    ScheduleConflict,
    /// The period is inactive, outside its enrollment window, or mismatched.
    PeriodNotValid,
    NotInCurriculum,
    /// A request was sent to the decanate of another career.
    WrongCareer,
    NotFound,
    /// Malformed input such as a non-positive capacity or credit count.
    InvalidArgument,
}

impl ViolationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTransition => "invalid_transition",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::AlreadyEnrolled => "already_enrolled",
            Self::NotEnrolled => "not_enrolled",
            Self::PrerequisiteNotMet => "prerequisite_not_met",
            Self::ScheduleConflict => "schedule_conflict",
            Self::PeriodNotValid => "period_not_valid",
            Self::NotInCurriculum => "not_in_curriculum",
            Self::WrongCareer => "wrong_career",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during domain validation and state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A schedule does not satisfy `start < end`.
    InvalidSchedule {
        /// The day of the slot.
        day: Day,
        /// The requested start time.
        start: Time,
        /// The requested end time.
        end: Time,
    },
    /// An academic period has inconsistent dates.
    InvalidPeriod {
        /// The period code.
        code: PeriodCode,
        /// Description of the inconsistency.
        reason: String,
    },
    /// A name is empty or invalid.
    InvalidName(String),
    /// A subject was declared with zero credits.
    InvalidCredits {
        /// The subject.
        subject: SubjectId,
    },
    /// A grade is outside the 0.0 to 5.0 scale.
    InvalidGrade(String),
    /// A group capacity must be greater than zero.
    InvalidCapacity {
        /// The group.
        group: GroupId,
        /// The rejected capacity.
        capacity: u32,
    },
    /// A subject change names the same subject on both sides.
    SameSubject {
        /// The subject.
        subject: SubjectId,
    },
    /// A state machine rejected an operation in its current state.
    InvalidTransition {
        /// The entity whose state machine rejected the operation.
        entity: String,
        /// The current state.
        from: &'static str,
        /// The rejected operation.
        operation: &'static str,
        /// Why the state rejects the operation.
        reason: &'static str,
    },
    /// A subject field can only change while the subject is in progress.
    FieldLocked {
        /// The subject.
        subject: SubjectId,
        /// The current status.
        status: &'static str,
        /// The field that cannot be changed.
        field: &'static str,
    },
    /// Group capacity can only be set while nobody is enrolled.
    CapacityLocked {
        /// The group.
        group: GroupId,
        /// The number of students currently enrolled.
        enrolled: usize,
    },
    /// The student is already taking the subject.
    SubjectAlreadyInProgress {
        /// The subject.
        subject: SubjectId,
    },
    /// The student is not currently taking the subject.
    SubjectNotInProgress {
        /// The subject.
        subject: SubjectId,
        /// The current status.
        status: &'static str,
    },
    /// The student is already on the group roster.
    StudentAlreadyEnrolled {
        /// The group.
        group: GroupId,
        /// The student.
        student: StudentId,
    },
    /// The student is not on the group roster.
    StudentNotEnrolled {
        /// The group.
        group: GroupId,
        /// The student.
        student: StudentId,
    },
    /// The group has no seats left.
    GroupFull {
        /// The group.
        group: GroupId,
        /// The group capacity.
        capacity: u32,
    },
    /// The group was closed administratively.
    GroupClosed {
        /// The group.
        group: GroupId,
    },
    /// The decanate queue reached its configured bound.
    DecanateFull {
        /// The career served by the decanate.
        career: CareerId,
        /// The configured bound.
        limit: usize,
    },
    /// A prerequisite of the subject is not satisfied.
    PrerequisiteNotMet {
        /// The subject being requested.
        subject: SubjectId,
        /// The first unsatisfied rule.
        rule: PrerequisiteRule,
    },
    /// The group meets at the same time as a subject already in progress.
    ScheduleConflict {
        /// The requested group.
        group: GroupId,
        /// The subject already in progress.
        conflicting_subject: SubjectId,
        /// The group of the subject already in progress.
        conflicting_group: GroupId,
        /// The overlapping slot of the requested group.
        slot: Schedule,
    },
    /// The group belongs to a different period.
    PeriodMismatch {
        /// The group.
        group: GroupId,
        /// The group's period.
        group_period: PeriodCode,
        /// The period of the operation.
        period: PeriodCode,
    },
    /// The period is not active.
    PeriodInactive {
        /// The period.
        period: PeriodCode,
        /// The date the check was made on.
        today: Date,
    },
    /// The enrollment window of the period is not open.
    EnrollmentClosed {
        /// The period.
        period: PeriodCode,
        /// The date the check was made on.
        today: Date,
    },
    /// The subject is not part of the student's study plan.
    NotInCurriculum {
        /// The student.
        student: StudentId,
        /// The subject.
        subject: SubjectId,
    },
    /// The student has no study plan attached.
    NoStudyPlan {
        /// The student.
        student: StudentId,
    },
    /// A career mismatch between a decanate, plan, or request.
    WrongCareer {
        /// The career the operation expected.
        expected: CareerId,
        /// The career that was supplied.
        actual: CareerId,
    },
    /// The group is not offered for the subject.
    GroupNotInSubject {
        /// The group.
        group: GroupId,
        /// The subject.
        subject: SubjectId,
    },
    /// Subject does not exist.
    SubjectNotFound(SubjectId),
    /// Group does not exist.
    GroupNotFound(GroupId),
    /// Period does not exist.
    PeriodNotFound(PeriodCode),
    /// Student does not exist.
    StudentNotFound(StudentId),
    /// Request does not exist (or is not pending where it was looked up).
    RequestNotFound(RequestId),
    /// No decanate serves the career.
    DecanateNotFound(CareerId),
}

impl DomainError {
    /// Returns the category of this violation.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        match self {
            Self::InvalidSchedule { .. }
            | Self::InvalidPeriod { .. }
            | Self::InvalidName(_)
            | Self::InvalidCredits { .. }
            | Self::InvalidGrade(_)
            | Self::InvalidCapacity { .. }
            | Self::SameSubject { .. } => ViolationKind::InvalidArgument,
            Self::InvalidTransition { .. }
            | Self::FieldLocked { .. }
            | Self::CapacityLocked { .. }
            | Self::GroupClosed { .. } => ViolationKind::InvalidTransition,
            Self::SubjectAlreadyInProgress { .. } | Self::StudentAlreadyEnrolled { .. } => {
                ViolationKind::AlreadyEnrolled
            }
            Self::SubjectNotInProgress { .. } | Self::StudentNotEnrolled { .. } => {
                ViolationKind::NotEnrolled
            }
            Self::GroupFull { .. } | Self::DecanateFull { .. } => ViolationKind::CapacityExceeded,
            Self::PrerequisiteNotMet { .. } => ViolationKind::PrerequisiteNotMet,
            Self::ScheduleConflict { .. } => ViolationKind::ScheduleConflict,
            Self::PeriodMismatch { .. }
            | Self::PeriodInactive { .. }
            | Self::EnrollmentClosed { .. } => ViolationKind::PeriodNotValid,
            Self::NotInCurriculum { .. } | Self::NoStudyPlan { .. } => {
                ViolationKind::NotInCurriculum
            }
            Self::WrongCareer { .. } => ViolationKind::WrongCareer,
            Self::GroupNotInSubject { .. }
            | Self::SubjectNotFound(_)
            | Self::GroupNotFound(_)
            | Self::PeriodNotFound(_)
            | Self::StudentNotFound(_)
            | Self::RequestNotFound(_)
            | Self::DecanateNotFound(_) => ViolationKind::NotFound,
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSchedule { day, start, end } => {
                write!(
                    f,
                    "Invalid schedule on {day}: start {start} must be before end {end}"
                )
            }
            Self::InvalidPeriod { code, reason } => {
                write!(f, "Invalid academic period '{code}': {reason}")
            }
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidCredits { subject } => {
                write!(f, "Subject '{subject}' must have more than 0 credits")
            }
            Self::InvalidGrade(msg) => write!(f, "Invalid grade: {msg}"),
            Self::InvalidCapacity { group, capacity } => {
                write!(
                    f,
                    "Invalid capacity {capacity} for group '{group}'. Must be greater than 0"
                )
            }
            Self::SameSubject { subject } => {
                write!(f, "Subject change must name a different subject than '{subject}'")
            }
            Self::InvalidTransition {
                entity,
                from,
                operation,
                reason,
            } => {
                write!(f, "Cannot {operation} {entity} while {from}: {reason}")
            }
            Self::FieldLocked {
                subject,
                status,
                field,
            } => {
                write!(
                    f,
                    "Cannot change the {field} of subject '{subject}' while {status}"
                )
            }
            Self::CapacityLocked { group, enrolled } => {
                write!(
                    f,
                    "Cannot change the capacity of group '{group}': {enrolled} student(s) already enrolled"
                )
            }
            Self::SubjectAlreadyInProgress { subject } => {
                write!(f, "Student is already enrolled in subject '{subject}'")
            }
            Self::SubjectNotInProgress { subject, status } => {
                write!(
                    f,
                    "Student is not taking subject '{subject}' (status: {status})"
                )
            }
            Self::StudentAlreadyEnrolled { group, student } => {
                write!(f, "Student '{student}' is already enrolled in group '{group}'")
            }
            Self::StudentNotEnrolled { group, student } => {
                write!(f, "Student '{student}' is not enrolled in group '{group}'")
            }
            Self::GroupFull { group, capacity } => {
                write!(f, "Group '{group}' is full ({capacity} seats taken)")
            }
            Self::GroupClosed { group } => write!(f, "Group '{group}' is closed"),
            Self::DecanateFull { career, limit } => {
                write!(
                    f,
                    "Decanate for career '{career}' already holds {limit} pending request(s)"
                )
            }
            Self::PrerequisiteNotMet { subject, rule } => {
                write!(f, "Prerequisite for subject '{subject}' not met: {rule}")
            }
            Self::ScheduleConflict {
                group,
                conflicting_subject,
                conflicting_group,
                slot,
            } => {
                write!(
                    f,
                    "Group '{group}' meets {slot}, which overlaps group '{conflicting_group}' of subject '{conflicting_subject}'"
                )
            }
            Self::PeriodMismatch {
                group,
                group_period,
                period,
            } => {
                write!(
                    f,
                    "Group '{group}' belongs to period '{group_period}', not '{period}'"
                )
            }
            Self::PeriodInactive { period, today } => {
                write!(f, "Academic period '{period}' is not active on {today}")
            }
            Self::EnrollmentClosed { period, today } => {
                write!(
                    f,
                    "Enrollment for academic period '{period}' is not open on {today}"
                )
            }
            Self::NotInCurriculum { student, subject } => {
                write!(
                    f,
                    "Subject '{subject}' is not in the study plan of student '{student}'"
                )
            }
            Self::NoStudyPlan { student } => {
                write!(f, "Student '{student}' has no study plan attached")
            }
            Self::WrongCareer { expected, actual } => {
                write!(f, "Expected career '{expected}', got '{actual}'")
            }
            Self::GroupNotInSubject { group, subject } => {
                write!(f, "Group '{group}' is not offered for subject '{subject}'")
            }
            Self::SubjectNotFound(subject) => write!(f, "Subject '{subject}' not found"),
            Self::GroupNotFound(group) => write!(f, "Group '{group}' not found"),
            Self::PeriodNotFound(period) => write!(f, "Academic period '{period}' not found"),
            Self::StudentNotFound(student) => write!(f, "Student '{student}' not found"),
            Self::RequestNotFound(request) => write!(f, "Request {request} not found"),
            Self::DecanateNotFound(career) => {
                write!(f, "No decanate serves career '{career}'")
            }
        }
    }
}

impl std::error::Error for DomainError {}
