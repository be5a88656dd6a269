// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod decanate;
mod error;
mod group;
mod period;
mod prerequisite;
mod request;
mod schedule;
mod student;
mod subject_status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use decanate::{Decanate, Refused};
pub use error::{DomainError, ViolationKind};
pub use group::{Group, GroupStatus};
pub use period::AcademicPeriod;
pub use prerequisite::{ApprovedRecord, PrerequisiteRule};
pub use request::{
    ProcessEntry, Request, RequestKind, RequestOperation, RequestStatus, SUBMISSION_COMMENT,
};
pub use schedule::{Day, Schedule};
pub use student::{Student, StudyPlan};
pub use subject_status::{StatusSnapshot, SubjectEnrollment, SubjectOperation, SubjectStatus};

// Re-export public types
pub use types::{
    CareerId, Grade, GroupId, PeriodCode, ProfessorId, RequestId, StudentId, Subject, SubjectId,
};
pub use validation::{
    ChangeKind, HeldGroup, ValidationContext, held_groups, validate_change, validate_enrollment,
    validate_group_change, validate_subject_change,
};
