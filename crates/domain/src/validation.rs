// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ordered legality checks for enrollment and change operations.
//!
//! Every check is read-only. Checks run in a fixed order and the first
//! failing check decides the reported error:
//!
//! 1. The replaced subject is held `InProgress` (changes only)
//! 2. The new subject differs from the replaced one (subject change only)
//! 3. The new subject is not already `InProgress` or `Approved`
//!    (enrollment and subject change)
//! 4. The new subject is in the student's study plan
//! 5. Every prerequisite of the new subject is satisfied
//! 6. The group is offered for the target subject
//! 7. The group accepts the student
//! 8. The group runs in the operation's period and that period is active
//!    (enrollment also needs the enrollment window to be open)
//! 9. The group does not overlap a subject held `InProgress`, other than
//!    the one being replaced

use crate::error::DomainError;
use crate::group::Group;
use crate::period::AcademicPeriod;
use crate::prerequisite::{ApprovedRecord, PrerequisiteRule};
use crate::schedule::Schedule;
use crate::student::Student;
use crate::subject_status::{SubjectOperation, SubjectStatus};
use crate::types::{GroupId, Subject, SubjectId};
use time::Date;

/// The operation being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind<'a> {
    /// Direct enrollment into a subject the student does not hold.
    Enrollment,
    /// Move to another group of a subject held `InProgress`.
    GroupChange {
        /// The subject whose group changes.
        current: &'a SubjectId,
    },
    /// Replace a subject held `InProgress` with another one.
    SubjectChange {
        /// The subject being dropped.
        current: &'a SubjectId,
    },
}

impl<'a> ChangeKind<'a> {
    /// Returns the subject this operation gives up, if any.
    #[must_use]
    pub const fn replaced(&self) -> Option<&'a SubjectId> {
        match *self {
            Self::Enrollment => None,
            Self::GroupChange { current } | Self::SubjectChange { current } => Some(current),
        }
    }
}

/// The meetings of a group a student currently attends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldGroup {
    /// The subject held `InProgress`.
    pub subject: SubjectId,
    /// The group the student attends for it.
    pub group: GroupId,
    /// The group's meetings.
    pub schedules: Vec<Schedule>,
}

/// Collects the groups a student attends for subjects held `InProgress`.
///
/// `schedules_of` resolves the meetings of a group; groups it cannot
/// resolve are skipped.
pub fn held_groups<F>(student: &Student, schedules_of: F) -> Vec<HeldGroup>
where
    F: Fn(&GroupId) -> Option<Vec<Schedule>>,
{
    student
        .groups_in_progress()
        .filter_map(|(subject, group)| {
            schedules_of(group).map(|schedules| HeldGroup {
                subject: subject.clone(),
                group: group.clone(),
                schedules,
            })
        })
        .collect()
}

/// Everything the checks read.
///
/// `subject` and `group` are the targets of the operation. For a group
/// change the target subject is the subject being kept.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub student: &'a Student,
    pub subject: &'a Subject,
    pub group: &'a Group,
    pub period: &'a AcademicPeriod,
    pub today: Date,
    pub approved: &'a ApprovedRecord,
    pub held: &'a [HeldGroup],
}

/// Runs all checks for `kind` in order.
///
/// # Errors
///
/// Returns the error of the first failing check.
pub fn validate_change(
    kind: ChangeKind<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), DomainError> {
    check_replaced_in_progress(kind, ctx)?;
    check_distinct_subject(kind, ctx)?;
    check_not_already_held(kind, ctx)?;
    check_in_curriculum(ctx)?;
    check_prerequisites(ctx)?;
    check_group_offered(ctx)?;
    check_group_accepts(ctx)?;
    check_period(kind, ctx)?;
    check_schedule(kind, ctx)?;
    Ok(())
}

/// Validates a direct enrollment into `ctx.subject` through `ctx.group`.
///
/// # Errors
///
/// Returns the error of the first failing check.
pub fn validate_enrollment(ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    validate_change(ChangeKind::Enrollment, ctx)
}

/// Validates moving `ctx.subject` to `ctx.group`.
///
/// # Errors
///
/// Returns the error of the first failing check.
pub fn validate_group_change(ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    validate_change(
        ChangeKind::GroupChange {
            current: ctx.subject.id(),
        },
        ctx,
    )
}

/// Validates replacing `current` with `ctx.subject` through `ctx.group`.
///
/// # Errors
///
/// Returns the error of the first failing check.
pub fn validate_subject_change(
    current: &SubjectId,
    ctx: &ValidationContext<'_>,
) -> Result<(), DomainError> {
    validate_change(ChangeKind::SubjectChange { current }, ctx)
}

// Check 1
fn check_replaced_in_progress(
    kind: ChangeKind<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), DomainError> {
    let Some(current) = kind.replaced() else {
        return Ok(());
    };
    let Some(binding) = ctx.student.enrollment(current) else {
        return Err(missing_binding(ctx.student, current));
    };
    if binding.status() != SubjectStatus::InProgress {
        return Err(DomainError::SubjectNotInProgress {
            subject: current.clone(),
            status: binding.status().as_str(),
        });
    }
    Ok(())
}

// Check 2
fn check_distinct_subject(
    kind: ChangeKind<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), DomainError> {
    if let ChangeKind::SubjectChange { current } = kind {
        if current == ctx.subject.id() {
            return Err(DomainError::SameSubject {
                subject: current.clone(),
            });
        }
    }
    Ok(())
}

// Check 3
fn check_not_already_held(
    kind: ChangeKind<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), DomainError> {
    if matches!(kind, ChangeKind::GroupChange { .. }) {
        return Ok(());
    }
    let subject: &SubjectId = ctx.subject.id();
    let Some(status) = ctx.student.status_of(subject) else {
        return Ok(());
    };
    match status.next(SubjectOperation::Enroll) {
        Ok(_) => Ok(()),
        Err(_) if status == SubjectStatus::InProgress => {
            Err(DomainError::SubjectAlreadyInProgress {
                subject: subject.clone(),
            })
        }
        Err(reason) => Err(DomainError::InvalidTransition {
            entity: format!("subject '{subject}'"),
            from: status.as_str(),
            operation: SubjectOperation::Enroll.as_str(),
            reason,
        }),
    }
}

// Check 4
fn check_in_curriculum(ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    let subject: &SubjectId = ctx.subject.id();
    if ctx.student.has_in_curriculum(subject) {
        Ok(())
    } else {
        Err(missing_binding(ctx.student, subject))
    }
}

// Check 5
fn check_prerequisites(ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    let unmet: Option<&PrerequisiteRule> = ctx
        .subject
        .prerequisites()
        .iter()
        .find(|rule| !rule.is_satisfied_by(ctx.approved));
    if let Some(rule) = unmet {
        return Err(DomainError::PrerequisiteNotMet {
            subject: ctx.subject.id().clone(),
            rule: rule.clone(),
        });
    }
    Ok(())
}

// Check 6
fn check_group_offered(ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    let offered: bool =
        ctx.group.subject() == ctx.subject.id() && ctx.subject.offers(ctx.group.id());
    if offered {
        Ok(())
    } else {
        Err(DomainError::GroupNotInSubject {
            group: ctx.group.id().clone(),
            subject: ctx.subject.id().clone(),
        })
    }
}

// Check 7
fn check_group_accepts(ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    ctx.group.check_can_enroll(ctx.student.id())
}

// Check 8
fn check_period(kind: ChangeKind<'_>, ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    if ctx.group.period() != ctx.period.code() {
        return Err(DomainError::PeriodMismatch {
            group: ctx.group.id().clone(),
            group_period: ctx.group.period().clone(),
            period: ctx.period.code().clone(),
        });
    }
    if !ctx.period.is_active(ctx.today) {
        return Err(DomainError::PeriodInactive {
            period: ctx.period.code().clone(),
            today: ctx.today,
        });
    }
    if kind == ChangeKind::Enrollment && !ctx.period.is_enrollment_open(ctx.today) {
        return Err(DomainError::EnrollmentClosed {
            period: ctx.period.code().clone(),
            today: ctx.today,
        });
    }
    Ok(())
}

// Check 9
fn check_schedule(kind: ChangeKind<'_>, ctx: &ValidationContext<'_>) -> Result<(), DomainError> {
    let replaced: Option<&SubjectId> = kind.replaced();
    for held in ctx.held {
        if replaced == Some(&held.subject) || &held.subject == ctx.subject.id() {
            continue;
        }
        if let Some(slot) = ctx.group.first_overlap(&held.schedules) {
            return Err(DomainError::ScheduleConflict {
                group: ctx.group.id().clone(),
                conflicting_subject: held.subject.clone(),
                conflicting_group: held.group.clone(),
                slot,
            });
        }
    }
    Ok(())
}

fn missing_binding(student: &Student, subject: &SubjectId) -> DomainError {
    if student.study_plan().is_none() {
        DomainError::NoStudyPlan {
            student: student.id().clone(),
        }
    } else {
        DomainError::NotInCurriculum {
            student: student.id().clone(),
            subject: subject.clone(),
        }
    }
}
