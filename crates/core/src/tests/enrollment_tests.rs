// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Direct enrollment, withdrawal, changes and grading through the engine.

use super::helpers::{AFTER_PERIOD, AFTER_WINDOW, Harness, PERIOD, kind_of, slot};
use crate::{Command, CoreError, Outcome, TransitionResult};
use enrollment_domain::{
    Day, DomainError, Grade, GroupId, GroupStatus, PeriodCode, StudentId, SubjectEnrollment,
    SubjectId, SubjectStatus, ViolationKind,
};
use time::macros::{date, datetime, time};

fn binding(harness: &Harness, student: &str, subject: &str) -> SubjectEnrollment {
    harness
        .engine
        .enrollment(&StudentId::new(student), &SubjectId::new(subject))
        .unwrap()
}

fn change_group(harness: &Harness, subject: &str, new_group: &str) -> Result<TransitionResult, CoreError> {
    harness.run(Command::ChangeGroup {
        student: StudentId::new("S-1"),
        subject: SubjectId::new(subject),
        new_group: GroupId::new(new_group),
        period: PeriodCode::new(PERIOD),
    })
}

fn change_subject(
    harness: &Harness,
    subject: &str,
    new_subject: &str,
    new_group: &str,
) -> Result<TransitionResult, CoreError> {
    harness.run(Command::ChangeSubject {
        student: StudentId::new("S-1"),
        subject: SubjectId::new(subject),
        new_subject: SubjectId::new(new_subject),
        new_group: GroupId::new(new_group),
        period: PeriodCode::new(PERIOD),
    })
}

// ============================================================================
// Enrollment
// ============================================================================

#[test]
fn test_enroll_updates_binding_and_roster() {
    let harness: Harness = Harness::new();

    let result: TransitionResult = harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    assert_eq!(
        result.outcome,
        Outcome::Enrolled {
            student: StudentId::new("S-1"),
            subject: SubjectId::new("ALG"),
            group: GroupId::new("ALG-01"),
            group_status: GroupStatus::Open,
        }
    );
    let algebra: SubjectEnrollment = binding(&harness, "S-1", "ALG");
    assert_eq!(algebra.status(), SubjectStatus::InProgress);
    assert_eq!(algebra.current_group(), Some(&GroupId::new("ALG-01")));
    assert_eq!(harness.roster_size("ALG-01"), 1);
}

#[test]
fn test_enroll_twice_is_rejected() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    let kind: ViolationKind = kind_of(harness.enroll("S-1", "ALG", "ALG-02"));

    assert_eq!(kind, ViolationKind::AlreadyEnrolled);
    assert_eq!(harness.roster_size("ALG-02"), 0);
}

#[test]
fn test_enroll_requires_prerequisite() {
    let harness: Harness = Harness::new();

    let kind: ViolationKind = kind_of(harness.enroll("S-1", "CALC", "CALC-01"));
    assert_eq!(kind, ViolationKind::PrerequisiteNotMet);

    harness.enroll("S-1", "ALG", "ALG-01").unwrap();
    harness.pass("S-1", "ALG");
    harness.enroll("S-1", "CALC", "CALC-01").unwrap();

    assert_eq!(
        binding(&harness, "S-1", "CALC").status(),
        SubjectStatus::InProgress
    );
}

#[test]
fn test_enroll_rejects_schedule_conflict_without_side_effects() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    let err: CoreError = harness.enroll("S-1", "PHY", "PHY-02").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::ScheduleConflict { .. })
    ));
    assert_eq!(harness.roster_size("PHY-02"), 0);
    assert_eq!(
        binding(&harness, "S-1", "PHY").status(),
        SubjectStatus::NotTaken
    );
}

#[test]
fn test_enroll_outside_window_is_rejected() {
    let harness: Harness = Harness::new();
    harness.clock.set(AFTER_WINDOW);

    let err: CoreError = harness.enroll("S-1", "ALG", "ALG-01").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::EnrollmentClosed { .. })
    ));
}

#[test]
fn test_enrollment_window_follows_the_institution_day() {
    let harness: Harness = Harness::in_timezone("America/Bogota");
    // 22:00 on January 14th in Bogota, the day before the window opens.
    harness.clock.set(datetime!(2026-01-15 03:00 UTC));
    assert_eq!(harness.engine.today(), date!(2026 - 01 - 14));

    let kind: ViolationKind = kind_of(harness.enroll("S-1", "ALG", "ALG-01"));
    assert_eq!(kind, ViolationKind::PeriodNotValid);
    assert_eq!(harness.roster_size("ALG-01"), 0);

    harness.clock.set(datetime!(2026-01-15 06:00 UTC));
    assert_eq!(harness.engine.today(), date!(2026 - 01 - 15));
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    // 22:00 on February 15th locally, still the last day of the window.
    harness.clock.set(datetime!(2026-02-16 03:00 UTC));
    harness.enroll("S-1", "PHY", "PHY-01").unwrap();
}

#[test]
fn test_utc_institution_day_starts_at_utc_midnight() {
    let harness: Harness = Harness::new();
    harness.clock.set(datetime!(2026-01-15 03:00 UTC));

    assert_eq!(harness.engine.today(), date!(2026 - 01 - 15));
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();
}

#[test]
fn test_enroll_in_subject_outside_plan_is_rejected() {
    let harness: Harness = Harness::new();
    harness.subject("ART", 2, vec![]);
    harness.group("ART-01", "ART", 10, slot(Day::Friday, time!(8:00), time!(10:00)));

    let kind: ViolationKind = kind_of(harness.enroll("S-1", "ART", "ART-01"));

    assert_eq!(kind, ViolationKind::NotInCurriculum);
}

#[test]
fn test_enroll_with_group_of_other_subject_is_rejected() {
    let harness: Harness = Harness::new();

    let err: CoreError = harness.enroll("S-1", "ALG", "PHY-01").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::GroupNotInSubject { .. })
    ));
}

#[test]
fn test_enroll_unknown_student_is_not_found() {
    let harness: Harness = Harness::new();

    let kind: ViolationKind = kind_of(harness.enroll("S-404", "ALG", "ALG-01"));

    assert_eq!(kind, ViolationKind::NotFound);
}

#[test]
fn test_last_seat_closes_group_and_withdrawal_reopens_it() {
    let harness: Harness = Harness::new();
    harness.group("PHY-09", "PHY", 1, slot(Day::Friday, time!(14:00), time!(16:00)));
    harness.student("S-2", &["ALG", "CALC", "PHY"]);

    let result: TransitionResult = harness.enroll("S-1", "PHY", "PHY-09").unwrap();
    assert!(matches!(
        result.outcome,
        Outcome::Enrolled {
            group_status: GroupStatus::Closed,
            ..
        }
    ));
    assert_eq!(
        kind_of(harness.enroll("S-2", "PHY", "PHY-09")),
        ViolationKind::CapacityExceeded
    );

    harness
        .run(Command::Unenroll {
            student: StudentId::new("S-1"),
            subject: SubjectId::new("PHY"),
        })
        .unwrap();
    assert_eq!(
        harness.engine.group(&GroupId::new("PHY-09")).unwrap().status(),
        GroupStatus::Open
    );
    harness.enroll("S-2", "PHY", "PHY-09").unwrap();
}

// ============================================================================
// Withdrawal
// ============================================================================

#[test]
fn test_unenroll_releases_seat_and_resets_binding() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    let result: TransitionResult = harness
        .run(Command::Unenroll {
            student: StudentId::new("S-1"),
            subject: SubjectId::new("ALG"),
        })
        .unwrap();

    assert!(matches!(result.outcome, Outcome::Unenrolled { .. }));
    let algebra: SubjectEnrollment = binding(&harness, "S-1", "ALG");
    assert_eq!(algebra.status(), SubjectStatus::NotTaken);
    assert_eq!(algebra.current_group(), None);
    assert_eq!(harness.roster_size("ALG-01"), 0);
}

#[test]
fn test_unenroll_subject_not_in_progress_is_rejected() {
    let harness: Harness = Harness::new();

    let kind: ViolationKind = kind_of(harness.run(Command::Unenroll {
        student: StudentId::new("S-1"),
        subject: SubjectId::new("ALG"),
    }));

    assert_eq!(kind, ViolationKind::NotEnrolled);
}

// ============================================================================
// Group and subject changes
// ============================================================================

#[test]
fn test_change_group_moves_student_between_rosters() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();
    harness.clock.set(AFTER_WINDOW);

    let result: TransitionResult = change_group(&harness, "ALG", "ALG-02").unwrap();

    assert_eq!(
        result.outcome,
        Outcome::GroupChanged {
            student: StudentId::new("S-1"),
            subject: SubjectId::new("ALG"),
            from: GroupId::new("ALG-01"),
            to: GroupId::new("ALG-02"),
        }
    );
    assert_eq!(harness.roster_size("ALG-01"), 0);
    assert_eq!(harness.roster_size("ALG-02"), 1);
    assert_eq!(
        binding(&harness, "S-1", "ALG").current_group(),
        Some(&GroupId::new("ALG-02"))
    );
}

#[test]
fn test_change_group_ignores_overlap_with_replaced_group() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    change_group(&harness, "ALG", "ALG-03").unwrap();

    assert_eq!(harness.roster_size("ALG-03"), 1);
}

#[test]
fn test_change_group_detects_conflict_with_other_subject() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-02").unwrap();
    harness.enroll("S-1", "PHY", "PHY-02").unwrap();

    let kind: ViolationKind = kind_of(change_group(&harness, "ALG", "ALG-03"));

    assert_eq!(kind, ViolationKind::ScheduleConflict);
    assert_eq!(harness.roster_size("ALG-02"), 1);
    assert_eq!(harness.roster_size("ALG-03"), 0);
}

#[test]
fn test_change_group_to_same_group_is_rejected() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    let kind: ViolationKind = kind_of(change_group(&harness, "ALG", "ALG-01"));

    assert_eq!(kind, ViolationKind::AlreadyEnrolled);
    assert_eq!(harness.roster_size("ALG-01"), 1);
}

#[test]
fn test_change_group_requires_subject_in_progress() {
    let harness: Harness = Harness::new();

    let kind: ViolationKind = kind_of(change_group(&harness, "ALG", "ALG-02"));

    assert_eq!(kind, ViolationKind::NotEnrolled);
}

#[test]
fn test_change_group_after_period_is_rejected() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();
    harness.clock.set(AFTER_PERIOD);

    let err: CoreError = change_group(&harness, "ALG", "ALG-02").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::PeriodInactive { .. })
    ));
}

#[test]
fn test_change_subject_swaps_bindings_and_rosters() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "PHY", "PHY-01").unwrap();

    let result: TransitionResult = change_subject(&harness, "PHY", "ALG", "ALG-01").unwrap();

    assert!(matches!(result.outcome, Outcome::SubjectChanged { .. }));
    assert_eq!(
        binding(&harness, "S-1", "PHY").status(),
        SubjectStatus::NotTaken
    );
    assert_eq!(
        binding(&harness, "S-1", "ALG").status(),
        SubjectStatus::InProgress
    );
    assert_eq!(harness.roster_size("PHY-01"), 0);
    assert_eq!(harness.roster_size("ALG-01"), 1);
}

#[test]
fn test_change_subject_to_same_subject_is_rejected() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "PHY", "PHY-01").unwrap();

    let err: CoreError = change_subject(&harness, "PHY", "PHY", "PHY-02").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::SameSubject { .. })
    ));
}

#[test]
fn test_change_subject_checks_prerequisites_of_new_subject() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "PHY", "PHY-01").unwrap();

    let kind: ViolationKind = kind_of(change_subject(&harness, "PHY", "CALC", "CALC-01"));

    assert_eq!(kind, ViolationKind::PrerequisiteNotMet);
    assert_eq!(
        binding(&harness, "S-1", "PHY").status(),
        SubjectStatus::InProgress
    );
}

// ============================================================================
// Grading
// ============================================================================

#[test]
fn test_failing_grade_allows_retaking_the_subject() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();

    let result: TransitionResult = harness
        .run(Command::RecordOutcome {
            student: StudentId::new("S-1"),
            subject: SubjectId::new("ALG"),
            grade: Grade::new(2.0).unwrap(),
        })
        .unwrap();
    assert!(matches!(
        result.outcome,
        Outcome::GradeRecorded {
            status: SubjectStatus::Failed,
            ..
        }
    ));

    harness.enroll("S-1", "ALG", "ALG-02").unwrap();
    let algebra: SubjectEnrollment = binding(&harness, "S-1", "ALG");
    assert_eq!(algebra.status(), SubjectStatus::InProgress);
    assert_eq!(algebra.grade(), None);
}

#[test]
fn test_failing_grade_releases_the_seat() {
    let harness: Harness = Harness::new();
    harness.group("ALG-09", "ALG", 1, slot(Day::Friday, time!(8:00), time!(10:00)));
    harness.enroll("S-1", "ALG", "ALG-09").unwrap();
    assert_eq!(
        harness.engine.group(&GroupId::new("ALG-09")).unwrap().status(),
        GroupStatus::Closed
    );

    let result: TransitionResult = harness
        .run(Command::RecordOutcome {
            student: StudentId::new("S-1"),
            subject: SubjectId::new("ALG"),
            grade: Grade::new(2.0).unwrap(),
        })
        .unwrap();

    assert_eq!(binding(&harness, "S-1", "ALG").current_group(), None);
    assert_eq!(harness.roster_size("ALG-09"), 0);
    assert_eq!(
        harness.engine.group(&GroupId::new("ALG-09")).unwrap().status(),
        GroupStatus::Open
    );
    assert!(result.audit_event.after.data.contains("enrolled=0/1"));

    harness.enroll("S-1", "ALG", "ALG-09").unwrap();
    let algebra: SubjectEnrollment = binding(&harness, "S-1", "ALG");
    assert_eq!(algebra.status(), SubjectStatus::InProgress);
    assert_eq!(algebra.current_group(), Some(&GroupId::new("ALG-09")));
    assert_eq!(harness.roster_size("ALG-09"), 1);
}

#[test]
fn test_passing_grade_keeps_the_seat() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();
    harness.pass("S-1", "ALG");

    assert_eq!(
        binding(&harness, "S-1", "ALG").current_group(),
        Some(&GroupId::new("ALG-01"))
    );
    assert_eq!(harness.roster_size("ALG-01"), 1);
}

#[test]
fn test_approved_subject_cannot_be_taken_again() {
    let harness: Harness = Harness::new();
    harness.enroll("S-1", "ALG", "ALG-01").unwrap();
    harness.pass("S-1", "ALG");

    let err: CoreError = harness.enroll("S-1", "ALG", "ALG-02").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::InvalidTransition { .. })
    ));
    assert_eq!(
        binding(&harness, "S-1", "ALG").grade(),
        Some(Grade::new(4.0).unwrap())
    );
}

#[test]
fn test_grade_for_subject_not_in_progress_is_rejected() {
    let harness: Harness = Harness::new();

    let kind: ViolationKind = kind_of(harness.run(Command::RecordOutcome {
        student: StudentId::new("S-1"),
        subject: SubjectId::new("PHY"),
        grade: Grade::new(4.5).unwrap(),
    }));

    assert_eq!(kind, ViolationKind::InvalidTransition);
}
