// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! A small catalog shared by the validation and scenario tests.
//!
//! Period `2026-1` runs 2026-01-15 to 2026-06-15 with enrollment open until
//! 2026-02-15. Student `S-1` studies SYS with plan {ALG, CALC, PHY}.
//!
//! | group   | subject | meets          |
//! |---------|---------|----------------|
//! | ALG-01  | ALG     | monday 08-10   |
//! | ALG-02  | ALG     | tuesday 08-10  |
//! | ALG-03  | ALG     | monday 09-11   |
//! | CALC-01 | CALC    | wednesday 08-10|
//! | PHY-01  | PHY     | thursday 08-10 |
//! | PHY-02  | PHY     | monday 09-11   |
//! | ART-01  | ART     | friday 08-10   |
//!
//! CALC requires ALG approved. ART is not in the plan.

use crate::{
    AcademicPeriod, ApprovedRecord, ChangeKind, CareerId, Day, DomainError, Group, GroupId, HeldGroup, PeriodCode,
    PrerequisiteRule, Schedule, Student, StudentId, StudyPlan, Subject, SubjectId,
    ValidationContext, held_groups, validate_change,
};
use std::collections::BTreeMap;
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime, Time};

pub const IN_WINDOW: Date = date!(2026 - 02 - 01);
pub const AFTER_WINDOW: Date = date!(2026 - 03 - 10);
pub const AFTER_PERIOD: Date = date!(2026 - 07 - 01);

pub fn at() -> OffsetDateTime {
    datetime!(2026-02-01 10:00 UTC)
}

pub fn slot(day: Day, start_hour: u8, end_hour: u8) -> Schedule {
    Schedule::new(
        day,
        Time::from_hms(start_hour, 0, 0).unwrap(),
        Time::from_hms(end_hour, 0, 0).unwrap(),
    )
    .unwrap()
}

pub fn period() -> AcademicPeriod {
    AcademicPeriod::new(
        PeriodCode::new("2026-1"),
        date!(2026 - 01 - 15),
        date!(2026 - 06 - 15),
    )
    .unwrap()
    .with_enrollment_window(Some(date!(2026 - 01 - 15)), Some(date!(2026 - 02 - 15)))
    .unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub period: AcademicPeriod,
    pub subjects: BTreeMap<SubjectId, Subject>,
    pub groups: BTreeMap<GroupId, Group>,
    pub student: Student,
    pub today: Date,
}

impl Fixture {
    pub fn new() -> Self {
        let mut fixture: Self = Self {
            period: period(),
            subjects: BTreeMap::new(),
            groups: BTreeMap::new(),
            student: Student::new(StudentId::new("S-1"), "Ada Lovelace", CareerId::new("SYS"))
                .unwrap(),
            today: IN_WINDOW,
        };

        fixture.add_subject("ALG", 4, Vec::new());
        fixture.add_subject(
            "CALC",
            4,
            vec![PrerequisiteRule::Approved(SubjectId::new("ALG"))],
        );
        fixture.add_subject("PHY", 3, Vec::new());
        fixture.add_subject("ART", 2, Vec::new());

        fixture.add_group("ALG-01", "ALG", 30, slot(Day::Monday, 8, 10), "2026-1");
        fixture.add_group("ALG-02", "ALG", 30, slot(Day::Tuesday, 8, 10), "2026-1");
        fixture.add_group("ALG-03", "ALG", 30, slot(Day::Monday, 9, 11), "2026-1");
        fixture.add_group("CALC-01", "CALC", 30, slot(Day::Wednesday, 8, 10), "2026-1");
        fixture.add_group("PHY-01", "PHY", 30, slot(Day::Thursday, 8, 10), "2026-1");
        fixture.add_group("PHY-02", "PHY", 30, slot(Day::Monday, 9, 11), "2026-1");
        fixture.add_group("ART-01", "ART", 30, slot(Day::Friday, 8, 10), "2026-1");

        fixture
            .student
            .attach_study_plan(StudyPlan::new(
                CareerId::new("SYS"),
                ["ALG", "CALC", "PHY"].iter().map(|s| SubjectId::new(s)).collect(),
            ))
            .unwrap();
        fixture
    }

    pub fn add_subject(&mut self, id: &str, credits: u32, prerequisites: Vec<PrerequisiteRule>) {
        let subject: Subject =
            Subject::new(SubjectId::new(id), &format!("Subject {id}"), credits, prerequisites)
                .unwrap();
        self.subjects.insert(subject.id().clone(), subject);
    }

    pub fn add_group(&mut self, id: &str, subject: &str, capacity: u32, meets: Schedule, period: &str) {
        let group: Group = Group::new(
            GroupId::new(id),
            SubjectId::new(subject),
            capacity,
            vec![meets],
            None,
            PeriodCode::new(period),
        )
        .unwrap();
        self.subjects
            .get_mut(&SubjectId::new(subject))
            .unwrap()
            .add_group(group.id().clone());
        self.groups.insert(group.id().clone(), group);
    }

    pub fn subject(&self, id: &str) -> &Subject {
        &self.subjects[&SubjectId::new(id)]
    }

    pub fn group(&self, id: &str) -> &Group {
        &self.groups[&GroupId::new(id)]
    }

    pub fn group_mut(&mut self, id: &str) -> &mut Group {
        self.groups.get_mut(&GroupId::new(id)).unwrap()
    }

    /// Runs the ordered checks against the fixture.
    pub fn validate(
        &self,
        kind: ChangeKind<'_>,
        subject: &str,
        group: &str,
    ) -> Result<(), DomainError> {
        let approved: ApprovedRecord = self
            .student
            .approved_record(|s| self.subjects.get(s).map(Subject::credits));
        let held: Vec<HeldGroup> = held_groups(&self.student, |g| {
            self.groups.get(g).map(|group| group.schedules().to_vec())
        });
        let ctx: ValidationContext<'_> = ValidationContext {
            student: &self.student,
            subject: self.subject(subject),
            group: self.group(group),
            period: &self.period,
            today: self.today,
            approved: &approved,
            held: &held,
        };
        validate_change(kind, &ctx)
    }

    /// Puts the student in a group, bypassing validation.
    pub fn enroll(&mut self, subject: &str, group: &str) {
        self.student
            .enrollment_mut(&SubjectId::new(subject))
            .unwrap()
            .enroll(GroupId::new(group), at())
            .unwrap();
        let student: StudentId = self.student.id().clone();
        self.group_mut(group).enroll_student(student).unwrap();
    }

    /// Takes the student out of a group, bypassing validation.
    pub fn withdraw(&mut self, subject: &str, group: &str) {
        self.student
            .enrollment_mut(&SubjectId::new(subject))
            .unwrap()
            .withdraw(at())
            .unwrap();
        let student: StudentId = self.student.id().clone();
        self.group_mut(group).unenroll_student(&student).unwrap();
    }

    /// Enrolls the student and approves the subject.
    pub fn pass(&mut self, subject: &str, group: &str) {
        self.enroll(subject, group);
        self.student
            .enrollment_mut(&SubjectId::new(subject))
            .unwrap()
            .approve(at())
            .unwrap();
        let student: StudentId = self.student.id().clone();
        self.group_mut(group).unenroll_student(&student).unwrap();
    }

    /// Fills every free seat of a group with placeholder students.
    pub fn fill(&mut self, group: &str) {
        let seats: usize = self.group(group).available_seats();
        for n in 0..seats {
            self.group_mut(group)
                .enroll_student(StudentId::new(&format!("FILL-{n}")))
                .unwrap();
        }
    }
}
