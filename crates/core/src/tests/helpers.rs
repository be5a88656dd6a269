// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Clock, Command, CoreError, Engine, EngineConfig, FixedClock, TransitionResult};
use enrollment_audit::{Actor, Cause};
use enrollment_domain::{
    AcademicPeriod, CareerId, Day, GroupId, PeriodCode, PrerequisiteRule, RequestId, Schedule,
    StudentId, StudyPlan, SubjectId, ViolationKind,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use time::macros::{date, datetime, time};
use time::{OffsetDateTime, Time};

/// Inside the 2026-1 enrollment window.
pub const IN_WINDOW: OffsetDateTime = datetime!(2026-02-01 10:00 UTC);
/// After the enrollment window, while the period is still active.
pub const AFTER_WINDOW: OffsetDateTime = datetime!(2026-03-10 10:00 UTC);
/// After the period has ended.
pub const AFTER_PERIOD: OffsetDateTime = datetime!(2026-07-01 10:00 UTC);

pub const PERIOD: &str = "2026-1";
pub const CAREER: &str = "SYS";

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("registrar-1"), String::from("admin"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("term-open"), String::from("Enrollment period"))
}

pub fn slot(day: Day, start: Time, end: Time) -> Schedule {
    Schedule::new(day, start, end).unwrap()
}

/// An engine driven by a clock the test controls.
pub struct Harness {
    pub engine: Engine,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// An empty engine with the given decanate queue limit.
    pub fn empty(max_pending: Option<usize>) -> Self {
        Self::configured(EngineConfig::new("UTC", max_pending).unwrap())
    }

    fn configured(config: EngineConfig) -> Self {
        let clock: Arc<FixedClock> = Arc::new(FixedClock::new(IN_WINDOW));
        let shared: Arc<dyn Clock> = clock.clone();
        Self {
            engine: Engine::with_clock(config, shared),
            clock,
        }
    }

    /// The standard catalog:
    ///
    /// - `ALG` (4 credits), groups `ALG-01` Mon 08-10, `ALG-02` Tue 08-10,
    ///   `ALG-03` Mon 09-11
    /// - `CALC` (4 credits, requires `ALG`), group `CALC-01` Wed 08-10
    /// - `PHY` (3 credits), groups `PHY-01` Thu 08-10, `PHY-02` Mon 09-11
    /// - student `S-1` of `SYS` with plan {ALG, CALC, PHY}
    /// - the `SYS` decanate
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    pub fn with_limit(max_pending: Option<usize>) -> Self {
        Self::seeded(Self::empty(max_pending))
    }

    /// The standard catalog in an institution on `timezone`.
    pub fn in_timezone(timezone: &str) -> Self {
        Self::seeded(Self::configured(EngineConfig::new(timezone, None).unwrap()))
    }

    fn seeded(harness: Self) -> Self {
        let period: AcademicPeriod = AcademicPeriod::new(
            PeriodCode::new(PERIOD),
            date!(2026 - 01 - 15),
            date!(2026 - 06 - 15),
        )
        .unwrap()
        .with_enrollment_window(Some(date!(2026 - 01 - 15)), Some(date!(2026 - 02 - 15)))
        .unwrap();
        harness.run(Command::RegisterPeriod { period }).unwrap();

        harness.subject("ALG", 4, vec![]);
        harness.subject(
            "CALC",
            4,
            vec![PrerequisiteRule::Approved(SubjectId::new("ALG"))],
        );
        harness.subject("PHY", 3, vec![]);

        harness.group("ALG-01", "ALG", 30, slot(Day::Monday, time!(8:00), time!(10:00)));
        harness.group("ALG-02", "ALG", 30, slot(Day::Tuesday, time!(8:00), time!(10:00)));
        harness.group("ALG-03", "ALG", 30, slot(Day::Monday, time!(9:00), time!(11:00)));
        harness.group("CALC-01", "CALC", 30, slot(Day::Wednesday, time!(8:00), time!(10:00)));
        harness.group("PHY-01", "PHY", 30, slot(Day::Thursday, time!(8:00), time!(10:00)));
        harness.group("PHY-02", "PHY", 30, slot(Day::Monday, time!(9:00), time!(11:00)));

        harness.student("S-1", &["ALG", "CALC", "PHY"]);
        harness
            .run(Command::RegisterDecanate {
                career: CareerId::new(CAREER),
            })
            .unwrap();
        harness
    }

    pub fn run(&self, command: Command) -> Result<TransitionResult, CoreError> {
        self.engine
            .apply(command, create_test_actor(), create_test_cause())
    }

    pub fn subject(&self, id: &str, credits: u32, prerequisites: Vec<PrerequisiteRule>) {
        self.run(Command::RegisterSubject {
            id: SubjectId::new(id),
            name: format!("Subject {id}"),
            credits,
            prerequisites,
        })
        .unwrap();
    }

    pub fn group(&self, id: &str, subject: &str, capacity: u32, schedule: Schedule) {
        self.run(Command::OpenGroup {
            id: GroupId::new(id),
            subject: SubjectId::new(subject),
            capacity,
            schedules: vec![schedule],
            professor: None,
            period: PeriodCode::new(PERIOD),
        })
        .unwrap();
    }

    pub fn student(&self, id: &str, plan: &[&str]) {
        self.run(Command::RegisterStudent {
            id: StudentId::new(id),
            name: format!("Student {id}"),
            career: CareerId::new(CAREER),
        })
        .unwrap();
        let subjects: BTreeSet<SubjectId> = plan.iter().map(|s| SubjectId::new(s)).collect();
        self.run(Command::AttachStudyPlan {
            student: StudentId::new(id),
            plan: StudyPlan::new(CareerId::new(CAREER), subjects),
        })
        .unwrap();
    }

    pub fn enroll(&self, student: &str, subject: &str, group: &str) -> Result<TransitionResult, CoreError> {
        self.run(Command::Enroll {
            student: StudentId::new(student),
            subject: SubjectId::new(subject),
            group: GroupId::new(group),
            period: PeriodCode::new(PERIOD),
        })
    }

    pub fn pass(&self, student: &str, subject: &str) {
        self.run(Command::RecordOutcome {
            student: StudentId::new(student),
            subject: SubjectId::new(subject),
            grade: enrollment_domain::Grade::new(4.0).unwrap(),
        })
        .unwrap();
    }

    pub fn submit_group_change(
        &self,
        student: &str,
        subject: &str,
        new_group: &str,
    ) -> Result<TransitionResult, CoreError> {
        self.run(Command::SubmitGroupChange {
            student: StudentId::new(student),
            subject: SubjectId::new(subject),
            new_group: GroupId::new(new_group),
            period: PeriodCode::new(PERIOD),
        })
    }

    pub fn receive(&self, request: u64) -> Result<TransitionResult, CoreError> {
        self.run(Command::ReceiveRequest {
            career: CareerId::new(CAREER),
            request: RequestId::new(request),
            comment: String::from("received"),
        })
    }

    pub fn approve(&self, request: u64) -> Result<TransitionResult, CoreError> {
        self.run(Command::ApproveRequest {
            career: CareerId::new(CAREER),
            request: RequestId::new(request),
            comment: String::from("approved"),
        })
    }

    pub fn reject(&self, request: u64) -> Result<TransitionResult, CoreError> {
        self.run(Command::RejectRequest {
            career: CareerId::new(CAREER),
            request: RequestId::new(request),
            comment: String::from("rejected"),
        })
    }

    pub fn roster_size(&self, group: &str) -> usize {
        self.engine.group(&GroupId::new(group)).unwrap().enrolled_count()
    }
}

pub fn kind_of(result: Result<TransitionResult, CoreError>) -> ViolationKind {
    result.unwrap_err().violation_kind().unwrap()
}
