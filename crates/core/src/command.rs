// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use enrollment_domain::{
    AcademicPeriod, CareerId, Grade, GroupId, PeriodCode, PrerequisiteRule, ProfessorId,
    RequestId, Schedule, StudentId, StudyPlan, SubjectId,
};
use serde::Deserialize;

/// A command represents user or system intent as data only.
///
/// Commands are the only way to request state changes. Every command that
/// depends on the academic period names it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Register an academic period.
    RegisterPeriod {
        /// The period, with its optional enrollment window.
        period: AcademicPeriod,
    },
    /// Add a subject to the catalog.
    RegisterSubject {
        id: SubjectId,
        name: String,
        credits: u32,
        #[serde(default)]
        prerequisites: Vec<PrerequisiteRule>,
    },
    /// Open a group of a registered subject in a registered period.
    OpenGroup {
        id: GroupId,
        subject: SubjectId,
        capacity: u32,
        schedules: Vec<Schedule>,
        #[serde(default)]
        professor: Option<ProfessorId>,
        period: PeriodCode,
    },
    /// Register a student of a career.
    RegisterStudent {
        id: StudentId,
        name: String,
        career: CareerId,
    },
    /// Attach (or extend) a student's study plan.
    AttachStudyPlan {
        student: StudentId,
        plan: StudyPlan,
    },
    /// Create the decanate that resolves a career's requests.
    RegisterDecanate { career: CareerId },
    /// Enroll a student in a subject through one of its groups.
    Enroll {
        student: StudentId,
        subject: SubjectId,
        group: GroupId,
        period: PeriodCode,
    },
    /// Withdraw a student from a subject in progress.
    Unenroll {
        student: StudentId,
        subject: SubjectId,
    },
    /// Move a student to another group of a subject in progress.
    ChangeGroup {
        student: StudentId,
        subject: SubjectId,
        new_group: GroupId,
        period: PeriodCode,
    },
    /// Replace a subject in progress with another subject.
    ChangeSubject {
        student: StudentId,
        subject: SubjectId,
        new_subject: SubjectId,
        new_group: GroupId,
        period: PeriodCode,
    },
    /// Record the final grade of a subject in progress.
    RecordOutcome {
        student: StudentId,
        subject: SubjectId,
        grade: Grade,
    },
    /// File a group-change request.
    SubmitGroupChange {
        student: StudentId,
        subject: SubjectId,
        new_group: GroupId,
        period: PeriodCode,
    },
    /// File a subject-change request.
    SubmitSubjectChange {
        student: StudentId,
        subject: SubjectId,
        new_subject: SubjectId,
        new_group: GroupId,
        period: PeriodCode,
    },
    /// Admit a submitted request into its career's decanate queue.
    ReceiveRequest {
        career: CareerId,
        request: RequestId,
        comment: String,
    },
    /// Approve a request under review and apply the change it asks for.
    ApproveRequest {
        career: CareerId,
        request: RequestId,
        comment: String,
    },
    /// Reject a request under review.
    RejectRequest {
        career: CareerId,
        request: RequestId,
        comment: String,
    },
    /// Administratively close a group.
    CloseGroup { group: GroupId },
    /// Administratively reopen a group.
    ReopenGroup { group: GroupId },
    /// Change the capacity of an empty group.
    SetGroupCapacity { group: GroupId, capacity: u32 },
}

impl Command {
    /// Returns the action name recorded in audit events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RegisterPeriod { .. } => "RegisterPeriod",
            Self::RegisterSubject { .. } => "RegisterSubject",
            Self::OpenGroup { .. } => "OpenGroup",
            Self::RegisterStudent { .. } => "RegisterStudent",
            Self::AttachStudyPlan { .. } => "AttachStudyPlan",
            Self::RegisterDecanate { .. } => "RegisterDecanate",
            Self::Enroll { .. } => "Enroll",
            Self::Unenroll { .. } => "Unenroll",
            Self::ChangeGroup { .. } => "ChangeGroup",
            Self::ChangeSubject { .. } => "ChangeSubject",
            Self::RecordOutcome { .. } => "RecordOutcome",
            Self::SubmitGroupChange { .. } => "SubmitGroupChange",
            Self::SubmitSubjectChange { .. } => "SubmitSubjectChange",
            Self::ReceiveRequest { .. } => "ReceiveRequest",
            Self::ApproveRequest { .. } => "ApproveRequest",
            Self::RejectRequest { .. } => "RejectRequest",
            Self::CloseGroup { .. } => "CloseGroup",
            Self::ReopenGroup { .. } => "ReopenGroup",
            Self::SetGroupCapacity { .. } => "SetGroupCapacity",
        }
    }
}
