// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic requests and their approval workflow.
//!
//! A request starts `Pending` when the student submits it, moves to
//! `InReview` when a decanate receives it, and ends `Approved` or
//! `Rejected`. Every transition appends one entry to the process log; the
//! creation entry seeds it. Rejected transitions leave status and log as
//! they were.

use crate::error::DomainError;
use crate::types::{CareerId, GroupId, PeriodCode, RequestId, StudentId, SubjectId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Comment recorded on the log entry created together with a request.
pub const SUBMISSION_COMMENT: &str = "Request submitted";

/// Approval status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    InReview,
    Approved,
    Rejected,
}

/// Operations that move a request between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOperation {
    Review,
    Approve,
    Reject,
}

impl RequestOperation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidName(format!(
                "Unknown request status '{s}'"
            ))),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Computes the status an operation leads to.
    ///
    /// # Errors
    ///
    /// Returns the reason the current status rejects the operation.
    pub const fn next(&self, operation: RequestOperation) -> Result<Self, &'static str> {
        match (self, operation) {
            (Self::Pending, RequestOperation::Review) => Ok(Self::InReview),
            (Self::Pending, RequestOperation::Approve) => {
                Err("cannot approve a request still pending review")
            }
            (Self::Pending, RequestOperation::Reject) => {
                Err("cannot reject a request still pending review")
            }
            (Self::InReview, RequestOperation::Approve) => Ok(Self::Approved),
            (Self::InReview, RequestOperation::Reject) => Ok(Self::Rejected),
            (Self::InReview, RequestOperation::Review) => Err("request is already under review"),
            (Self::Approved, _) => Err("request has already been approved"),
            (Self::Rejected, _) => Err("request has already been rejected"),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a request's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub status: RequestStatus,
    pub comment: String,
    pub at: OffsetDateTime,
}

/// What the student is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Move to another group of the same subject.
    GroupChange,
    /// Replace the subject with another one.
    SubjectChange {
        /// The subject to take instead.
        new_subject: SubjectId,
    },
}

/// A student petition handled by the decanate of the student's career.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    id: RequestId,
    student: StudentId,
    career: CareerId,
    subject: SubjectId,
    kind: RequestKind,
    new_group: GroupId,
    period: PeriodCode,
    priority: Option<u32>,
    status: RequestStatus,
    process_log: Vec<ProcessEntry>,
}

impl Request {
    /// Creates a pending group-change request.
    #[must_use]
    pub fn group_change(
        id: RequestId,
        student: StudentId,
        career: CareerId,
        subject: SubjectId,
        new_group: GroupId,
        period: PeriodCode,
        at: OffsetDateTime,
    ) -> Self {
        Self::submitted(
            id,
            student,
            career,
            subject,
            RequestKind::GroupChange,
            new_group,
            period,
            at,
        )
    }

    /// Creates a pending subject-change request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SameSubject` if both subjects are the same.
    #[allow(clippy::too_many_arguments)]
    pub fn subject_change(
        id: RequestId,
        student: StudentId,
        career: CareerId,
        subject: SubjectId,
        new_subject: SubjectId,
        new_group: GroupId,
        period: PeriodCode,
        at: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        if new_subject == subject {
            return Err(DomainError::SameSubject { subject });
        }
        Ok(Self::submitted(
            id,
            student,
            career,
            subject,
            RequestKind::SubjectChange { new_subject },
            new_group,
            period,
            at,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn submitted(
        id: RequestId,
        student: StudentId,
        career: CareerId,
        subject: SubjectId,
        kind: RequestKind,
        new_group: GroupId,
        period: PeriodCode,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            student,
            career,
            subject,
            kind,
            new_group,
            period,
            priority: None,
            status: RequestStatus::Pending,
            process_log: vec![ProcessEntry {
                status: RequestStatus::Pending,
                comment: String::from(SUBMISSION_COMMENT),
                at,
            }],
        }
    }

    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub const fn student(&self) -> &StudentId {
        &self.student
    }

    #[must_use]
    pub const fn career(&self) -> &CareerId {
        &self.career
    }

    /// Returns the subject the student currently holds.
    #[must_use]
    pub const fn subject(&self) -> &SubjectId {
        &self.subject
    }

    #[must_use]
    pub const fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Returns the subject for subject-change requests.
    #[must_use]
    pub const fn new_subject(&self) -> Option<&SubjectId> {
        match &self.kind {
            RequestKind::GroupChange => None,
            RequestKind::SubjectChange { new_subject } => Some(new_subject),
        }
    }

    /// Returns the subject the student would hold once the request is applied.
    #[must_use]
    pub const fn target_subject(&self) -> &SubjectId {
        match &self.kind {
            RequestKind::GroupChange => &self.subject,
            RequestKind::SubjectChange { new_subject } => new_subject,
        }
    }

    #[must_use]
    pub const fn new_group(&self) -> &GroupId {
        &self.new_group
    }

    #[must_use]
    pub const fn period(&self) -> &PeriodCode {
        &self.period
    }

    /// Returns the queue position, set only while a decanate holds the request.
    #[must_use]
    pub const fn priority(&self) -> Option<u32> {
        self.priority
    }

    #[must_use]
    pub const fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the full process log, oldest first.
    #[must_use]
    pub fn process_log(&self) -> &[ProcessEntry] {
        &self.process_log
    }

    /// Starts the review of a pending request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the request is pending.
    pub fn review(&mut self, comment: &str, at: OffsetDateTime) -> Result<(), DomainError> {
        self.transition(RequestOperation::Review, comment, at)
    }

    /// Approves a request under review.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the request is in review.
    pub fn approve(&mut self, comment: &str, at: OffsetDateTime) -> Result<(), DomainError> {
        self.transition(RequestOperation::Approve, comment, at)
    }

    /// Rejects a request under review.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the request is in review.
    pub fn reject(&mut self, comment: &str, at: OffsetDateTime) -> Result<(), DomainError> {
        self.transition(RequestOperation::Reject, comment, at)
    }

    pub(crate) fn set_priority(&mut self, priority: Option<u32>) {
        self.priority = priority;
    }

    fn transition(
        &mut self,
        operation: RequestOperation,
        comment: &str,
        at: OffsetDateTime,
    ) -> Result<(), DomainError> {
        let next: RequestStatus =
            self.status
                .next(operation)
                .map_err(|reason| DomainError::InvalidTransition {
                    entity: format!("request {}", self.id),
                    from: self.status.as_str(),
                    operation: operation.as_str(),
                    reason,
                })?;
        self.status = next;
        self.process_log.push(ProcessEntry {
            status: next,
            comment: comment.to_string(),
            at,
        });
        Ok(())
    }
}
