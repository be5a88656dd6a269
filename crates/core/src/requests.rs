// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change requests: submission, admission into a decanate queue and
//! resolution.
//!
//! A submitted request waits outside any queue until its decanate receives
//! it. Approval re-validates the change against current state before it is
//! applied; a request that no longer validates stays `InReview`.

use crate::apply::{Applied, ChangeRecord, joined};
use crate::error::CoreError;
use crate::state::{Engine, Outcome, decanate_snapshot, lock, request_snapshot};
use enrollment_audit::StateSnapshot;
use enrollment_domain::{
    AcademicPeriod, CareerId, ChangeKind, Decanate, DomainError, Group, GroupId, PeriodCode,
    Refused, Request, RequestId, SUBMISSION_COMMENT, Student, StudentId, Subject, SubjectId,
};
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::{debug, info};

impl Engine {
    /// Files a group-change (`new_subject` is `None`) or subject-change request.
    pub(crate) fn submit(
        &self,
        student_id: &StudentId,
        subject: SubjectId,
        new_subject: Option<SubjectId>,
        new_group: GroupId,
        period: PeriodCode,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Student>> = self.student_handle(student_id)?;
        let mut student: MutexGuard<'_, Student> = lock(&handle, "student")?;

        let kind: ChangeKind<'_> = match new_subject {
            None => ChangeKind::GroupChange { current: &subject },
            Some(_) => ChangeKind::SubjectChange { current: &subject },
        };
        let target: &SubjectId = new_subject.as_ref().unwrap_or(&subject);
        self.validate_locked(kind, &student, target, &new_group, &period)?;

        let id: RequestId = self.allocate_request_id();
        let now: OffsetDateTime = self.clock.now();
        let career: CareerId = student.career().clone();
        let request: Request = match new_subject {
            None => Request::group_change(
                id,
                student_id.clone(),
                career.clone(),
                subject,
                new_group,
                period.clone(),
                now,
            ),
            Some(new_subject) => Request::subject_change(
                id,
                student_id.clone(),
                career.clone(),
                subject,
                new_subject,
                new_group,
                period.clone(),
                now,
            )?,
        };

        lock(&self.submitted, "submitted requests")?.insert(id, request.clone());
        student.record_request(id);
        drop(student);

        info!(
            request = %id,
            student = %student_id,
            subject = %request.subject(),
            group = %request.new_group(),
            "Submitted change request"
        );
        Ok(Applied::new(
            Outcome::RequestSubmitted(request.clone()),
            format!("{student_id} submitted {id}: {SUBMISSION_COMMENT}"),
            StateSnapshot::absent(),
            request_snapshot(&request),
        )
        .in_period(period)
        .for_career(career))
    }

    pub(crate) fn receive_request(
        &self,
        career: &CareerId,
        id: RequestId,
        comment: &str,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Decanate>> = self.decanate_handle(career)?;
        let mut decanate: MutexGuard<'_, Decanate> = lock(&handle, "decanate")?;
        let mut submitted = lock(&self.submitted, "submitted requests")?;
        let request: Request = submitted
            .remove(&id)
            .ok_or(DomainError::RequestNotFound(id))?;
        let before: StateSnapshot =
            joined(&request_snapshot(&request), &decanate_snapshot(&decanate));

        let admitted: Request = match decanate.receive(request, comment, self.clock.now()) {
            Ok(admitted) => admitted,
            Err(refused) => {
                let Refused { error, request } = *refused;
                submitted.insert(id, request);
                debug!(request = %id, career = %career, error = %error, "Decanate refused request");
                return Err(error.into());
            }
        };
        drop(submitted);
        let after: StateSnapshot =
            joined(&request_snapshot(&admitted), &decanate_snapshot(&decanate));
        drop(decanate);

        info!(
            request = %id,
            career = %career,
            priority = admitted.priority().unwrap_or_default(),
            "Received request"
        );
        Ok(Applied::new(
            Outcome::RequestReceived(admitted.clone()),
            format!("Decanate {career} received {id}"),
            before,
            after,
        )
        .in_period(admitted.period().clone())
        .for_career(career.clone()))
    }

    /// Approves a request under review and applies the change it asks for.
    ///
    /// Locks the decanate, then the student, then the groups involved. The
    /// request is filed as resolved before the change runs and withdrawn
    /// again if the change fails; readers reach the decanate first, so they
    /// never see it resolved while it is still under review.
    pub(crate) fn approve_request(
        &self,
        career: &CareerId,
        id: RequestId,
        comment: &str,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Decanate>> = self.decanate_handle(career)?;
        let mut decanate: MutexGuard<'_, Decanate> = lock(&handle, "decanate")?;
        let before: StateSnapshot = decanate_snapshot(&decanate);

        let mut updated: Decanate = decanate.clone();
        let approved: Request = updated.approve(id, comment, self.clock.now())?;
        lock(&self.resolved, "resolved requests")?.insert(id, approved.clone());

        let change: ChangeRecord = match self.apply_approved(&approved) {
            Ok(change) => change,
            Err(err) => {
                if let Ok(mut resolved) = lock(&self.resolved, "resolved requests") {
                    resolved.remove(&id);
                }
                debug!(request = %id, error = %err, "Approval failed re-validation");
                return Err(err);
            }
        };

        *decanate = updated;
        let after: StateSnapshot = joined(&change.after, &decanate_snapshot(&decanate));
        drop(decanate);

        info!(
            request = %id,
            career = %career,
            student = %approved.student(),
            from = %change.old_group,
            to = %approved.new_group(),
            "Approved request"
        );
        Ok(Applied::new(
            Outcome::RequestApproved(approved.clone()),
            format!("Decanate {career} approved {id}: {comment}"),
            joined(&change.before, &before),
            after,
        )
        .in_period(approved.period().clone())
        .for_career(career.clone()))
    }

    fn apply_approved(&self, approved: &Request) -> Result<ChangeRecord, CoreError> {
        let handle: Arc<Mutex<Student>> = self.student_handle(approved.student())?;
        let mut student: MutexGuard<'_, Student> = lock(&handle, "student")?;
        self.locked_change(
            &mut student,
            approved.subject(),
            approved.target_subject(),
            approved.new_group(),
            approved.period(),
        )
    }

    pub(crate) fn reject_request(
        &self,
        career: &CareerId,
        id: RequestId,
        comment: &str,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Decanate>> = self.decanate_handle(career)?;
        let mut decanate: MutexGuard<'_, Decanate> = lock(&handle, "decanate")?;
        let before: StateSnapshot = decanate_snapshot(&decanate);
        let mut updated: Decanate = decanate.clone();
        let rejected: Request = updated.reject(id, comment, self.clock.now())?;
        lock(&self.resolved, "resolved requests")?.insert(id, rejected.clone());
        *decanate = updated;
        let after: StateSnapshot = decanate_snapshot(&decanate);
        drop(decanate);

        info!(request = %id, career = %career, "Rejected request");
        Ok(Applied::new(
            Outcome::RequestRejected(rejected.clone()),
            format!("Decanate {career} rejected {id}: {comment}"),
            before,
            after,
        )
        .in_period(rejected.period().clone())
        .for_career(career.clone()))
    }

    /// Runs the checks for a change without applying it.
    fn validate_locked(
        &self,
        kind: ChangeKind<'_>,
        student: &Student,
        target: &SubjectId,
        group_id: &GroupId,
        period_code: &PeriodCode,
    ) -> Result<(), CoreError> {
        let period: AcademicPeriod = self.period(period_code)?;
        let subject: Subject = self.subject(target)?;
        let handle: Arc<Mutex<Group>> = self.group_handle(group_id)?;
        let group: MutexGuard<'_, Group> = lock(&handle, "group")?;
        self.check(kind, student, &subject, &group, &period)
    }
}
