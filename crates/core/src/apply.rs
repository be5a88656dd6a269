// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{
    Engine, Outcome, TransitionResult, binding_snapshot, group_snapshot, lock, lock_groups, read,
    write,
};
use enrollment_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use enrollment_domain::{
    AcademicPeriod, ApprovedRecord, CareerId, ChangeKind, Decanate, DomainError, Grade, Group,
    GroupId, GroupStatus, HeldGroup, PeriodCode, PrerequisiteRule, ProfessorId, Schedule, Student,
    StudentId, StudyPlan, Subject, SubjectEnrollment, SubjectId, SubjectStatus, ValidationContext,
    validate_change,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::{debug, info};

/// What a handler did, before it is wrapped into an audit event.
pub(crate) struct Applied {
    pub(crate) outcome: Outcome,
    pub(crate) details: String,
    pub(crate) before: StateSnapshot,
    pub(crate) after: StateSnapshot,
    pub(crate) period: Option<PeriodCode>,
    pub(crate) career: Option<CareerId>,
}

impl Applied {
    pub(crate) const fn new(
        outcome: Outcome,
        details: String,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            outcome,
            details,
            before,
            after,
            period: None,
            career: None,
        }
    }

    pub(crate) fn in_period(mut self, period: PeriodCode) -> Self {
        self.period = Some(period);
        self
    }

    pub(crate) fn for_career(mut self, career: CareerId) -> Self {
        self.career = Some(career);
        self
    }
}

/// The groups a change touched.
pub(crate) struct ChangeRecord {
    pub(crate) old_group: GroupId,
    pub(crate) before: StateSnapshot,
    pub(crate) after: StateSnapshot,
}

impl Engine {
    /// Applies a command, producing an outcome and exactly one audit event.
    ///
    /// The engine is updated in place; a failed command leaves every entity
    /// exactly as it was.
    ///
    /// # Arguments
    ///
    /// * `command` - The command to apply
    /// * `actor` - The actor performing this action
    /// * `cause` - The cause or reason for this action
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The command violates a domain rule or names an unknown entity
    /// - A registration clashes with an existing entity
    /// - A lock was poisoned by a panicking thread
    pub fn apply(
        &self,
        command: Command,
        actor: Actor,
        cause: Cause,
    ) -> Result<TransitionResult, CoreError> {
        let name: &'static str = command.name();
        let applied: Applied = match self.dispatch(command) {
            Ok(applied) => applied,
            Err(err) => {
                debug!(command = name, actor = %actor.id, error = %err, "Command rejected");
                return Err(err);
            }
        };

        let action: Action = Action::new(name.to_string(), Some(applied.details));
        let mut audit_event: AuditEvent = AuditEvent::new(
            actor,
            cause,
            action,
            applied.before,
            applied.after,
            self.clock.now(),
        );
        if let Some(period) = applied.period {
            audit_event = audit_event.with_period(period);
        }
        if let Some(career) = applied.career {
            audit_event = audit_event.with_career(career);
        }
        self.record(audit_event.clone());

        Ok(TransitionResult {
            outcome: applied.outcome,
            audit_event,
        })
    }

    fn dispatch(&self, command: Command) -> Result<Applied, CoreError> {
        match command {
            Command::RegisterPeriod { period } => self.register_period(period),
            Command::RegisterSubject {
                id,
                name,
                credits,
                prerequisites,
            } => self.register_subject(id, &name, credits, prerequisites),
            Command::OpenGroup {
                id,
                subject,
                capacity,
                schedules,
                professor,
                period,
            } => self.open_group(id, subject, capacity, schedules, professor, period),
            Command::RegisterStudent { id, name, career } => {
                self.register_student(id, &name, career)
            }
            Command::AttachStudyPlan { student, plan } => self.attach_study_plan(&student, plan),
            Command::RegisterDecanate { career } => self.register_decanate(career),
            Command::Enroll {
                student,
                subject,
                group,
                period,
            } => self.enroll(&student, &subject, &group, &period),
            Command::Unenroll { student, subject } => self.unenroll(&student, &subject),
            Command::ChangeGroup {
                student,
                subject,
                new_group,
                period,
            } => self.change_group(&student, &subject, &new_group, &period),
            Command::ChangeSubject {
                student,
                subject,
                new_subject,
                new_group,
                period,
            } => self.change_subject(&student, &subject, &new_subject, &new_group, &period),
            Command::RecordOutcome {
                student,
                subject,
                grade,
            } => self.record_outcome(&student, &subject, grade),
            Command::SubmitGroupChange {
                student,
                subject,
                new_group,
                period,
            } => self.submit(&student, subject, None, new_group, period),
            Command::SubmitSubjectChange {
                student,
                subject,
                new_subject,
                new_group,
                period,
            } => self.submit(&student, subject, Some(new_subject), new_group, period),
            Command::ReceiveRequest {
                career,
                request,
                comment,
            } => self.receive_request(&career, request, &comment),
            Command::ApproveRequest {
                career,
                request,
                comment,
            } => self.approve_request(&career, request, &comment),
            Command::RejectRequest {
                career,
                request,
                comment,
            } => self.reject_request(&career, request, &comment),
            Command::CloseGroup { group } => self.close_group(&group),
            Command::ReopenGroup { group } => self.reopen_group(&group),
            Command::SetGroupCapacity { group, capacity } => {
                self.set_group_capacity(&group, capacity)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    fn register_period(&self, period: AcademicPeriod) -> Result<Applied, CoreError> {
        let code: PeriodCode = period.code().clone();
        let mut periods = write(&self.periods, "periods")?;
        if periods.contains_key(&code) {
            return Err(CoreError::DuplicateEntity {
                entity: "period",
                id: code.to_string(),
            });
        }
        let after: StateSnapshot = StateSnapshot::new(format!(
            "period={code} from={} to={}",
            period.start_date(),
            period.end_date()
        ));
        periods.insert(code.clone(), period);
        drop(periods);

        info!(period = %code, "Registered academic period");
        Ok(Applied::new(
            Outcome::PeriodRegistered(code.clone()),
            format!("Registered period {code}"),
            StateSnapshot::absent(),
            after,
        )
        .in_period(code))
    }

    fn register_subject(
        &self,
        id: SubjectId,
        name: &str,
        credits: u32,
        prerequisites: Vec<PrerequisiteRule>,
    ) -> Result<Applied, CoreError> {
        let subject: Subject = Subject::new(id.clone(), name, credits, prerequisites)?;
        let mut subjects = write(&self.subjects, "subjects")?;
        if subjects.contains_key(&id) {
            return Err(CoreError::DuplicateEntity {
                entity: "subject",
                id: id.to_string(),
            });
        }
        let after: StateSnapshot = StateSnapshot::new(format!(
            "subject={id} credits={credits} prerequisites={}",
            subject.prerequisites().len()
        ));
        subjects.insert(id.clone(), subject);
        drop(subjects);

        info!(subject = %id, credits, "Registered subject");
        Ok(Applied::new(
            Outcome::SubjectRegistered(id.clone()),
            format!("Registered subject {id}"),
            StateSnapshot::absent(),
            after,
        ))
    }

    fn open_group(
        &self,
        id: GroupId,
        subject: SubjectId,
        capacity: u32,
        schedules: Vec<Schedule>,
        professor: Option<ProfessorId>,
        period: PeriodCode,
    ) -> Result<Applied, CoreError> {
        self.period(&period)?;
        let group: Group = Group::new(
            id.clone(),
            subject.clone(),
            capacity,
            schedules,
            professor,
            period.clone(),
        )?;

        // Map lock order for registration: groups, subjects, timetable.
        let mut groups = write(&self.groups, "groups")?;
        if groups.contains_key(&id) {
            return Err(CoreError::DuplicateEntity {
                entity: "group",
                id: id.to_string(),
            });
        }
        let mut subjects = write(&self.subjects, "subjects")?;
        let mut timetable = write(&self.timetable, "timetable")?;
        let Some(catalog_entry) = subjects.get_mut(&subject) else {
            return Err(DomainError::SubjectNotFound(subject).into());
        };

        catalog_entry.add_group(id.clone());
        timetable.insert(id.clone(), group.schedules().to_vec());
        let after: StateSnapshot = group_snapshot(&group);
        groups.insert(id.clone(), Arc::new(Mutex::new(group)));
        drop(timetable);
        drop(subjects);
        drop(groups);

        info!(group = %id, subject = %subject, capacity, period = %period, "Opened group");
        Ok(Applied::new(
            Outcome::GroupOpened(id.clone()),
            format!("Opened group {id} of {subject} with {capacity} seats"),
            StateSnapshot::absent(),
            after,
        )
        .in_period(period))
    }

    fn register_student(
        &self,
        id: StudentId,
        name: &str,
        career: CareerId,
    ) -> Result<Applied, CoreError> {
        let student: Student = Student::new(id.clone(), name, career.clone())?;
        let mut students = write(&self.students, "students")?;
        if students.contains_key(&id) {
            return Err(CoreError::DuplicateEntity {
                entity: "student",
                id: id.to_string(),
            });
        }
        students.insert(id.clone(), Arc::new(Mutex::new(student)));
        drop(students);

        info!(student = %id, career = %career, "Registered student");
        Ok(Applied::new(
            Outcome::StudentRegistered(id.clone()),
            format!("Registered student {id}"),
            StateSnapshot::absent(),
            StateSnapshot::new(format!("student={id} career={career}")),
        )
        .for_career(career))
    }

    fn attach_study_plan(&self, id: &StudentId, plan: StudyPlan) -> Result<Applied, CoreError> {
        {
            let subjects = read(&self.subjects, "subjects")?;
            if let Some(unknown) = plan.subjects().find(|s| !subjects.contains_key(*s)) {
                return Err(DomainError::SubjectNotFound(unknown.clone()).into());
            }
        }

        let handle: Arc<Mutex<Student>> = self.student_handle(id)?;
        let mut student: MutexGuard<'_, Student> = lock(&handle, "student")?;
        let before_count: usize = student.enrollments().count();
        let mut updated: Student = student.clone();
        updated.attach_study_plan(plan)?;
        let after_count: usize = updated.enrollments().count();
        let career: CareerId = updated.career().clone();
        *student = updated;
        drop(student);

        info!(student = %id, subjects = after_count, "Attached study plan");
        Ok(Applied::new(
            Outcome::StudyPlanAttached(id.clone()),
            format!("Attached study plan to {id}"),
            StateSnapshot::new(format!("student={id} bindings={before_count}")),
            StateSnapshot::new(format!("student={id} bindings={after_count}")),
        )
        .for_career(career))
    }

    fn register_decanate(&self, career: CareerId) -> Result<Applied, CoreError> {
        let limit: Option<usize> = self.config.max_pending_per_decanate;
        let mut decanates = write(&self.decanates, "decanates")?;
        if decanates.contains_key(&career) {
            return Err(CoreError::DuplicateEntity {
                entity: "decanate",
                id: career.to_string(),
            });
        }
        decanates.insert(
            career.clone(),
            Arc::new(Mutex::new(Decanate::with_limit(career.clone(), limit))),
        );
        drop(decanates);

        info!(career = %career, ?limit, "Registered decanate");
        Ok(Applied::new(
            Outcome::DecanateRegistered(career.clone()),
            format!("Registered decanate for {career}"),
            StateSnapshot::absent(),
            StateSnapshot::new(format!("decanate={career} pending=0")),
        )
        .for_career(career))
    }

    // ---------------------------------------------------------------------
    // Enrollment
    // ---------------------------------------------------------------------

    fn enroll(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        group_id: &GroupId,
        period_code: &PeriodCode,
    ) -> Result<Applied, CoreError> {
        let period: AcademicPeriod = self.period(period_code)?;
        let subject: Subject = self.subject(subject_id)?;
        let student_handle: Arc<Mutex<Student>> = self.student_handle(student_id)?;
        let group_handle: Arc<Mutex<Group>> = self.group_handle(group_id)?;

        let mut student: MutexGuard<'_, Student> = lock(&student_handle, "student")?;
        let mut group: MutexGuard<'_, Group> = lock(&group_handle, "group")?;
        self.check(ChangeKind::Enrollment, &student, &subject, &group, &period)?;

        let now: OffsetDateTime = self.clock.now();
        let before: StateSnapshot = joined(
            &binding_snapshot(&student, subject_id),
            &group_snapshot(&group),
        );
        let mut updated_student: Student = student.clone();
        let mut updated_group: Group = group.clone();
        updated_student
            .enrollment_mut(subject_id)?
            .enroll(group_id.clone(), now)?;
        updated_group.enroll_student(student_id.clone())?;
        let after: StateSnapshot = joined(
            &binding_snapshot(&updated_student, subject_id),
            &group_snapshot(&updated_group),
        );
        let group_status: GroupStatus = updated_group.status();
        let career: CareerId = updated_student.career().clone();
        *student = updated_student;
        *group = updated_group;
        drop(group);
        drop(student);

        info!(
            student = %student_id,
            subject = %subject_id,
            group = %group_id,
            status = %group_status,
            "Enrolled student"
        );
        Ok(Applied::new(
            Outcome::Enrolled {
                student: student_id.clone(),
                subject: subject_id.clone(),
                group: group_id.clone(),
                group_status,
            },
            format!("Enrolled {student_id} in {subject_id} through {group_id}"),
            before,
            after,
        )
        .in_period(period_code.clone())
        .for_career(career))
    }

    fn unenroll(&self, student_id: &StudentId, subject_id: &SubjectId) -> Result<Applied, CoreError> {
        let student_handle: Arc<Mutex<Student>> = self.student_handle(student_id)?;
        let mut student: MutexGuard<'_, Student> = lock(&student_handle, "student")?;

        let mut updated_student: Student = student.clone();
        let binding: &mut SubjectEnrollment = updated_student.enrollment_mut(subject_id)?;
        if binding.status() != SubjectStatus::InProgress {
            return Err(DomainError::SubjectNotInProgress {
                subject: subject_id.clone(),
                status: binding.status().as_str(),
            }
            .into());
        }
        let group_id: GroupId = binding.current_group().cloned().ok_or_else(|| {
            DomainError::SubjectNotInProgress {
                subject: subject_id.clone(),
                status: SubjectStatus::InProgress.as_str(),
            }
        })?;
        binding.withdraw(self.clock.now())?;

        let group_handle: Arc<Mutex<Group>> = self.group_handle(&group_id)?;
        let mut group: MutexGuard<'_, Group> = lock(&group_handle, "group")?;
        let before: StateSnapshot = joined(
            &binding_snapshot(&student, subject_id),
            &group_snapshot(&group),
        );
        let mut updated_group: Group = group.clone();
        updated_group.unenroll_student(student_id)?;
        let after: StateSnapshot = joined(
            &binding_snapshot(&updated_student, subject_id),
            &group_snapshot(&updated_group),
        );
        let period: PeriodCode = updated_group.period().clone();
        let career: CareerId = updated_student.career().clone();
        *student = updated_student;
        *group = updated_group;
        drop(group);
        drop(student);

        info!(student = %student_id, subject = %subject_id, group = %group_id, "Withdrew student");
        Ok(Applied::new(
            Outcome::Unenrolled {
                student: student_id.clone(),
                subject: subject_id.clone(),
                group: group_id.clone(),
            },
            format!("Withdrew {student_id} from {subject_id} ({group_id})"),
            before,
            after,
        )
        .in_period(period)
        .for_career(career))
    }

    fn change_group(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        new_group: &GroupId,
        period: &PeriodCode,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Student>> = self.student_handle(student_id)?;
        let mut student: MutexGuard<'_, Student> = lock(&handle, "student")?;
        let record: ChangeRecord =
            self.locked_change(&mut student, subject_id, subject_id, new_group, period)?;
        let career: CareerId = student.career().clone();
        drop(student);

        info!(
            student = %student_id,
            subject = %subject_id,
            from = %record.old_group,
            to = %new_group,
            "Changed group"
        );
        Ok(Applied::new(
            Outcome::GroupChanged {
                student: student_id.clone(),
                subject: subject_id.clone(),
                from: record.old_group.clone(),
                to: new_group.clone(),
            },
            format!(
                "Moved {student_id} from {} to {new_group} in {subject_id}",
                record.old_group
            ),
            record.before,
            record.after,
        )
        .in_period(period.clone())
        .for_career(career))
    }

    fn change_subject(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        new_subject: &SubjectId,
        new_group: &GroupId,
        period: &PeriodCode,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Student>> = self.student_handle(student_id)?;
        let mut student: MutexGuard<'_, Student> = lock(&handle, "student")?;
        let record: ChangeRecord =
            self.locked_change(&mut student, subject_id, new_subject, new_group, period)?;
        let career: CareerId = student.career().clone();
        drop(student);

        info!(
            student = %student_id,
            from = %subject_id,
            to = %new_subject,
            group = %new_group,
            "Changed subject"
        );
        Ok(Applied::new(
            Outcome::SubjectChanged {
                student: student_id.clone(),
                from: subject_id.clone(),
                to: new_subject.clone(),
                group: new_group.clone(),
            },
            format!("Replaced {subject_id} with {new_subject} through {new_group} for {student_id}"),
            record.before,
            record.after,
        )
        .in_period(period.clone())
        .for_career(career))
    }

    fn record_outcome(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        grade: Grade,
    ) -> Result<Applied, CoreError> {
        let handle: Arc<Mutex<Student>> = self.student_handle(student_id)?;
        let mut student: MutexGuard<'_, Student> = lock(&handle, "student")?;
        let held: Option<GroupId> = student
            .enrollment(subject_id)
            .and_then(|binding| binding.current_group())
            .cloned();
        let mut before: StateSnapshot = binding_snapshot(&student, subject_id);
        let mut updated: Student = student.clone();
        updated
            .enrollment_mut(subject_id)?
            .record_outcome(grade, self.clock.now())?;
        let status: SubjectStatus = updated
            .status_of(subject_id)
            .unwrap_or(SubjectStatus::NotTaken);
        let mut after: StateSnapshot = binding_snapshot(&updated, subject_id);

        // A failed subject gives its seat back.
        let released: Option<GroupId> = match held {
            Some(group_id) if !status.has_assigned_group() => {
                let group_handle: Arc<Mutex<Group>> = self.group_handle(&group_id)?;
                let mut group: MutexGuard<'_, Group> = lock(&group_handle, "group")?;
                let mut updated_group: Group = group.clone();
                updated_group.unenroll_student(student_id)?;
                before = joined(&before, &group_snapshot(&group));
                after = joined(&after, &group_snapshot(&updated_group));
                *group = updated_group;
                Some(group_id)
            }
            _ => None,
        };
        let career: CareerId = updated.career().clone();
        *student = updated;
        drop(student);

        info!(
            student = %student_id,
            subject = %subject_id,
            %grade,
            %status,
            released = ?released,
            "Recorded outcome"
        );
        Ok(Applied::new(
            Outcome::GradeRecorded {
                student: student_id.clone(),
                subject: subject_id.clone(),
                status,
            },
            format!("Recorded grade {grade} for {student_id} in {subject_id}"),
            before,
            after,
        )
        .for_career(career))
    }

    // ---------------------------------------------------------------------
    // Group administration
    // ---------------------------------------------------------------------

    fn close_group(&self, id: &GroupId) -> Result<Applied, CoreError> {
        let (before, after, period) = self.update_group(id, Group::close_group)?;
        info!(group = %id, "Closed group");
        Ok(Applied::new(
            Outcome::GroupClosed(id.clone()),
            format!("Closed group {id}"),
            before,
            after,
        )
        .in_period(period))
    }

    fn reopen_group(&self, id: &GroupId) -> Result<Applied, CoreError> {
        let (before, after, period) = self.update_group(id, Group::open_group)?;
        info!(group = %id, "Reopened group");
        Ok(Applied::new(
            Outcome::GroupReopened(id.clone()),
            format!("Reopened group {id}"),
            before,
            after,
        )
        .in_period(period))
    }

    fn set_group_capacity(&self, id: &GroupId, capacity: u32) -> Result<Applied, CoreError> {
        let (before, after, period) =
            self.update_group(id, |group| group.set_capacity(capacity))?;
        info!(group = %id, capacity, "Changed group capacity");
        Ok(Applied::new(
            Outcome::CapacityChanged {
                group: id.clone(),
                capacity,
            },
            format!("Set capacity of {id} to {capacity}"),
            before,
            after,
        )
        .in_period(period))
    }

    /// Applies an administrative operation to a copy of a group and commits it.
    fn update_group<F>(
        &self,
        id: &GroupId,
        operation: F,
    ) -> Result<(StateSnapshot, StateSnapshot, PeriodCode), CoreError>
    where
        F: FnOnce(&mut Group) -> Result<(), DomainError>,
    {
        let handle: Arc<Mutex<Group>> = self.group_handle(id)?;
        let mut group: MutexGuard<'_, Group> = lock(&handle, "group")?;
        let before: StateSnapshot = group_snapshot(&group);
        let mut updated: Group = group.clone();
        operation(&mut updated)?;
        let after: StateSnapshot = group_snapshot(&updated);
        let period: PeriodCode = updated.period().clone();
        *group = updated;
        drop(group);
        Ok((before, after, period))
    }

    // ---------------------------------------------------------------------
    // Shared change machinery
    // ---------------------------------------------------------------------

    /// Runs the ordered checks for a locked student against a locked group.
    pub(crate) fn check(
        &self,
        kind: ChangeKind<'_>,
        student: &Student,
        subject: &Subject,
        group: &Group,
        period: &AcademicPeriod,
    ) -> Result<(), CoreError> {
        let approved: ApprovedRecord = self.approved_record(student)?;
        let held: Vec<HeldGroup> = self.held_groups(student)?;
        let ctx: ValidationContext<'_> = ValidationContext {
            student,
            subject,
            group,
            period,
            today: self.today(),
            approved: &approved,
            held: &held,
        };
        validate_change(kind, &ctx).map_err(|err| {
            debug!(
                student = %student.id(),
                subject = %subject.id(),
                group = %group.id(),
                error = %err,
                "Validation rejected change"
            );
            CoreError::from(err)
        })
    }

    /// Validates and applies a group or subject change for a locked student.
    ///
    /// `current` is the subject held in progress; `target` equals `current`
    /// for a group change. The student and both groups are updated together
    /// or not at all.
    pub(crate) fn locked_change(
        &self,
        student: &mut Student,
        current: &SubjectId,
        target: &SubjectId,
        new_group: &GroupId,
        period_code: &PeriodCode,
    ) -> Result<ChangeRecord, CoreError> {
        let period: AcademicPeriod = self.period(period_code)?;
        let subject: Subject = self.subject(target)?;
        let old_group: Option<GroupId> = student
            .enrollment(current)
            .and_then(|binding| binding.current_group())
            .cloned();

        let handles: BTreeMap<GroupId, Arc<Mutex<Group>>> =
            self.group_handles(old_group.iter().chain(std::iter::once(new_group)))?;
        let mut groups: BTreeMap<GroupId, MutexGuard<'_, Group>> = lock_groups(&handles)?;

        let kind: ChangeKind<'_> = if current == target {
            ChangeKind::GroupChange { current }
        } else {
            ChangeKind::SubjectChange { current }
        };
        self.check(kind, student, &subject, locked(&groups, new_group)?, &period)?;

        // Check 1 passed, so the student attends a group for `current`.
        let old_group: GroupId = old_group.ok_or_else(|| DomainError::SubjectNotInProgress {
            subject: current.clone(),
            status: SubjectStatus::NotTaken.as_str(),
        })?;
        let before: StateSnapshot = joined(
            &group_snapshot(locked(&groups, &old_group)?),
            &group_snapshot(locked(&groups, new_group)?),
        );

        let now: OffsetDateTime = self.clock.now();
        let mut updated_student: Student = student.clone();
        if current == target {
            updated_student
                .enrollment_mut(current)?
                .set_group(new_group.clone())?;
        } else {
            updated_student.enrollment_mut(current)?.withdraw(now)?;
            updated_student
                .enrollment_mut(target)?
                .enroll(new_group.clone(), now)?;
        }
        let mut leaving: Group = locked(&groups, &old_group)?.clone();
        leaving.unenroll_student(student.id())?;
        let mut joining: Group = locked(&groups, new_group)?.clone();
        joining.enroll_student(student.id().clone())?;
        let after: StateSnapshot = joined(&group_snapshot(&leaving), &group_snapshot(&joining));

        *student = updated_student;
        let mut updates: BTreeMap<GroupId, Group> =
            BTreeMap::from([(old_group.clone(), leaving), (new_group.clone(), joining)]);
        for (id, guard) in &mut groups {
            if let Some(updated) = updates.remove(id) {
                **guard = updated;
            }
        }

        Ok(ChangeRecord {
            old_group,
            before,
            after,
        })
    }
}

/// Returns a locked group by id.
pub(crate) fn locked<'g>(
    groups: &'g BTreeMap<GroupId, MutexGuard<'_, Group>>,
    id: &GroupId,
) -> Result<&'g Group, CoreError> {
    groups
        .get(id)
        .map(|guard| &**guard)
        .ok_or_else(|| DomainError::GroupNotFound(id.clone()).into())
}

pub(crate) fn joined(left: &StateSnapshot, right: &StateSnapshot) -> StateSnapshot {
    StateSnapshot::new(format!("{} | {}", left.data, right.data))
}
