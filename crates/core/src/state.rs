// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The engine registry.
//!
//! ## Locking
//!
//! Every group, student and decanate sits behind its own mutex. The maps
//! holding them are read-locked only long enough to clone the handle, and
//! write-locked only to register new entities.
//!
//! When an operation needs several entity locks it takes them in this order:
//! decanate, then student, then groups in ascending id order. The request
//! maps and the audit trail are leaves: nothing else is locked while they
//! are held.

use crate::clock::{Clock, SystemClock, local_date};
use crate::config::EngineConfig;
use crate::error::CoreError;
use enrollment_audit::{AuditEvent, StateSnapshot};
use enrollment_domain::{
    AcademicPeriod, ApprovedRecord, CareerId, Decanate, DomainError, Group, GroupId, GroupStatus,
    HeldGroup, PeriodCode, Request, RequestId, Schedule, Student, StudentId, Subject,
    SubjectEnrollment, SubjectId, SubjectStatus, held_groups,
};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use time::Date;

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    PeriodRegistered(PeriodCode),
    SubjectRegistered(SubjectId),
    GroupOpened(GroupId),
    StudentRegistered(StudentId),
    StudyPlanAttached(StudentId),
    DecanateRegistered(CareerId),
    Enrolled {
        student: StudentId,
        subject: SubjectId,
        group: GroupId,
        /// The group's status right after the enrollment.
        group_status: GroupStatus,
    },
    Unenrolled {
        student: StudentId,
        subject: SubjectId,
        group: GroupId,
    },
    GroupChanged {
        student: StudentId,
        subject: SubjectId,
        from: GroupId,
        to: GroupId,
    },
    SubjectChanged {
        student: StudentId,
        from: SubjectId,
        to: SubjectId,
        group: GroupId,
    },
    GradeRecorded {
        student: StudentId,
        subject: SubjectId,
        status: SubjectStatus,
    },
    RequestSubmitted(Request),
    RequestReceived(Request),
    RequestApproved(Request),
    RequestRejected(Request),
    GroupClosed(GroupId),
    GroupReopened(GroupId),
    CapacityChanged {
        group: GroupId,
        capacity: u32,
    },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeriodRegistered(period) => write!(f, "registered period {period}"),
            Self::SubjectRegistered(subject) => write!(f, "registered subject {subject}"),
            Self::GroupOpened(group) => write!(f, "opened group {group}"),
            Self::StudentRegistered(student) => write!(f, "registered student {student}"),
            Self::StudyPlanAttached(student) => write!(f, "attached study plan to {student}"),
            Self::DecanateRegistered(career) => write!(f, "registered decanate for {career}"),
            Self::Enrolled {
                student,
                subject,
                group,
                group_status,
            } => write!(
                f,
                "{student} enrolled in {subject} through {group} (group now {group_status})"
            ),
            Self::Unenrolled {
                student,
                subject,
                group,
            } => write!(f, "{student} withdrew from {subject} ({group})"),
            Self::GroupChanged {
                student,
                subject,
                from,
                to,
            } => write!(f, "{student} moved from {from} to {to} in {subject}"),
            Self::SubjectChanged {
                student,
                from,
                to,
                group,
            } => write!(f, "{student} replaced {from} with {to} through {group}"),
            Self::GradeRecorded {
                student,
                subject,
                status,
            } => write!(f, "{student} finished {subject}: {status}"),
            Self::RequestSubmitted(request) => write!(f, "request {} submitted", request.id()),
            Self::RequestReceived(request) => write!(
                f,
                "request {} received with priority {}",
                request.id(),
                request.priority().unwrap_or_default()
            ),
            Self::RequestApproved(request) => write!(f, "request {} approved", request.id()),
            Self::RequestRejected(request) => write!(f, "request {} rejected", request.id()),
            Self::GroupClosed(group) => write!(f, "closed group {group}"),
            Self::GroupReopened(group) => write!(f, "reopened group {group}"),
            Self::CapacityChanged { group, capacity } => {
                write!(f, "group {group} capacity set to {capacity}")
            }
        }
    }
}

/// The result of a successful command.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// What the command did.
    pub outcome: Outcome,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

/// The enrollment engine: a registry of periods, subjects, groups, students
/// and decanates that applies commands concurrently.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) periods: RwLock<HashMap<PeriodCode, AcademicPeriod>>,
    pub(crate) subjects: RwLock<HashMap<SubjectId, Subject>>,
    pub(crate) groups: RwLock<HashMap<GroupId, Arc<Mutex<Group>>>>,
    /// Meetings of every group. Fixed once the group is opened, so conflict
    /// checks read them without locking the groups.
    pub(crate) timetable: RwLock<HashMap<GroupId, Vec<Schedule>>>,
    pub(crate) students: RwLock<HashMap<StudentId, Arc<Mutex<Student>>>>,
    pub(crate) decanates: RwLock<HashMap<CareerId, Arc<Mutex<Decanate>>>>,
    /// Requests filed but not yet received by a decanate.
    pub(crate) submitted: Mutex<HashMap<RequestId, Request>>,
    /// Approved and rejected requests.
    pub(crate) resolved: Mutex<HashMap<RequestId, Request>>,
    pub(crate) next_request: AtomicU64,
    pub(crate) audit_trail: Mutex<Vec<AuditEvent>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("next_request", &self.next_request)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an empty engine that reads the wall clock.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_clock(config, clock)
    }

    /// Creates an empty engine with an explicit clock.
    #[must_use]
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            periods: RwLock::new(HashMap::new()),
            subjects: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            timetable: RwLock::new(HashMap::new()),
            students: RwLock::new(HashMap::new()),
            decanates: RwLock::new(HashMap::new()),
            submitted: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
            next_request: AtomicU64::new(1),
            audit_trail: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The institution's calendar day: the clock's instant read in the
    /// configured timezone. Periods and enrollment windows are checked
    /// against it.
    #[must_use]
    pub fn today(&self) -> Date {
        local_date(self.clock.now(), self.config.timezone)
    }

    // ---------------------------------------------------------------------
    // Read accessors. All of them return copies.
    // ---------------------------------------------------------------------

    /// Returns a registered period.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is unknown or its map lock is poisoned.
    pub fn period(&self, code: &PeriodCode) -> Result<AcademicPeriod, CoreError> {
        read(&self.periods, "periods")?
            .get(code)
            .cloned()
            .ok_or_else(|| DomainError::PeriodNotFound(code.clone()).into())
    }

    /// Returns a catalog subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is unknown or its map lock is poisoned.
    pub fn subject(&self, id: &SubjectId) -> Result<Subject, CoreError> {
        read(&self.subjects, "subjects")?
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::SubjectNotFound(id.clone()).into())
    }

    /// Returns a copy of a group, including its roster and status.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or a lock is poisoned.
    pub fn group(&self, id: &GroupId) -> Result<Group, CoreError> {
        let handle: Arc<Mutex<Group>> = self.group_handle(id)?;
        let group: MutexGuard<'_, Group> = lock(&handle, "group")?;
        Ok(group.clone())
    }

    /// Returns a copy of a student with all subject bindings.
    ///
    /// # Errors
    ///
    /// Returns an error if the student is unknown or a lock is poisoned.
    pub fn student(&self, id: &StudentId) -> Result<Student, CoreError> {
        let handle: Arc<Mutex<Student>> = self.student_handle(id)?;
        let student: MutexGuard<'_, Student> = lock(&handle, "student")?;
        Ok(student.clone())
    }

    /// Returns the binding of a student to a subject, with its history.
    ///
    /// # Errors
    ///
    /// Returns an error if the student is unknown, the subject is not in the
    /// student's plan, or a lock is poisoned.
    pub fn enrollment(
        &self,
        student: &StudentId,
        subject: &SubjectId,
    ) -> Result<SubjectEnrollment, CoreError> {
        let student: Student = self.student(student)?;
        student.enrollment(subject).cloned().ok_or_else(|| {
            DomainError::NotInCurriculum {
                student: student.id().clone(),
                subject: subject.clone(),
            }
            .into()
        })
    }

    /// Returns the pending requests of a career's decanate in priority order.
    ///
    /// # Errors
    ///
    /// Returns an error if no decanate serves the career or a lock is poisoned.
    pub fn pending_requests(&self, career: &CareerId) -> Result<Vec<Request>, CoreError> {
        let handle: Arc<Mutex<Decanate>> = self.decanate_handle(career)?;
        let decanate: MutexGuard<'_, Decanate> = lock(&handle, "decanate")?;
        Ok(decanate.pending_requests().to_vec())
    }

    /// Finds a request wherever it currently lives.
    ///
    /// # Errors
    ///
    /// Returns an error if the request does not exist or a lock is poisoned.
    pub fn request(&self, id: RequestId) -> Result<Request, CoreError> {
        if let Some(request) = lock(&self.submitted, "submitted requests")?.get(&id) {
            return Ok(request.clone());
        }
        let handles: Vec<Arc<Mutex<Decanate>>> = read(&self.decanates, "decanates")?
            .values()
            .cloned()
            .collect();
        for handle in handles {
            let decanate: MutexGuard<'_, Decanate> = lock(&handle, "decanate")?;
            if let Some(request) = decanate.get(id) {
                return Ok(request.clone());
            }
        }
        lock(&self.resolved, "resolved requests")?
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::RequestNotFound(id).into())
    }

    /// Returns every audit event recorded so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit trail lock is poisoned.
    pub fn audit_trail(&self) -> Result<Vec<AuditEvent>, CoreError> {
        Ok(lock(&self.audit_trail, "audit trail")?.clone())
    }

    // ---------------------------------------------------------------------
    // Internal helpers shared by the command handlers.
    // ---------------------------------------------------------------------

    pub(crate) fn group_handle(&self, id: &GroupId) -> Result<Arc<Mutex<Group>>, CoreError> {
        handle(&self.groups, id, "groups", || DomainError::GroupNotFound(id.clone()))
    }

    pub(crate) fn student_handle(&self, id: &StudentId) -> Result<Arc<Mutex<Student>>, CoreError> {
        handle(&self.students, id, "students", || {
            DomainError::StudentNotFound(id.clone())
        })
    }

    pub(crate) fn decanate_handle(
        &self,
        career: &CareerId,
    ) -> Result<Arc<Mutex<Decanate>>, CoreError> {
        handle(&self.decanates, career, "decanates", || {
            DomainError::DecanateNotFound(career.clone())
        })
    }

    /// Resolves group handles keyed (and therefore ordered) by id.
    pub(crate) fn group_handles<'a, I>(
        &self,
        ids: I,
    ) -> Result<BTreeMap<GroupId, Arc<Mutex<Group>>>, CoreError>
    where
        I: IntoIterator<Item = &'a GroupId>,
    {
        ids.into_iter()
            .map(|id| Ok((id.clone(), self.group_handle(id)?)))
            .collect()
    }

    /// Builds the approved record of a student from catalog credits.
    pub(crate) fn approved_record(&self, student: &Student) -> Result<ApprovedRecord, CoreError> {
        let subjects = read(&self.subjects, "subjects")?;
        Ok(student.approved_record(|id| subjects.get(id).map(Subject::credits)))
    }

    /// Collects the meetings of every group the student attends.
    pub(crate) fn held_groups(&self, student: &Student) -> Result<Vec<HeldGroup>, CoreError> {
        let timetable = read(&self.timetable, "timetable")?;
        Ok(held_groups(student, |group| timetable.get(group).cloned()))
    }

    pub(crate) fn allocate_request_id(&self) -> RequestId {
        RequestId::new(self.next_request.fetch_add(1, Ordering::Relaxed))
    }

    /// Appends to the audit trail. A poisoned trail is recovered: appending
    /// cannot leave it inconsistent.
    pub(crate) fn record(&self, event: AuditEvent) {
        self.audit_trail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

pub(crate) fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    what: &'static str,
) -> Result<MutexGuard<'a, T>, CoreError> {
    mutex.lock().map_err(|_| CoreError::LockPoisoned(what))
}

pub(crate) fn read<'a, T>(
    rw: &'a RwLock<T>,
    what: &'static str,
) -> Result<std::sync::RwLockReadGuard<'a, T>, CoreError> {
    rw.read().map_err(|_| CoreError::LockPoisoned(what))
}

pub(crate) fn write<'a, T>(
    rw: &'a RwLock<T>,
    what: &'static str,
) -> Result<std::sync::RwLockWriteGuard<'a, T>, CoreError> {
    rw.write().map_err(|_| CoreError::LockPoisoned(what))
}

/// Locks every group in ascending id order.
pub(crate) fn lock_groups<'a>(
    handles: &'a BTreeMap<GroupId, Arc<Mutex<Group>>>,
) -> Result<BTreeMap<GroupId, MutexGuard<'a, Group>>, CoreError> {
    handles
        .iter()
        .map(|(id, handle)| Ok((id.clone(), lock(handle, "group")?)))
        .collect()
}

fn handle<K, V, F>(
    map: &RwLock<HashMap<K, Arc<Mutex<V>>>>,
    key: &K,
    what: &'static str,
    missing: F,
) -> Result<Arc<Mutex<V>>, CoreError>
where
    K: Eq + Hash,
    F: FnOnce() -> DomainError,
{
    read(map, what)?
        .get(key)
        .cloned()
        .ok_or_else(|| missing().into())
}

pub(crate) fn group_snapshot(group: &Group) -> StateSnapshot {
    StateSnapshot::new(format!(
        "group={} status={} enrolled={}/{}",
        group.id(),
        group.status(),
        group.enrolled_count(),
        group.capacity()
    ))
}

pub(crate) fn binding_snapshot(student: &Student, subject: &SubjectId) -> StateSnapshot {
    student.enrollment(subject).map_or_else(
        || StateSnapshot::new(format!("student={} subject={subject} unbound", student.id())),
        |binding| {
            let group: String = binding
                .current_group()
                .map_or_else(|| String::from("-"), ToString::to_string);
            StateSnapshot::new(format!(
                "student={} subject={subject} status={} group={group}",
                student.id(),
                binding.status()
            ))
        },
    )
}

pub(crate) fn request_snapshot(request: &Request) -> StateSnapshot {
    let priority: String = request
        .priority()
        .map_or_else(|| String::from("-"), |p| p.to_string());
    StateSnapshot::new(format!(
        "request={} status={} priority={priority}",
        request.id(),
        request.status()
    ))
}

pub(crate) fn decanate_snapshot(decanate: &Decanate) -> StateSnapshot {
    StateSnapshot::new(format!(
        "decanate={} pending={}",
        decanate.career(),
        decanate.pending_requests().len()
    ))
}
