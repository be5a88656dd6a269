// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::prerequisite::ApprovedRecord;
use crate::subject_status::{SubjectEnrollment, SubjectStatus};
use crate::types::{CareerId, GroupId, RequestId, StudentId, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The subjects a student of a career progresses through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    career: CareerId,
    subjects: BTreeSet<SubjectId>,
}

impl StudyPlan {
    #[must_use]
    pub const fn new(career: CareerId, subjects: BTreeSet<SubjectId>) -> Self {
        Self { career, subjects }
    }

    #[must_use]
    pub const fn career(&self) -> &CareerId {
        &self.career
    }

    #[must_use]
    pub fn contains(&self, subject: &SubjectId) -> bool {
        self.subjects.contains(subject)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &SubjectId> {
        self.subjects.iter()
    }
}

/// A student and their per-subject bindings.
///
/// Bindings are keyed by subject and only exist for subjects of the
/// attached study plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    id: StudentId,
    name: String,
    career: CareerId,
    study_plan: Option<StudyPlan>,
    enrollments: BTreeMap<SubjectId, SubjectEnrollment>,
    requests: Vec<RequestId>,
}

impl Student {
    /// Creates a student without a study plan.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidName` if the name is empty.
    pub fn new(id: StudentId, name: &str, career: CareerId) -> Result<Self, DomainError> {
        let name: String = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::InvalidName(String::from(
                "Student name cannot be empty",
            )));
        }
        Ok(Self {
            id,
            name,
            career,
            study_plan: None,
            enrollments: BTreeMap::new(),
            requests: Vec::new(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> &StudentId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn career(&self) -> &CareerId {
        &self.career
    }

    #[must_use]
    pub const fn study_plan(&self) -> Option<&StudyPlan> {
        self.study_plan.as_ref()
    }

    /// Attaches a study plan, creating a `NotTaken` binding for every
    /// subject that does not have one yet.
    ///
    /// Existing bindings are kept, so re-attaching never loses progress.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::WrongCareer` if the plan belongs to another career.
    pub fn attach_study_plan(&mut self, plan: StudyPlan) -> Result<(), DomainError> {
        if plan.career() != &self.career {
            return Err(DomainError::WrongCareer {
                expected: self.career.clone(),
                actual: plan.career().clone(),
            });
        }
        for subject in plan.subjects() {
            self.enrollments
                .entry(subject.clone())
                .or_insert_with(|| SubjectEnrollment::new(subject.clone()));
        }
        self.study_plan = Some(plan);
        Ok(())
    }

    /// Returns whether the subject is part of the attached plan.
    #[must_use]
    pub fn has_in_curriculum(&self, subject: &SubjectId) -> bool {
        self.study_plan
            .as_ref()
            .is_some_and(|plan| plan.contains(subject))
    }

    #[must_use]
    pub fn enrollment(&self, subject: &SubjectId) -> Option<&SubjectEnrollment> {
        self.enrollments.get(subject)
    }

    /// Returns the binding for a subject so it can be transitioned.
    ///
    /// # Errors
    ///
    /// Returns an error if no study plan is attached or the subject is not in it.
    pub fn enrollment_mut(
        &mut self,
        subject: &SubjectId,
    ) -> Result<&mut SubjectEnrollment, DomainError> {
        if self.study_plan.is_none() {
            return Err(DomainError::NoStudyPlan {
                student: self.id.clone(),
            });
        }
        let student: &StudentId = &self.id;
        self.enrollments
            .get_mut(subject)
            .ok_or_else(|| DomainError::NotInCurriculum {
                student: student.clone(),
                subject: subject.clone(),
            })
    }

    /// Returns every binding, ordered by subject.
    pub fn enrollments(&self) -> impl Iterator<Item = &SubjectEnrollment> {
        self.enrollments.values()
    }

    #[must_use]
    pub fn status_of(&self, subject: &SubjectId) -> Option<SubjectStatus> {
        self.enrollments.get(subject).map(SubjectEnrollment::status)
    }

    /// Returns `(subject, group)` for every subject currently in progress.
    pub fn groups_in_progress(&self) -> impl Iterator<Item = (&SubjectId, &GroupId)> {
        self.enrollments.values().filter_map(|binding| {
            if binding.status() == SubjectStatus::InProgress {
                binding.current_group().map(|group| (binding.subject(), group))
            } else {
                None
            }
        })
    }

    /// Returns the subjects the student has approved.
    #[must_use]
    pub fn approved_subjects(&self) -> BTreeSet<SubjectId> {
        self.enrollments
            .values()
            .filter(|binding| binding.status() == SubjectStatus::Approved)
            .map(|binding| binding.subject().clone())
            .collect()
    }

    /// Builds the record prerequisites are evaluated against.
    ///
    /// `credits_of` resolves the credit value of an approved subject;
    /// subjects it cannot resolve count as zero.
    pub fn approved_record<F>(&self, credits_of: F) -> ApprovedRecord
    where
        F: Fn(&SubjectId) -> Option<u32>,
    {
        let subjects: BTreeSet<SubjectId> = self.approved_subjects();
        let credits: u32 = subjects
            .iter()
            .filter_map(&credits_of)
            .fold(0_u32, u32::saturating_add);
        ApprovedRecord::new(subjects, credits)
    }

    /// Returns the requests the student has submitted, oldest first.
    #[must_use]
    pub fn requests(&self) -> &[RequestId] {
        &self.requests
    }

    pub fn record_request(&mut self, request: RequestId) {
        self.requests.push(request);
    }
}
