// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Prerequisite rules evaluated against a student's approved subjects.

use crate::types::SubjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A condition a student must meet before taking a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteRule {
    /// The subject must have been approved.
    Approved(SubjectId),
    /// At least one of the subjects must have been approved.
    AnyOf(Vec<SubjectId>),
    /// The credits of all approved subjects must add up to at least this value.
    MinimumCredits(u32),
}

impl PrerequisiteRule {
    /// Returns whether the rule holds for the given record.
    #[must_use]
    pub fn is_satisfied_by(&self, record: &ApprovedRecord) -> bool {
        match self {
            Self::Approved(subject) => record.has_approved(subject),
            Self::AnyOf(subjects) => subjects.iter().any(|s| record.has_approved(s)),
            Self::MinimumCredits(credits) => record.credits() >= *credits,
        }
    }
}

impl std::fmt::Display for PrerequisiteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved(subject) => write!(f, "{subject} approved"),
            Self::AnyOf(subjects) => {
                let names: Vec<&str> = subjects.iter().map(SubjectId::value).collect();
                write!(f, "one of [{}] approved", names.join(", "))
            }
            Self::MinimumCredits(credits) => write!(f, "at least {credits} approved credits"),
        }
    }
}

/// The set of subjects a student has approved, with their credit total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovedRecord {
    subjects: BTreeSet<SubjectId>,
    credits: u32,
}

impl ApprovedRecord {
    #[must_use]
    pub const fn new(subjects: BTreeSet<SubjectId>, credits: u32) -> Self {
        Self { subjects, credits }
    }

    #[must_use]
    pub fn has_approved(&self, subject: &SubjectId) -> bool {
        self.subjects.contains(subject)
    }

    #[must_use]
    pub const fn credits(&self) -> u32 {
        self.credits
    }

    pub fn subjects(&self) -> impl Iterator<Item = &SubjectId> {
        self.subjects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subjects: &[&str], credits: u32) -> ApprovedRecord {
        ApprovedRecord::new(subjects.iter().map(|s| SubjectId::new(s)).collect(), credits)
    }

    #[test]
    fn test_approved_rule() {
        let rule: PrerequisiteRule = PrerequisiteRule::Approved(SubjectId::new("ALG"));
        assert!(rule.is_satisfied_by(&record(&["ALG"], 3)));
        assert!(!rule.is_satisfied_by(&record(&["PHY"], 3)));
        assert!(!rule.is_satisfied_by(&ApprovedRecord::default()));
    }

    #[test]
    fn test_any_of_rule() {
        let rule: PrerequisiteRule =
            PrerequisiteRule::AnyOf(vec![SubjectId::new("ALG"), SubjectId::new("GEO")]);
        assert!(rule.is_satisfied_by(&record(&["GEO"], 3)));
        assert!(!rule.is_satisfied_by(&record(&["PHY"], 3)));
        assert!(!PrerequisiteRule::AnyOf(Vec::new()).is_satisfied_by(&record(&["GEO"], 3)));
    }

    #[test]
    fn test_minimum_credits_rule() {
        let rule: PrerequisiteRule = PrerequisiteRule::MinimumCredits(10);
        assert!(rule.is_satisfied_by(&record(&[], 10)));
        assert!(!rule.is_satisfied_by(&record(&["ALG"], 9)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PrerequisiteRule::Approved(SubjectId::new("alg")).to_string(),
            "ALG approved"
        );
        assert_eq!(
            PrerequisiteRule::MinimumCredits(12).to_string(),
            "at least 12 approved credits"
        );
    }
}
