// crates/gatehouse-core/src/matchers/subject.rs
// ============================================================================
// Module: Gatehouse Subject Matcher
// Description: Typed `user:` / `group:` predicates and AND-clauses.
// Purpose: Evaluate rule subjects against a verified identity.
// Dependencies: smallvec, thiserror
// ============================================================================

//! ## Overview
//! Subject entries are parsed once at compile time into [`Subject`] values.
//! A [`SubjectClause`] is an AND of subjects; a rule holds an OR of clauses.
//! Anonymous callers never satisfy a clause that names anyone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use crate::core::request::Identity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix for user predicates.
pub const USER_PREFIX: &str = "user:";
/// Prefix for group predicates.
pub const GROUP_PREFIX: &str = "group:";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a subject entry cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectParseError {
    /// Entry lacks a `user:` or `group:` prefix.
    #[error("subject {0:?} must start with 'user:' or 'group:'")]
    UnknownPrefix(String),
    /// Entry has a prefix but no name.
    #[error("subject {0:?} has an empty name")]
    EmptyName(String),
}

// ============================================================================
// SECTION: Subjects
// ============================================================================

/// Kind of subject predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    /// Matches the username.
    User,
    /// Matches a group membership.
    Group,
}

/// One subject predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    /// Predicate kind.
    pub kind: SubjectKind,
    /// Username or group name.
    pub name: String,
}

impl Subject {
    /// Parses a `user:<name>` or `group:<name>` entry.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectParseError`] for unknown prefixes or empty names.
    pub fn parse(entry: &str) -> Result<Self, SubjectParseError> {
        let trimmed = entry.trim();
        let (kind, name) = if let Some(name) = trimmed.strip_prefix(USER_PREFIX) {
            (SubjectKind::User, name)
        } else if let Some(name) = trimmed.strip_prefix(GROUP_PREFIX) {
            (SubjectKind::Group, name)
        } else {
            return Err(SubjectParseError::UnknownPrefix(entry.to_string()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(SubjectParseError::EmptyName(entry.to_string()));
        }
        Ok(Self {
            kind,
            name: name.to_string(),
        })
    }

    /// Returns true when `identity` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, identity: &Identity) -> bool {
        match self.kind {
            SubjectKind::User => identity.username == self.name,
            SubjectKind::Group => identity.in_group(&self.name),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SubjectKind::User => write!(f, "{USER_PREFIX}{}", self.name),
            SubjectKind::Group => write!(f, "{GROUP_PREFIX}{}", self.name),
        }
    }
}

// ============================================================================
// SECTION: Clauses
// ============================================================================

/// AND-group of subject predicates.
///
/// # Invariants
/// - A clause that contained an unparseable entry never matches.
/// - The compiler does not keep such clauses; it degrades the whole rule to deny.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectClause {
    /// Predicates that must all hold.
    subjects: SmallVec<[Subject; 2]>,
    /// Set when a malformed entry was dropped from the clause.
    unsatisfiable: bool,
}

impl SubjectClause {
    /// Builds a clause from raw entries, collecting parse failures.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> (Self, Vec<SubjectParseError>) {
        let mut clause = Self::default();
        let mut errors = Vec::new();
        for entry in entries {
            match Subject::parse(entry.as_ref()) {
                Ok(subject) => clause.subjects.push(subject),
                Err(error) => {
                    clause.unsatisfiable = true;
                    errors.push(error);
                }
            }
        }
        (clause, errors)
    }

    /// Returns true when every predicate holds for the caller.
    ///
    /// An empty clause matches anyone, including anonymous callers.
    #[must_use]
    pub fn matches(&self, identity: Option<&Identity>) -> bool {
        if self.unsatisfiable {
            return false;
        }
        if self.subjects.is_empty() {
            return true;
        }
        identity.is_some_and(|identity| self.subjects.iter().all(|subject| subject.matches(identity)))
    }

    /// Predicates in the clause.
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Returns true when the clause can never match.
    #[must_use]
    pub const fn is_unsatisfiable(&self) -> bool {
        self.unsatisfiable
    }
}

impl fmt::Display for SubjectClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unsatisfiable {
            return f.write_str("<never>");
        }
        let mut first = true;
        for subject in &self.subjects {
            if !first {
                f.write_str(" & ")?;
            }
            first = false;
            write!(f, "{subject}")?;
        }
        Ok(())
    }
}

/// Returns true when any clause matches, or when there are no clauses.
#[must_use]
pub fn clauses_match(clauses: &[SubjectClause], identity: Option<&Identity>) -> bool {
    clauses.is_empty() || clauses.iter().any(|clause| clause.matches(identity))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::missing_docs_in_private_items,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    fn bob() -> Identity {
        Identity::new("bob", vec!["dev".to_string()])
    }

    #[test]
    fn prefixes_select_kind() {
        let user = Subject::parse("user:bob").unwrap();
        assert_eq!(user.kind, SubjectKind::User);
        assert_eq!(user.name, "bob");
        let group = Subject::parse(" group: admins ").unwrap();
        assert_eq!(group.kind, SubjectKind::Group);
        assert_eq!(group.name, "admins");
        assert_eq!(group.to_string(), "group:admins");
    }

    #[test]
    fn bad_entries_are_rejected() {
        assert!(matches!(Subject::parse("bob"), Err(SubjectParseError::UnknownPrefix(_))));
        assert!(matches!(Subject::parse("user:"), Err(SubjectParseError::EmptyName(_))));
    }

    #[test]
    fn clause_requires_every_predicate() {
        let (clause, errors) = SubjectClause::parse(&["user:bob", "group:dev"]);
        assert!(errors.is_empty());
        assert!(clause.matches(Some(&bob())));
        let (clause, _) = SubjectClause::parse(&["user:bob", "group:admins"]);
        assert!(!clause.matches(Some(&bob())));
    }

    #[test]
    fn anonymous_only_matches_empty_clause() {
        let (named, _) = SubjectClause::parse(&["user:bob"]);
        assert!(!named.matches(None));
        assert!(SubjectClause::default().matches(None));
        assert!(clauses_match(&[], None));
        assert!(!clauses_match(&[named], None));
    }

    #[test]
    fn malformed_entry_poisons_its_clause_only() {
        let (broken, errors) = SubjectClause::parse(&["admins"]);
        assert_eq!(errors.len(), 1);
        assert!(broken.is_unsatisfiable());
        assert!(!broken.matches(Some(&bob())));
        let (ok, _) = SubjectClause::parse(&["group:dev"]);
        assert!(clauses_match(&[broken, ok], Some(&bob())));
    }
}
