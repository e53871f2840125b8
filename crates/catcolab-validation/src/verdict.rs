//! Validity verdicts
//!
//! A [`Verdict<T>`] is `None` while unvalidated, otherwise a shared
//! [`Validated<T>`]. Consumers compare verdicts by allocation.

use crate::engine::{ElaborationEngine, ValidationError};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of elaborating and checking judgments
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T> {
    /// Elaborated and passed every check
    Valid(T),

    /// Elaborated with errors; `errors` is never empty
    Invalid {
        /// Elaborated structure
        elaborated: T,
        /// Errors keyed by judgment
        errors: Vec<ValidationError>,
    },

    /// Could not be elaborated
    Illformed {
        /// Description
        message: String,
    },
}

impl<T> Validated<T> {
    /// Verdict of a structural check: `Valid` without errors, else `Invalid`
    #[must_use]
    pub fn checked(elaborated: T, errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            Self::Valid(elaborated)
        } else {
            Self::Invalid { elaborated, errors }
        }
    }

    /// Illformed verdict
    #[must_use]
    pub fn illformed(message: impl Into<String>) -> Self {
        Self::Illformed {
            message: message.into(),
        }
    }

    /// Check if verdict is valid
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Elaborated structure of a valid verdict
    #[inline]
    #[must_use]
    pub fn valid(&self) -> Option<&T> {
        match self {
            Self::Valid(elaborated) => Some(elaborated),
            Self::Invalid { .. } | Self::Illformed { .. } => None,
        }
    }

    /// Elaborated structure, valid or not
    #[must_use]
    pub fn elaborated(&self) -> Option<&T> {
        match self {
            Self::Valid(elaborated) | Self::Invalid { elaborated, .. } => Some(elaborated),
            Self::Illformed { .. } => None,
        }
    }

    /// All validation errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Invalid { errors, .. } => errors,
            Self::Valid(_) | Self::Illformed { .. } => &[],
        }
    }

    /// Errors concerning one judgment
    pub fn errors_for(&self, judgment_id: Uuid) -> impl Iterator<Item = &ValidationError> + '_ {
        self.errors()
            .iter()
            .filter(move |err| err.judgment_id == judgment_id)
    }
}

/// Shared verdict; `None` is unvalidated
pub type Verdict<T> = Option<Arc<Validated<T>>>;

/// Verdict over an engine's elaborated models
pub type ValidatedModel<E> = Validated<<E as ElaborationEngine>::Model>;

/// Verdict over an engine's elaborated diagrams
pub type ValidatedDiagram<E> = Validated<<E as ElaborationEngine>::Diagram>;

/// Elaborated parent, only when its verdict is valid
///
/// Dependents (diagrams, analyses) stay unvalidated otherwise.
#[must_use]
pub fn valid_parent<T>(verdict: &Verdict<T>) -> Option<&T> {
    verdict.as_deref().and_then(Validated::valid)
}

/// Check if two verdicts are the same allocation (or both unvalidated)
#[must_use]
pub fn same_verdict<T>(a: &Verdict<T>, b: &Verdict<T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
