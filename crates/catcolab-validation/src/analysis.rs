//! Analysis gating
//!
//! Analyses run on a validated parent (model or diagram). [`AnalysisGate`]
//! holds an analysis result that exists only while the parent verdict is
//! valid, and reruns the analysis only when that verdict changes.

use crate::verdict::{same_verdict, valid_parent, Verdict};
use std::sync::Arc;

/// Memoized analysis of a parent verdict
pub struct AnalysisGate<P, R> {
    parent: Option<Verdict<P>>,
    result: Option<Arc<R>>,
    recomputations: u64,
}

impl<P, R> AnalysisGate<P, R> {
    /// Create gate with no result
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            result: None,
            recomputations: 0,
        }
    }

    /// Bring the result up to date with the parent verdict
    ///
    /// `analyze` runs only when the parent verdict is a new allocation and
    /// valid; any other parent clears the result. Returns whether the gate
    /// was re-evaluated.
    pub fn update(&mut self, parent: &Verdict<P>, analyze: impl FnOnce(&P) -> R) -> bool {
        if self
            .parent
            .as_ref()
            .is_some_and(|seen| same_verdict(seen, parent))
        {
            return false;
        }

        self.result = valid_parent(parent).map(|elaborated| Arc::new(analyze(elaborated)));
        self.parent = Some(parent.clone());
        self.recomputations += 1;
        tracing::debug!(
            "analysis re-evaluated: {}",
            if self.result.is_some() { "ran" } else { "parent not valid" }
        );
        true
    }

    /// Current result, `None` unless the parent is valid
    #[inline]
    #[must_use]
    pub fn result(&self) -> Option<Arc<R>> {
        self.result.clone()
    }

    /// Number of re-evaluations so far
    #[inline]
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

impl<P, R> Default for AnalysisGate<P, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ValidationError;
    use crate::verdict::Validated;
    use uuid::Uuid;

    #[test]
    fn runs_only_on_new_valid_parent() {
        let mut gate: AnalysisGate<u8, u8> = AnalysisGate::new();
        let valid: Verdict<u8> = Some(Arc::new(Validated::Valid(3)));
        let mut runs = 0;

        assert!(gate.update(&valid, |n| {
            runs += 1;
            n * 2
        }));
        assert_eq!(gate.result().as_deref(), Some(&6));
        assert!(!gate.update(&valid.clone(), |_| unreachable!()));
        assert_eq!(runs, 1);

        let invalid: Verdict<u8> = Some(Arc::new(Validated::checked(
            3,
            vec![ValidationError::new(Uuid::new_v4(), "bad")],
        )));
        assert!(gate.update(&invalid, |_| unreachable!()));
        assert!(gate.result().is_none());

        assert!(gate.update(&None, |_| unreachable!()));
        assert!(gate.result().is_none());
        assert!(!gate.update(&None, |_| unreachable!()));
        assert_eq!(gate.recomputations(), 3);
    }
}
