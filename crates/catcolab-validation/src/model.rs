//! Model validation
//!
//! [`ModelValidationCache`] recomputes only when the theory or the formal
//! cells change; renames and prose edits keep the previous verdict.

use crate::engine::ElaborationEngine;
use crate::verdict::{Validated, Verdict};
use catcolab_document::{FormalCells, ModelDocument, ModelJudgment, Notebook, TheoryId};
use std::sync::Arc;

/// Elaborate and check formal model cells
///
/// Returns `None` (unvalidated) when the engine has no context for `theory`.
#[must_use]
pub fn validate_model<E: ElaborationEngine>(
    engine: &E,
    theory: &TheoryId,
    formal: &FormalCells<ModelJudgment>,
) -> Option<Validated<E::Model>> {
    if !engine.has_theory(theory) {
        return None;
    }
    let judgments: Vec<&ModelJudgment> = formal.judgments().collect();
    let verdict = match engine.elaborate_model(&judgments, theory) {
        Ok(model) => {
            let errors = engine.validate_model(&model);
            Validated::checked(model, errors)
        }
        Err(err) => Validated::illformed(err.message),
    };
    Some(verdict)
}

struct ModelKey {
    theory: TheoryId,
    notebook: Arc<Notebook<ModelJudgment>>,
    formal: FormalCells<ModelJudgment>,
}

/// Memoized model verdict
pub struct ModelValidationCache<E: ElaborationEngine> {
    engine: Arc<E>,
    key: Option<ModelKey>,
    verdict: Verdict<E::Model>,
    recomputations: u64,
}

impl<E: ElaborationEngine> ModelValidationCache<E> {
    /// Create empty cache (unvalidated)
    #[must_use]
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            key: None,
            verdict: None,
            recomputations: 0,
        }
    }

    /// Bring the verdict up to date with `doc`
    ///
    /// Returns whether the verdict was recomputed.
    pub fn update(&mut self, doc: &ModelDocument) -> bool {
        if let Some(key) = &self.key {
            if key.theory == doc.theory && Arc::ptr_eq(&key.notebook, &doc.notebook) {
                return false;
            }
        }

        let formal = doc.notebook.formal_cells();
        if let Some(key) = &mut self.key {
            if key.theory == doc.theory && key.formal.same_as(&formal) {
                key.notebook = Arc::clone(&doc.notebook);
                return false;
            }
        }

        self.verdict = validate_model(self.engine.as_ref(), &doc.theory, &formal).map(Arc::new);
        self.recomputations += 1;
        tracing::debug!(
            "model '{}' revalidated ({} formal cells): {}",
            doc.name,
            formal.len(),
            describe(&self.verdict)
        );
        self.key = Some(ModelKey {
            theory: doc.theory.clone(),
            notebook: Arc::clone(&doc.notebook),
            formal,
        });
        true
    }

    /// Current verdict
    #[inline]
    #[must_use]
    pub fn verdict(&self) -> Verdict<E::Model> {
        self.verdict.clone()
    }

    /// Number of recomputations so far
    #[inline]
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

pub(crate) fn describe<T>(verdict: &Verdict<T>) -> &'static str {
    match verdict.as_deref() {
        None => "unvalidated",
        Some(Validated::Valid(_)) => "valid",
        Some(Validated::Invalid { .. }) => "invalid",
        Some(Validated::Illformed { .. }) => "illformed",
    }
}
