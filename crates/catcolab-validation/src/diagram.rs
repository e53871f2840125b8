//! Diagram validation
//!
//! A diagram is validated against its model's elaborated structure, so its
//! verdict also depends on the model's verdict. While the model is not valid
//! the diagram stays unvalidated and is not elaborated.

use crate::engine::ElaborationEngine;
use crate::model::describe;
use crate::verdict::{same_verdict, valid_parent, Validated, Verdict};
use catcolab_document::{DiagramDocument, DiagramJudgment, FormalCells, Notebook, TheoryId};
use std::sync::Arc;

/// Elaborate and check formal diagram cells in their model
///
/// Returns `None` (unvalidated) when the model verdict is not valid or the
/// engine has no context for `theory`.
#[must_use]
pub fn validate_diagram<E: ElaborationEngine>(
    engine: &E,
    theory: &TheoryId,
    formal: &FormalCells<DiagramJudgment>,
    model: &Verdict<E::Model>,
) -> Option<Validated<E::Diagram>> {
    let model = valid_parent(model)?;
    if !engine.has_theory(theory) {
        return None;
    }
    let judgments: Vec<&DiagramJudgment> = formal.judgments().collect();
    let verdict = match engine.elaborate_diagram(&judgments, theory) {
        Ok(mut diagram) => {
            engine.infer_missing_from(&mut diagram, model);
            let errors = engine.validate_diagram_in(&diagram, model);
            Validated::checked(diagram, errors)
        }
        Err(err) => Validated::illformed(err.message),
    };
    Some(verdict)
}

struct DiagramKey<M> {
    theory: TheoryId,
    notebook: Arc<Notebook<DiagramJudgment>>,
    formal: FormalCells<DiagramJudgment>,
    model: Verdict<M>,
}

/// Memoized diagram verdict
pub struct DiagramValidationCache<E: ElaborationEngine> {
    engine: Arc<E>,
    key: Option<DiagramKey<E::Model>>,
    verdict: Verdict<E::Diagram>,
    recomputations: u64,
}

impl<E: ElaborationEngine> DiagramValidationCache<E> {
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

    /// Bring the verdict up to date
    ///
    /// `theory` is the theory of the model the diagram lives in. Returns
    /// whether the verdict was recomputed.
    pub fn update(
        &mut self,
        doc: &DiagramDocument,
        theory: &TheoryId,
        model: &Verdict<E::Model>,
    ) -> bool {
        if let Some(key) = &self.key {
            if key.theory == *theory
                && same_verdict(&key.model, model)
                && Arc::ptr_eq(&key.notebook, &doc.notebook)
            {
                return false;
            }
        }

        let formal = doc.notebook.formal_cells();
        if let Some(key) = &mut self.key {
            if key.theory == *theory
                && same_verdict(&key.model, model)
                && key.formal.same_as(&formal)
            {
                key.notebook = Arc::clone(&doc.notebook);
                return false;
            }
        }

        self.verdict =
            validate_diagram(self.engine.as_ref(), theory, &formal, model).map(Arc::new);
        self.recomputations += 1;
        tracing::debug!(
            "diagram '{}' revalidated ({} formal cells, model {}): {}",
            doc.name,
            formal.len(),
            describe(model),
            describe(&self.verdict)
        );
        self.key = Some(DiagramKey {
            theory: theory.clone(),
            notebook: Arc::clone(&doc.notebook),
            formal,
            model: model.clone(),
        });
        true
    }

    /// Current verdict
    #[inline]
    #[must_use]
    pub fn verdict(&self) -> Verdict<E::Diagram> {
        self.verdict.clone()
    }

    /// Number of recomputations so far
    #[inline]
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
