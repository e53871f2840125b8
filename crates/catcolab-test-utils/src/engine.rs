//! Toy elaboration engine
//!
//! Elaborates judgments into id-indexed tables and checks that every
//! reference points at something of the right kind. Enough structure to
//! exercise validation without a real theory library.

use catcolab_document::{DiagramJudgment, Judgment, ModelJudgment, ObType, TheoryId};
use catcolab_validation::{ElaborationEngine, ElaborationError, ValidationError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Theory every [`ToyEngine`] knows
pub const TOY_THEORY: &str = "simple-olog";

/// Arrow between two (possibly missing) ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyArrow {
    /// Domain
    pub dom: Option<Uuid>,
    /// Codomain
    pub cod: Option<Uuid>,
}

/// Elaborated model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyModel {
    /// Objects by id
    pub objects: BTreeMap<Uuid, ObType>,
    /// Morphisms by id
    pub morphisms: BTreeMap<Uuid, ToyArrow>,
}

/// Elaborated diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyDiagram {
    /// Objects by id, with the model object they lie over
    pub objects: BTreeMap<Uuid, Option<Uuid>>,
    /// Morphisms by id, with the model morphism they lie over
    pub morphisms: BTreeMap<Uuid, (Option<Uuid>, ToyArrow)>,
}

/// Counting [`ElaborationEngine`]
#[derive(Debug)]
pub struct ToyEngine {
    theories: BTreeSet<TheoryId>,
    model_elaborations: AtomicU64,
    diagram_elaborations: AtomicU64,
}

impl Default for ToyEngine {
    fn default() -> Self {
        Self::with_theories([TOY_THEORY])
    }
}

impl ToyEngine {
    /// Engine knowing [`TOY_THEORY`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine knowing exactly `theories`
    pub fn with_theories<'a>(theories: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            theories: theories.into_iter().map(TheoryId::new).collect(),
            model_elaborations: AtomicU64::new(0),
            diagram_elaborations: AtomicU64::new(0),
        }
    }

    /// Number of model elaborations so far
    pub fn model_elaborations(&self) -> u64 {
        self.model_elaborations.load(Ordering::SeqCst)
    }

    /// Number of diagram elaborations so far
    pub fn diagram_elaborations(&self) -> u64 {
        self.diagram_elaborations.load(Ordering::SeqCst)
    }
}

fn claim(seen: &mut BTreeSet<Uuid>, judgment: &impl Judgment) -> Result<(), ElaborationError> {
    if seen.insert(judgment.id()) {
        Ok(())
    } else {
        Err(ElaborationError::new(format!(
            "duplicate declaration {}",
            judgment.id()
        )))
    }
}

fn check_end(
    errors: &mut Vec<ValidationError>,
    id: Uuid,
    end: Option<Uuid>,
    which: &str,
    exists: impl Fn(Uuid) -> bool,
) {
    match end {
        None => errors.push(ValidationError::new(id, format!("missing {which}"))),
        Some(target) if !exists(target) => {
            errors.push(ValidationError::new(id, format!("{which} is not an object")));
        }
        Some(_) => {}
    }
}

impl ElaborationEngine for ToyEngine {
    type Model = ToyModel;
    type Diagram = ToyDiagram;

    fn has_theory(&self, theory: &TheoryId) -> bool {
        self.theories.contains(theory)
    }

    fn elaborate_model(
        &self,
        judgments: &[&ModelJudgment],
        _theory: &TheoryId,
    ) -> Result<ToyModel, ElaborationError> {
        self.model_elaborations.fetch_add(1, Ordering::SeqCst);
        let mut seen = BTreeSet::new();
        let mut model = ToyModel {
            objects: BTreeMap::new(),
            morphisms: BTreeMap::new(),
        };
        for judgment in judgments {
            claim(&mut seen, *judgment)?;
            match judgment {
                ModelJudgment::Object { id, ob_type, .. } => {
                    model.objects.insert(*id, ob_type.clone());
                }
                ModelJudgment::Morphism { id, dom, cod, .. } => {
                    model.morphisms.insert(
                        *id,
                        ToyArrow {
                            dom: *dom,
                            cod: *cod,
                        },
                    );
                }
            }
        }
        Ok(model)
    }

    fn validate_model(&self, model: &ToyModel) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let exists = |id: Uuid| model.objects.contains_key(&id);
        for (id, arrow) in &model.morphisms {
            check_end(&mut errors, *id, arrow.dom, "domain", exists);
            check_end(&mut errors, *id, arrow.cod, "codomain", exists);
        }
        errors
    }

    fn elaborate_diagram(
        &self,
        judgments: &[&DiagramJudgment],
        _theory: &TheoryId,
    ) -> Result<ToyDiagram, ElaborationError> {
        self.diagram_elaborations.fetch_add(1, Ordering::SeqCst);
        let mut seen = BTreeSet::new();
        let mut diagram = ToyDiagram {
            objects: BTreeMap::new(),
            morphisms: BTreeMap::new(),
        };
        for judgment in judgments {
            claim(&mut seen, *judgment)?;
            match judgment {
                DiagramJudgment::Object { id, over, .. } => {
                    diagram.objects.insert(*id, *over);
                }
                DiagramJudgment::Morphism {
                    id, over, dom, cod, ..
                } => {
                    diagram.morphisms.insert(
                        *id,
                        (
                            *over,
                            ToyArrow {
                                dom: *dom,
                                cod: *cod,
                            },
                        ),
                    );
                }
            }
        }
        Ok(diagram)
    }

    fn infer_missing_from(&self, diagram: &mut ToyDiagram, model: &ToyModel) {
        let objects = diagram.objects.clone();
        let base = |end: Option<Uuid>| end.and_then(|id| objects.get(&id).copied().flatten());
        for (over, arrow) in diagram.morphisms.values_mut() {
            if over.is_some() {
                continue;
            }
            let (Some(dom), Some(cod)) = (base(arrow.dom), base(arrow.cod)) else {
                continue;
            };
            let mut candidates = model
                .morphisms
                .iter()
                .filter(|(_, m)| m.dom == Some(dom) && m.cod == Some(cod));
            if let (Some((id, _)), None) = (candidates.next(), candidates.next()) {
                *over = Some(*id);
            }
        }
    }

    fn validate_diagram_in(&self, diagram: &ToyDiagram, model: &ToyModel) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (id, over) in &diagram.objects {
            match over {
                None => errors.push(ValidationError::new(*id, "not mapped into the model")),
                Some(target) if !model.objects.contains_key(target) => {
                    errors.push(ValidationError::new(*id, "mapped to a missing model object"));
                }
                Some(_) => {}
            }
        }
        let exists = |id: Uuid| diagram.objects.contains_key(&id);
        for (id, (over, arrow)) in &diagram.morphisms {
            check_end(&mut errors, *id, arrow.dom, "domain", exists);
            check_end(&mut errors, *id, arrow.cod, "codomain", exists);
            match over {
                None => errors.push(ValidationError::new(*id, "not mapped into the model")),
                Some(target) if !model.morphisms.contains_key(target) => {
                    errors.push(ValidationError::new(*id, "mapped to a missing model morphism"));
                }
                Some(_) => {}
            }
        }
        errors
    }
}
