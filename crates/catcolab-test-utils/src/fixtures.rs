//! Document fixtures

use crate::engine::TOY_THEORY;
use catcolab_backend::DEFAULT_SERVER;
use catcolab_document::{
    Cell, DiagramDocument, DiagramJudgment, Judgment, ModelDocument, ModelJudgment, MorType,
    Notebook, ObType, RefId, TheoryId,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Model object with a fresh id
pub fn ob(name: &str) -> ModelJudgment {
    ModelJudgment::object(Uuid::new_v4(), name, ObType::new("Entity"))
}

/// Model morphism with a fresh id
pub fn mor(name: &str, dom: Option<Uuid>, cod: Option<Uuid>) -> ModelJudgment {
    ModelJudgment::morphism(Uuid::new_v4(), name, MorType::new("Attr"), dom, cod)
}

/// Diagram object with a fresh id
pub fn diagram_ob(name: &str, over: Option<Uuid>) -> DiagramJudgment {
    DiagramJudgment::object(Uuid::new_v4(), name, ObType::new("Entity"), over)
}

/// Diagram morphism with a fresh id
pub fn diagram_mor(
    name: &str,
    over: Option<Uuid>,
    dom: Option<Uuid>,
    cod: Option<Uuid>,
) -> DiagramJudgment {
    DiagramJudgment::Morphism {
        id: Uuid::new_v4(),
        name: name.to_string(),
        mor_type: MorType::new("Attr"),
        over,
        dom,
        cod,
    }
}

/// Formal cell sharing the judgment's id
pub fn formal<J: Judgment>(judgment: J) -> Cell<J> {
    Cell::Formal {
        id: judgment.id(),
        content: judgment,
    }
}

/// Prose cell with a fresh id
pub fn prose<J>(text: &str) -> Cell<J> {
    Cell::RichText {
        id: Uuid::new_v4(),
        content: text.to_string(),
    }
}

/// Current-version model in the toy theory
pub fn model_doc(name: &str, judgments: impl IntoIterator<Item = ModelJudgment>) -> ModelDocument {
    let mut doc = ModelDocument::new(name, TheoryId::new(TOY_THEORY));
    doc.notebook = Arc::new(notebook(judgments));
    doc
}

/// Current-version diagram in the model behind `model_ref`
pub fn diagram_doc(
    name: &str,
    model_ref: &str,
    judgments: impl IntoIterator<Item = DiagramJudgment>,
) -> DiagramDocument {
    let mut doc = DiagramDocument::new(name, RefId::new(model_ref), DEFAULT_SERVER);
    doc.notebook = Arc::new(notebook(judgments));
    doc
}

fn notebook<J: Judgment>(judgments: impl IntoIterator<Item = J>) -> Notebook<J> {
    let mut notebook = Notebook::new();
    for judgment in judgments {
        notebook.push(formal(judgment));
    }
    notebook
}

/// JSON form of a document
pub fn to_value<T: Serialize>(doc: &T) -> Value {
    serde_json::to_value(doc).expect("fixture serializes")
}

/// Version "0" model storing its cells as a bare list
pub fn legacy_model(name: &str, cells: &[Cell<ModelJudgment>]) -> Value {
    json!({
        "type": "model",
        "name": name,
        "theory": TOY_THEORY,
        "notebook": cells,
        "version": "0",
    })
}
