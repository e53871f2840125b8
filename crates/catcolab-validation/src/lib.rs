//! CatColab notebook validation
//!
//! Memoized, cascading elaboration and validation of model and diagram
//! notebooks, kept consistent while the underlying documents change.
//!
//! # Core Concepts
//!
//! - [`ElaborationEngine`]: Domain-theory engine collaborator
//! - [`Validated<T>`]: `Valid` | `Invalid` (errors keyed by judgment) | `Illformed`
//! - [`Verdict<T>`]: Shared verdict, `None` while unvalidated
//! - [`ModelValidationCache`] / [`DiagramValidationCache`]: Recompute only when
//!   the theory, the formal cells or the parent verdict change
//! - [`watch_model`] / [`watch_diagram`]: Reactive drivers over live documents
//! - [`AnalysisGate`]: Analysis results that exist only for a valid parent
//!
//! # Example
//!
//! ```rust,ignore
//! use catcolab_validation::{watch_diagram, watch_model};
//!
//! let model_verdict = watch_model(engine.clone(), &model);
//! let diagram_verdict = watch_diagram(engine, &diagram, &model, &model_verdict);
//! if let Some(verdict) = diagram_verdict.current() {
//!     for err in verdict.errors_for(judgment_id) { /* ... */ }
//! }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod analysis;
mod diagram;
mod engine;
mod model;
mod reactive;
mod verdict;

pub use analysis::AnalysisGate;
pub use diagram::{validate_diagram, DiagramValidationCache};
pub use engine::{ElaborationEngine, ElaborationError, ValidationError};
pub use model::{validate_model, ModelValidationCache};
pub use reactive::{watch_diagram, watch_model, VerdictWatch};
pub use verdict::{
    same_verdict, valid_parent, Validated, ValidatedDiagram, ValidatedModel, Verdict,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        valid_parent, watch_diagram, watch_model, AnalysisGate, ElaborationEngine, Validated, Verdict,
        VerdictWatch,
    };
}
