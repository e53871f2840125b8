//! Elaboration engine collaborator
//!
//! The engine turns formal judgments into elaborated structures for a theory
//! and checks them. Its algorithms live outside this crate.

use catcolab_document::{DiagramJudgment, ModelJudgment, TheoryId};
use std::fmt::{self, Debug, Display, Formatter};
use uuid::Uuid;

/// Structural problem attributed to one judgment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationError {
    /// Judgment the problem concerns
    pub judgment_id: Uuid,
    /// Description
    pub message: String,
}

impl ValidationError {
    /// Create validation error
    #[must_use]
    pub fn new(judgment_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            judgment_id,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.judgment_id, self.message)
    }
}

/// Judgments could not be elaborated at all
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ElaborationError {
    /// Description
    pub message: String,
}

impl ElaborationError {
    /// Create elaboration error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Elaborates and validates notebook judgments
///
/// Calls are synchronous and bounded.
pub trait ElaborationEngine: Send + Sync + 'static {
    /// Elaborated model
    type Model: Clone + Debug + Send + Sync + 'static;
    /// Elaborated diagram
    type Diagram: Clone + Debug + Send + Sync + 'static;

    /// Check if the engine has a context for `theory`
    fn has_theory(&self, theory: &TheoryId) -> bool;

    /// Elaborate model judgments
    ///
    /// # Errors
    /// Returns error if the judgments do not form a model
    fn elaborate_model(
        &self,
        judgments: &[&ModelJudgment],
        theory: &TheoryId,
    ) -> Result<Self::Model, ElaborationError>;

    /// Structural check of an elaborated model
    fn validate_model(&self, model: &Self::Model) -> Vec<ValidationError>;

    /// Elaborate diagram judgments
    ///
    /// # Errors
    /// Returns error if the judgments do not form a diagram
    fn elaborate_diagram(
        &self,
        judgments: &[&DiagramJudgment],
        theory: &TheoryId,
    ) -> Result<Self::Diagram, ElaborationError>;

    /// Fill in what the diagram leaves blank from its validated model
    fn infer_missing_from(&self, diagram: &mut Self::Diagram, model: &Self::Model);

    /// Structural check of an elaborated diagram in its model
    fn validate_diagram_in(&self, diagram: &Self::Diagram, model: &Self::Model)
        -> Vec<ValidationError>;
}
