//! Judgments carried by formal notebook cells
//!
//! A model declares objects and morphisms typed by its theory; a diagram
//! declares objects and morphisms lying over those of its model.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Common accessors of formal judgments
pub trait Judgment {
    /// Identifier of the declaration (also the key errors are reported under)
    fn id(&self) -> Uuid;

    /// Human-readable label
    fn name(&self) -> &str;
}

/// Object type from the theory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObType(pub String);

impl ObType {
    /// Create object type
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Morphism type from the theory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MorType(pub String);

impl MorType {
    /// Create morphism type
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declaration in a model notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum ModelJudgment {
    /// Object declaration
    #[serde(rename_all = "camelCase")]
    Object {
        /// Declaration id
        id: Uuid,
        /// Label
        name: String,
        /// Type in the theory
        ob_type: ObType,
    },

    /// Morphism declaration; `dom`/`cod` may be left blank while editing
    #[serde(rename_all = "camelCase")]
    Morphism {
        /// Declaration id
        id: Uuid,
        /// Label
        name: String,
        /// Type in the theory
        mor_type: MorType,
        /// Domain object
        #[serde(default)]
        dom: Option<Uuid>,
        /// Codomain object
        #[serde(default)]
        cod: Option<Uuid>,
    },
}

impl ModelJudgment {
    /// Object declaration
    #[must_use]
    pub fn object(id: Uuid, name: impl Into<String>, ob_type: ObType) -> Self {
        Self::Object {
            id,
            name: name.into(),
            ob_type,
        }
    }

    /// Morphism declaration
    #[must_use]
    pub fn morphism(
        id: Uuid,
        name: impl Into<String>,
        mor_type: MorType,
        dom: Option<Uuid>,
        cod: Option<Uuid>,
    ) -> Self {
        Self::Morphism {
            id,
            name: name.into(),
            mor_type,
            dom,
            cod,
        }
    }
}

impl Judgment for ModelJudgment {
    fn id(&self) -> Uuid {
        match self {
            Self::Object { id, .. } | Self::Morphism { id, .. } => *id,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Object { name, .. } | Self::Morphism { name, .. } => name,
        }
    }
}

/// Declaration in a diagram notebook
///
/// `over` names the model object or morphism the declaration maps to. When
/// blank it may be inferred from the model during elaboration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum DiagramJudgment {
    /// Object lying over a model object
    #[serde(rename_all = "camelCase")]
    Object {
        /// Declaration id
        id: Uuid,
        /// Label
        name: String,
        /// Type in the theory
        ob_type: ObType,
        /// Model object
        #[serde(default)]
        over: Option<Uuid>,
    },

    /// Morphism lying over a model morphism
    #[serde(rename_all = "camelCase")]
    Morphism {
        /// Declaration id
        id: Uuid,
        /// Label
        name: String,
        /// Type in the theory
        mor_type: MorType,
        /// Model morphism
        #[serde(default)]
        over: Option<Uuid>,
        /// Domain diagram object
        #[serde(default)]
        dom: Option<Uuid>,
        /// Codomain diagram object
        #[serde(default)]
        cod: Option<Uuid>,
    },
}

impl DiagramJudgment {
    /// Diagram object declaration
    #[must_use]
    pub fn object(id: Uuid, name: impl Into<String>, ob_type: ObType, over: Option<Uuid>) -> Self {
        Self::Object {
            id,
            name: name.into(),
            ob_type,
            over,
        }
    }

    /// Model element this declaration lies over
    #[inline]
    #[must_use]
    pub fn over(&self) -> Option<Uuid> {
        match self {
            Self::Object { over, .. } | Self::Morphism { over, .. } => *over,
        }
    }
}

impl Judgment for DiagramJudgment {
    fn id(&self) -> Uuid {
        match self {
            Self::Object { id, .. } | Self::Morphism { id, .. } => *id,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Object { name, .. } | Self::Morphism { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_judgment_wire_shape() {
        let id = Uuid::new_v4();
        let judgment = ModelJudgment::object(id, "x", ObType::new("Object"));
        assert_eq!(
            serde_json::to_value(&judgment).unwrap(),
            json!({"tag": "object", "id": id, "name": "x", "obType": "Object"})
        );
    }

    #[test]
    fn morphism_endpoints_default_to_blank() {
        let id = Uuid::new_v4();
        let parsed: ModelJudgment = serde_json::from_value(json!({
            "tag": "morphism", "id": id, "name": "f", "morType": "Hom"
        }))
        .unwrap();
        assert_eq!(
            parsed,
            ModelJudgment::morphism(id, "f", MorType::new("Hom"), None, None)
        );
        assert_eq!(parsed.id(), id);
        assert_eq!(parsed.name(), "f");
    }

    #[test]
    fn diagram_judgment_over() {
        let over = Uuid::new_v4();
        let judgment = DiagramJudgment::object(Uuid::new_v4(), "a", ObType::new("Object"), Some(over));
        assert_eq!(judgment.over(), Some(over));
        let value = serde_json::to_value(&judgment).unwrap();
        assert_eq!(value["over"], json!(over));
    }
}
