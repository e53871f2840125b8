//! Typed documents
//!
//! # Core Concepts
//!
//! - [`DocumentKind`]: typed view of a persisted document; names the expected
//!   `type` field and parses after checking it
//! - [`ModelDocument`], [`DiagramDocument`], [`AnalysisDocument`]: the three
//!   document types
//! - [`Document`]: any of the three, dispatched on `type`

use crate::judgment::{DiagramJudgment, ModelJudgment};
use crate::notebook::Notebook;
use crate::reconcile::{reconcile_arc, Reconcile};
use crate::reference::{RefId, StableRef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Schema version every document is migrated to
pub const CURRENT_VERSION: &str = "1";

/// Version of documents persisted without a `version` key
pub const INITIAL_VERSION: &str = "0";

/// Document type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// Model of a theory
    Model,
    /// Diagram in a model
    Diagram,
    /// Analysis of a model or diagram
    Analysis,
}

impl DocType {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Diagram => "diagram",
            Self::Analysis => "analysis",
        }
    }
}

impl Display for DocType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the `type` field of a raw document
///
/// # Errors
/// Returns error if the field is missing or names no known type
pub fn doc_type_of(value: &Value) -> Result<DocType, DocumentError> {
    match value.get("type").and_then(Value::as_str) {
        Some("model") => Ok(DocType::Model),
        Some("diagram") => Ok(DocType::Diagram),
        Some("analysis") => Ok(DocType::Analysis),
        Some(other) => Err(DocumentError::UnknownType(other.to_string())),
        None => Err(DocumentError::MissingType),
    }
}

/// Read the schema version of a raw document, [`INITIAL_VERSION`] if absent
#[must_use]
pub fn version_of(value: &Value) -> &str {
    value
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or(INITIAL_VERSION)
}

fn initial_version() -> String {
    INITIAL_VERSION.to_string()
}

/// Theory identifier, e.g. `simple-olog`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TheoryId(String);

impl TheoryId {
    /// Create theory id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TheoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relation a link expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    /// Diagram → model
    DiagramIn,
    /// Analysis → model or diagram
    AnalysisOf,
}

/// Link from one document to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Target document
    #[serde(rename = "_id")]
    pub ref_id: RefId,
    /// Pinned version, `None` for head
    #[serde(rename = "_version", default)]
    pub version: Option<String>,
    /// Server hosting the target
    #[serde(rename = "_server")]
    pub server: String,
    /// Relation
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

impl Link {
    /// Reference for resolving the link target
    #[must_use]
    pub fn to_stable_ref(&self) -> StableRef {
        StableRef {
            ref_id: self.ref_id.clone(),
            version: self.version.clone(),
            server: Some(self.server.clone()),
        }
    }
}

/// Typed view of a persisted document
pub trait DocumentKind:
    Serialize + DeserializeOwned + Reconcile + Clone + PartialEq + Debug + Send + Sync + 'static
{
    /// Expected `type` field, `None` when any type is accepted
    const DOC_TYPE: Option<DocType>;

    /// Actual type of this document
    fn doc_type(&self) -> DocType;

    /// Document name
    fn name(&self) -> &str;

    /// Schema version
    fn version(&self) -> &str;

    /// Check the `type` field of a raw document against [`Self::DOC_TYPE`]
    ///
    /// # Errors
    /// Returns [`DocumentError::TypeMismatch`] when the types disagree
    fn check_type(value: &Value) -> Result<DocType, DocumentError> {
        let actual = doc_type_of(value)?;
        match Self::DOC_TYPE {
            Some(expected) if expected != actual => {
                Err(DocumentError::TypeMismatch { expected, actual })
            }
            _ => Ok(actual),
        }
    }

    /// Parse from a raw document after checking its type
    ///
    /// # Errors
    /// Returns error on type mismatch or malformed content
    fn from_value(value: Value) -> Result<Self, DocumentError> {
        Self::check_type(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as a raw document
    ///
    /// # Errors
    /// Returns error if serialization fails
    fn to_value(&self) -> Result<Value, DocumentError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Model of a theory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDocument {
    /// Always [`DocType::Model`]
    #[serde(rename = "type")]
    pub doc_type: DocType,
    /// Name
    pub name: String,
    /// Theory the model is in
    pub theory: TheoryId,
    /// Cells
    pub notebook: Arc<Notebook<ModelJudgment>>,
    /// Schema version
    #[serde(default = "initial_version")]
    pub version: String,
}

impl ModelDocument {
    /// Create empty model at the current version
    #[must_use]
    pub fn new(name: impl Into<String>, theory: TheoryId) -> Self {
        Self {
            doc_type: DocType::Model,
            name: name.into(),
            theory,
            notebook: Arc::default(),
            version: CURRENT_VERSION.to_string(),
        }
    }
}

impl Reconcile for ModelDocument {
    fn reconcile(prev: &Self, mut next: Self) -> Self {
        next.notebook = reconcile_arc(&prev.notebook, next.notebook);
        next
    }
}

impl DocumentKind for ModelDocument {
    const DOC_TYPE: Option<DocType> = Some(DocType::Model);

    fn doc_type(&self) -> DocType {
        DocType::Model
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Diagram in a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    /// Always [`DocType::Diagram`]
    #[serde(rename = "type")]
    pub doc_type: DocType,
    /// Name
    pub name: String,
    /// Model the diagram lives in
    pub diagram_in: Link,
    /// Cells
    pub notebook: Arc<Notebook<DiagramJudgment>>,
    /// Schema version
    #[serde(default = "initial_version")]
    pub version: String,
}

impl DiagramDocument {
    /// Create empty diagram at the current version
    #[must_use]
    pub fn new(name: impl Into<String>, model: RefId, server: impl Into<String>) -> Self {
        Self {
            doc_type: DocType::Diagram,
            name: name.into(),
            diagram_in: Link {
                ref_id: model,
                version: None,
                server: server.into(),
                link_type: LinkType::DiagramIn,
            },
            notebook: Arc::default(),
            version: CURRENT_VERSION.to_string(),
        }
    }
}

impl Reconcile for DiagramDocument {
    fn reconcile(prev: &Self, mut next: Self) -> Self {
        next.notebook = reconcile_arc(&prev.notebook, next.notebook);
        next
    }
}

impl DocumentKind for DiagramDocument {
    const DOC_TYPE: Option<DocType> = Some(DocType::Diagram);

    fn doc_type(&self) -> DocType {
        DocType::Diagram
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// What an analysis is of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Analysis of a model
    Model,
    /// Analysis of a diagram
    Diagram,
}

/// Analysis of a model or diagram
///
/// Analysis cells carry opaque content interpreted by the analysis widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDocument {
    /// Always [`DocType::Analysis`]
    #[serde(rename = "type")]
    pub doc_type: DocType,
    /// Name
    pub name: String,
    /// Kind of the analysed document
    pub analysis_type: AnalysisType,
    /// Analysed document
    pub analysis_of: Link,
    /// Cells
    pub notebook: Arc<Notebook<Value>>,
    /// Schema version
    #[serde(default = "initial_version")]
    pub version: String,
}

impl Reconcile for AnalysisDocument {
    fn reconcile(prev: &Self, mut next: Self) -> Self {
        next.notebook = reconcile_arc(&prev.notebook, next.notebook);
        next
    }
}

impl DocumentKind for AnalysisDocument {
    const DOC_TYPE: Option<DocType> = Some(DocType::Analysis);

    fn doc_type(&self) -> DocType {
        DocType::Analysis
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Document of any type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    /// Model
    Model(ModelDocument),
    /// Diagram
    Diagram(DiagramDocument),
    /// Analysis
    Analysis(AnalysisDocument),
}

impl Document {
    /// Number of cells in display order
    #[must_use]
    pub fn cell_count(&self) -> usize {
        match self {
            Self::Model(doc) => doc.notebook.len(),
            Self::Diagram(doc) => doc.notebook.len(),
            Self::Analysis(doc) => doc.notebook.len(),
        }
    }

    /// Number of formal cells
    #[must_use]
    pub fn formal_cell_count(&self) -> usize {
        match self {
            Self::Model(doc) => doc.notebook.formal_cells().len(),
            Self::Diagram(doc) => doc.notebook.formal_cells().len(),
            Self::Analysis(doc) => doc.notebook.formal_cells().len(),
        }
    }

    fn parse(value: Value) -> Result<Self, DocumentError> {
        Ok(match doc_type_of(&value)? {
            DocType::Model => Self::Model(serde_json::from_value(value)?),
            DocType::Diagram => Self::Diagram(serde_json::from_value(value)?),
            DocType::Analysis => Self::Analysis(serde_json::from_value(value)?),
        })
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::parse(value).map_err(serde::de::Error::custom)
    }
}

impl Reconcile for Document {
    fn reconcile(prev: &Self, next: Self) -> Self {
        match (prev, next) {
            (Self::Model(prev), Self::Model(next)) => Self::Model(Reconcile::reconcile(prev, next)),
            (Self::Diagram(prev), Self::Diagram(next)) => {
                Self::Diagram(Reconcile::reconcile(prev, next))
            }
            (Self::Analysis(prev), Self::Analysis(next)) => {
                Self::Analysis(Reconcile::reconcile(prev, next))
            }
            (_, next) => next,
        }
    }
}

impl DocumentKind for Document {
    const DOC_TYPE: Option<DocType> = None;

    fn doc_type(&self) -> DocType {
        match self {
            Self::Model(_) => DocType::Model,
            Self::Diagram(_) => DocType::Diagram,
            Self::Analysis(_) => DocType::Analysis,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Model(doc) => &doc.name,
            Self::Diagram(doc) => &doc.name,
            Self::Analysis(doc) => &doc.name,
        }
    }

    fn version(&self) -> &str {
        match self {
            Self::Model(doc) => &doc.version,
            Self::Diagram(doc) => &doc.version,
            Self::Analysis(doc) => &doc.version,
        }
    }

    fn from_value(value: Value) -> Result<Self, DocumentError> {
        Self::parse(value)
    }
}

/// Errors for typed document access
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Content does not match the typed shape
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// No `type` field
    #[error("document has no type field")]
    MissingType,

    /// `type` names no known document type
    #[error("unknown document type: {0}")]
    UnknownType(String),

    /// `type` differs from the expected one
    #[error("expected a {expected} document, found {actual}")]
    TypeMismatch { expected: DocType, actual: DocType },
}
