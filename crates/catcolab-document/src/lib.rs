//! CatColab document model
//!
//! Typed, JSON-shaped documents with structural patch support.
//!
//! # Core Concepts
//!
//! - [`DocumentKind`]: Typed view of a persisted document (model, diagram, analysis)
//! - [`Notebook<J>`]: Ordered cells; formal cells carry judgments
//! - [`StableRef`]: Reference to a document at its head or pinned to a version
//! - [`Patch`]: Structural difference between two document values
//! - [`Reconcile`]: Reuse of shared allocations across successive snapshots
//! - [`ContentHash`]: 32-byte Blake3 hash of a document's canonical encoding
//!
//! # Example
//!
//! ```rust,ignore
//! use catcolab_document::{diff, DocumentKind, ModelDocument};
//!
//! let model = ModelDocument::from_value(raw)?;
//! let patch = diff(&raw, &migrated);
//! patch.apply(&mut replica)?;
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod document;
mod hash;
mod judgment;
mod notebook;
mod patch;
mod path;
mod reconcile;
mod reference;

pub use document::{
    doc_type_of, version_of, AnalysisDocument, AnalysisType, DiagramDocument, DocType, Document,
    DocumentError, DocumentKind, Link, LinkType, ModelDocument, TheoryId, CURRENT_VERSION,
    INITIAL_VERSION,
};
pub use hash::{ContentHash, HashError};
pub use judgment::{DiagramJudgment, Judgment, ModelJudgment, MorType, ObType};
pub use notebook::{Cell, FormalCells, Notebook};
pub use patch::{diff, Patch, PatchError, PatchOp};
pub use path::{DocPath, PathError, PathSegment};
pub use reconcile::{reconcile_arc, reuse_arc, Reconcile};
pub use reference::{DocRef, DocumentId, PermissionLevel, Permissions, RefId, StableRef};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        diff, Cell, ContentHash, DocRef, DocType, Document, DocumentId, DocumentKind,
        DiagramDocument, Judgment, ModelDocument, Notebook, Patch, PatchOp, Reconcile, StableRef,
    };
}
