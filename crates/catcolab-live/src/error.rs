//! Error types for live documents
//!
//! - Handle and repo errors come from the CRDT runtime
//! - Change errors are raised by change functions and abort the change
//! - Migration errors abort attach before anything is written

use catcolab_document::{DocType, DocumentError, DocumentId, PatchError};

/// Errors raised inside a change function
///
/// Any error aborts the change; the document is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    /// Patch did not apply
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Typed view could not be read or written
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Migration inside the change failed
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Change function gave up
    #[error("change aborted: {0}")]
    Aborted(String),
}

/// Errors from a CRDT document handle
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// Document could not be loaded
    #[error("document {0} is unavailable")]
    Unavailable(DocumentId),

    /// Document was deleted
    #[error("document {0} was deleted")]
    Deleted(DocumentId),

    /// Change function failed
    #[error("change rejected: {0}")]
    Change(#[from] ChangeError),
}

/// Errors from a CRDT repo
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// No such document
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Storage or network failure
    #[error("repo unavailable for {document_id}: {message}")]
    Unavailable {
        document_id: DocumentId,
        message: String,
    },
}

/// Errors during schema migration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MigrationError {
    /// Document version is unknown or newer than the latest supported
    #[error("unsupported document version '{found}' (latest supported: {latest})")]
    UnsupportedVersion { found: String, latest: String },

    /// Migrator returned a document below the current version
    #[error("migration stopped at version '{actual}', expected '{expected}'")]
    IncompleteMigration { expected: String, actual: String },

    /// Document content does not have the shape a step expects
    #[error("malformed version {version} document: {message}")]
    Malformed { version: String, message: String },

    /// Steps do not form a contiguous chain
    #[error("invalid migration chain: {0}")]
    InvalidChain(String),

    /// Computed patch did not apply
    #[error("migration patch failed: {0}")]
    Apply(#[from] PatchError),
}

impl MigrationError {
    /// Create malformed-content error
    pub fn malformed(version: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            version: version.into(),
            message: message.into(),
        }
    }
}

/// Errors from [`LiveDoc`](crate::LiveDoc) operations
#[derive(Debug, thiserror::Error)]
pub enum LiveDocError {
    /// Handle readiness was rejected
    #[error("document {document_id} not ready: {source}")]
    NotReady {
        document_id: DocumentId,
        #[source]
        source: HandleError,
    },

    /// Handle is ready but holds no document
    #[error("document {0} has no content")]
    NoContent(DocumentId),

    /// Persisted type differs from the requested one
    #[error("expected a {expected} document, found {actual}")]
    TypeMismatch { expected: DocType, actual: DocType },

    /// Persisted content does not parse
    #[error("invalid document: {0}")]
    Document(DocumentError),

    /// Migration failed; nothing was written
    #[error("migration failed: {0}")]
    MigrationFailed(#[from] MigrationError),

    /// Document is not live or not writable
    #[error("document {0} is read-only")]
    ReadOnly(DocumentId),

    /// CRDT change failed
    #[error("change failed: {0}")]
    Change(#[from] HandleError),
}

impl From<DocumentError> for LiveDocError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::TypeMismatch { expected, actual } => {
                Self::TypeMismatch { expected, actual }
            }
            other => Self::Document(other),
        }
    }
}
