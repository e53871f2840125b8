//! Error types for reference resolution

use crate::rpc::RpcError;
use catcolab_document::{DocumentError, RefId, StableRef};
use catcolab_live::{LiveDocError, MigrationError, RepoError};

/// Errors while resolving a reference
///
/// Raised to the caller; nothing at this layer retries.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Backend has no such document (404)
    #[error("document not found: {0}")]
    NotFound(RefId),

    /// Caller may not access the document (403)
    #[error("access to document {0} is forbidden")]
    Forbidden(RefId),

    /// Live resolution of a reference pinned to a version
    #[error("reference {0} is pinned to a version; read it as a snapshot")]
    PinnedVersion(StableRef),

    /// Reference names a server other than the configured one
    #[error("unknown server '{server}' (configured: {configured})")]
    UnknownServer {
        /// Server named by the reference
        server: String,
        /// Server this resolver talks to
        configured: String,
    },

    /// Other backend failure
    #[error("backend error: {0}")]
    Rpc(#[from] RpcError),

    /// CRDT repo failure
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Attaching the live document failed
    #[error(transparent)]
    LiveDoc(#[from] LiveDocError),

    /// Snapshot migration failed
    #[error("snapshot migration failed: {0}")]
    Migration(#[from] MigrationError),

    /// Snapshot content does not parse
    #[error("invalid snapshot: {0}")]
    Document(#[from] DocumentError),
}

impl ResolveError {
    /// Classify a backend failure for `ref_id`
    #[must_use]
    pub fn from_rpc(ref_id: &RefId, err: RpcError) -> Self {
        match err.code {
            404 => Self::NotFound(ref_id.clone()),
            403 => Self::Forbidden(ref_id.clone()),
            _ => Self::Rpc(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_codes_are_classified() {
        let ref_id = RefId::new("r");
        assert!(matches!(
            ResolveError::from_rpc(&ref_id, RpcError::new(404, "nope")),
            ResolveError::NotFound(_)
        ));
        assert!(matches!(
            ResolveError::from_rpc(&ref_id, RpcError::new(403, "no")),
            ResolveError::Forbidden(_)
        ));
        let other = ResolveError::from_rpc(&ref_id, RpcError::new(500, "boom"));
        assert_eq!(other.to_string(), "backend error: boom");
    }
}
