//! Backend RPC collaborator

use crate::rpc::RpcResult;
use async_trait::async_trait;
use catcolab_document::{DocumentId, Permissions, RefId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply of [`Backend::get_doc`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum RefDoc {
    /// Document receiving live edits
    Live {
        /// CRDT locator
        #[serde(rename = "docId")]
        doc_id: DocumentId,
        /// Granted permissions
        permissions: Permissions,
    },
    /// Document the caller may only read
    Readonly {
        /// CRDT locator
        #[serde(rename = "docId")]
        doc_id: DocumentId,
        /// Granted permissions
        permissions: Permissions,
    },
}

impl RefDoc {
    /// CRDT locator
    #[inline]
    #[must_use]
    pub fn doc_id(&self) -> &DocumentId {
        match self {
            Self::Live { doc_id, .. } | Self::Readonly { doc_id, .. } => doc_id,
        }
    }

    /// Granted permissions
    #[inline]
    #[must_use]
    pub fn permissions(&self) -> Permissions {
        match self {
            Self::Live { permissions, .. } | Self::Readonly { permissions, .. } => *permissions,
        }
    }

    /// Check if the document receives live edits
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }
}

/// Backend queries used to resolve references
///
/// Transport, retries and authentication belong to the implementation.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// CRDT locator of a document
    async fn doc_id(&self, ref_id: &RefId) -> RpcResult<DocumentId>;

    /// Locator and access of a document
    async fn get_doc(&self, ref_id: &RefId) -> RpcResult<RefDoc>;

    /// Current content of a document
    async fn head_snapshot(&self, ref_id: &RefId) -> RpcResult<Value>;

    /// Content of a document at a version
    async fn version_snapshot(&self, ref_id: &RefId, version: &str) -> RpcResult<Value>;
}
