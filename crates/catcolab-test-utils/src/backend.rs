//! Scripted backend
//!
//! Serves head snapshots straight from registered [`MemoryHandle`]s and
//! pinned snapshots from a version table. References can be hidden (404) or
//! forbidden (403), and every query is counted.

use crate::repo::{MemoryHandle, MemoryRepo};
use async_trait::async_trait;
use catcolab_backend::{Backend, RefDoc, RpcResult};
use catcolab_document::{DocumentId, PermissionLevel, Permissions, RefId};
use catcolab_live::DocHandle;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Entry {
    handle: Arc<MemoryHandle>,
    permissions: Permissions,
    live: bool,
}

/// Counted backend queries
#[derive(Debug, Default)]
pub struct CallCounts {
    /// `doc_id` calls
    pub doc_id: AtomicU64,
    /// `get_doc` calls
    pub get_doc: AtomicU64,
    /// `head_snapshot` calls
    pub head_snapshot: AtomicU64,
    /// `version_snapshot` calls
    pub version_snapshot: AtomicU64,
}

impl CallCounts {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory [`Backend`]
#[derive(Default)]
pub struct FakeBackend {
    refs: DashMap<RefId, Entry>,
    versions: DashMap<(RefId, String), Value>,
    forbidden: DashSet<RefId>,
    /// Query counters
    pub calls: CallCounts,
}

impl FakeBackend {
    /// Create empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live document the caller owns
    pub fn register(&self, ref_id: &str, handle: Arc<MemoryHandle>) {
        let permissions = Permissions {
            anyone: None,
            user: Some(PermissionLevel::Own),
        };
        self.register_with(ref_id, handle, permissions, true);
    }

    /// Register a document the caller may only read
    pub fn register_readonly(&self, ref_id: &str, handle: Arc<MemoryHandle>) {
        let permissions = Permissions {
            anyone: Some(PermissionLevel::Read),
            user: None,
        };
        self.register_with(ref_id, handle, permissions, false);
    }

    /// Register a document with explicit access
    pub fn register_with(
        &self,
        ref_id: &str,
        handle: Arc<MemoryHandle>,
        permissions: Permissions,
        live: bool,
    ) {
        self.refs.insert(
            RefId::new(ref_id),
            Entry {
                handle,
                permissions,
                live,
            },
        );
    }

    /// Create a document in `repo` and register it live under `ref_id`
    pub fn publish(&self, repo: &MemoryRepo, ref_id: &str, value: Value) -> Arc<MemoryHandle> {
        let handle = repo.create(&format!("automerge:{ref_id}"), value);
        self.register(ref_id, Arc::clone(&handle));
        handle
    }

    /// Record the content of `ref_id` at `version`
    pub fn pin(&self, ref_id: &str, version: &str, value: Value) {
        self.versions
            .insert((RefId::new(ref_id), version.to_string()), value);
    }

    /// Answer every query about `ref_id` with 403
    pub fn forbid(&self, ref_id: &str) {
        self.forbidden.insert(RefId::new(ref_id));
    }

    fn lookup<T>(&self, ref_id: &RefId, f: impl FnOnce(&Entry) -> T) -> RpcResult<T> {
        if self.forbidden.contains(ref_id) {
            return RpcResult::err(403, format!("access to {ref_id} denied"));
        }
        match self.refs.get(ref_id) {
            Some(entry) => RpcResult::ok(f(entry.value())),
            None => RpcResult::err(404, format!("document {ref_id} not found")),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn doc_id(&self, ref_id: &RefId) -> RpcResult<DocumentId> {
        CallCounts::bump(&self.calls.doc_id);
        self.lookup(ref_id, |entry| entry.handle.document_id().clone())
    }

    async fn get_doc(&self, ref_id: &RefId) -> RpcResult<RefDoc> {
        CallCounts::bump(&self.calls.get_doc);
        self.lookup(ref_id, |entry| {
            let doc_id = entry.handle.document_id().clone();
            if entry.live {
                RefDoc::Live {
                    doc_id,
                    permissions: entry.permissions,
                }
            } else {
                RefDoc::Readonly {
                    doc_id,
                    permissions: entry.permissions,
                }
            }
        })
    }

    async fn head_snapshot(&self, ref_id: &RefId) -> RpcResult<Value> {
        CallCounts::bump(&self.calls.head_snapshot);
        self.lookup(ref_id, |entry| entry.handle.value())
    }

    async fn version_snapshot(&self, ref_id: &RefId, version: &str) -> RpcResult<Value> {
        CallCounts::bump(&self.calls.version_snapshot);
        if self.forbidden.contains(ref_id) {
            return RpcResult::err(403, format!("access to {ref_id} denied"));
        }
        match self.versions.get(&(ref_id.clone(), version.to_string())) {
            Some(value) => RpcResult::ok(value.clone()),
            None => RpcResult::err(404, format!("version {version} of {ref_id} not found")),
        }
    }
}
