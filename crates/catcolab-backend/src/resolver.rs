//! Reference resolution
//!
//! Turns [`StableRef`]s into live documents or detached snapshots.
//!
//! - Head references resolve live: the backend names the CRDT document, the
//!   repo finds its handle and it is attached with backend metadata.
//! - Pinned references resolve to snapshots only, cached per
//!   `(ref, version)` so a pinned reference always yields the same content.

use crate::backend::Backend;
use crate::config::SyncConfig;
use crate::error::ResolveError;
use crate::rpc::{RpcError, RpcResult};
use catcolab_document::{DocRef, DocumentId, DocumentKind, RefId, StableRef};
use catcolab_live::{migrate_snapshot, LiveDoc, MigrationChain, Migrator, Repo};
use moka::future::Cache;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Resolves references against one backend and CRDT repo
#[derive(Clone)]
pub struct Resolver {
    backend: Arc<dyn Backend>,
    repo: Arc<dyn Repo>,
    migrator: Arc<dyn Migrator>,
    config: SyncConfig,
    pinned: Cache<(RefId, String), Arc<Value>>,
}

impl Resolver {
    /// Create resolver using the canonical migration chain
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, repo: Arc<dyn Repo>, config: SyncConfig) -> Self {
        let mut pinned = Cache::builder().max_capacity(config.pinned_snapshot_capacity);
        if let Some(ttl) = config.pinned_snapshot_ttl() {
            pinned = pinned.time_to_live(ttl);
        }
        Self {
            backend,
            repo,
            migrator: Arc::new(MigrationChain::canonical()),
            config,
            pinned: pinned.build(),
        }
    }

    /// With a different migrator
    #[must_use]
    pub fn with_migrator(mut self, migrator: Arc<dyn Migrator>) -> Self {
        self.migrator = migrator;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Migrator applied on attach and to snapshots
    #[inline]
    #[must_use]
    pub fn migrator(&self) -> &dyn Migrator {
        self.migrator.as_ref()
    }

    fn check_server(&self, stable_ref: &StableRef) -> Result<(), ResolveError> {
        match &stable_ref.server {
            Some(server) if *server != self.config.server => Err(ResolveError::UnknownServer {
                server: server.clone(),
                configured: self.config.server.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// CRDT locator of the referenced document
    ///
    /// # Errors
    /// Returns error for foreign servers or backend failures
    pub async fn locate(&self, stable_ref: &StableRef) -> Result<DocumentId, ResolveError> {
        self.check_server(stable_ref)?;
        let reply = self.backend.doc_id(&stable_ref.ref_id).await;
        content(&stable_ref.ref_id, reply)
    }

    /// Live document behind a head reference
    ///
    /// Each call creates a new [`LiveDoc`]; go through a
    /// [`DocumentLibrary`](crate::DocumentLibrary) to share instances.
    ///
    /// # Errors
    /// - `PinnedVersion` if the reference is pinned
    /// - `NotFound` / `Forbidden` / `Rpc` from the backend
    /// - `Repo` / `LiveDoc` if finding or attaching the handle fails
    pub async fn resolve_live<T: DocumentKind>(
        &self,
        stable_ref: &StableRef,
    ) -> Result<LiveDoc<T>, ResolveError> {
        self.check_server(stable_ref)?;
        if !stable_ref.is_head() {
            return Err(ResolveError::PinnedVersion(stable_ref.clone()));
        }

        let ref_id = &stable_ref.ref_id;
        let reply = content(ref_id, self.backend.get_doc(ref_id).await)?;

        let handle = self.repo.find(reply.doc_id()).await?;
        let doc_ref = DocRef::new(ref_id.clone(), reply.permissions(), reply.is_live());
        let live = LiveDoc::attach_with_ref(handle, self.migrator(), doc_ref).await?;
        tracing::debug!("resolved {} to {}", stable_ref, live.document_id());
        Ok(live)
    }

    /// Detached, migrated snapshot of the referenced document
    ///
    /// Nothing is written to the CRDT.
    ///
    /// # Errors
    /// Returns error for foreign servers, backend failures or content that
    /// does not migrate or parse as `T`
    pub async fn resolve_snapshot<T: DocumentKind>(
        &self,
        stable_ref: &StableRef,
    ) -> Result<T, ResolveError> {
        self.check_server(stable_ref)?;
        let ref_id = &stable_ref.ref_id;

        let raw = match &stable_ref.version {
            None => content(ref_id, self.backend.head_snapshot(ref_id).await)?,
            Some(version) => self.pinned_snapshot(ref_id, version).await?.as_ref().clone(),
        };

        let migrated = migrate_snapshot(self.migrator(), raw)?;
        Ok(T::from_value(migrated)?)
    }

    async fn pinned_snapshot(
        &self,
        ref_id: &RefId,
        version: &str,
    ) -> Result<Arc<Value>, ResolveError> {
        let key = (ref_id.clone(), version.to_string());
        if let Some(cached) = self.pinned.get(&key).await {
            return Ok(cached);
        }

        let reply = self.backend.version_snapshot(ref_id, version).await;
        let snapshot = Arc::new(content(ref_id, reply)?);
        self.pinned.insert(key, Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    /// Live document for a locator, bypassing the backend
    ///
    /// The result has no [`DocRef`] and is writable.
    ///
    /// # Errors
    /// Returns error if finding or attaching the handle fails
    pub async fn attach_by_id<T: DocumentKind>(
        &self,
        doc_id: &DocumentId,
    ) -> Result<LiveDoc<T>, ResolveError> {
        let handle = self.repo.find(doc_id).await?;
        Ok(LiveDoc::attach(handle, self.migrator()).await?)
    }
}

fn content<T>(ref_id: &RefId, reply: RpcResult<T>) -> Result<T, ResolveError> {
    Result::<T, RpcError>::from(reply).map_err(|err| ResolveError::from_rpc(ref_id, err))
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("pinned_snapshots", &self.pinned.entry_count())
            .finish_non_exhaustive()
    }
}
