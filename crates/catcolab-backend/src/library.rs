//! Deduplicating live document library
//!
//! Process-wide cache from CRDT locator to live document, backed by moka.
//! Concurrent requests for the same locator share one fetch-and-attach
//! sequence and receive the same [`LiveDoc`] instance.
//!
//! Entries are never expired by time and, unless a capacity is configured,
//! never evicted: a second instance for a locator would create a second
//! change subscription on the same handle.

use crate::error::ResolveError;
use crate::resolver::Resolver;
use catcolab_document::{DocumentId, DocumentKind, ModelDocument, StableRef};
use catcolab_live::LiveDoc;
use moka::future::Cache;
use std::fmt;
use std::sync::Arc;

/// Library of live documents of type `T`
pub struct DocumentLibrary<T: DocumentKind> {
    resolver: Resolver,
    docs: Cache<DocumentId, LiveDoc<T>>,
}

/// Library of live models, used to look up diagram parents
pub type ModelLibrary = DocumentLibrary<ModelDocument>;

impl<T: DocumentKind> DocumentLibrary<T> {
    /// Create library sized by the resolver's configuration
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        let mut docs = Cache::builder();
        if let Some(capacity) = resolver.config().library_capacity {
            docs = docs.max_capacity(capacity);
        }
        Self {
            resolver,
            docs: docs.build(),
        }
    }

    /// Resolver used for fetches
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Live document behind a head reference, fetched at most once
    ///
    /// # Errors
    /// Returns the resolution error, shared with concurrent waiters. Failures
    /// are not cached; a later call fetches again.
    pub async fn get_or_fetch(
        &self,
        stable_ref: &StableRef,
    ) -> Result<LiveDoc<T>, Arc<ResolveError>> {
        let doc_id = self.resolver.locate(stable_ref).await.map_err(Arc::new)?;
        self.docs
            .try_get_with(doc_id.clone(), async {
                tracing::info!("fetching {} ({})", stable_ref, doc_id);
                self.resolver.resolve_live::<T>(stable_ref).await
            })
            .await
    }

    /// Live document for a locator obtained without the backend
    ///
    /// # Errors
    /// Returns the attach error, shared with concurrent waiters
    pub async fn get_or_attach(
        &self,
        doc_id: &DocumentId,
    ) -> Result<LiveDoc<T>, Arc<ResolveError>> {
        self.docs
            .try_get_with(doc_id.clone(), async {
                tracing::info!("attaching {}", doc_id);
                self.resolver.attach_by_id::<T>(doc_id).await
            })
            .await
    }

    /// Cached live document, if any
    pub async fn cached(&self, doc_id: &DocumentId) -> Option<LiveDoc<T>> {
        self.docs.get(doc_id).await
    }

    /// Drop every cached document
    pub fn clear(&self) {
        self.docs.invalidate_all();
    }

    /// Number of cached documents (approximate while writes are pending)
    #[must_use]
    pub fn len(&self) -> u64 {
        self.docs.entry_count()
    }

    /// Check if no documents are cached (approximate while writes are pending)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: DocumentKind> Clone for DocumentLibrary<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            docs: self.docs.clone(),
        }
    }
}

impl<T: DocumentKind> fmt::Debug for DocumentLibrary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentLibrary")
            .field("resolver", &self.resolver)
            .field("entries", &self.docs.entry_count())
            .finish()
    }
}
