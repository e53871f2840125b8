//! Live documents
//!
//! A [`LiveDoc<T>`] bundles a CRDT handle, the reactive projection of its
//! value and optional backend metadata. Attaching migrates the document in
//! place before the first snapshot is exposed.
//!
//! # Invariants
//! - Migration writes only the structural patch, inside one change, and
//!   re-checks the version so a replica that already migrated is untouched.
//! - All mutation goes through [`LiveDoc::change_doc`].

use crate::error::{ChangeError, HandleError, LiveDocError};
use crate::handle::DocHandle;
use crate::migrator::{plan_migration, Migrator};
use crate::projection::Projection;
use catcolab_document::{diff, ContentHash, DocRef, DocumentId, DocumentKind, HashError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Document kept in sync with its CRDT handle
///
/// Cheap to clone; clones share state. Dropping the last clone releases the
/// change subscription.
pub struct LiveDoc<T: DocumentKind> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: DocumentKind> {
    handle: Arc<dyn DocHandle>,
    projection: Projection<T>,
    doc_ref: Option<DocRef>,
}

impl<T: DocumentKind> LiveDoc<T> {
    /// Attach to a handle obtained without the backend
    ///
    /// Waits for readiness, checks the document type, migrates in place and
    /// starts the projection.
    ///
    /// # Errors
    /// - `NotReady` if the handle fails to load
    /// - `TypeMismatch` if the document has another type
    /// - `MigrationFailed` if migration fails (nothing is written)
    pub async fn attach(
        handle: Arc<dyn DocHandle>,
        migrator: &dyn Migrator,
    ) -> Result<Self, LiveDocError> {
        Self::enliven(handle, migrator, None).await
    }

    /// Attach to a handle obtained through the backend
    ///
    /// # Errors
    /// Same as [`LiveDoc::attach`]
    pub async fn attach_with_ref(
        handle: Arc<dyn DocHandle>,
        migrator: &dyn Migrator,
        doc_ref: DocRef,
    ) -> Result<Self, LiveDocError> {
        Self::enliven(handle, migrator, Some(doc_ref)).await
    }

    async fn enliven(
        handle: Arc<dyn DocHandle>,
        migrator: &dyn Migrator,
        doc_ref: Option<DocRef>,
    ) -> Result<Self, LiveDocError> {
        let document_id = handle.document_id().clone();
        handle
            .when_ready()
            .await
            .map_err(|source| LiveDocError::NotReady {
                document_id: document_id.clone(),
                source,
            })?;

        let before = handle
            .doc()
            .ok_or_else(|| LiveDocError::NoContent(document_id.clone()))?;
        T::check_type(&before)?;

        migrate_in_place(handle.as_ref(), migrator, &before)?;

        let projection = Projection::new(Arc::clone(&handle))?;
        Ok(Self {
            inner: Arc::new(Inner {
                handle,
                projection,
                doc_ref,
            }),
        })
    }

    /// Current snapshot
    #[inline]
    #[must_use]
    pub fn doc(&self) -> Arc<T> {
        self.inner.projection.current()
    }

    /// Receiver of snapshot updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> {
        self.inner.projection.subscribe()
    }

    /// Change the document
    ///
    /// `f` edits a typed copy of the CRDT value; only the structural
    /// difference between the copy before and after `f` is committed, in one
    /// change. Fields the typed document does not model are left as they are.
    ///
    /// # Errors
    /// - `ReadOnly` if the document is not live or not writable
    /// - `Change` if the handle rejects the change
    pub fn change_doc<F>(&self, f: F) -> Result<(), LiveDocError>
    where
        F: FnOnce(&mut T) + Send,
    {
        if self.is_read_only() {
            return Err(LiveDocError::ReadOnly(self.document_id().clone()));
        }
        // Diff typed copies so keys `T` does not model are never deleted
        let change = move |doc: &mut Value| -> Result<(), ChangeError> {
            let mut typed = T::from_value(doc.clone())?;
            let before = typed.to_value()?;
            f(&mut typed);
            let after = typed.to_value()?;
            diff(&before, &after).apply(doc)?;
            Ok(())
        };
        self.inner.handle.change(Box::new(change))?;
        Ok(())
    }

    /// Underlying CRDT handle
    #[inline]
    #[must_use]
    pub fn doc_handle(&self) -> &Arc<dyn DocHandle> {
        &self.inner.handle
    }

    /// Backend metadata, absent when attached without the backend
    #[inline]
    #[must_use]
    pub fn doc_ref(&self) -> Option<&DocRef> {
        self.inner.doc_ref.as_ref()
    }

    /// Locator of the document
    #[inline]
    #[must_use]
    pub fn document_id(&self) -> &DocumentId {
        self.inner.handle.document_id()
    }

    /// Check if local changes are rejected
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.inner
            .doc_ref
            .as_ref()
            .is_some_and(|doc_ref| !doc_ref.is_writable())
    }

    /// Content hash of the current snapshot
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be encoded
    pub fn content_hash(&self) -> Result<ContentHash, HashError> {
        ContentHash::compute_serializable(&*self.doc())
    }

    /// Stop following the handle; the snapshot stays at its last value
    pub fn dispose(&self) {
        self.inner.projection.dispose();
    }

    /// Check if two live docs are the same instance
    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T: DocumentKind> Clone for LiveDoc<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: DocumentKind> fmt::Debug for LiveDoc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveDoc")
            .field("document_id", self.document_id())
            .field("doc_ref", &self.inner.doc_ref)
            .finish_non_exhaustive()
    }
}

/// Migrate the document behind `handle` to the current version
///
/// Returns whether a change was written. `before` is the value read after
/// readiness; the plan is recomputed inside the change against the value the
/// CRDT holds at that point.
///
/// # Errors
/// Returns `MigrationFailed` if migration fails, leaving the document untouched
pub fn migrate_in_place(
    handle: &dyn DocHandle,
    migrator: &dyn Migrator,
    before: &Value,
) -> Result<bool, LiveDocError> {
    if plan_migration(migrator, before)?.is_none() {
        tracing::debug!(
            "document {} already at version {}",
            handle.document_id(),
            migrator.current_version()
        );
        return Ok(false);
    }

    // A peer may have migrated since `before` was read
    let mut applied = None;
    let change = |doc: &mut Value| -> Result<(), ChangeError> {
        if let Some(plan) = plan_migration(migrator, doc)? {
            plan.patch().apply(doc)?;
            applied = Some(plan);
        }
        Ok(())
    };
    match handle.change(Box::new(change)) {
        Ok(()) => {}
        Err(HandleError::Change(ChangeError::Migration(err))) => {
            return Err(LiveDocError::MigrationFailed(err));
        }
        Err(err) => return Err(LiveDocError::Change(err)),
    }

    match applied {
        Some(plan) => {
            tracing::info!(
                "migrated document {} from version {} to {} ({} ops)",
                handle.document_id(),
                plan.from_version(),
                plan.to_version(),
                plan.patch().len()
            );
            Ok(true)
        }
        None => {
            tracing::debug!("document {} was migrated by a peer", handle.document_id());
            Ok(false)
        }
    }
}
