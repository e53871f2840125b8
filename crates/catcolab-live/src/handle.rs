//! CRDT runtime collaborators
//!
//! The CRDT engine (storage, sync, merge) lives outside this crate. It is
//! reached through [`Repo`] to look documents up and [`DocHandle`] to read,
//! change and observe one document.

use crate::error::{ChangeError, HandleError, RepoError};
use async_trait::async_trait;
use catcolab_document::{DocumentId, Patch};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Mutation run inside one CRDT change
pub type ChangeFn<'a> = Box<dyn FnOnce(&mut Value) -> Result<(), ChangeError> + Send + 'a>;

/// Callback receiving change events
pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Identifier of a registered change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Create listener id
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id
    #[inline]
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Notification of a local or remote change
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Changed document
    pub document_id: DocumentId,
    /// Document value after the change
    pub doc: Arc<Value>,
    /// Operations that produced it
    pub patch: Patch,
}

/// Handle to one CRDT document
///
/// `change` is atomic: when the change function fails the document is left
/// untouched and no event is emitted. Events are delivered to listeners in the
/// order changes are applied.
#[async_trait]
pub trait DocHandle: Send + Sync + 'static {
    /// Locator of the document
    fn document_id(&self) -> &DocumentId;

    /// Current value, `None` before the document is loaded
    fn doc(&self) -> Option<Value>;

    /// Apply a change
    ///
    /// # Errors
    /// Returns error if the change function fails or the document is gone
    fn change(&self, f: ChangeFn<'_>) -> Result<(), HandleError>;

    /// Register a change listener
    fn on_change(&self, listener: ChangeListener) -> ListenerId;

    /// Remove a change listener
    fn off_change(&self, id: ListenerId);

    /// Resolve once the document is loaded
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    async fn when_ready(&self) -> Result<(), HandleError>;
}

/// Collection of CRDT documents
#[async_trait]
pub trait Repo: Send + Sync + 'static {
    /// Find the handle of a document
    ///
    /// # Errors
    /// Returns error if the document does not exist or cannot be reached
    async fn find(&self, id: &DocumentId) -> Result<Arc<dyn DocHandle>, RepoError>;
}

/// Registered change listener, removed on drop
pub struct Subscription {
    handle: Arc<dyn DocHandle>,
    id: Option<ListenerId>,
}

impl Subscription {
    /// Register `listener` on `handle`
    #[must_use]
    pub fn new(handle: Arc<dyn DocHandle>, listener: ChangeListener) -> Self {
        let id = handle.on_change(listener);
        tracing::debug!("subscribed to {} ({:?})", handle.document_id(), id);
        Self {
            handle,
            id: Some(id),
        }
    }

    /// Listener id, `None` once cancelled
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    /// Remove the listener; later calls do nothing
    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            self.handle.off_change(id);
            tracing::debug!("unsubscribed from {} ({:?})", self.handle.document_id(), id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("document_id", self.handle.document_id())
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
