//! In-memory CRDT repo
//!
//! Documents are plain JSON values. Changes are atomic, emit one event per
//! non-empty change in commit order and are counted, so tests can assert how
//! many operations an action wrote.

use async_trait::async_trait;
use catcolab_document::{diff, DocumentId, Patch, PatchError};
use catcolab_live::{
    ChangeEvent, ChangeFn, ChangeListener, DocHandle, HandleError, ListenerId, Repo, RepoError,
};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// In-memory document handle
pub struct MemoryHandle {
    id: DocumentId,
    state: RwLock<Option<Value>>,
    commit: Mutex<()>,
    listeners: Mutex<Vec<(ListenerId, ChangeListener)>>,
    next_listener: AtomicU64,
    readiness: watch::Sender<Readiness>,
    changes: AtomicU64,
}

impl MemoryHandle {
    /// Loaded document
    pub fn new(id: impl Into<DocumentId>, value: Value) -> Arc<Self> {
        let handle = Self::pending(id);
        handle.load(value);
        handle
    }

    /// Document still loading; see [`MemoryHandle::load`] and [`MemoryHandle::fail`]
    pub fn pending(id: impl Into<DocumentId>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            state: RwLock::new(None),
            commit: Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            readiness: watch::Sender::new(Readiness::Pending),
            changes: AtomicU64::new(0),
        })
    }

    /// Finish loading with `value`
    pub fn load(&self, value: Value) {
        *self.state.write() = Some(value);
        self.readiness.send_replace(Readiness::Ready);
    }

    /// Fail loading
    pub fn fail(&self) {
        self.readiness.send_replace(Readiness::Failed);
    }

    /// Current value (panics if not loaded)
    pub fn value(&self) -> Value {
        self.state.read().clone().expect("document not loaded")
    }

    /// Number of committed non-empty changes
    pub fn change_count(&self) -> u64 {
        self.changes.load(Ordering::SeqCst)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Simulate a peer's change arriving over sync
    pub fn remote_change(&self, f: impl FnOnce(&mut Value)) {
        self.commit(|doc| {
            f(doc);
            Ok(())
        })
        .expect("remote change failed");
    }

    /// Merge operations produced by another replica
    pub fn merge(&self, patch: &Patch) -> Result<(), PatchError> {
        let mut result = Ok(());
        self.commit(|doc| {
            result = patch.apply(doc);
            Ok(())
        })
        .expect("merge failed");
        result
    }

    fn commit(
        &self,
        f: impl FnOnce(&mut Value) -> Result<(), catcolab_live::ChangeError>,
    ) -> Result<(), HandleError> {
        let _commit = self.commit.lock();
        let (value, patch) = {
            let mut state = self.state.write();
            let current = state
                .as_ref()
                .ok_or_else(|| HandleError::Unavailable(self.id.clone()))?;
            let mut working = current.clone();
            f(&mut working)?;
            let patch = diff(current, &working);
            if patch.is_empty() {
                return Ok(());
            }
            *state = Some(working.clone());
            (working, patch)
        };
        self.changes.fetch_add(1, Ordering::SeqCst);

        let event = ChangeEvent {
            document_id: self.id.clone(),
            doc: Arc::new(value),
            patch,
        };
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&event);
        }
        Ok(())
    }
}

#[async_trait]
impl DocHandle for MemoryHandle {
    fn document_id(&self) -> &DocumentId {
        &self.id
    }

    fn doc(&self) -> Option<Value> {
        self.state.read().clone()
    }

    fn change(&self, f: ChangeFn<'_>) -> Result<(), HandleError> {
        self.commit(f)
    }

    fn on_change(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId::new(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, listener));
        id
    }

    fn off_change(&self, id: ListenerId) {
        self.listeners.lock().retain(|(other, _)| *other != id);
    }

    async fn when_ready(&self) -> Result<(), HandleError> {
        let mut readiness = self.readiness.subscribe();
        let outcome = readiness
            .wait_for(|state| *state != Readiness::Pending)
            .await
            .map(|state| *state)
            .unwrap_or(Readiness::Failed);
        match outcome {
            Readiness::Ready => Ok(()),
            Readiness::Pending | Readiness::Failed => Err(HandleError::Unavailable(self.id.clone())),
        }
    }
}

/// In-memory repo of [`MemoryHandle`]s
#[derive(Default)]
pub struct MemoryRepo {
    docs: DashMap<DocumentId, Arc<MemoryHandle>>,
    finds: AtomicU64,
    find_delay: Option<Duration>,
}

impl MemoryRepo {
    /// Create empty repo
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `find`, widening race windows
    #[must_use]
    pub fn with_find_delay(mut self, delay: Duration) -> Self {
        self.find_delay = Some(delay);
        self
    }

    /// Add a loaded document
    pub fn create(&self, id: &str, value: Value) -> Arc<MemoryHandle> {
        let handle = MemoryHandle::new(id, value);
        self.insert(Arc::clone(&handle));
        handle
    }

    /// Add a handle
    pub fn insert(&self, handle: Arc<MemoryHandle>) {
        self.docs.insert(handle.document_id().clone(), handle);
    }

    /// Handle by id
    pub fn handle(&self, id: &str) -> Option<Arc<MemoryHandle>> {
        self.docs.get(&DocumentId::new(id)).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of `find` calls
    pub fn find_count(&self) -> u64 {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repo for MemoryRepo {
    async fn find(&self, id: &DocumentId) -> Result<Arc<dyn DocHandle>, RepoError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.find_delay {
            tokio::time::sleep(delay).await;
        }
        let handle = self
            .docs
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RepoError::NotFound(id.clone()))?;
        Ok(handle)
    }
}
