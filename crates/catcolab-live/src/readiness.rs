//! Readiness signal for the currently tracked document handle
//!
//! The signal resets to `false` whenever a different handle is tracked and
//! flips to `true` once that handle's readiness resolves. A stale handle's
//! late readiness is ignored; a rejected readiness leaves the signal `false`
//! and is not retried.

use crate::handle::DocHandle;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Reactive readiness of a tracked handle
///
/// Requires a tokio runtime when tracking a handle.
#[derive(Debug)]
pub struct ReadinessTracker {
    ready: Arc<watch::Sender<bool>>,
    generation: Arc<AtomicU64>,
    tracked: Mutex<Option<Tracked>>,
}

struct Tracked {
    handle: Arc<dyn DocHandle>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Tracked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracked")
            .field("document_id", self.handle.document_id())
            .finish_non_exhaustive()
    }
}

impl ReadinessTracker {
    /// Create tracker with no handle (not ready)
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(watch::Sender::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            tracked: Mutex::new(None),
        }
    }

    /// Create tracker following `handle`
    #[must_use]
    pub fn for_handle(handle: Arc<dyn DocHandle>) -> Self {
        let tracker = Self::new();
        tracker.track(handle);
        tracker
    }

    /// Follow `handle`
    ///
    /// Tracking the handle already tracked does nothing.
    pub fn track(&self, handle: Arc<dyn DocHandle>) {
        let mut tracked = self.tracked.lock();
        if let Some(current) = tracked.as_ref() {
            if same_handle(&current.handle, &handle) {
                return;
            }
            current.task.abort();
        }

        // Bump under the channel lock so a racing completion of the previous
        // handle cannot publish after the reset.
        let mut generation = 0;
        self.ready.send_modify(|ready| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *ready = false;
        });

        let ready = Arc::clone(&self.ready);
        let current_generation = Arc::clone(&self.generation);
        let waiting = Arc::clone(&handle);
        let task = tokio::spawn(async move {
            match waiting.when_ready().await {
                Ok(()) => {
                    ready.send_if_modified(|ready| {
                        if current_generation.load(Ordering::SeqCst) == generation && !*ready {
                            *ready = true;
                            true
                        } else {
                            false
                        }
                    });
                }
                Err(err) => {
                    tracing::warn!("document {} failed to load: {}", waiting.document_id(), err);
                }
            }
        });

        *tracked = Some(Tracked { handle, task });
    }

    /// Current readiness
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Receiver of readiness changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }
}

impl Default for ReadinessTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReadinessTracker {
    fn drop(&mut self) {
        if let Some(tracked) = self.tracked.get_mut().take() {
            tracked.task.abort();
        }
    }
}

fn same_handle(a: &Arc<dyn DocHandle>, b: &Arc<dyn DocHandle>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}
