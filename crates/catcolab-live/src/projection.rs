//! Reactive projection of a CRDT document
//!
//! Mirrors the handle's value as an immutable `Arc<T>` published through a
//! `watch` channel. Each change event is parsed and reconciled against the
//! previous mirror, so unchanged subtrees keep their allocations and an event
//! that changes nothing publishes nothing.

use crate::error::LiveDocError;
use crate::handle::{ChangeEvent, ChangeListener, DocHandle, Subscription};
use catcolab_document::{reconcile_arc, DocumentKind};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Immutable mirror of a document handle
#[derive(Debug)]
pub struct Projection<T: DocumentKind> {
    sender: Arc<watch::Sender<Arc<T>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<T: DocumentKind> Projection<T> {
    /// Subscribe to `handle` and mirror its current value
    ///
    /// # Errors
    /// Returns error if the handle holds no document or it does not parse
    pub fn new(handle: Arc<dyn DocHandle>) -> Result<Self, LiveDocError> {
        let initial = read_typed::<T>(handle.as_ref())?;
        let sender = Arc::new(watch::Sender::new(Arc::new(initial)));

        let weak = Arc::downgrade(&sender);
        let listener: ChangeListener = Arc::new(move |event: &ChangeEvent| {
            on_change(&weak, event);
        });
        let subscription = Subscription::new(Arc::clone(&handle), listener);

        // Changes between the first read and the subscription
        if let Some(value) = handle.doc() {
            publish(&sender, &value);
        }

        Ok(Self {
            sender,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Current mirror
    #[inline]
    #[must_use]
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receiver of mirror updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> {
        self.sender.subscribe()
    }

    /// Stop following the handle; the mirror stays at its last value
    pub fn dispose(&self) {
        drop(self.subscription.lock().take());
    }

    /// Check if the projection was disposed
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.subscription.lock().is_none()
    }
}

fn read_typed<T: DocumentKind>(handle: &dyn DocHandle) -> Result<T, LiveDocError> {
    let value = handle
        .doc()
        .ok_or_else(|| LiveDocError::NoContent(handle.document_id().clone()))?;
    Ok(T::from_value(value)?)
}

fn on_change<T: DocumentKind>(sender: &Weak<watch::Sender<Arc<T>>>, event: &ChangeEvent) {
    let Some(sender) = sender.upgrade() else {
        return;
    };
    publish(&sender, &event.doc);
}

fn publish<T: DocumentKind>(sender: &watch::Sender<Arc<T>>, value: &Value) {
    let next = match T::from_value(value.clone()) {
        Ok(next) => next,
        Err(err) => {
            tracing::warn!("ignoring unparsable document change: {}", err);
            return;
        }
    };
    sender.send_if_modified(|current| {
        let reconciled = reconcile_arc(current, Arc::new(next));
        if Arc::ptr_eq(current, &reconciled) {
            false
        } else {
            *current = reconciled;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use catcolab_document::{ModelDocument, TheoryId};

    #[test]
    fn equal_value_publishes_nothing() {
        let model = ModelDocument::new("M", TheoryId::new("simple-olog"));
        let sender = watch::Sender::new(Arc::new(model.clone()));
        let mut rx = sender.subscribe();
        let before = Arc::clone(&sender.borrow());

        publish(&sender, &model.to_value().unwrap());
        assert!(!rx.has_changed().unwrap());
        assert!(Arc::ptr_eq(&before, &sender.borrow()));
    }

    #[test]
    fn rename_publishes_and_keeps_notebook() {
        let model = ModelDocument::new("M", TheoryId::new("simple-olog"));
        let sender = watch::Sender::new(Arc::new(model.clone()));
        let mut rx = sender.subscribe();
        let before = Arc::clone(&sender.borrow());

        let mut renamed = model;
        renamed.name = "N".into();
        publish(&sender, &renamed.to_value().unwrap());

        assert!(rx.has_changed().unwrap());
        let after = Arc::clone(&rx.borrow_and_update());
        assert_eq!(after.name, "N");
        assert!(Arc::ptr_eq(&before.notebook, &after.notebook));
    }

    #[test]
    fn unparsable_change_keeps_mirror() {
        let model = ModelDocument::new("M", TheoryId::new("simple-olog"));
        let sender = watch::Sender::new(Arc::new(model));
        let mut rx = sender.subscribe();

        publish(&sender, &serde_json::json!({"type": "diagram"}));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow().name, "M");
    }
}
