//! Reactive verdict drivers
//!
//! Spawn tokio tasks that follow live documents (and, for diagrams, the
//! model's verdict) and publish recomputed verdicts through `watch` channels.
//! The first verdict is computed before the driver returns.
//!
//! Watch channels coalesce rapid edits: an observer may skip intermediate
//! verdicts, but the verdict after edits settle matches the one an observer of
//! every edit would see.

use crate::diagram::DiagramValidationCache;
use crate::engine::ElaborationEngine;
use crate::model::ModelValidationCache;
use crate::verdict::Verdict;
use catcolab_document::{DiagramDocument, ModelDocument};
use catcolab_live::LiveDoc;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Live verdict published by a driver task
///
/// Dropping it stops the task.
pub struct VerdictWatch<T> {
    verdicts: watch::Receiver<Verdict<T>>,
    recomputations: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl<T> VerdictWatch<T> {
    /// Current verdict
    #[must_use]
    pub fn current(&self) -> Verdict<T> {
        self.verdicts.borrow().clone()
    }

    /// Receiver of verdict updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Verdict<T>> {
        self.verdicts.clone()
    }

    /// Number of recomputations so far, the initial one included
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::SeqCst)
    }
}

impl<T> fmt::Debug for VerdictWatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerdictWatch")
            .field("recomputations", &self.recomputations())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl<T> Drop for VerdictWatch<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Follow a live model and publish its verdict
///
/// Must be called within a tokio runtime.
#[must_use]
pub fn watch_model<E: ElaborationEngine>(
    engine: Arc<E>,
    model: &LiveDoc<ModelDocument>,
) -> VerdictWatch<E::Model> {
    let mut docs = model.subscribe();
    let mut cache = ModelValidationCache::new(engine);

    let first = Arc::clone(&docs.borrow_and_update());
    cache.update(&first);
    let recomputations = Arc::new(AtomicU64::new(cache.recomputations()));
    let (sender, verdicts) = watch::channel(cache.verdict());

    let counter = Arc::clone(&recomputations);
    let task = tokio::spawn(async move {
        while docs.changed().await.is_ok() {
            let doc = Arc::clone(&docs.borrow_and_update());
            if cache.update(&doc) {
                counter.store(cache.recomputations(), Ordering::SeqCst);
                sender.send_replace(cache.verdict());
            }
        }
        tracing::debug!("model verdict driver stopped");
    });

    VerdictWatch {
        verdicts,
        recomputations,
        task,
    }
}

/// Follow a live diagram, its model and the model's verdict
///
/// The diagram is elaborated in the model's theory. Must be called within a
/// tokio runtime.
#[must_use]
pub fn watch_diagram<E: ElaborationEngine>(
    engine: Arc<E>,
    diagram: &LiveDoc<DiagramDocument>,
    model: &LiveDoc<ModelDocument>,
    model_verdict: &VerdictWatch<E::Model>,
) -> VerdictWatch<E::Diagram> {
    let mut diagrams = diagram.subscribe();
    let mut models = model.subscribe();
    let mut parents = model_verdict.subscribe();
    let mut cache = DiagramValidationCache::new(engine);

    let doc = Arc::clone(&diagrams.borrow_and_update());
    let theory = models.borrow_and_update().theory.clone();
    let parent = parents.borrow_and_update().clone();
    cache.update(&doc, &theory, &parent);
    let recomputations = Arc::new(AtomicU64::new(cache.recomputations()));
    let (sender, verdicts) = watch::channel(cache.verdict());

    let counter = Arc::clone(&recomputations);
    let task = tokio::spawn(async move {
        let (mut diagrams_open, mut models_open, mut parents_open) = (true, true, true);
        loop {
            tokio::select! {
                changed = diagrams.changed(), if diagrams_open => diagrams_open = changed.is_ok(),
                changed = models.changed(), if models_open => models_open = changed.is_ok(),
                changed = parents.changed(), if parents_open => parents_open = changed.is_ok(),
                else => break,
            }

            let doc = Arc::clone(&diagrams.borrow_and_update());
            let theory = models.borrow_and_update().theory.clone();
            let parent = parents.borrow_and_update().clone();
            if cache.update(&doc, &theory, &parent) {
                counter.store(cache.recomputations(), Ordering::SeqCst);
                sender.send_replace(cache.verdict());
            }
        }
        tracing::debug!("diagram verdict driver stopped");
    });

    VerdictWatch {
        verdicts,
        recomputations,
        task,
    }
}
