//! Functional tests for attaching, migrating and editing live documents.
//!
//! Exercises:
//! - Migration on attach writes one change, and nothing once migrated.
//! - Failed migrations leave the CRDT untouched.
//! - Edits commit structural differences only, and unchanged cells keep
//!   their allocations in the projection.
//! - Readiness follows the handle tracked last.

use catcolab_document::{
    Cell, DiagramDocument, DocRef, Document, DocumentId, Judgment, ModelDocument, Notebook,
    PermissionLevel, Permissions, RefId, TheoryId,
};
use catcolab_live::{
    DocHandle, LiveDoc, LiveDocError, MigrationChain, MigrationError, MigrationStep,
    ReadinessTracker,
};
use catcolab_test_utils::fixtures::{diagram_doc, formal, legacy_model, model_doc, ob, prose, to_value};
use catcolab_test_utils::{settle, wait_for, MemoryHandle};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn canonical() -> MigrationChain {
    MigrationChain::canonical()
}

async fn attach_model(handle: &Arc<MemoryHandle>) -> Result<LiveDoc<ModelDocument>, LiveDocError> {
    LiveDoc::<ModelDocument>::attach(Arc::clone(handle) as Arc<dyn DocHandle>, &canonical()).await
}

/// Tenet: a legacy document is migrated by exactly one change.
///
/// A model named "M" at version "0" is upgraded on first attach, and a
/// second attach to the same document writes nothing.
#[tokio::test]
async fn legacy_model_migrates_once() {
    let a = ob("A");
    let cells: Vec<Cell<_>> = vec![formal(a.clone()), prose("notes")];
    let handle = MemoryHandle::new("automerge:m", legacy_model("M", &cells));

    let live = attach_model(&handle).await.unwrap();
    assert_eq!(handle.change_count(), 1);

    let doc = live.doc();
    assert_eq!(doc.name, "M");
    assert_eq!(doc.version, "1");
    assert_eq!(doc.notebook.len(), 2);
    assert_eq!(doc.notebook.formal_cells().len(), 1);
    assert_eq!(handle.value()["version"], json!("1"));

    let again = attach_model(&handle).await.unwrap();
    assert_eq!(handle.change_count(), 1);
    assert_eq!(*again.doc(), *live.doc());
}

/// Tenet: attaching a current document writes nothing.
#[tokio::test]
async fn current_model_attaches_without_changes() {
    let handle = MemoryHandle::new("automerge:m", to_value(&model_doc("M", [ob("A")])));
    let live = attach_model(&handle).await.unwrap();

    assert_eq!(handle.change_count(), 0);
    assert_eq!(live.doc().notebook.len(), 1);
    assert!(!live.is_read_only());
    assert!(live.doc_ref().is_none());
}

fn upgrade_theory(doc: &mut Value) -> Result<(), MigrationError> {
    if doc["theory"] == json!("olog") {
        doc["theory"] = json!("simple-olog");
    }
    Ok(())
}

fn reject(_doc: &mut Value) -> Result<(), MigrationError> {
    Err(MigrationError::malformed("1", "rejected"))
}

fn chain_with(to_two: fn(&mut Value) -> Result<(), MigrationError>) -> MigrationChain {
    let mut steps = MigrationChain::canonical().steps().to_vec();
    steps.push(MigrationStep {
        from: "1",
        to: "2",
        description: "second step",
        apply: to_two,
    });
    MigrationChain::new(steps).unwrap()
}

/// Tenet: several steps are written together as one change.
#[tokio::test]
async fn multi_step_migration_is_one_change() {
    let mut legacy = legacy_model("M", &[formal(ob("A"))]);
    legacy["theory"] = json!("olog");
    let handle = MemoryHandle::new("automerge:m", legacy);

    let chain = chain_with(upgrade_theory);
    let live = LiveDoc::<ModelDocument>::attach(Arc::clone(&handle) as Arc<dyn DocHandle>, &chain)
        .await
        .unwrap();

    assert_eq!(handle.change_count(), 1);
    assert_eq!(live.doc().version, "2");
    assert_eq!(live.doc().theory, TheoryId::new("simple-olog"));
}

/// Tenet: a failing migration leaves the document untouched.
#[tokio::test]
async fn failed_migration_writes_nothing() {
    let legacy = legacy_model("M", &[formal(ob("A"))]);
    let handle = MemoryHandle::new("automerge:m", legacy.clone());

    let err = LiveDoc::<ModelDocument>::attach(
        Arc::clone(&handle) as Arc<dyn DocHandle>,
        &chain_with(reject),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LiveDocError::MigrationFailed(MigrationError::Malformed { .. })));
    assert_eq!(handle.change_count(), 0);
    assert_eq!(handle.value(), legacy);
}

/// Tenet: documents newer than the migrator are refused, not rewritten.
#[tokio::test]
async fn newer_version_is_unsupported() {
    let mut value = to_value(&model_doc("M", []));
    value["version"] = json!("7");
    let handle = MemoryHandle::new("automerge:m", value);

    let err = attach_model(&handle).await.unwrap_err();
    assert!(matches!(
        err,
        LiveDocError::MigrationFailed(MigrationError::UnsupportedVersion { .. })
    ));
    assert_eq!(handle.change_count(), 0);
}

#[tokio::test]
async fn wrong_document_type_is_rejected() {
    let handle = MemoryHandle::new("automerge:d", to_value(&diagram_doc("D", "model-1", [])));

    let err = attach_model(&handle).await.unwrap_err();
    assert!(matches!(err, LiveDocError::TypeMismatch { .. }));

    let as_diagram =
        LiveDoc::<DiagramDocument>::attach(Arc::clone(&handle) as Arc<dyn DocHandle>, &canonical())
            .await
            .unwrap();
    assert_eq!(as_diagram.doc().name, "D");

    let as_any =
        LiveDoc::<Document>::attach(Arc::clone(&handle) as Arc<dyn DocHandle>, &canonical())
            .await
            .unwrap();
    assert!(matches!(*as_any.doc(), Document::Diagram(_)));
}

#[tokio::test]
async fn failed_load_is_not_ready() {
    let handle = MemoryHandle::pending("automerge:m");
    handle.fail();

    let err = attach_model(&handle).await.unwrap_err();
    assert!(matches!(err, LiveDocError::NotReady { .. }));
}

/// Tenet: attach waits for the handle to load.
#[tokio::test]
async fn attach_waits_for_readiness() {
    let handle = MemoryHandle::pending("automerge:m");
    let waiting = Arc::clone(&handle);
    let attach = tokio::spawn(async move { attach_model(&waiting).await });

    settle().await;
    assert!(!attach.is_finished());

    handle.load(to_value(&model_doc("M", [])));
    let live = attach.await.unwrap().unwrap();
    assert_eq!(live.doc().name, "M");
}

/// Tenet: an edit commits only its structural difference.
#[tokio::test]
async fn change_doc_commits_structural_difference() {
    let handle = MemoryHandle::new("automerge:m", to_value(&model_doc("M", [ob("A"), ob("B")])));
    let live = attach_model(&handle).await.unwrap();
    let notebook = Arc::clone(&live.doc().notebook);

    live.change_doc(|doc| doc.name = "Renamed".into()).unwrap();

    assert_eq!(handle.change_count(), 1);
    assert_eq!(handle.value()["name"], json!("Renamed"));
    assert_eq!(live.doc().name, "Renamed");
    assert!(Arc::ptr_eq(&notebook, &live.doc().notebook));

    live.change_doc(|doc| doc.name = "Renamed".into()).unwrap();
    assert_eq!(handle.change_count(), 1);
}

/// Tenet: local edits never delete fields the typed document does not model.
///
/// A peer wrote a top-level key and a key inside a judgment that this client
/// does not know about; a rename and a new cell must keep both.
#[tokio::test]
async fn change_doc_keeps_unmodeled_fields() {
    let a = ob("A");
    let a_id = a.id();
    let mut value = to_value(&model_doc("M", [a]));
    value["extra"] = json!({"written": "by a peer"});
    value["notebook"]["cellContents"][a_id.to_string()]["content"]["note"] = json!("keep me");
    let handle = MemoryHandle::new("automerge:m", value);
    let live = attach_model(&handle).await.unwrap();

    live.change_doc(|doc| doc.name = "Renamed".into()).unwrap();
    live.change_doc(|doc| {
        let mut notebook = Notebook::clone(&doc.notebook);
        notebook.push(formal(ob("B")));
        doc.notebook = Arc::new(notebook);
    })
    .unwrap();

    let stored = handle.value();
    assert_eq!(stored["name"], json!("Renamed"));
    assert_eq!(stored["extra"], json!({"written": "by a peer"}));
    assert_eq!(
        stored["notebook"]["cellContents"][a_id.to_string()]["content"]["note"],
        json!("keep me")
    );
    assert_eq!(live.doc().notebook.len(), 2);
    assert_eq!(handle.change_count(), 2);
}

/// Tenet: a remote edit to one cell keeps every other cell's allocation.
#[tokio::test]
async fn projection_reuses_unchanged_cells() {
    let (a, b) = (ob("A"), ob("B"));
    let (a_id, b_id) = (a.id(), b.id());
    let handle = MemoryHandle::new("automerge:m", to_value(&model_doc("M", [a, b])));
    let live = attach_model(&handle).await.unwrap();
    let before = live.doc();
    let mut updates = live.subscribe();
    updates.borrow_and_update();

    handle.remote_change(|doc| {
        doc["notebook"]["cellContents"][b_id.to_string()]["content"]["name"] = json!("B2");
    });

    assert!(updates.has_changed().unwrap());
    let after = live.doc();
    let cell_b = after.notebook.get(b_id).unwrap();
    assert_eq!(cell_b.formal().map(Judgment::name), Some("B2"));
    assert!(Arc::ptr_eq(
        before.notebook.get(a_id).unwrap(),
        after.notebook.get(a_id).unwrap()
    ));
    assert!(!Arc::ptr_eq(&before.notebook, &after.notebook));
}

/// Tenet: read-only documents reject local edits.
#[tokio::test]
async fn read_only_document_rejects_changes() {
    let handle = MemoryHandle::new("automerge:m", to_value(&model_doc("M", [])));
    let doc_ref = DocRef::new(
        RefId::new("model-1"),
        Permissions {
            anyone: Some(PermissionLevel::Read),
            user: None,
        },
        true,
    );
    let live = LiveDoc::<ModelDocument>::attach_with_ref(
        Arc::clone(&handle) as Arc<dyn DocHandle>,
        &canonical(),
        doc_ref,
    )
    .await
    .unwrap();

    assert!(live.is_read_only());
    let err = live.change_doc(|doc| doc.name = "X".into()).unwrap_err();
    assert!(matches!(err, LiveDocError::ReadOnly(id) if id == DocumentId::new("automerge:m")));
    assert_eq!(handle.change_count(), 0);
}

/// Tenet: releasing a live doc releases its subscription.
#[tokio::test]
async fn dispose_and_drop_unsubscribe() {
    let handle = MemoryHandle::new("automerge:m", to_value(&model_doc("M", [])));
    let live = attach_model(&handle).await.unwrap();
    assert_eq!(handle.listener_count(), 1);

    live.dispose();
    assert_eq!(handle.listener_count(), 0);
    handle.remote_change(|doc| doc["name"] = json!("Elsewhere"));
    assert_eq!(live.doc().name, "M");

    let other = attach_model(&handle).await.unwrap();
    let clone = other.clone();
    assert!(LiveDoc::ptr_eq(&other, &clone));
    assert_eq!(handle.listener_count(), 1);
    drop(other);
    assert_eq!(handle.listener_count(), 1);
    drop(clone);
    assert_eq!(handle.listener_count(), 0);
}

#[tokio::test]
async fn content_hash_follows_content() {
    let handle = MemoryHandle::new("automerge:m", to_value(&model_doc("M", [])));
    let live = attach_model(&handle).await.unwrap();
    let before = live.content_hash().unwrap();

    live.change_doc(|doc| doc.name = "N".into()).unwrap();
    assert_ne!(live.content_hash().unwrap(), before);
    live.change_doc(|doc| doc.name = "M".into()).unwrap();
    assert_eq!(live.content_hash().unwrap(), before);
}

/// Tenet: readiness follows only the handle tracked last.
#[tokio::test]
async fn readiness_ignores_stale_handles() {
    let first = MemoryHandle::pending("automerge:first");
    let second = MemoryHandle::pending("automerge:second");
    let tracker = ReadinessTracker::for_handle(Arc::clone(&first) as Arc<dyn DocHandle>);
    tracker.track(Arc::clone(&second) as Arc<dyn DocHandle>);

    first.load(json!({}));
    settle().await;
    assert!(!tracker.is_ready());

    let mut ready = tracker.subscribe();
    second.load(json!({}));
    wait_for(&mut ready, |ready| *ready).await;
    assert!(tracker.is_ready());

    // Same handle again keeps the signal
    tracker.track(Arc::clone(&second) as Arc<dyn DocHandle>);
    assert!(tracker.is_ready());
}

#[tokio::test]
async fn rejected_readiness_stays_false() {
    let handle = MemoryHandle::pending("automerge:m");
    let tracker = ReadinessTracker::for_handle(Arc::clone(&handle) as Arc<dyn DocHandle>);
    handle.fail();
    settle().await;
    assert!(!tracker.is_ready());
}
