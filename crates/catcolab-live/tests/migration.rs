//! Property tests for in-place migration across replicas.
//!
//! Two replicas of the same legacy document may migrate independently and
//! then exchange their operations in either order; both must converge, and
//! neither exchange may write anything further.

use catcolab_document::{Cell, ModelJudgment, MorType, ObType, Patch};
use catcolab_live::{
    migrate_in_place, plan_migration, ChangeEvent, DocHandle, MigrationChain, Migrator,
};
use catcolab_test_utils::fixtures::{formal, legacy_model};
use catcolab_test_utils::MemoryHandle;
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

fn arb_cell() -> impl Strategy<Value = Cell<ModelJudgment>> {
    let id = any::<u128>().prop_map(Uuid::from_u128);
    prop_oneof![
        (id.clone(), "[a-z]{0,8}").prop_map(|(id, content)| Cell::<ModelJudgment>::RichText { id, content }),
        id.clone().prop_map(|id| Cell::<ModelJudgment>::Stem { id }),
        (id.clone(), "[A-Z][a-z]{0,4}")
            .prop_map(|(id, name)| formal(ModelJudgment::object(id, name, ObType::new("Entity")))),
        (id, "[a-z]{1,4}").prop_map(|(id, name)| {
            formal(ModelJudgment::morphism(id, name, MorType::new("Attr"), None, None))
        }),
    ]
}

fn arb_legacy() -> impl Strategy<Value = Value> {
    prop::collection::vec(arb_cell(), 0..6).prop_map(|cells| legacy_model("M", &cells))
}

/// Replica that records the operations it emits
fn replica(id: &str, value: Value) -> (Arc<MemoryHandle>, Arc<Mutex<Vec<Patch>>>) {
    let handle = MemoryHandle::new(id, value);
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&emitted);
    handle.on_change(Arc::new(move |event: &ChangeEvent| {
        sink.lock().push(event.patch.clone());
    }));
    (handle, emitted)
}

fn migrate(handle: &MemoryHandle) -> bool {
    migrate_in_place(handle, &MigrationChain::canonical(), &handle.value()).unwrap()
}

fn exchange(from: &Mutex<Vec<Patch>>, to: &MemoryHandle) {
    for patch in from.lock().clone() {
        to.merge(&patch).unwrap();
    }
}

proptest! {
    /// Migrating twice yields the same value as migrating once.
    #[test]
    fn migration_is_idempotent(legacy in arb_legacy()) {
        let chain = MigrationChain::canonical();
        let once = chain.migrate(&legacy).unwrap();
        let twice = chain.migrate(&once).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(plan_migration(&chain, &once).unwrap().is_none());
    }

    /// Independent migrations converge whichever replica merges first.
    #[test]
    fn concurrent_migrations_converge(legacy in arb_legacy(), a_first in any::<bool>()) {
        let (a, a_ops) = replica("automerge:a", legacy.clone());
        let (b, b_ops) = replica("automerge:b", legacy);

        prop_assert!(migrate(&a));
        prop_assert!(migrate(&b));
        prop_assert_eq!(a.change_count(), 1);
        prop_assert_eq!(b.change_count(), 1);

        if a_first {
            exchange(&a_ops, &b);
            exchange(&b_ops, &a);
        } else {
            exchange(&b_ops, &a);
            exchange(&a_ops, &b);
        }

        prop_assert_eq!(a.value(), b.value());
        prop_assert_eq!(a.change_count(), 1);
        prop_assert_eq!(b.change_count(), 1);
    }

    /// A replica that received a peer's migration plans nothing itself.
    #[test]
    fn merged_migration_is_not_repeated(legacy in arb_legacy()) {
        let (a, a_ops) = replica("automerge:a", legacy.clone());
        let (b, _) = replica("automerge:b", legacy);

        prop_assert!(migrate(&a));
        exchange(&a_ops, &b);
        prop_assert!(!migrate(&b));
        prop_assert_eq!(a.value(), b.value());
        prop_assert_eq!(b.change_count(), 1);
    }
}

#[test]
fn current_document_plans_nothing() {
    let migrated = MigrationChain::canonical()
        .migrate(&legacy_model("M", &[]))
        .unwrap();
    let handle = MemoryHandle::new("automerge:m", migrated.clone());
    assert!(!migrate(&handle));
    assert_eq!(handle.change_count(), 0);
    assert_eq!(handle.value(), migrated);
    assert_eq!(handle.document_id().as_str(), "automerge:m");
}

/// Tenet: a replica that a peer migrated first reports no write.
#[test]
fn stale_read_of_migrated_document_writes_nothing() {
    let legacy = legacy_model("M", &[formal(ModelJudgment::object(Uuid::from_u128(1), "A", ObType::new("Entity")))]);
    let migrated = MigrationChain::canonical().migrate(&legacy).unwrap();
    let handle = MemoryHandle::new("automerge:m", migrated.clone());

    let wrote = migrate_in_place(handle.as_ref(), &MigrationChain::canonical(), &legacy).unwrap();

    assert!(!wrote);
    assert_eq!(handle.change_count(), 0);
    assert_eq!(handle.value(), migrated);
}
