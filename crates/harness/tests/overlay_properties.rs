use std::borrow::Cow;

use prio_core::models::Collection;
use prio_core::{Operation, OperationKey};
use prio_engine::project;
use prio_storage::{OperationStore, PendingOperation, ReconcileOutcome, StoreError, reconcile};

fn named(id: &str, name: &str) -> Collection {
    Collection::new(name).with_id(id)
}

fn bare(id: &str) -> Collection {
    Collection::new("").with_id(id)
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn empty_store_projects_to_the_same_list() {
    let store = OperationStore::<Collection>::new();
    for backend in [vec![], vec![bare("1")], vec![bare("1"), bare("2"), bare("3")]] {
        let projected = project(&backend, &store);
        assert!(matches!(projected, Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*projected, backend.as_slice()));
    }
}

#[test]
fn projection_ignores_merge_order_across_kinds() -> Result<(), Box<dyn std::error::Error>> {
    let backend = vec![named("1", "A"), named("2", "B"), named("3", "C")];
    let ops = [
        Operation::delete(named("2", "B")),
        Operation::update(named("3", "C2")),
        Operation::create(named("4", "D")),
        Operation::add_related(named("1", "A"), "e1"),
    ];

    let mut forward = OperationStore::new();
    for op in ops.iter().cloned() {
        forward.merge(op)?;
    }
    let mut reverse = OperationStore::new();
    for op in ops.iter().rev().cloned() {
        reverse.merge(op)?;
    }

    let expected = vec![
        named("1", "A").with_events(["e1"]),
        named("3", "C2"),
        named("4", "D"),
    ];
    assert_eq!(*project(&backend, &forward), *expected);
    assert_eq!(*project(&backend, &reverse), *expected);
    Ok(())
}

#[test]
fn create_then_delete_nets_to_absent() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = OperationStore::new();
    store.merge(Operation::create(named("k", "Ghost")))?;
    store.merge(Operation::delete(named("k", "Ghost")))?;

    let backend = vec![bare("1")];
    let projected = project(&backend, &store);
    assert!(projected.iter().all(|c| c.id.as_deref() != Some("k")));
    assert_eq!(projected.len(), 1);
    Ok(())
}

#[test]
fn update_then_delete_nets_to_absent() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = OperationStore::new();
    store.merge(Operation::update(named("1", "Renamed")))?;
    store.merge(Operation::delete(named("1", "Renamed")))?;

    assert!(project(&[named("1", "A")], &store).is_empty());
    Ok(())
}

#[test]
fn temp_key_promotion_leaves_one_real_entry() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = OperationStore::new();
    let operation = Operation::create(Collection::new("Draft"));
    let key = store.merge(operation.clone())?;
    let issued = PendingOperation { key, operation };

    let outcome = reconcile(&mut store, Some(named("R", "Draft")), &issued);
    assert_eq!(outcome, ReconcileOutcome::Promoted(OperationKey::real("R")));
    assert_eq!(store.len(), 1);
    assert!(store.keys().all(|k| !k.is_temp()));
    assert!(store.contains_key(&OperationKey::real("R")));

    // Shown once whether or not the backend already has it
    for backend in [vec![], vec![named("R", "Draft")], vec![bare("0"), named("R", "Draft")]] {
        let projected = project(&backend, &store);
        let hits = projected.iter().filter(|c| c.id.as_deref() == Some("R")).count();
        assert_eq!(hits, 1, "backend {backend:?}");
    }
    Ok(())
}

#[test]
fn last_update_wins() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = OperationStore::new();
    store.merge(Operation::update(named("1", "First")))?;
    store.merge(Operation::update(named("1", "Second")))?;

    assert_eq!(store.len(), 1);
    assert_eq!(*project(&[named("1", "A")], &store), [named("1", "Second")]);
    Ok(())
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_update_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let backend = vec![named("1", "A")];
    let mut store = OperationStore::new();
    store.merge(Operation::update(named("1", "B")))?;

    assert_eq!(*project(&backend, &store), [named("1", "B")]);
    Ok(())
}

#[test]
fn scenario_create_reconcile_refetch() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = OperationStore::new();
    let operation = Operation::create(Collection::new("New"));
    let key = store.merge(operation.clone())?;
    assert!(key.as_str().starts_with("temp-New-"));

    let empty: Vec<Collection> = Vec::new();
    assert_eq!(*project(&empty, &store), [Collection::new("New")]);

    let issued = PendingOperation { key, operation };
    reconcile(&mut store, Some(named("42", "New")), &issued);
    let keys: Vec<_> = store.keys().cloned().collect();
    assert_eq!(keys, [OperationKey::real("42")]);

    let refetched = vec![named("42", "New")];
    assert_eq!(*project(&refetched, &store), [named("42", "New")]);
    Ok(())
}

#[test]
fn scenario_delete_removes() -> Result<(), Box<dyn std::error::Error>> {
    let backend = vec![bare("1"), bare("2")];
    let mut store = OperationStore::new();
    store.merge(Operation::delete(bare("1")))?;

    assert_eq!(*project(&backend, &store), [bare("2")]);
    Ok(())
}

#[test]
fn scenario_merge_without_operation() {
    let mut store = OperationStore::<Collection>::new();
    match store.merge(None::<Operation<Collection>>) {
        Err(StoreError::MissingOperation) => {}
        other => panic!("expected MissingOperation, got {other:?}"),
    }
}
