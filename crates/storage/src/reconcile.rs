use log::{debug, warn};
use prio_core::{Entity, Operation, OperationKey, OperationKind};

use crate::store::{OperationStore, PendingOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The write failed or has not resolved.
    NoResponse,
    /// Only creates need their key promoted.
    NotCreate,
    /// The backend answered a create without assigning an id.
    MissingServerId,
    /// The issued key is gone: already promoted, or discarded by the caller.
    KeyGone,
    /// A newer operation replaced or amended the create under the same key.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Promoted(OperationKey),
    Skipped(SkipReason),
}

/// Promote the key of a confirmed create to the server-assigned id.
///
/// The entry under `issued.key` is replaced by a create of the response
/// entity under its real id. Everything else in the store is left alone.
/// Calling this twice with the same response is a no-op the second time.
pub fn reconcile<E: Entity + PartialEq>(
    store: &mut OperationStore<E>,
    response: Option<E>,
    issued: &PendingOperation<E>,
) -> ReconcileOutcome {
    let Some(response) = response else {
        debug!("reconcile skipped for {}: no response", issued.key);
        return ReconcileOutcome::Skipped(SkipReason::NoResponse);
    };

    if issued.operation.kind != OperationKind::Create {
        return ReconcileOutcome::Skipped(SkipReason::NotCreate);
    }

    let Some(server_id) = response.id().map(str::to_owned) else {
        warn!("create response for {} carries no server id", issued.key);
        return ReconcileOutcome::Skipped(SkipReason::MissingServerId);
    };

    match store.get(&issued.key) {
        None => {
            debug!("reconcile skipped for {}: key no longer pending", issued.key);
            return ReconcileOutcome::Skipped(SkipReason::KeyGone);
        }
        Some(pending) if *pending != issued.operation => {
            debug!(
                "reconcile skipped for {}: superseded by {}",
                issued.key,
                pending.kind.as_str()
            );
            return ReconcileOutcome::Skipped(SkipReason::Superseded);
        }
        Some(_) => {}
    }

    let real_key = OperationKey::real(server_id);
    let promoted = Operation::create(response);

    store.remove(&issued.key);
    store.upsert(real_key.clone(), promoted.clone());
    store.set_current(PendingOperation {
        key: real_key.clone(),
        operation: promoted,
    });

    debug!("promoted {} to {}", issued.key, real_key);
    ReconcileOutcome::Promoted(real_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_core::models::Collection;

    fn issue(
        store: &mut OperationStore<Collection>,
        op: Operation<Collection>,
    ) -> PendingOperation<Collection> {
        let key = store.merge(op.clone()).unwrap();
        PendingOperation { key, operation: op }
    }

    #[test]
    fn promotes_temp_key_to_server_id() {
        let mut store = OperationStore::new();
        let issued = issue(&mut store, Operation::create(Collection::new("New")));
        let response = Collection::new("New").with_id("42");

        let outcome = reconcile(&mut store, Some(response.clone()), &issued);

        assert_eq!(outcome, ReconcileOutcome::Promoted(OperationKey::real("42")));
        assert_eq!(store.len(), 1);
        assert!(!store.contains_key(&issued.key));
        assert!(store.keys().all(|k| !k.is_temp()));
        let op = store.get(&OperationKey::real("42")).unwrap();
        assert_eq!(op.kind, OperationKind::Create);
        assert_eq!(op.entity, response);
        assert_eq!(store.current().unwrap().key, OperationKey::real("42"));
    }

    #[test]
    fn second_reconcile_is_a_no_op() {
        let mut store = OperationStore::new();
        let issued = issue(&mut store, Operation::create(Collection::new("New")));
        let response = Collection::new("New").with_id("42");

        reconcile(&mut store, Some(response.clone()), &issued);
        let revision = store.revision();
        let outcome = reconcile(&mut store, Some(response), &issued);

        assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::KeyGone));
        assert_eq!(store.revision(), revision);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn other_pending_operations_are_untouched() {
        let mut store = OperationStore::new();
        store.merge(Operation::update(Collection::new("Old").with_id("1"))).unwrap();
        let issued = issue(&mut store, Operation::create(Collection::new("New")));
        store.merge(Operation::delete(Collection::new("Gone").with_id("2"))).unwrap();

        reconcile(&mut store, Some(Collection::new("New").with_id("42")), &issued);

        let keys: Vec<_> = store.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["1", "2", "42"]);
    }

    #[test]
    fn skips_without_response_or_for_non_creates() {
        let mut store = OperationStore::new();
        let created = issue(&mut store, Operation::create(Collection::new("New")));
        let updated = issue(&mut store, Operation::update(Collection::new("A").with_id("1")));
        let revision = store.revision();

        assert_eq!(
            reconcile(&mut store, None, &created),
            ReconcileOutcome::Skipped(SkipReason::NoResponse)
        );
        assert_eq!(
            reconcile(&mut store, Some(Collection::new("A").with_id("1")), &updated),
            ReconcileOutcome::Skipped(SkipReason::NotCreate)
        );
        assert_eq!(
            reconcile(&mut store, Some(Collection::new("New")), &created),
            ReconcileOutcome::Skipped(SkipReason::MissingServerId)
        );
        assert_eq!(store.revision(), revision);
        assert!(store.contains_key(&created.key));
    }

    #[test]
    fn superseded_create_is_not_resurrected() {
        let mut store = OperationStore::new();
        let issued = issue(
            &mut store,
            Operation::create(Collection::new("A").with_id("client-1")),
        );
        store.merge(Operation::update(Collection::new("B").with_id("client-1"))).unwrap();

        let response = Collection::new("A").with_id("client-1");
        let outcome = reconcile(&mut store, Some(response), &issued);

        assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::Superseded));
        let op = store.get(&OperationKey::real("client-1")).unwrap();
        assert_eq!(op.kind, OperationKind::Update);
        assert_eq!(op.entity.name, "B");
    }

    #[test]
    fn create_amended_by_relation_edit_keeps_the_edit() {
        let mut store = OperationStore::new();
        let issued = issue(
            &mut store,
            Operation::create(Collection::new("A").with_id("client-1")),
        );
        store
            .merge(Operation::add_related(Collection::new("A").with_id("client-1"), "e1"))
            .unwrap();

        let response = Collection::new("A").with_id("client-1");
        let outcome = reconcile(&mut store, Some(response), &issued);

        assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::Superseded));
        let op = store.get(&OperationKey::real("client-1")).unwrap();
        assert_eq!(op.kind, OperationKind::Create);
        assert_eq!(op.entity.event_ids, ["e1"]);
    }
}
