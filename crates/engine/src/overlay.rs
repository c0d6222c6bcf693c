use std::borrow::Cow;

use log::{debug, error};
use prio_core::{Entity, Operation, OperationKind};
use prio_storage::OperationStore;

use crate::error::ProjectionError;

/// Render the backend list with every pending operation applied on top.
///
/// Operations are applied in fixed phases (creates, updates, relationship
/// edits, deletes) no matter what order they were merged in. Within a phase
/// they run in key order, so entries appended to the list land in the same
/// place whatever the merge order was. With no pending operations the
/// backend slice is returned as is. If any phase fails the whole overlay is
/// dropped and the backend slice is returned unmodified.
pub fn project<'a, E: Entity>(backend: &'a [E], operations: &OperationStore<E>) -> Cow<'a, [E]> {
    if operations.is_empty() {
        return Cow::Borrowed(backend);
    }

    match apply_pending(backend, operations) {
        Ok(projected) => Cow::Owned(projected),
        Err(e) => {
            error!(
                "overlay projection failed, showing backend list ({} pending dropped): {e}",
                operations.len()
            );
            Cow::Borrowed(backend)
        }
    }
}

fn apply_pending<E: Entity>(
    backend: &[E],
    operations: &OperationStore<E>,
) -> Result<Vec<E>, ProjectionError> {
    let mut working = backend.to_vec();

    for op in of_kind(operations, &[OperationKind::Create]) {
        apply_create(&mut working, op);
    }
    for op in of_kind(operations, &[OperationKind::Update]) {
        apply_update(&mut working, op)?;
    }
    for op in of_kind(operations, RELATION_EDITS) {
        apply_relation_edit(&mut working, op)?;
    }
    for op in of_kind(operations, &[OperationKind::Delete]) {
        apply_delete(&mut working, op)?;
    }

    Ok(working)
}

const RELATION_EDITS: &[OperationKind] = &[OperationKind::AddRelated, OperationKind::RemoveRelated];

fn of_kind<'s, E: Entity>(
    operations: &'s OperationStore<E>,
    kinds: &[OperationKind],
) -> Vec<&'s Operation<E>> {
    let mut selected: Vec<_> = operations
        .iter()
        .filter(|(_, op)| kinds.contains(&op.kind))
        .collect();
    selected.sort_by(|(a, _), (b, _)| a.cmp(b));
    selected.into_iter().map(|(_, op)| op).collect()
}

fn position_of<E: Entity>(working: &[E], id: &str) -> Option<usize> {
    working.iter().position(|e| e.id() == Some(id))
}

fn required_id<E: Entity>(op: &Operation<E>) -> Result<&str, ProjectionError> {
    op.entity_id().ok_or(ProjectionError::MissingEntityId {
        kind: op.kind.as_str(),
    })
}

fn apply_create<E: Entity>(working: &mut Vec<E>, op: &Operation<E>) {
    // A refetch may already contain the created entity
    if let Some(id) = op.entity_id() {
        if position_of(working, id).is_some() {
            return;
        }
    }
    working.push(op.entity.clone());
}

fn apply_update<E: Entity>(working: &mut Vec<E>, op: &Operation<E>) -> Result<(), ProjectionError> {
    let id = required_id(op)?;
    match position_of(working, id) {
        Some(i) => working[i] = op.entity.clone(),
        // No backend copy yet (e.g. the create was pending and got replaced)
        None => working.push(op.entity.clone()),
    }
    Ok(())
}

fn apply_relation_edit<E: Entity>(
    working: &mut Vec<E>,
    op: &Operation<E>,
) -> Result<(), ProjectionError> {
    let id = required_id(op)?;

    let applied = match position_of(working, id) {
        Some(i) => op.apply_related(&mut working[i])?,
        None => {
            debug!("{} on {id}: parent not in view, appending it", op.kind.as_str());
            let mut parent = op.entity.clone();
            let applied = op.apply_related(&mut parent)?;
            working.push(parent);
            applied
        }
    };

    if !applied {
        return Err(ProjectionError::NoRelatedList {
            kind: op.kind.as_str(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn apply_delete<E: Entity>(working: &mut Vec<E>, op: &Operation<E>) -> Result<(), ProjectionError> {
    let id = required_id(op)?;
    working.retain(|e| e.id() != Some(id));
    Ok(())
}
