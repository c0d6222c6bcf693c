use log::debug;
use prio_core::{Entity, Operation, OperationKey, OperationKind, TempKeyGenerator};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperation<E> {
    pub key: OperationKey,
    pub operation: Operation<E>,
}

/// Pending operations keyed by entity id (or temporary key), at most one per
/// key, in insertion order.
///
/// Overwriting a key keeps its position; removing a key and inserting it
/// again moves it to the end. Every mutation bumps `revision`, which is what
/// reactive adapters compare to decide whether to re-render.
pub struct OperationStore<E> {
    entries: Vec<PendingOperation<E>>,
    current: Option<PendingOperation<E>>,
    temp_keys: TempKeyGenerator,
    revision: u64,
}

impl<E: Entity> Default for OperationStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> OperationStore<E> {
    pub fn new() -> Self {
        Self::with_temp_keys(TempKeyGenerator::default())
    }

    pub fn with_temp_keys(temp_keys: TempKeyGenerator) -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            temp_keys,
            revision: 0,
        }
    }

    /// Record `incoming` as the latest local intent for its entity, replacing
    /// whatever was pending under the same key. Returns the key used.
    ///
    /// `current()` always reports `incoming` as issued, even when it was
    /// folded into a pending create or update.
    pub fn merge(
        &mut self,
        incoming: impl Into<Option<Operation<E>>>,
    ) -> Result<OperationKey, StoreError> {
        let incoming = incoming.into().ok_or(StoreError::MissingOperation)?;

        let key = match incoming.entity_id() {
            Some(id) => OperationKey::real(id),
            None if incoming.kind == OperationKind::Create => {
                self.temp_keys.next_key(&incoming.entity.key_hint())?
            }
            None => return Err(StoreError::MissingIdentity { kind: incoming.kind }),
        };

        let stored = self
            .fold_relation_edit(&key, &incoming)
            .unwrap_or_else(|| incoming.clone());
        self.current = Some(PendingOperation {
            key: key.clone(),
            operation: incoming,
        });
        self.upsert(key.clone(), stored);
        Ok(key)
    }

    /// A relationship edit landing on a pending create or update is applied
    /// to that entity, which keeps its kind. Anything else is replaced.
    fn fold_relation_edit(
        &self,
        key: &OperationKey,
        edit: &Operation<E>,
    ) -> Option<Operation<E>> {
        if !edit.kind.is_relation_edit() {
            return None;
        }
        let pending = self.get(key)?;
        if !matches!(pending.kind, OperationKind::Create | OperationKind::Update) {
            return None;
        }

        let mut folded = pending.clone();
        match edit.apply_related(&mut folded.entity) {
            Ok(true) => {
                debug!(
                    "{} folded into pending {} at {key}",
                    edit.kind.as_str(),
                    folded.kind.as_str()
                );
                Some(folded)
            }
            _ => None,
        }
    }

    pub fn get(&self, key: &OperationKey) -> Option<&Operation<E>> {
        self.position(key).map(|i| &self.entries[i].operation)
    }

    pub fn contains_key(&self, key: &OperationKey) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OperationKey, &Operation<E>)> {
        self.entries.iter().map(|p| (&p.key, &p.operation))
    }

    pub fn keys(&self) -> impl Iterator<Item = &OperationKey> {
        self.entries.iter().map(|p| &p.key)
    }

    /// The operation most recently issued through `merge` or promoted by a
    /// reconcile.
    pub fn current(&self) -> Option<&PendingOperation<E>> {
        self.current.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop the pending operation at `key`, e.g. to roll back a failed write.
    pub fn discard(&mut self, key: &OperationKey) -> Option<Operation<E>> {
        let removed = self.remove(key);
        if removed.is_some() {
            debug!("discarded pending operation at {key}");
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.revision += 1;
        }
        self.current = None;
    }

    pub(crate) fn set_current(&mut self, pending: PendingOperation<E>) {
        self.current = Some(pending);
    }

    pub(crate) fn upsert(&mut self, key: OperationKey, operation: Operation<E>) {
        match self.position(&key) {
            Some(i) => self.entries[i].operation = operation,
            None => self.entries.push(PendingOperation { key, operation }),
        }
        self.revision += 1;
    }

    pub(crate) fn remove(&mut self, key: &OperationKey) -> Option<Operation<E>> {
        let i = self.position(key)?;
        self.revision += 1;
        Some(self.entries.remove(i).operation)
    }

    fn position(&self, key: &OperationKey) -> Option<usize> {
        self.entries.iter().position(|p| &p.key == key)
    }
}

impl<E: Entity + PartialEq> OperationStore<E> {
    /// Remove operations a fresh backend read already reflects.
    ///
    /// Creates and updates go once the backend copy equals the pending
    /// entity. Deletes go only when `complete` is set (the read covered every
    /// page) and the id is absent. Relationship edits go once the parent's
    /// related list shows them. Temp-keyed entries are never pruned.
    pub fn prune_confirmed(&mut self, backend: &[E], complete: bool) -> usize {
        let find = |id: &str| backend.iter().find(|e| e.id() == Some(id));

        let before = self.entries.len();
        self.entries.retain(|pending| {
            let OperationKey::Real(id) = &pending.key else {
                return true;
            };
            let op = &pending.operation;
            let confirmed = match op.kind {
                OperationKind::Create | OperationKind::Update => {
                    find(id.as_str()).is_some_and(|remote| *remote == op.entity)
                }
                OperationKind::Delete => complete && find(id.as_str()).is_none(),
                OperationKind::AddRelated | OperationKind::RemoveRelated => {
                    let listed = find(id.as_str())
                        .and_then(|remote| remote.related_ids())
                        .zip(op.auxiliary_id.as_deref())
                        .map(|(related, aux)| related.iter().any(|r| r == aux));
                    match (op.kind, listed) {
                        (OperationKind::AddRelated, Some(present)) => present,
                        (OperationKind::RemoveRelated, Some(present)) => !present,
                        _ => false,
                    }
                }
            };
            !confirmed
        });

        let pruned = before - self.entries.len();
        if pruned > 0 {
            self.revision += 1;
            debug!("pruned {pruned} confirmed operation(s), {} pending", self.entries.len());
        }
        pruned
    }
}
