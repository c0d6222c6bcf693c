pub mod collections;
pub mod error;
pub mod overlay;
pub mod permissions;
pub mod settings;
pub mod teams;
pub mod transport;

pub use collections::CollectionStore;
pub use error::{EngineError, ProjectionError};
pub use overlay::project;
pub use permissions::PermissionStore;
pub use settings::EngineConfig;
pub use teams::TeamStore;
pub use transport::{Page, Transport, TransportError};

use log::{debug, warn};
use parking_lot::Mutex;
use prio_core::{Entity, Operation, OperationKey};
use prio_storage::{OperationStore, PendingOperation, ReconcileOutcome, reconcile};

/// The last backend read the store has accepted.
#[derive(Debug, Clone)]
pub struct Snapshot<E> {
    pub entities: Vec<E>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub total: Option<u64>,
}

impl<E> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            cursor: None,
            has_more: false,
            total: None,
        }
    }
}

struct StoreState<E> {
    operations: OperationStore<E>,
    snapshot: Snapshot<E>,
    /// Bumped whenever a read replaces the snapshot.
    generation: u64,
}

/// Read and write path for one kind of entity.
///
/// Writes are merged into the pending operation store before the network
/// call starts, so `data()` reflects them immediately. The state lock is
/// never held across an await, so several writes may be in flight at once.
pub struct EntityStore<E, T> {
    transport: T,
    config: EngineConfig,
    state: Mutex<StoreState<E>>,
}

impl<E, T> EntityStore<E, T>
where
    E: Entity + PartialEq + Send + Sync,
    T: Transport<E>,
{
    pub fn new(transport: T, config: EngineConfig) -> Self {
        let operations = OperationStore::with_temp_keys(config.temp_key_generator());
        Self {
            transport,
            config,
            state: Mutex::new(StoreState {
                operations,
                snapshot: Snapshot::default(),
                generation: 0,
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Backend read, passed straight through.
    pub async fn read(
        &self,
        query: &T::Query,
        cursor: Option<&str>,
    ) -> Result<Page<E>, EngineError> {
        Ok(self.transport.read(query, cursor).await?)
    }

    /// Replace the snapshot with the first page of `query`.
    pub async fn refresh(&self, query: &T::Query) -> Result<usize, EngineError> {
        let page = self.read(query, None).await?;
        Ok(self.apply_read(page))
    }

    /// Append the next page to the snapshot. No-op once the read is complete.
    ///
    /// If another read replaced the snapshot while the page was in flight,
    /// the page is dropped since its cursor belongs to the old listing.
    pub async fn load_more(&self, query: &T::Query) -> Result<usize, EngineError> {
        let (cursor, generation) = {
            let state = self.state.lock();
            if !state.snapshot.has_more {
                return Ok(0);
            }
            (state.snapshot.cursor.clone(), state.generation)
        };

        let page = self.read(query, cursor.as_deref()).await?;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(
                "dropping page at {:?}: snapshot replaced while it was loading",
                cursor
            );
            return Ok(state.snapshot.entities.len());
        }
        let mut accumulated = std::mem::take(&mut state.snapshot.entities);
        accumulated.extend(page.data);
        Ok(self.accept(
            &mut state,
            Page {
                data: accumulated,
                ..page
            },
        ))
    }

    /// Accept `page` as the new backend truth, replacing the previous
    /// snapshot wholesale. Returns the number of entities now held.
    pub fn apply_read(&self, page: Page<E>) -> usize {
        let mut state = self.state.lock();
        self.accept(&mut state, page)
    }

    fn accept(&self, state: &mut StoreState<E>, page: Page<E>) -> usize {
        state.generation += 1;
        state.snapshot = Snapshot {
            entities: page.data,
            cursor: page.cursor,
            has_more: page.has_more,
            total: page.total,
        };

        if self.config.prune_on_refetch {
            let complete = !state.snapshot.has_more;
            state
                .operations
                .prune_confirmed(&state.snapshot.entities, complete);
        }
        state.snapshot.entities.len()
    }

    pub fn snapshot(&self) -> Snapshot<E> {
        self.state.lock().snapshot.clone()
    }

    /// The list the UI renders: the snapshot with pending operations applied.
    pub fn data(&self) -> Vec<E> {
        let state = self.state.lock();
        project(&state.snapshot.entities, &state.operations).into_owned()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().operations.revision()
    }

    pub fn pending(&self) -> Vec<PendingOperation<E>> {
        self.state
            .lock()
            .operations
            .iter()
            .map(|(key, operation)| PendingOperation {
                key: key.clone(),
                operation: operation.clone(),
            })
            .collect()
    }

    pub fn current(&self) -> Option<PendingOperation<E>> {
        self.state.lock().operations.current().cloned()
    }

    /// Apply `operation` optimistically without sending it.
    pub fn merge(&self, operation: Operation<E>) -> Result<PendingOperation<E>, EngineError> {
        let key = self.state.lock().operations.merge(operation.clone())?;
        Ok(PendingOperation { key, operation })
    }

    /// Merge `operation`, send it, and promote its key once the backend
    /// confirms a create.
    ///
    /// A failed write leaves the optimistic operation in place; use
    /// [`EntityStore::rollback`] to withdraw it.
    pub async fn write(&self, operation: Operation<E>) -> Result<Option<E>, EngineError> {
        let issued = self.merge(operation)?;

        let response = match self.transport.write(&issued.operation).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "{} for {} failed, optimistic state kept: {e}",
                    issued.operation.kind.as_str(),
                    issued.key
                );
                return Err(e.into());
            }
        };

        let outcome = reconcile(
            &mut self.state.lock().operations,
            response.clone(),
            &issued,
        );
        if let ReconcileOutcome::Skipped(reason) = outcome {
            debug!(
                "{} for {} confirmed ({reason:?})",
                issued.operation.kind.as_str(),
                issued.key
            );
        }
        Ok(response)
    }

    /// Withdraw the pending operation at `key`.
    pub fn rollback(&self, key: &OperationKey) -> Option<Operation<E>> {
        self.state.lock().operations.discard(key)
    }
}
