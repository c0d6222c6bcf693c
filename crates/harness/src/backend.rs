use async_trait::async_trait;
use parking_lot::Mutex;
use prio_core::models::{Collection, CollectionPermission, Team};
use prio_core::{Entity, Operation, OperationKind};
use prio_engine::{Page, Transport, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// An entity the in-memory backend can assign an id to.
pub trait Record: Entity + Send + Sync {
    fn assign_id(&mut self, id: String);
}

impl Record for Collection {
    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Record for CollectionPermission {
    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Record for Team {
    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

struct BackendState<E> {
    records: Vec<E>,
    writes: Vec<Operation<E>>,
    fail_next: Option<TransportError>,
    omit_ids: bool,
}

/// Backend stand-in: pages by offset cursor, assigns UUIDv7 ids on create,
/// and can hold writes or a single read until released to exercise
/// in-flight states.
pub struct MemoryBackend<E> {
    state: Mutex<BackendState<E>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    waiting: AtomicUsize,
    hold_read: AtomicBool,
    held_read: Mutex<Option<Arc<Semaphore>>>,
}

impl<E: Record + Clone> MemoryBackend<E> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<E>) -> Self {
        Self {
            state: Mutex::new(BackendState {
                records,
                writes: Vec::new(),
                fail_next: None,
                omit_ids: false,
            }),
            gate: Mutex::new(None),
            waiting: AtomicUsize::new(0),
            hold_read: AtomicBool::new(false),
            held_read: Mutex::new(None),
        }
    }

    pub fn records(&self) -> Vec<E> {
        self.state.lock().records.clone()
    }

    /// Operations received so far, in arrival order.
    pub fn writes(&self) -> Vec<Operation<E>> {
        self.state.lock().writes.clone()
    }

    /// Fail the next write with `error`.
    pub fn fail_next_write(&self, error: TransportError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Answer creates without assigning an id.
    pub fn omit_ids(&self, omit: bool) {
        self.state.lock().omit_ids = omit;
    }

    /// Park every following write until `release` lets it through.
    pub fn hold_writes(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, writes: usize) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(writes);
        }
    }

    /// Writes currently parked by `hold_writes`.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Park the next read until `release_read`. Reads after it pass freely.
    pub fn hold_next_read(&self) {
        self.hold_read.store(true, Ordering::SeqCst);
    }

    pub fn read_held(&self) -> bool {
        self.held_read.lock().is_some()
    }

    pub fn release_read(&self) {
        if let Some(gate) = self.held_read.lock().take() {
            gate.add_permits(1);
        }
    }

    fn apply(&self, operation: &Operation<E>) -> Result<Option<E>, TransportError> {
        let mut state = self.state.lock();
        state.writes.push(operation.clone());
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }

        let missing = || TransportError::Rejected(format!("{:?} not found", operation.entity_id()));

        match operation.kind {
            OperationKind::Create => {
                let mut created = operation.entity.clone();
                if created.id().is_none() && !state.omit_ids {
                    created.assign_id(Uuid::now_v7().to_string());
                }
                if created.id().is_some() {
                    state.records.push(created.clone());
                }
                Ok(Some(created))
            }
            OperationKind::Update => {
                let i = position_of(&state.records, operation.entity_id()).ok_or_else(missing)?;
                state.records[i] = operation.entity.clone();
                Ok(Some(operation.entity.clone()))
            }
            OperationKind::Delete => {
                let i = position_of(&state.records, operation.entity_id()).ok_or_else(missing)?;
                state.records.remove(i);
                Ok(None)
            }
            OperationKind::AddRelated | OperationKind::RemoveRelated => {
                let related_id = operation
                    .related_id()
                    .map_err(|e| TransportError::Malformed(e.to_string()))?
                    .to_string();
                let i = position_of(&state.records, operation.entity_id()).ok_or_else(missing)?;
                let parent = &mut state.records[i];
                let related = parent.related_ids_mut().ok_or_else(|| {
                    TransportError::Rejected("entity has no related list".into())
                })?;
                if operation.kind == OperationKind::AddRelated {
                    if !related.contains(&related_id) {
                        related.push(related_id);
                    }
                } else {
                    related.retain(|r| *r != related_id);
                }
                Ok(Some(parent.clone()))
            }
        }
    }
}

fn position_of<E: Entity>(records: &[E], id: Option<&str>) -> Option<usize> {
    let id = id?;
    records.iter().position(|r| r.id() == Some(id))
}

impl<E: Record + Clone> Default for MemoryBackend<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Record + Clone> Transport<E> for MemoryBackend<E> {
    type Query = ListQuery;

    async fn read(
        &self,
        query: &ListQuery,
        cursor: Option<&str>,
    ) -> Result<Page<E>, TransportError> {
        if self.hold_read.swap(false, Ordering::SeqCst) {
            let gate = Arc::new(Semaphore::new(0));
            *self.held_read.lock() = Some(gate.clone());
            gate.acquire()
                .await
                .map_err(|_| TransportError::Unavailable("backend shut down".into()))?
                .forget();
        }

        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| TransportError::Malformed(format!("bad cursor {c:?}")))?,
            None => 0,
        };

        let state = self.state.lock();
        let total = state.records.len();
        let end = (offset + query.page_size).min(total);
        let data = state.records.get(offset..end).unwrap_or_default().to_vec();
        let has_more = end < total;

        Ok(Page {
            data,
            cursor: has_more.then(|| end.to_string()),
            has_more,
            total: Some(total as u64),
        })
    }

    async fn write(&self, operation: &Operation<E>) -> Result<Option<E>, TransportError> {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let permit = gate.acquire().await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            permit
                .map_err(|_| TransportError::Unavailable("backend shut down".into()))?
                .forget();
        }
        self.apply(operation)
    }
}
