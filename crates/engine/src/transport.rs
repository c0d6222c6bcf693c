use async_trait::async_trait;
use prio_core::Operation;
use thiserror::Error;

/// One page of a backend read.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    pub data: Vec<E>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub total: Option<u64>,
}

impl<E> Page<E> {
    /// A single page holding the whole result set.
    pub fn complete(data: Vec<E>) -> Self {
        let total = Some(data.len() as u64);
        Self {
            data,
            cursor: None,
            has_more: false,
            total,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The backend a store reads from and writes to.
///
/// `write` answers with the entity as the backend now holds it, or `None`
/// when there is nothing to return (deletes).
#[async_trait]
pub trait Transport<E>: Send + Sync
where
    E: Send + Sync,
{
    type Query: Send + Sync;

    async fn read(
        &self,
        query: &Self::Query,
        cursor: Option<&str>,
    ) -> Result<Page<E>, TransportError>;

    async fn write(&self, operation: &Operation<E>) -> Result<Option<E>, TransportError>;
}
