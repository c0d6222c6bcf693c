use prio_core::CoreError;
use prio_storage::StoreError;
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Raised inside the overlay projector. Never escapes `project`, which falls
/// back to the backend list instead.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("pending {kind} has no entity id")]
    MissingEntityId { kind: &'static str },

    #[error("{kind} on {id}: entity has no related list")]
    NoRelatedList { kind: &'static str, id: String },
}
