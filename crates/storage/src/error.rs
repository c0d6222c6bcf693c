use prio_core::{CoreError, OperationKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no operation supplied to merge")]
    MissingOperation,

    #[error("an ID is required for non-create operations (got {})", .kind.as_str())]
    MissingIdentity { kind: OperationKind },

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}
