pub mod error;
pub mod reconcile;
pub mod store;

pub use error::StoreError;
pub use reconcile::{ReconcileOutcome, SkipReason, reconcile};
pub use store::{OperationStore, PendingOperation};
