pub mod entity;
pub mod error;
pub mod ids;
pub mod models;
pub mod operations;

pub use entity::Entity;
pub use error::CoreError;
pub use ids::{OperationKey, TempKeyGenerator};
pub use operations::{Operation, OperationKind};
