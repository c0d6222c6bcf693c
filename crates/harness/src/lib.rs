pub mod backend;
pub mod fixtures;

pub use backend::{ListQuery, MemoryBackend, Record};
pub use fixtures::{collection_store, permission_store, team_store};
