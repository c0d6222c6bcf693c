use prio_core::models::{Collection, CollectionPermission, Team};
use prio_engine::{CollectionStore, EngineConfig, PermissionStore, TeamStore};

use crate::backend::MemoryBackend;

pub fn collection_store(seed: Vec<Collection>) -> CollectionStore<MemoryBackend<Collection>> {
    CollectionStore::new(MemoryBackend::with_records(seed), EngineConfig::default())
}

pub fn permission_store(
    seed: Vec<CollectionPermission>,
) -> PermissionStore<MemoryBackend<CollectionPermission>> {
    PermissionStore::new(MemoryBackend::with_records(seed), EngineConfig::default())
}

pub fn team_store(seed: Vec<Team>) -> TeamStore<MemoryBackend<Team>> {
    TeamStore::new(MemoryBackend::with_records(seed), EngineConfig::default())
}
