use prio_core::Operation;
use prio_core::models::CollectionPermission;

use crate::transport::Transport;
use crate::{EngineError, EntityStore};

pub type PermissionStore<T> = EntityStore<CollectionPermission, T>;

impl<T: Transport<CollectionPermission>> EntityStore<CollectionPermission, T> {
    /// Grant a new permission, or change the role of an existing grant.
    pub async fn set_permission(
        &self,
        grant: CollectionPermission,
    ) -> Result<Option<CollectionPermission>, EngineError> {
        let operation = if grant.id.is_some() {
            Operation::update(grant)
        } else {
            Operation::create(grant)
        };
        self.write(operation).await
    }

    pub async fn remove_permission(&self, grant: CollectionPermission) -> Result<(), EngineError> {
        self.write(Operation::delete(grant)).await?;
        Ok(())
    }

    /// Grants on one collection, as currently rendered.
    pub fn permissions_for(&self, collection_id: &str) -> Vec<CollectionPermission> {
        self.data()
            .into_iter()
            .filter(|grant| grant.collection_id == collection_id)
            .collect()
    }
}
