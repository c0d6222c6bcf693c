use prio_core::Operation;
use prio_core::models::Collection;

use crate::transport::Transport;
use crate::{EngineError, EntityStore};

pub type CollectionStore<T> = EntityStore<Collection, T>;

impl<T: Transport<Collection>> EntityStore<Collection, T> {
    pub async fn create_collection(
        &self,
        collection: Collection,
    ) -> Result<Option<Collection>, EngineError> {
        self.write(Operation::create(collection)).await
    }

    pub async fn update_collection(
        &self,
        collection: Collection,
    ) -> Result<Option<Collection>, EngineError> {
        self.write(Operation::update(collection)).await
    }

    pub async fn delete_collection(&self, collection: Collection) -> Result<(), EngineError> {
        self.write(Operation::delete(collection)).await?;
        Ok(())
    }

    /// Put `event_id` into the collection.
    pub async fn add_event(
        &self,
        collection: Collection,
        event_id: impl Into<String>,
    ) -> Result<Option<Collection>, EngineError> {
        self.write(Operation::add_related(collection, event_id)).await
    }

    pub async fn remove_event(
        &self,
        collection: Collection,
        event_id: impl Into<String>,
    ) -> Result<Option<Collection>, EngineError> {
        self.write(Operation::remove_related(collection, event_id)).await
    }
}
