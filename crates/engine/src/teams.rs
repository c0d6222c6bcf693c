use prio_core::Operation;
use prio_core::models::Team;

use crate::transport::Transport;
use crate::{EngineError, EntityStore};

pub type TeamStore<T> = EntityStore<Team, T>;

impl<T: Transport<Team>> EntityStore<Team, T> {
    pub async fn create_team(&self, team: Team) -> Result<Option<Team>, EngineError> {
        self.write(Operation::create(team)).await
    }

    pub async fn update_team(&self, team: Team) -> Result<Option<Team>, EngineError> {
        self.write(Operation::update(team)).await
    }

    pub async fn delete_team(&self, team: Team) -> Result<(), EngineError> {
        self.write(Operation::delete(team)).await?;
        Ok(())
    }

    pub async fn add_participant(
        &self,
        team: Team,
        user_id: impl Into<String>,
    ) -> Result<Option<Team>, EngineError> {
        self.write(Operation::add_related(team, user_id)).await
    }

    pub async fn remove_participant(
        &self,
        team: Team,
        user_id: impl Into<String>,
    ) -> Result<Option<Team>, EngineError> {
        self.write(Operation::remove_related(team, user_id)).await
    }
}
