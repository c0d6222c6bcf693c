//! Records held by the collection, permission and team stores.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub event_ids: Vec<String>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            event_ids: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_events<I, S>(mut self, event_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_ids = event_ids.into_iter().map(Into::into).collect();
        self
    }
}

impl Entity for Collection {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key_hint(&self) -> String {
        self.name.clone()
    }

    fn related_ids(&self) -> Option<&[String]> {
        Some(&self.event_ids)
    }

    fn related_ids_mut(&mut self) -> Option<&mut Vec<String>> {
        Some(&mut self.event_ids)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionRole {
    Viewer,
    Editor,
    Owner,
}

impl PermissionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }
}

/// A grant of `role` on a collection to a user or team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPermission {
    pub id: Option<String>,
    pub collection_id: String,
    pub principal_id: String,
    pub role: PermissionRole,
}

impl CollectionPermission {
    pub fn new(
        collection_id: impl Into<String>,
        principal_id: impl Into<String>,
        role: PermissionRole,
    ) -> Self {
        Self {
            id: None,
            collection_id: collection_id.into(),
            principal_id: principal_id.into(),
            role,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Entity for CollectionPermission {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key_hint(&self) -> String {
        format!("{}_{}", self.principal_id, self.role.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<String>,
    pub name: String,
    pub participant_ids: Vec<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            participant_ids: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_participants<I, S>(mut self, participant_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_ids = participant_ids.into_iter().map(Into::into).collect();
        self
    }
}

impl Entity for Team {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key_hint(&self) -> String {
        self.name.clone()
    }

    fn related_ids(&self) -> Option<&[String]> {
        Some(&self.participant_ids)
    }

    fn related_ids_mut(&mut self) -> Option<&mut Vec<String>> {
        Some(&mut self.participant_ids)
    }
}
