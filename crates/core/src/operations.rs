use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    AddRelated,
    RemoveRelated,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::AddRelated => "add_related",
            Self::RemoveRelated => "remove_related",
        }
    }

    pub fn is_relation_edit(&self) -> bool {
        matches!(self, Self::AddRelated | Self::RemoveRelated)
    }
}

/// A local mutation intent that the backend has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation<E> {
    pub kind: OperationKind,
    pub entity: E,
    /// Second entity referenced by a relationship edit.
    pub auxiliary_id: Option<String>,
}

impl<E> Operation<E> {
    pub fn create(entity: E) -> Self {
        Self {
            kind: OperationKind::Create,
            entity,
            auxiliary_id: None,
        }
    }

    pub fn update(entity: E) -> Self {
        Self {
            kind: OperationKind::Update,
            entity,
            auxiliary_id: None,
        }
    }

    pub fn delete(entity: E) -> Self {
        Self {
            kind: OperationKind::Delete,
            entity,
            auxiliary_id: None,
        }
    }

    pub fn add_related(entity: E, related_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::AddRelated,
            entity,
            auxiliary_id: Some(related_id.into()),
        }
    }

    pub fn remove_related(entity: E, related_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::RemoveRelated,
            entity,
            auxiliary_id: Some(related_id.into()),
        }
    }
}

impl<E: Entity> Operation<E> {
    pub fn entity_id(&self) -> Option<&str> {
        self.entity.id()
    }

    /// The related id a relationship edit acts on.
    pub fn related_id(&self) -> Result<&str, CoreError> {
        self.auxiliary_id.as_deref().ok_or_else(|| {
            CoreError::InvalidOperation(format!(
                "{} on {:?} has no auxiliary id",
                self.kind.as_str(),
                self.entity_id()
            ))
        })
    }

    /// Apply this relationship edit to `target`'s related list. Returns
    /// `Ok(false)` when `target` keeps no such list.
    pub fn apply_related(&self, target: &mut E) -> Result<bool, CoreError> {
        if !self.kind.is_relation_edit() {
            return Err(CoreError::InvalidOperation(format!(
                "{} is not a relationship edit",
                self.kind.as_str()
            )));
        }
        let related_id = self.related_id()?;
        let Some(related) = target.related_ids_mut() else {
            return Ok(false);
        };

        if self.kind == OperationKind::AddRelated {
            if !related.iter().any(|r| r == related_id) {
                related.push(related_id.to_string());
            }
        } else {
            related.retain(|r| r != related_id);
        }
        Ok(true)
    }
}
