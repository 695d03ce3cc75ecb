//! Error types for the entity-component store.

use thiserror::Error;

use crate::entity::EntityId;

#[derive(Debug, Error)]
pub enum EcsError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("entity {entity} has no component of kind {kind}")]
    MissingComponent { entity: EntityId, kind: &'static str },

    #[error("entity {entity} already has a component of kind {kind}")]
    DuplicateComponent { entity: EntityId, kind: &'static str },

    #[error("unknown component type {0:?}")]
    UnknownComponentType(String),

    #[error("snapshot is inconsistent: {reason}")]
    InvalidSnapshot { reason: String },
}
