//! Error type shared by every gameplay system.

use sim_ecs::prelude::{EcsError, EntityId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error("entity {entity} is missing its {kind} component")]
    MissingComponent {
        entity: EntityId,
        kind: &'static str,
    },

    #[error("unknown skill id {0:?}")]
    UnknownSkill(String),

    #[error("unknown shop item id {0:?}")]
    UnknownShopItem(String),

    #[error("insufficient {resource}: have {have}, need {need}")]
    InsufficientResource {
        resource: String,
        have: f64,
        need: f64,
    },

    #[error("skill {skill_id:?} for entity {entity} is still on cooldown for another {remaining_ms}ms")]
    OnCooldown {
        entity: EntityId,
        skill_id: String,
        remaining_ms: u64,
    },

    #[error("skill {skill_id:?} is not an active skill on entity {entity}")]
    NotActive { entity: EntityId, skill_id: String },

    #[error("requirements not met to evolve entity {entity} into skill {skill_id:?}")]
    RequirementsNotMet { entity: EntityId, skill_id: String },

    #[error("skill {skill_id:?} is not available for evolution on entity {entity}")]
    EvolutionUnavailable { entity: EntityId, skill_id: String },
}
