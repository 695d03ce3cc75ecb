//! Typed event vocabulary and synchronous event bus for the simulation.

#![deny(unsafe_code)]

pub mod bus;
pub mod event;

pub mod prelude {
    pub use crate::bus::{EventBus, EventBusConfig, EventBusStats, HistoryEntry, ListenerId};
    pub use crate::event::{
        CollectibleCollected, DamageDealt, DifficultyChanged, EnemySpawned, EntityKilled,
        EventKind, ExperienceGained, ItemPurchased, ItemTransferred, LevelUp, ProjectileCreated,
        ResourceGained, ResourceTransferred, SkillActivated, SkillEffectApplied,
        SkillEvolutionAvailable, SkillLevelUp, SkillPointsAwarded, WaveCompleted, WaveStarted,
    };
}
