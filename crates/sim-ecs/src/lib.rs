//! Entity-component storage for the simulation core.
//!
//! Components come from a closed, fixed set (see [`component::ComponentKind`])
//! rather than an open type-erased registry, so every operation here is
//! plain safe Rust: no raw pointers, no vtables, no downcasting.

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod error;
pub mod math;
pub mod pool;
pub mod query;
pub mod snapshot;
pub mod spatial;
pub mod world;

pub mod prelude {
    pub use crate::component::{
        ActiveEffect, AiAction, AiActionKind, AiMemory, AiState, Collectible, CollectibleKind,
        Combat, Component, ComponentKind, ComponentSignature, Difficulty, DifficultyAttribute,
        DifficultyLevel, DifficultyModifier, EffectType, EnemyAi, EnemyClassification,
        EnemyTypeEntry, Experience, Health, Inventory, ItemStack, Magnet, MagneticField, Movement,
        PatrolPoint,
        PerformanceMetrics, Rarity, Rect, Reset, SkillDefinition, SkillEffect, SkillId,
        SkillInstance, SkillRequirement, SkillType, Skills, SpawnCounters, SpawnPattern, Spawner,
        StatBaseline, TargetType, Transform, Wave, Weapon, xp_curve,
    };
    pub use crate::entity::{AllocatorSnapshot, EntityAllocator, EntityId};
    pub use crate::error::EcsError;
    pub use crate::math::Vec2;
    pub use crate::pool::{Pool, PoolConfig, PoolStatistics};
    pub use crate::query::{QueryCache, QueryCacheStats};
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::spatial::{SpatialGrid, SpatialGridConfig};
    pub use crate::world::{Entity, World};
}
