//! Gameplay systems that operate on a [`sim_ecs::world::World`] and report
//! through a [`sim_events::bus::EventBus`].
//!
//! Each system is a small struct with its own `update` method; nothing here
//! owns the world or the bus, so a host can run systems in whatever order
//! and cadence it wants (see `sim-engine` for a scheduled tick loop).

#![deny(unsafe_code)]

pub mod collection;
pub mod combat;
pub mod difficulty;
pub mod economy;
pub mod enemy_ai;
pub mod error;
pub mod movement;
pub mod progression;
pub mod skill;
pub mod spawner;

pub mod prelude {
    pub use crate::collection::CollectionSystem;
    pub use crate::combat::CombatSystem;
    pub use crate::difficulty::DifficultySystem;
    pub use crate::economy::{DropEntry, EconomySystem, ShopItem};
    pub use crate::enemy_ai::EnemyAiSystem;
    pub use crate::error::SystemError;
    pub use crate::movement::MovementSystem;
    pub use crate::progression::ProgressionSystem;
    pub use crate::skill::{default_skill_database, SkillSystem, SkillSystemConfig};
    pub use crate::spawner::SpawnerSystem;
}
