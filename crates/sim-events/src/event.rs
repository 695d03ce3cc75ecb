//! The closed vocabulary of simulation events.
//!
//! Rather than events carrying an arbitrary string type and a loosely typed
//! payload map, [`EventKind`] is a tagged union: every event the gameplay
//! systems emit has a concrete, named payload struct. `Custom` remains as an
//! escape hatch for host-defined events the simulation core doesn't know
//! about, carrying a name plus a `serde_json::Value` payload.

use sim_ecs::prelude::{CollectibleKind, DifficultyLevel, EffectType, EntityId, SkillId, TargetType, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageDealt {
    pub source: EntityId,
    pub target: EntityId,
    pub amount: f32,
    pub is_critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKilled {
    pub entity: EntityId,
    pub killer: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceGained {
    pub entity: EntityId,
    pub amount: f64,
    pub total_xp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUp {
    pub entity: EntityId,
    pub new_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGained {
    pub entity: EntityId,
    pub resource: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTransferred {
    pub from: EntityId,
    pub to: EntityId,
    pub resource: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTransferred {
    pub from: EntityId,
    pub to: EntityId,
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPurchased {
    pub buyer: EntityId,
    pub item_id: String,
    pub cost: f64,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectibleCollected {
    pub collector: EntityId,
    pub collectible: EntityId,
    pub kind: CollectibleKind,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillActivated {
    pub caster: EntityId,
    pub skill_id: SkillId,
    pub target_type: TargetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEffectApplied {
    pub source: EntityId,
    pub target: EntityId,
    pub skill_id: SkillId,
    pub effect_type: EffectType,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillLevelUp {
    pub entity: EntityId,
    pub skill_id: SkillId,
    pub new_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEvolutionAvailable {
    pub entity: EntityId,
    pub skill_id: SkillId,
    pub evolutions: Vec<SkillId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillPointsAwarded {
    pub entity: EntityId,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileCreated {
    pub source: EntityId,
    pub skill_id: SkillId,
    pub origin: Vec2,
    pub direction: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawned {
    pub entity: EntityId,
    pub enemy_type: String,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveStarted {
    pub wave_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveCompleted {
    pub wave_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyChanged {
    pub level: DifficultyLevel,
    pub reason: String,
}

/// The closed set of simulation events, plus a `Custom` escape hatch for
/// host-defined events this crate doesn't know the shape of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    DamageDealt(DamageDealt),
    EntityKilled(EntityKilled),
    ExperienceGained(ExperienceGained),
    LevelUp(LevelUp),
    ResourceGained(ResourceGained),
    ResourceTransferred(ResourceTransferred),
    ItemTransferred(ItemTransferred),
    ItemPurchased(ItemPurchased),
    CollectibleCollected(CollectibleCollected),
    SkillActivated(SkillActivated),
    SkillEffectApplied(SkillEffectApplied),
    SkillLevelUp(SkillLevelUp),
    SkillEvolutionAvailable(SkillEvolutionAvailable),
    SkillPointsAwarded(SkillPointsAwarded),
    ProjectileCreated(ProjectileCreated),
    EnemySpawned(EnemySpawned),
    WaveStarted(WaveStarted),
    WaveCompleted(WaveCompleted),
    DifficultyChanged(DifficultyChanged),
    Custom { name: String, data: serde_json::Value },
}

impl EventKind {
    /// The canonical `SCREAMING_SNAKE_CASE` event name, matching the
    /// vocabulary every subscriber filters on.
    pub fn name(&self) -> &str {
        match self {
            EventKind::DamageDealt(_) => "DAMAGE_DEALT",
            EventKind::EntityKilled(_) => "ENTITY_KILLED",
            EventKind::ExperienceGained(_) => "EXPERIENCE_GAINED",
            EventKind::LevelUp(_) => "LEVEL_UP",
            EventKind::ResourceGained(_) => "RESOURCE_GAINED",
            EventKind::ResourceTransferred(_) => "RESOURCE_TRANSFERRED",
            EventKind::ItemTransferred(_) => "ITEM_TRANSFERRED",
            EventKind::ItemPurchased(_) => "ITEM_PURCHASED",
            EventKind::CollectibleCollected(_) => "COLLECTIBLE_COLLECTED",
            EventKind::SkillActivated(_) => "SKILL_ACTIVATED",
            EventKind::SkillEffectApplied(_) => "SKILL_EFFECT_APPLIED",
            EventKind::SkillLevelUp(_) => "SKILL_LEVEL_UP",
            EventKind::SkillEvolutionAvailable(_) => "SKILL_EVOLUTION_AVAILABLE",
            EventKind::SkillPointsAwarded(_) => "SKILL_POINTS_AWARDED",
            EventKind::ProjectileCreated(_) => "PROJECTILE_CREATED",
            EventKind::EnemySpawned(_) => "ENEMY_SPAWNED",
            EventKind::WaveStarted(_) => "WAVE_STARTED",
            EventKind::WaveCompleted(_) => "WAVE_COMPLETED",
            EventKind::DifficultyChanged(_) => "DIFFICULTY_CHANGED",
            EventKind::Custom { name, .. } => name,
        }
    }

    /// The entity most relevant to this event, if any -- used by
    /// [`crate::bus::EventBus::events_by_entity`].
    pub fn primary_entity(&self) -> Option<EntityId> {
        match self {
            EventKind::DamageDealt(e) => Some(e.target),
            EventKind::EntityKilled(e) => Some(e.entity),
            EventKind::ExperienceGained(e) => Some(e.entity),
            EventKind::LevelUp(e) => Some(e.entity),
            EventKind::ResourceGained(e) => Some(e.entity),
            EventKind::ResourceTransferred(e) => Some(e.from),
            EventKind::ItemTransferred(e) => Some(e.from),
            EventKind::ItemPurchased(e) => Some(e.buyer),
            EventKind::CollectibleCollected(e) => Some(e.collector),
            EventKind::SkillActivated(e) => Some(e.caster),
            EventKind::SkillEffectApplied(e) => Some(e.target),
            EventKind::SkillLevelUp(e) => Some(e.entity),
            EventKind::SkillEvolutionAvailable(e) => Some(e.entity),
            EventKind::SkillPointsAwarded(e) => Some(e.entity),
            EventKind::ProjectileCreated(e) => Some(e.source),
            EventKind::EnemySpawned(e) => Some(e.entity),
            EventKind::WaveStarted(_) => None,
            EventKind::WaveCompleted(_) => None,
            EventKind::DifficultyChanged(_) => None,
            EventKind::Custom { .. } => None,
        }
    }
}
