//! The closed set of component kinds and their concrete data shapes.
//!
//! Rather than the fully generic, type-erased component storage a
//! general-purpose ECS needs, this engine's component set is closed: twelve
//! kinds, known up front. Spec section 9 asks for exactly this
//! re-architecture ("re-architect as a tagged variant ... plus typed
//! per-kind storage; queries become bitmask checks over a component
//! signature"), so [`Component`] is a tagged union over the twelve concrete
//! structs and [`ComponentSignature`] is a bitmask keyed by [`ComponentKind`].

use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// Reset -- the pool's "reset hook" (spec section 3: "component values are
// reset on pool release").
// ---------------------------------------------------------------------------

/// Restores a pooled value to its fresh, just-constructed state in place,
/// without allocating.
pub trait Reset {
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// ComponentKind / ComponentSignature
// ---------------------------------------------------------------------------

/// The closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComponentKind {
    Transform = 0,
    Health = 1,
    Movement = 2,
    Combat = 3,
    Experience = 4,
    Inventory = 5,
    Skills = 6,
    Collectible = 7,
    Magnet = 8,
    EnemyAi = 9,
    Spawner = 10,
    Difficulty = 11,
}

impl ComponentKind {
    pub const COUNT: usize = 12;

    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Transform,
        ComponentKind::Health,
        ComponentKind::Movement,
        ComponentKind::Combat,
        ComponentKind::Experience,
        ComponentKind::Inventory,
        ComponentKind::Skills,
        ComponentKind::Collectible,
        ComponentKind::Magnet,
        ComponentKind::EnemyAi,
        ComponentKind::Spawner,
        ComponentKind::Difficulty,
    ];

    /// Stable short string name, used for serialization and logging.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "transform",
            ComponentKind::Health => "health",
            ComponentKind::Movement => "movement",
            ComponentKind::Combat => "combat",
            ComponentKind::Experience => "experience",
            ComponentKind::Inventory => "inventory",
            ComponentKind::Skills => "skills",
            ComponentKind::Collectible => "collectible",
            ComponentKind::Magnet => "magnet",
            ComponentKind::EnemyAi => "enemyAI",
            ComponentKind::Spawner => "spawner",
            ComponentKind::Difficulty => "difficulty",
        }
    }

    #[inline]
    pub fn bit(self) -> u16 {
        1u16 << (self as u8)
    }

    pub fn from_name(name: &str) -> Option<ComponentKind> {
        ComponentKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A bitmask over [`ComponentKind`], used both as an entity's "which
/// components do I have" signature and as a system's "which components do I
/// require" query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ComponentSignature(pub u16);

impl ComponentSignature {
    pub const EMPTY: ComponentSignature = ComponentSignature(0);

    pub fn single(kind: ComponentKind) -> Self {
        ComponentSignature(kind.bit())
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = ComponentKind>) -> Self {
        let mut sig = ComponentSignature::EMPTY;
        for k in kinds {
            sig.insert(k);
        }
        sig
    }

    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    #[inline]
    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Whether `self` has every bit set that `required` has (a query match).
    #[inline]
    pub fn satisfies(self, required: ComponentSignature) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

impl Reset for Transform {
    fn reset(&mut self) {
        *self = Transform::default();
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub maximum: f32,
    pub last_damage_at: u64,
}

impl Health {
    pub fn new(maximum: f32) -> Self {
        Self {
            current: maximum,
            maximum,
            last_damage_at: 0,
        }
    }

    /// Apply damage, clamping `current` into `[0, maximum]`. Returns `true`
    /// iff this call is the transition from alive to dead.
    pub fn take_damage(&mut self, amount: f32, now: u64) -> bool {
        let was_dead = self.is_dead();
        let amount = amount.max(0.0);
        self.current = (self.current - amount).clamp(0.0, self.maximum);
        self.last_damage_at = now;
        !was_dead && self.is_dead()
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.maximum);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Reset for Health {
    fn reset(&mut self) {
        *self = Health::new(self.maximum.max(1.0));
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Movement {
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub max_speed: f32,
    pub friction: f32,
}

impl Reset for Movement {
    fn reset(&mut self) {
        *self = Movement::default();
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: f32,
    pub range: f32,
    pub attack_speed: f32,
    pub critical_chance: Option<f32>,
    pub critical_multiplier: Option<f32>,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            damage: 0.0,
            range: 0.0,
            attack_speed: 1.0,
            critical_chance: None,
            critical_multiplier: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Combat {
    pub weapon: Weapon,
    pub current_target: Option<EntityId>,
    pub last_attack_at: u64,
    pub auto_attack: bool,
}

impl Combat {
    /// `cooldownMs = 1000 / weapon.attackSpeed` (spec section 4.10).
    pub fn cooldown_ms(&self) -> f64 {
        if self.weapon.attack_speed <= 0.0 {
            f64::INFINITY
        } else {
            1000.0 / self.weapon.attack_speed as f64
        }
    }

    pub fn can_attack(&self, now: u64) -> bool {
        (now.saturating_sub(self.last_attack_at)) as f64 >= self.cooldown_ms()
    }
}

impl Reset for Combat {
    fn reset(&mut self) {
        *self = Combat::default();
    }
}

// ---------------------------------------------------------------------------
// Experience
// ---------------------------------------------------------------------------

/// `xpToNextLevel(L) = ⌊100 · L^1.5⌋` (spec section 3 and testable property 6).
pub fn xp_curve(level: u32) -> f64 {
    (100.0 * (level as f64).powf(1.5)).floor()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub level: u32,
    pub current_xp: f64,
    pub total_xp: f64,
    pub xp_to_next_level: f64,
}

impl Default for Experience {
    fn default() -> Self {
        Self {
            level: 1,
            current_xp: 0.0,
            total_xp: 0.0,
            xp_to_next_level: xp_curve(1),
        }
    }
}

impl Experience {
    /// Add experience, resolving any number of level-ups. Returns the
    /// sequence of levels reached, in order. A non-positive `amount`
    /// mutates nothing and returns an empty vec (spec section 4.11 / 8).
    pub fn add_experience(&mut self, amount: f64) -> Vec<u32> {
        if amount <= 0.0 {
            return Vec::new();
        }
        self.current_xp += amount;
        self.total_xp += amount;
        let mut levels_gained = Vec::new();
        while self.current_xp >= self.xp_to_next_level {
            self.current_xp -= self.xp_to_next_level;
            self.level += 1;
            levels_gained.push(self.level);
            self.xp_to_next_level = xp_curve(self.level);
        }
        levels_gained
    }

    /// Directly set the level, resetting `currentXP` to zero. `totalXP` is
    /// unchanged. Per spec section 4.11, the next threshold is computed from
    /// `L + 1`, not `L` -- this differs from the formula `addExperience`
    /// uses after a level-up and is intentional (see DESIGN.md).
    pub fn set_level(&mut self, level: u32) {
        self.level = level;
        self.current_xp = 0.0;
        self.xp_to_next_level = xp_curve(level + 1);
    }
}

impl Reset for Experience {
    fn reset(&mut self) {
        *self = Experience::default();
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<ItemStack>,
    pub max_slots: usize,
    pub resources: HashMap<String, f64>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            max_slots: 20,
            resources: HashMap::new(),
        }
    }
}

impl Inventory {
    pub fn new(max_slots: usize) -> Self {
        Self {
            max_slots,
            ..Default::default()
        }
    }

    pub fn resource(&self, kind: &str) -> f64 {
        *self.resources.get(kind).unwrap_or(&0.0)
    }

    pub fn add_resource(&mut self, kind: &str, amount: f64) {
        *self.resources.entry(kind.to_owned()).or_insert(0.0) += amount;
    }

    /// Returns `false` (and mutates nothing) if `kind` does not hold at
    /// least `amount`.
    pub fn remove_resource(&mut self, kind: &str, amount: f64) -> bool {
        let have = self.resource(kind);
        if have < amount {
            return false;
        }
        self.resources.insert(kind.to_owned(), have - amount);
        true
    }

    /// Stack onto an existing slot of the same item, or open a new slot if
    /// there is room. Returns `false` if the inventory is full.
    pub fn add_item(&mut self, item_id: &str, quantity: u32) -> bool {
        if let Some(stack) = self.slots.iter_mut().find(|s| s.item_id == item_id) {
            stack.quantity += quantity;
            return true;
        }
        if self.slots.len() >= self.max_slots {
            return false;
        }
        self.slots.push(ItemStack {
            item_id: item_id.to_owned(),
            quantity,
        });
        true
    }
}

impl Reset for Inventory {
    fn reset(&mut self) {
        self.slots.clear();
        self.resources.clear();
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

pub type SkillId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillType {
    Active,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    SelfTarget,
    Enemies,
    Area,
    Projectile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectType {
    Damage,
    Heal,
    Buff,
    Debuff,
    AttributeModify,
    ProjectileCreate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEffect {
    pub effect_type: EffectType,
    pub value: f32,
    pub radius: Option<f32>,
    pub duration_ms: Option<u64>,
    pub stackable: Option<bool>,
    pub chance: Option<f32>,
    /// Which stat an `AttributeModify` effect targets, e.g. `"damage"`.
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill_id: SkillId,
    pub min_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    pub skill_type: SkillType,
    pub target_type: TargetType,
    pub max_level: u32,
    pub cooldown_ms: u64,
    pub rarity_weight: f32,
    pub effects: Vec<SkillEffect>,
    pub evolve_into: Vec<SkillId>,
    pub requirements: Vec<SkillRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInstance {
    pub definition_id: SkillId,
    pub level: u32,
    /// `0` means never used; cooldown checks treat this as "off cooldown".
    pub last_used: u64,
}

impl SkillInstance {
    pub fn new(definition_id: impl Into<SkillId>) -> Self {
        Self {
            definition_id: definition_id.into(),
            level: 1,
            last_used: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: u64,
    pub skill_id: SkillId,
    pub source_entity_id: EntityId,
    pub effect: SkillEffect,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub stacks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBaseline {
    pub weapon_damage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    pub skills: HashMap<SkillId, SkillInstance>,
    pub active_effects: Vec<ActiveEffect>,
    pub skill_points: u32,
    pub evolution_progress: HashSet<SkillId>,
    /// Captured the first time an `AttributeModify` effect is applied, so
    /// subsequent modifiers compose against the unmodified baseline rather
    /// than an already-modified value (spec section 4.15).
    pub baseline: Option<StatBaseline>,
    pub next_effect_id: u64,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            skills: HashMap::new(),
            active_effects: Vec::new(),
            skill_points: 0,
            evolution_progress: HashSet::new(),
            baseline: None,
            next_effect_id: 1,
        }
    }
}

impl Reset for Skills {
    fn reset(&mut self) {
        *self = Skills::default();
    }
}

// ---------------------------------------------------------------------------
// Collectible
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Experience,
    Health,
    Mana,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub value: f64,
    pub rarity: Rarity,
}

impl Default for Collectible {
    fn default() -> Self {
        Self {
            kind: CollectibleKind::Currency,
            value: 0.0,
            rarity: Rarity::Common,
        }
    }
}

impl Reset for Collectible {
    fn reset(&mut self) {
        *self = Collectible::default();
    }
}

// ---------------------------------------------------------------------------
// Magnet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MagneticField {
    pub range: f32,
    pub strength: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnet {
    pub field: MagneticField,
    pub is_active: bool,
    pub filters: Option<Vec<CollectibleKind>>,
}

impl Default for Magnet {
    fn default() -> Self {
        Self {
            field: MagneticField::default(),
            is_active: true,
            filters: None,
        }
    }
}

impl Magnet {
    pub fn accepts(&self, kind: CollectibleKind) -> bool {
        match &self.filters {
            None => true,
            Some(allowed) => allowed.contains(&kind),
        }
    }
}

impl Reset for Magnet {
    fn reset(&mut self) {
        *self = Magnet::default();
    }
}

// ---------------------------------------------------------------------------
// EnemyAI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Seeking,
    Attacking,
    Fleeing,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolPoint {
    pub position: Vec2,
    pub wait_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiActionKind {
    Attack,
    Flee,
    Patrol,
    Investigate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAction {
    pub priority: i32,
    pub kind: AiActionKind,
}

impl Ord for AiAction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority.cmp(&other.priority)
    }
}

impl PartialOrd for AiAction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiMemory {
    pub last_damage_time: Option<u64>,
    pub last_damage_source: Option<EntityId>,
    pub custom: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyAi {
    pub behavior_type: String,
    pub current_state: AiState,
    pub target_entity_id: Option<EntityId>,
    pub last_known_target_position: Option<Vec2>,
    pub detection_range: f32,
    pub attack_range: f32,
    pub aggression_level: f32,
    pub last_action_time: u64,
    pub patrol_points: Vec<PatrolPoint>,
    pub patrol_index: usize,
    pub patrol_wait_until: Option<u64>,
    pub action_queue: BinaryHeap<AiAction>,
    pub memory: AiMemory,
    pub threat_level: f32,
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self {
            behavior_type: "basic".to_owned(),
            current_state: AiState::Idle,
            target_entity_id: None,
            last_known_target_position: None,
            detection_range: 0.0,
            attack_range: 0.0,
            aggression_level: 0.0,
            last_action_time: 0,
            patrol_points: Vec::new(),
            patrol_index: 0,
            patrol_wait_until: None,
            action_queue: BinaryHeap::new(),
            memory: AiMemory::default(),
            threat_level: 0.0,
        }
    }
}

impl EnemyAi {
    pub fn record_damage(&mut self, amount: f32, source: EntityId, now: u64) {
        self.memory.last_damage_time = Some(now);
        self.memory.last_damage_source = Some(source);
        self.threat_level += amount;
    }

    /// Pop the highest-priority queued action, if any.
    pub fn next_action(&mut self) -> Option<AiAction> {
        self.action_queue.pop()
    }
}

impl Reset for EnemyAi {
    fn reset(&mut self) {
        *self = EnemyAi::default();
    }
}

// ---------------------------------------------------------------------------
// Spawner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyClassification {
    Basic,
    Elite,
    Boss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeEntry {
    pub enemy_type: String,
    pub weight: f32,
    pub classification: EnemyClassification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub index: u32,
    pub enemy_type: String,
    pub count: u32,
    pub spawned: u32,
    pub killed: u32,
    pub interval_ms: u64,
}

impl Wave {
    pub fn is_spawn_exhausted(&self) -> bool {
        self.spawned >= self.count
    }

    pub fn is_complete(&self) -> bool {
        self.is_spawn_exhausted() && self.killed >= self.spawned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPattern {
    Sequential,
    Random,
    Simultaneous,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnCounters {
    pub total_spawned: u32,
    pub total_killed: u32,
    pub active_wave_index: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub enemy_types: Vec<EnemyTypeEntry>,
    pub wave_queue: VecDeque<Wave>,
    pub pattern: SpawnPattern,
    pub area: Rect,
    pub counters: SpawnCounters,
    pub last_spawn_at: u64,
}

impl Default for Spawner {
    fn default() -> Self {
        Self {
            enemy_types: Vec::new(),
            wave_queue: VecDeque::new(),
            pattern: SpawnPattern::Sequential,
            area: Rect {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
            },
            counters: SpawnCounters::default(),
            last_spawn_at: 0,
        }
    }
}

impl Reset for Spawner {
    fn reset(&mut self) {
        *self = Spawner::default();
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyAttribute {
    EnemyDamage,
    EnemyHealth,
    SpawnRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifier {
    pub attribute: DifficultyAttribute,
    pub multiplier: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub current_level: DifficultyLevel,
    pub metrics: PerformanceMetrics,
    pub active_modifiers: Vec<DifficultyModifier>,
    pub last_evaluated_at: u64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            current_level: DifficultyLevel::Normal,
            metrics: PerformanceMetrics::default(),
            active_modifiers: Vec::new(),
            last_evaluated_at: 0,
        }
    }
}

impl Reset for Difficulty {
    fn reset(&mut self) {
        *self = Difficulty::default();
    }
}

// ---------------------------------------------------------------------------
// Component -- the tagged union
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Component {
    Transform(Transform),
    Health(Health),
    Movement(Movement),
    Combat(Combat),
    Experience(Experience),
    Inventory(Inventory),
    Skills(Skills),
    Collectible(Collectible),
    Magnet(Magnet),
    EnemyAi(EnemyAi),
    Spawner(Spawner),
    Difficulty(Difficulty),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::Health(_) => ComponentKind::Health,
            Component::Movement(_) => ComponentKind::Movement,
            Component::Combat(_) => ComponentKind::Combat,
            Component::Experience(_) => ComponentKind::Experience,
            Component::Inventory(_) => ComponentKind::Inventory,
            Component::Skills(_) => ComponentKind::Skills,
            Component::Collectible(_) => ComponentKind::Collectible,
            Component::Magnet(_) => ComponentKind::Magnet,
            Component::EnemyAi(_) => ComponentKind::EnemyAi,
            Component::Spawner(_) => ComponentKind::Spawner,
            Component::Difficulty(_) => ComponentKind::Difficulty,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Component::Transform(c) => c.reset(),
            Component::Health(c) => c.reset(),
            Component::Movement(c) => c.reset(),
            Component::Combat(c) => c.reset(),
            Component::Experience(c) => c.reset(),
            Component::Inventory(c) => c.reset(),
            Component::Skills(c) => c.reset(),
            Component::Collectible(c) => c.reset(),
            Component::Magnet(c) => c.reset(),
            Component::EnemyAi(c) => c.reset(),
            Component::Spawner(c) => c.reset(),
            Component::Difficulty(c) => c.reset(),
        }
    }
}

/// Implements `From<T> for Component`, `TryFrom<&Component> for &T`-style
/// accessors are hand-written on [`crate::entity_store::EntityRecord`]
/// instead, since each component kind needs its own typed getter anyway.
macro_rules! component_from {
    ($ty:ident) => {
        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::$ty(value)
            }
        }
    };
}

component_from!(Transform);
component_from!(Health);
component_from!(Movement);
component_from!(Combat);
component_from!(Experience);
component_from!(Inventory);
component_from!(Skills);
component_from!(Collectible);
component_from!(Magnet);
component_from!(EnemyAi);
component_from!(Spawner);
component_from!(Difficulty);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_bitmask_roundtrip() {
        let mut sig = ComponentSignature::EMPTY;
        sig.insert(ComponentKind::Transform);
        sig.insert(ComponentKind::Health);
        assert!(sig.contains(ComponentKind::Transform));
        assert!(sig.contains(ComponentKind::Health));
        assert!(!sig.contains(ComponentKind::Movement));
        sig.remove(ComponentKind::Health);
        assert!(!sig.contains(ComponentKind::Health));
    }

    #[test]
    fn satisfies_checks_superset() {
        let sig = ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Movement]);
        let required = ComponentSignature::from_kinds([ComponentKind::Transform]);
        assert!(sig.satisfies(required));
        let required_missing =
            ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Combat]);
        assert!(!sig.satisfies(required_missing));
    }

    #[test]
    fn health_invariant_clamped() {
        let mut h = Health::new(100.0);
        h.take_damage(500.0, 1);
        assert_eq!(h.current, 0.0);
        h.heal(1000.0);
        assert_eq!(h.current, 100.0);
    }

    #[test]
    fn health_kill_transition_fires_once() {
        let mut h = Health::new(10.0);
        assert!(h.take_damage(10.0, 1));
        assert!(!h.take_damage(5.0, 2), "already dead, no second transition");
    }

    #[test]
    fn xp_curve_matches_formula() {
        assert_eq!(xp_curve(1), 100.0);
        assert_eq!(xp_curve(2), 282.0);
    }

    #[test]
    fn experience_scenario_from_spec() {
        let mut xp = Experience::default();
        let levels = xp.add_experience(300.0);
        assert_eq!(levels, vec![2]);
        assert_eq!(xp.level, 2);
        assert_eq!(xp.current_xp, 200.0);
        assert_eq!(xp.xp_to_next_level, 282.0);
    }

    #[test]
    fn negative_experience_is_noop() {
        let mut xp = Experience::default();
        let levels = xp.add_experience(-5.0);
        assert!(levels.is_empty());
        assert_eq!(xp.current_xp, 0.0);
    }

    #[test]
    fn inventory_resource_transfer_respects_balance() {
        let mut inv = Inventory::default();
        inv.add_resource("wood", 10.0);
        assert!(!inv.remove_resource("wood", 20.0));
        assert!(inv.remove_resource("wood", 10.0));
        assert_eq!(inv.resource("wood"), 0.0);
    }

    #[test]
    fn component_reset_restores_default_shape() {
        let mut c = Component::from(Movement {
            velocity: Vec2::new(5.0, 5.0),
            acceleration: Vec2::ZERO,
            max_speed: 10.0,
            friction: 0.1,
        });
        c.reset();
        match c {
            Component::Movement(m) => assert_eq!(m, Movement::default()),
            _ => panic!("wrong kind"),
        }
    }
}
