//! Adaptive difficulty: periodically evaluates each difficulty-tracked
//! entity's recent performance and nudges enemy stats and spawn rate up
//! or down to keep the encounter challenging but survivable.

use sim_ecs::prelude::{
    ComponentKind, ComponentSignature, Difficulty, DifficultyAttribute, DifficultyLevel,
    DifficultyModifier, World,
};
use sim_events::prelude::{DifficultyChanged, EventBus, EventKind};

use crate::error::SystemError;

/// How often (in milliseconds) a difficulty entity is re-evaluated.
const EVALUATION_INTERVAL_MS: u64 = 15_000;

/// Deaths-to-kills ratio above which difficulty steps down.
const STRUGGLE_RATIO: f64 = 0.5;
/// Deaths-to-kills ratio below which difficulty steps up.
const DOMINANCE_RATIO: f64 = 0.05;
const MIN_KILLS_FOR_EVALUATION: u32 = 5;

#[derive(Debug, Default)]
pub struct DifficultySystem;

impl DifficultySystem {
    pub fn new() -> Self {
        Self
    }

    pub fn update(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        now: u64,
        _dt: f32,
    ) -> Result<(), SystemError> {
        let sig = ComponentSignature::single(ComponentKind::Difficulty);
        let ids: Vec<_> = world.query(sig).collect();
        for id in ids {
            self.evaluate(world, bus, id, now);
        }
        Ok(())
    }

    fn evaluate(&mut self, world: &mut World, bus: &mut EventBus, entity: sim_ecs::prelude::EntityId, now: u64) {
        let Some(difficulty) = world.difficulty(entity) else {
            return;
        };
        if now.saturating_sub(difficulty.last_evaluated_at) < EVALUATION_INTERVAL_MS {
            return;
        }
        let metrics = difficulty.metrics;
        let current_level = difficulty.current_level;

        if metrics.kills < MIN_KILLS_FOR_EVALUATION {
            if let Some(d) = world.difficulty_mut(entity) {
                d.last_evaluated_at = now;
            }
            return;
        }

        let death_ratio = metrics.deaths as f64 / metrics.kills.max(1) as f64;
        let next_level = if death_ratio >= STRUGGLE_RATIO {
            step_down(current_level)
        } else if death_ratio <= DOMINANCE_RATIO {
            step_up(current_level)
        } else {
            current_level
        };

        if let Some(d) = world.difficulty_mut(entity) {
            d.last_evaluated_at = now;
            if next_level != current_level {
                d.current_level = next_level;
                d.active_modifiers = modifiers_for(next_level);
            }
        }

        if next_level != current_level {
            let reason = if level_rank(next_level) > level_rank(current_level) {
                "player dominating recent encounters".to_owned()
            } else {
                "player struggling in recent encounters".to_owned()
            };
            bus.emit(EventKind::DifficultyChanged(DifficultyChanged {
                level: next_level,
                reason,
            }));
        }
    }

    /// Record a kill or death toward the rolling metrics an entity's
    /// difficulty is evaluated against.
    pub fn record_kill(&mut self, world: &mut World, entity: sim_ecs::prelude::EntityId) {
        if let Some(d) = world.difficulty_mut(entity) {
            d.metrics.kills += 1;
        }
    }

    pub fn record_death(&mut self, world: &mut World, entity: sim_ecs::prelude::EntityId) {
        if let Some(d) = world.difficulty_mut(entity) {
            d.metrics.deaths += 1;
        }
    }

    pub fn record_damage(&mut self, world: &mut World, entity: sim_ecs::prelude::EntityId, dealt: f64, taken: f64) {
        if let Some(d) = world.difficulty_mut(entity) {
            d.metrics.damage_dealt += dealt;
            d.metrics.damage_taken += taken;
        }
    }
}

fn step_down(level: DifficultyLevel) -> DifficultyLevel {
    match level {
        DifficultyLevel::Hard => DifficultyLevel::Normal,
        DifficultyLevel::Normal => DifficultyLevel::Easy,
        DifficultyLevel::Easy => DifficultyLevel::Easy,
    }
}

fn step_up(level: DifficultyLevel) -> DifficultyLevel {
    match level {
        DifficultyLevel::Easy => DifficultyLevel::Normal,
        DifficultyLevel::Normal => DifficultyLevel::Hard,
        DifficultyLevel::Hard => DifficultyLevel::Hard,
    }
}

fn level_rank(level: DifficultyLevel) -> u8 {
    match level {
        DifficultyLevel::Easy => 0,
        DifficultyLevel::Normal => 1,
        DifficultyLevel::Hard => 2,
    }
}

fn modifiers_for(level: DifficultyLevel) -> Vec<DifficultyModifier> {
    match level {
        DifficultyLevel::Easy => vec![
            DifficultyModifier { attribute: DifficultyAttribute::EnemyDamage, multiplier: 0.75 },
            DifficultyModifier { attribute: DifficultyAttribute::EnemyHealth, multiplier: 0.8 },
            DifficultyModifier { attribute: DifficultyAttribute::SpawnRate, multiplier: 0.85 },
        ],
        DifficultyLevel::Normal => vec![
            DifficultyModifier { attribute: DifficultyAttribute::EnemyDamage, multiplier: 1.0 },
            DifficultyModifier { attribute: DifficultyAttribute::EnemyHealth, multiplier: 1.0 },
            DifficultyModifier { attribute: DifficultyAttribute::SpawnRate, multiplier: 1.0 },
        ],
        DifficultyLevel::Hard => vec![
            DifficultyModifier { attribute: DifficultyAttribute::EnemyDamage, multiplier: 1.3 },
            DifficultyModifier { attribute: DifficultyAttribute::EnemyHealth, multiplier: 1.25 },
            DifficultyModifier { attribute: DifficultyAttribute::SpawnRate, multiplier: 1.2 },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ecs::prelude::Component;
    use sim_events::prelude::EventBusConfig;

    fn world_with_difficulty() -> (World, sim_ecs::prelude::EntityId) {
        let mut world = World::new();
        let id = world.spawn();
        world.set_component(id, Component::Difficulty(Difficulty::default())).unwrap();
        (world, id)
    }

    #[test]
    fn low_death_ratio_steps_difficulty_up() {
        let (mut world, id) = world_with_difficulty();
        for _ in 0..20 {
            world.difficulty_mut(id).unwrap().metrics.kills += 1;
        }
        let mut bus = EventBus::new(EventBusConfig { history_enabled: true, history_capacity: 8 });
        let mut system = DifficultySystem::new();
        system.update(&mut world, &mut bus, EVALUATION_INTERVAL_MS, 0.016).unwrap();

        assert_eq!(world.difficulty(id).unwrap().current_level, DifficultyLevel::Hard);
        assert_eq!(bus.events_by_type("DIFFICULTY_CHANGED").len(), 1);
    }

    #[test]
    fn high_death_ratio_steps_difficulty_down() {
        let (mut world, id) = world_with_difficulty();
        {
            let d = world.difficulty_mut(id).unwrap();
            d.metrics.kills = 10;
            d.metrics.deaths = 8;
        }
        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = DifficultySystem::new();
        system.update(&mut world, &mut bus, EVALUATION_INTERVAL_MS, 0.016).unwrap();

        assert_eq!(world.difficulty(id).unwrap().current_level, DifficultyLevel::Easy);
    }

    #[test]
    fn evaluation_is_a_no_op_before_the_interval_elapses() {
        let (mut world, id) = world_with_difficulty();
        {
            let d = world.difficulty_mut(id).unwrap();
            d.metrics.kills = 10;
        }
        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = DifficultySystem::new();
        system.update(&mut world, &mut bus, EVALUATION_INTERVAL_MS - 1, 0.016).unwrap();
        assert_eq!(world.difficulty(id).unwrap().current_level, DifficultyLevel::Normal);
    }

    #[test]
    fn too_few_kills_skips_evaluation_without_panicking() {
        let (mut world, id) = world_with_difficulty();
        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = DifficultySystem::new();
        system.update(&mut world, &mut bus, EVALUATION_INTERVAL_MS, 0.016).unwrap();
        assert_eq!(world.difficulty(id).unwrap().current_level, DifficultyLevel::Normal);
        assert_eq!(world.difficulty(id).unwrap().last_evaluated_at, EVALUATION_INTERVAL_MS);
    }
}
