//! Enemy wave spawning: pulls from a spawner's wave queue, mints enemy
//! entities inside its spawn area, and reports wave lifecycle events.

use rand::Rng;
use rand_pcg::Pcg32;
use sim_ecs::prelude::{
    Combat, ComponentKind, ComponentSignature, EnemyAi, EnemyTypeEntry, Health, Movement,
    SpawnPattern, Transform, Vec2, Weapon, World,
};
use sim_events::prelude::{EnemySpawned, EventBus, EventKind, WaveCompleted, WaveStarted};

use crate::error::SystemError;

pub struct SpawnerSystem {
    rng: Pcg32,
}

impl SpawnerSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::new(seed, 0x9e3779b97f4a7c15),
        }
    }

    pub fn update(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        now: u64,
        _dt: f32,
    ) -> Result<(), SystemError> {
        let sig = ComponentSignature::single(ComponentKind::Spawner);
        let ids: Vec<_> = world.query(sig).collect();
        for id in ids {
            self.update_one(world, bus, id, now)?;
        }
        Ok(())
    }

    fn update_one(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        spawner_entity: sim_ecs::prelude::EntityId,
        now: u64,
    ) -> Result<(), SystemError> {
        let should_start_wave = {
            let Some(spawner) = world.spawner(spawner_entity) else {
                return Ok(());
            };
            spawner.counters.active_wave_index.is_none() && !spawner.wave_queue.is_empty()
        };

        if should_start_wave {
            let wave_index = {
                let spawner = world.spawner_mut(spawner_entity).unwrap();
                let index = spawner.wave_queue.front().map(|w| w.index).unwrap();
                spawner.counters.active_wave_index = Some(index);
                index
            };
            bus.emit(EventKind::WaveStarted(WaveStarted { wave_index }));
        }

        let interval_elapsed = {
            let Some(spawner) = world.spawner(spawner_entity) else {
                return Ok(());
            };
            now.saturating_sub(spawner.last_spawn_at)
                >= spawner.wave_queue.front().map(|w| w.interval_ms).unwrap_or(0)
        };

        if interval_elapsed {
            self.spawn_next(world, bus, spawner_entity, now)?;
        }

        self.check_wave_completion(world, bus, spawner_entity);
        Ok(())
    }

    fn spawn_next(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        spawner_entity: sim_ecs::prelude::EntityId,
        now: u64,
    ) -> Result<(), SystemError> {
        let spawn_plan = {
            let Some(spawner) = world.spawner_mut(spawner_entity) else {
                return Ok(());
            };
            let Some(wave) = spawner.wave_queue.front_mut() else {
                return Ok(());
            };
            if wave.is_spawn_exhausted() {
                return Ok(());
            }
            wave.spawned += 1;
            spawner.last_spawn_at = now;
            spawner.counters.total_spawned += 1;
            let enemy_type = wave.enemy_type.clone();
            let area = spawner.area;
            let entries = spawner.enemy_types.clone();
            let pattern = spawner.pattern;
            (enemy_type, area, entries, pattern)
        };

        let (enemy_type, area, entries, pattern) = spawn_plan;
        let entry = self.pick_enemy_type(&entries, &enemy_type, pattern);

        let position = match pattern {
            SpawnPattern::Simultaneous | SpawnPattern::Sequential => area.center(),
            SpawnPattern::Random => Vec2::new(
                self.rng.gen_range(area.min.x..=area.max.x.max(area.min.x)),
                self.rng.gen_range(area.min.y..=area.max.y.max(area.min.y)),
            ),
        };

        let enemy = world.spawn();
        world.set_component(enemy, sim_ecs::prelude::Component::Transform(Transform {
            position,
            ..Transform::default()
        }))?;
        let scale = entry.map(|e| classification_scale(e.classification)).unwrap_or(1.0);
        world.set_component(
            enemy,
            sim_ecs::prelude::Component::Health(Health::new(50.0 * scale)),
        )?;
        world.set_component(
            enemy,
            sim_ecs::prelude::Component::Movement(Movement {
                max_speed: 20.0,
                friction: 2.0,
                ..Movement::default()
            }),
        )?;
        world.set_component(
            enemy,
            sim_ecs::prelude::Component::Combat(Combat {
                weapon: Weapon {
                    damage: 5.0 * scale,
                    range: 8.0,
                    attack_speed: 1.0,
                    critical_chance: None,
                    critical_multiplier: None,
                },
                ..Combat::default()
            }),
        )?;
        world.set_component(
            enemy,
            sim_ecs::prelude::Component::EnemyAi(EnemyAi {
                behavior_type: enemy_type.clone(),
                detection_range: 80.0,
                attack_range: 10.0,
                aggression_level: 0.6,
                ..EnemyAi::default()
            }),
        )?;

        bus.emit(EventKind::EnemySpawned(EnemySpawned {
            entity: enemy,
            enemy_type,
            position,
        }));
        Ok(())
    }

    fn pick_enemy_type<'a>(
        &mut self,
        entries: &'a [EnemyTypeEntry],
        preferred: &str,
        _pattern: SpawnPattern,
    ) -> Option<&'a EnemyTypeEntry> {
        entries.iter().find(|e| e.enemy_type == preferred).or_else(|| entries.first())
    }

    fn check_wave_completion(&mut self, world: &mut World, bus: &mut EventBus, spawner_entity: sim_ecs::prelude::EntityId) {
        let completed_index = {
            let Some(spawner) = world.spawner_mut(spawner_entity) else {
                return;
            };
            let Some(wave) = spawner.wave_queue.front() else {
                return;
            };
            if !wave.is_complete() {
                return;
            }
            let index = wave.index;
            spawner.wave_queue.pop_front();
            spawner.counters.active_wave_index = None;
            index
        };
        bus.emit(EventKind::WaveCompleted(WaveCompleted {
            wave_index: completed_index,
        }));
    }

    /// Record a kill credited toward the active wave so it can complete.
    pub fn record_kill(&mut self, world: &mut World, spawner_entity: sim_ecs::prelude::EntityId) {
        if let Some(spawner) = world.spawner_mut(spawner_entity) {
            spawner.counters.total_killed += 1;
            if let Some(wave) = spawner.wave_queue.front_mut() {
                wave.killed += 1;
            }
        }
    }
}

fn classification_scale(classification: sim_ecs::prelude::EnemyClassification) -> f32 {
    match classification {
        sim_ecs::prelude::EnemyClassification::Basic => 1.0,
        sim_ecs::prelude::EnemyClassification::Elite => 2.5,
        sim_ecs::prelude::EnemyClassification::Boss => 8.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ecs::prelude::{Component, EnemyClassification, Rect, Spawner, Wave};
    use sim_events::prelude::EventBusConfig;

    fn spawner_with_wave() -> (World, sim_ecs::prelude::EntityId) {
        let mut world = World::new();
        let id = world.spawn();
        world
            .set_component(
                id,
                Component::Spawner(Spawner {
                    enemy_types: vec![EnemyTypeEntry {
                        enemy_type: "grunt".to_string(),
                        weight: 1.0,
                        classification: EnemyClassification::Basic,
                    }],
                    wave_queue: vec![Wave {
                        index: 1,
                        enemy_type: "grunt".to_string(),
                        count: 2,
                        spawned: 0,
                        killed: 0,
                        interval_ms: 0,
                    }]
                    .into(),
                    pattern: SpawnPattern::Sequential,
                    area: Rect {
                        min: Vec2::ZERO,
                        max: Vec2::new(10.0, 10.0),
                    },
                    counters: Default::default(),
                    last_spawn_at: 0,
                }),
            )
            .unwrap();
        (world, id)
    }

    #[test]
    fn wave_starts_and_spawns_enemies_up_to_count() {
        let (mut world, spawner_id) = spawner_with_wave();
        let mut bus = EventBus::new(EventBusConfig {
            history_enabled: true,
            history_capacity: 16,
        });
        let mut system = SpawnerSystem::new(7);
        system.update(&mut world, &mut bus, 0, 0.016).unwrap();
        system.update(&mut world, &mut bus, 1, 0.016).unwrap();

        assert_eq!(bus.events_by_type("WAVE_STARTED").len(), 1);
        assert_eq!(bus.events_by_type("ENEMY_SPAWNED").len(), 2);
        assert_eq!(world.spawner(spawner_id).unwrap().counters.total_spawned, 2);
    }

    #[test]
    fn wave_completes_once_spawned_enemies_are_killed() {
        let (mut world, spawner_id) = spawner_with_wave();
        let mut bus = EventBus::new(EventBusConfig {
            history_enabled: true,
            history_capacity: 16,
        });
        let mut system = SpawnerSystem::new(7);
        system.update(&mut world, &mut bus, 0, 0.016).unwrap();
        system.update(&mut world, &mut bus, 1, 0.016).unwrap();

        system.record_kill(&mut world, spawner_id);
        system.record_kill(&mut world, spawner_id);
        system.update(&mut world, &mut bus, 2, 0.016).unwrap();

        assert_eq!(bus.events_by_type("WAVE_COMPLETED").len(), 1);
        assert!(world.spawner(spawner_id).unwrap().wave_queue.is_empty());
    }
}
