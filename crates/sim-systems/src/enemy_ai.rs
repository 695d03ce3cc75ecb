//! Enemy behavior state machine: idle/patrol, seeking, attacking, fleeing,
//! and death, driven by detection/attack range, a threat memory, and a
//! priority action queue that can override the default state transition.

use sim_ecs::prelude::{AiActionKind, AiState, ComponentKind, ComponentSignature, Vec2, World};
use sim_events::prelude::EventBus;

use crate::error::SystemError;

/// Below this aggression, an enemy that has taken recent damage flees
/// instead of continuing to seek or attack.
const FLEE_AGGRESSION_THRESHOLD: f32 = 0.3;
const PATROL_ARRIVAL_RADIUS: f32 = 2.0;

#[derive(Debug, Default)]
pub struct EnemyAiSystem;

impl EnemyAiSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn update(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        now: u64,
        dt: f32,
    ) -> Result<(), SystemError> {
        let sig = ComponentSignature::from_kinds([
            ComponentKind::Transform,
            ComponentKind::EnemyAi,
            ComponentKind::Health,
        ]);
        let ids: Vec<_> = world.query(sig).collect();
        for id in ids {
            self.update_one(world, bus, id, now, dt)?;
        }
        Ok(())
    }

    fn update_one(
        &mut self,
        world: &mut World,
        _bus: &mut EventBus,
        id: sim_ecs::prelude::EntityId,
        now: u64,
        _dt: f32,
    ) -> Result<(), SystemError> {
        let is_dead = world.health(id).is_some_and(|h| h.is_dead());
        if is_dead {
            if let Some(ai) = world.enemy_ai_mut(id) {
                ai.current_state = AiState::Dead;
            }
            if let Some(movement) = world.movement_mut(id) {
                movement.velocity = Vec2::ZERO;
            }
            return Ok(());
        }

        let Some(pos) = world.transform(id).map(|t| t.position) else {
            return Ok(());
        };

        let (detection_range, attack_range, target, last_known, aggression, threat, forced_action) = {
            let Some(ai) = world.enemy_ai_mut(id) else {
                return Ok(());
            };
            let forced_action = ai.next_action().map(|a| a.kind);
            (
                ai.detection_range,
                ai.attack_range,
                ai.target_entity_id,
                ai.last_known_target_position,
                ai.aggression_level,
                ai.threat_level,
                forced_action,
            )
        };

        let target_pos = target.and_then(|t| world.transform(t).map(|tr| tr.position));

        let natural_state = match target_pos {
            Some(tp) if pos.distance(tp) <= attack_range => AiState::Attacking,
            Some(tp) if pos.distance(tp) <= detection_range => AiState::Seeking,
            _ => AiState::Idle,
        };

        let forced_state = forced_action.map(|kind| match kind {
            AiActionKind::Attack => AiState::Attacking,
            AiActionKind::Flee => AiState::Fleeing,
            AiActionKind::Investigate => AiState::Seeking,
            AiActionKind::Patrol => AiState::Idle,
        });

        let threatened_flee =
            threat > 0.0 && aggression < FLEE_AGGRESSION_THRESHOLD && natural_state != AiState::Idle;

        let final_state = forced_state.unwrap_or(if threatened_flee {
            AiState::Fleeing
        } else {
            natural_state
        });

        if let Some(ai) = world.enemy_ai_mut(id) {
            ai.current_state = final_state;
            ai.last_action_time = now;
            if let Some(tp) = target_pos {
                ai.last_known_target_position = Some(tp);
            }
        }

        match final_state {
            AiState::Seeking => {
                if let Some(destination) = target_pos.or(last_known) {
                    self.move_toward(world, id, pos, destination);
                }
            }
            AiState::Fleeing => {
                if let Some(threat_pos) = target_pos.or(last_known) {
                    self.move_toward(world, id, pos, pos + (pos - threat_pos));
                }
            }
            AiState::Attacking => {
                if let Some(movement) = world.movement_mut(id) {
                    movement.velocity = Vec2::ZERO;
                }
                if let Some(target_id) = target {
                    if let Some(combat) = world.combat_mut(id) {
                        combat.current_target = Some(target_id);
                    }
                }
            }
            AiState::Idle => self.patrol(world, id, pos, now),
            AiState::Dead => {}
        }

        Ok(())
    }

    fn move_toward(&self, world: &mut World, id: sim_ecs::prelude::EntityId, from: Vec2, to: Vec2) {
        let Some(movement) = world.movement_mut(id) else {
            return;
        };
        let direction = (to - from).normalized();
        let speed = if movement.max_speed > 0.0 {
            movement.max_speed
        } else {
            1.0
        };
        movement.velocity = direction * speed;
    }

    fn patrol(&self, world: &mut World, id: sim_ecs::prelude::EntityId, pos: Vec2, now: u64) {
        let Some((points, mut index, wait_until)) = world.enemy_ai(id).and_then(|ai| {
            if ai.patrol_points.is_empty() {
                None
            } else {
                Some((ai.patrol_points.clone(), ai.patrol_index, ai.patrol_wait_until))
            }
        }) else {
            if let Some(movement) = world.movement_mut(id) {
                movement.velocity = Vec2::ZERO;
            }
            return;
        };

        let mut wait_until = wait_until;
        if let Some(wu) = wait_until {
            if now < wu {
                if let Some(movement) = world.movement_mut(id) {
                    movement.velocity = Vec2::ZERO;
                }
                return;
            }
            wait_until = None;
            index = (index + 1) % points.len();
        }

        let point = points[index];
        let reached = pos.distance(point.position) <= PATROL_ARRIVAL_RADIUS;
        if reached {
            wait_until = Some(now + point.wait_ms);
        }

        if let Some(ai) = world.enemy_ai_mut(id) {
            ai.patrol_index = index;
            ai.patrol_wait_until = wait_until;
        }

        if reached {
            if let Some(movement) = world.movement_mut(id) {
                movement.velocity = Vec2::ZERO;
            }
        } else {
            self.move_toward(world, id, pos, point.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ecs::prelude::{Component, EnemyAi, Health, Movement, PatrolPoint, Transform};
    use sim_events::prelude::EventBusConfig;

    fn spawn_enemy(world: &mut World, ai: EnemyAi) -> sim_ecs::prelude::EntityId {
        let id = world.spawn();
        world.set_component(id, Component::Transform(Transform::default())).unwrap();
        world
            .set_component(
                id,
                Component::Movement(Movement {
                    max_speed: 5.0,
                    ..Movement::default()
                }),
            )
            .unwrap();
        world.set_component(id, Component::Health(Health::new(10.0))).unwrap();
        world.set_component(id, Component::EnemyAi(ai)).unwrap();
        id
    }

    #[test]
    fn dead_enemy_transitions_to_dead_state() {
        let mut world = World::new();
        let id = spawn_enemy(&mut world, EnemyAi::default());
        world.health_mut(id).unwrap().take_damage(1000.0, 1);
        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = EnemyAiSystem::new();
        system.update(&mut world, &mut bus, 1, 0.016).unwrap();
        assert_eq!(world.enemy_ai(id).unwrap().current_state, AiState::Dead);
    }

    #[test]
    fn target_within_detection_range_triggers_seeking() {
        let mut world = World::new();
        let target = world.spawn();
        world
            .set_component(
                target,
                Component::Transform(Transform {
                    position: Vec2::new(20.0, 0.0),
                    ..Transform::default()
                }),
            )
            .unwrap();

        let id = spawn_enemy(
            &mut world,
            EnemyAi {
                detection_range: 30.0,
                attack_range: 2.0,
                target_entity_id: Some(target),
                ..EnemyAi::default()
            },
        );

        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = EnemyAiSystem::new();
        system.update(&mut world, &mut bus, 1, 0.016).unwrap();
        assert_eq!(world.enemy_ai(id).unwrap().current_state, AiState::Seeking);
        assert!(world.movement(id).unwrap().velocity.length() > 0.0);
    }

    #[test]
    fn target_within_attack_range_triggers_attacking_and_sets_combat_target() {
        let mut world = World::new();
        let target = world.spawn();
        world.set_component(target, Component::Transform(Transform::default())).unwrap();

        let id = spawn_enemy(
            &mut world,
            EnemyAi {
                detection_range: 30.0,
                attack_range: 5.0,
                target_entity_id: Some(target),
                ..EnemyAi::default()
            },
        );
        world
            .set_component(id, Component::Combat(sim_ecs::prelude::Combat::default()))
            .unwrap();

        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = EnemyAiSystem::new();
        system.update(&mut world, &mut bus, 1, 0.016).unwrap();
        assert_eq!(world.enemy_ai(id).unwrap().current_state, AiState::Attacking);
        assert_eq!(world.combat(id).unwrap().current_target, Some(target));
    }

    #[test]
    fn patrol_advances_through_points_after_waiting() {
        let mut world = World::new();
        let id = spawn_enemy(
            &mut world,
            EnemyAi {
                patrol_points: vec![
                    PatrolPoint {
                        position: Vec2::ZERO,
                        wait_ms: 100,
                    },
                    PatrolPoint {
                        position: Vec2::new(50.0, 0.0),
                        wait_ms: 100,
                    },
                ],
                ..EnemyAi::default()
            },
        );

        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = EnemyAiSystem::new();
        // Already at patrol_points[0], so this tick should start waiting.
        system.update(&mut world, &mut bus, 0, 0.016).unwrap();
        assert_eq!(world.enemy_ai(id).unwrap().patrol_index, 0);
        assert!(world.enemy_ai(id).unwrap().patrol_wait_until.is_some());

        // Still within the wait window.
        system.update(&mut world, &mut bus, 50, 0.016).unwrap();
        assert_eq!(world.enemy_ai(id).unwrap().patrol_index, 0);

        // Wait window elapsed: advances to the next point.
        system.update(&mut world, &mut bus, 200, 0.016).unwrap();
        assert_eq!(world.enemy_ai(id).unwrap().patrol_index, 1);
    }
}
