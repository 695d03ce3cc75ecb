//! Auto-attack resolution: target validity, range, cooldown, and the
//! critical-hit roll.

use rand::Rng;
use rand_pcg::Pcg32;
use sim_ecs::prelude::{ComponentKind, ComponentSignature, EntityId, World};
use sim_events::prelude::{DamageDealt, EntityKilled, EventBus, EventKind};

use crate::error::SystemError;

pub struct CombatSystem {
    rng: Pcg32,
}

impl CombatSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::new(seed, 0xa02bdbf7bb3c0a7),
        }
    }

    pub fn update(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        now: u64,
        _dt: f32,
    ) -> Result<(), SystemError> {
        let sig = ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Combat]);
        let ids: Vec<_> = world.query(sig).collect();

        for attacker in ids {
            let Some((attacker_pos, weapon, auto_attack)) = world
                .transform(attacker)
                .map(|t| t.position)
                .zip(world.combat(attacker).map(|c| (c.weapon, c.auto_attack)))
                .map(|(pos, (weapon, auto_attack))| (pos, weapon, auto_attack))
            else {
                continue;
            };

            let mut target = world.combat(attacker).and_then(|c| c.current_target);
            if let Some(candidate) = target {
                let still_valid = candidate != attacker
                    && world.is_alive(candidate)
                    && world.health(candidate).is_some_and(|h| !h.is_dead());
                if !still_valid {
                    if let Some(combat) = world.combat_mut(attacker) {
                        combat.current_target = None;
                    }
                    target = None;
                }
            }

            if target.is_none() && auto_attack {
                target = Self::nearest_target(world, attacker, attacker_pos, weapon.range);
                if let Some(found) = target {
                    if let Some(combat) = world.combat_mut(attacker) {
                        combat.current_target = Some(found);
                    }
                }
            }

            let Some(target) = target else {
                continue;
            };

            if target == attacker {
                continue;
            }

            let ready = world.combat(attacker).is_some_and(|c| c.can_attack(now));
            if !ready {
                continue;
            }

            let Some(target_pos) = world.transform(target).map(|t| t.position) else {
                continue;
            };
            if attacker_pos.distance(target_pos) > weapon.range {
                continue;
            }

            let is_critical = weapon
                .critical_chance
                .is_some_and(|chance| self.rng.gen::<f32>() < chance);
            let amount = if is_critical {
                weapon.damage * weapon.critical_multiplier.unwrap_or(1.5)
            } else {
                weapon.damage
            };

            let died = match world.health_mut(target) {
                Some(health) => health.take_damage(amount, now),
                None => false,
            };

            if let Some(combat) = world.combat_mut(attacker) {
                combat.last_attack_at = now;
            }

            bus.emit(EventKind::DamageDealt(DamageDealt {
                source: attacker,
                target,
                amount,
                is_critical,
            }));

            if died {
                bus.emit(EventKind::EntityKilled(EntityKilled {
                    entity: target,
                    killer: Some(attacker),
                }));
                if let Some(combat) = world.combat_mut(attacker) {
                    combat.current_target = None;
                }
            }
        }

        Ok(())
    }

    /// Nearest living entity (transform + health, not dead) within `range`
    /// of `origin`, excluding `attacker` itself. Ties break on the lower
    /// entity id.
    fn nearest_target(
        world: &World,
        attacker: EntityId,
        origin: sim_ecs::prelude::Vec2,
        range: f32,
    ) -> Option<EntityId> {
        let sig = ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Health]);
        let mut best: Option<(EntityId, f32)> = None;
        for candidate in world.query(sig) {
            if candidate == attacker {
                continue;
            }
            let Some(health) = world.health(candidate) else {
                continue;
            };
            if health.is_dead() {
                continue;
            }
            let Some(pos) = world.transform(candidate).map(|t| t.position) else {
                continue;
            };
            let distance = origin.distance(pos);
            if distance > range {
                continue;
            }
            match best {
                Some((best_id, best_distance)) => {
                    if distance < best_distance
                        || (distance == best_distance && candidate.0 < best_id.0)
                    {
                        best = Some((candidate, distance));
                    }
                }
                None => best = Some((candidate, distance)),
            }
        }
        best.map(|(id, _)| id)
    }
}
