//! Experience intake and level-up fan-out (skill points, events).
//!
//! Unlike the per-tick systems, progression is driven by callers (typically
//! the combat or collection systems reacting to a kill or an experience
//! pickup) rather than scanning the world every tick.

use sim_ecs::prelude::{EntityId, World};
use sim_events::prelude::{EventBus, EventKind, ExperienceGained, LevelUp, SkillPointsAwarded};

use crate::error::SystemError;

/// Skill points granted per level gained.
const SKILL_POINTS_PER_LEVEL: u32 = 1;

#[derive(Debug, Default)]
pub struct ProgressionSystem;

impl ProgressionSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn grant_experience(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        entity: EntityId,
        amount: f64,
    ) -> Result<(), SystemError> {
        let Some(xp) = world.experience_mut(entity) else {
            return Err(SystemError::MissingComponent {
                entity,
                kind: "experience",
            });
        };
        let levels_gained = xp.add_experience(amount);
        let total_xp = xp.total_xp;

        if amount > 0.0 {
            bus.emit(EventKind::ExperienceGained(ExperienceGained {
                entity,
                amount,
                total_xp,
            }));
        }

        for level in levels_gained {
            bus.emit(EventKind::LevelUp(LevelUp {
                entity,
                new_level: level,
            }));
            if let Some(skills) = world.skills_mut(entity) {
                skills.skill_points += SKILL_POINTS_PER_LEVEL;
                bus.emit(EventKind::SkillPointsAwarded(SkillPointsAwarded {
                    entity,
                    amount: SKILL_POINTS_PER_LEVEL,
                }));
            }
        }

        Ok(())
    }

    pub fn set_level(&mut self, world: &mut World, entity: EntityId, level: u32) -> Result<(), SystemError> {
        let Some(xp) = world.experience_mut(entity) else {
            return Err(SystemError::MissingComponent {
                entity,
                kind: "experience",
            });
        };
        xp.set_level(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ecs::prelude::{Component, Experience, Skills};
    use sim_events::prelude::EventBusConfig;

    #[test]
    fn grant_experience_emits_gained_and_level_up() {
        let mut world = World::new();
        let id = world.spawn();
        world
            .set_component(id, Component::Experience(Experience::default()))
            .unwrap();
        world
            .set_component(id, Component::Skills(Skills::default()))
            .unwrap();

        let mut bus = EventBus::new(EventBusConfig {
            history_enabled: true,
            history_capacity: 16,
        });
        let mut system = ProgressionSystem::new();
        system.grant_experience(&mut world, &mut bus, id, 300.0).unwrap();

        assert_eq!(world.experience(id).unwrap().level, 2);
        assert_eq!(world.skills(id).unwrap().skill_points, 1);
        assert_eq!(bus.events_by_type("EXPERIENCE_GAINED").len(), 1);
        assert_eq!(bus.events_by_type("LEVEL_UP").len(), 1);
        assert_eq!(bus.events_by_type("SKILL_POINTS_AWARDED").len(), 1);
    }

    #[test]
    fn missing_experience_component_errors() {
        let mut world = World::new();
        let id = world.spawn();
        let mut bus = EventBus::new(EventBusConfig::default());
        let mut system = ProgressionSystem::new();
        let err = system.grant_experience(&mut world, &mut bus, id, 10.0).unwrap_err();
        assert!(matches!(err, SystemError::MissingComponent { .. }));
    }
}
