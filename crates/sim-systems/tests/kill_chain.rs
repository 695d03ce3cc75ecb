//! A lethal auto-attack should cascade into a kill, an experience grant,
//! and (if it crosses a level boundary) a level-up and skill point award,
//! all observable on the same event bus.

use sim_ecs::prelude::{
    Combat, Component, Experience, Health, Skills, Transform, Vec2, Weapon, World,
};
use sim_events::prelude::{EventBus, EventBusConfig, EventKind};
use sim_systems::prelude::{CombatSystem, ProgressionSystem};

#[test]
fn killing_an_enemy_grants_experience_and_may_level_up() {
    let mut world = World::new();

    let attacker = world.spawn();
    world.set_component(attacker, Component::Transform(Transform::default())).unwrap();
    world
        .set_component(
            attacker,
            Component::Combat(Combat {
                weapon: Weapon {
                    damage: 1000.0,
                    range: 50.0,
                    attack_speed: 1.0,
                    critical_chance: None,
                    critical_multiplier: None,
                },
                current_target: None,
                last_attack_at: 0,
                auto_attack: true,
            }),
        )
        .unwrap();
    world.set_component(attacker, Component::Experience(Experience::default())).unwrap();
    world.set_component(attacker, Component::Skills(Skills::default())).unwrap();

    let enemy = world.spawn();
    world
        .set_component(
            enemy,
            Component::Transform(Transform {
                position: Vec2::new(1.0, 0.0),
                ..Transform::default()
            }),
        )
        .unwrap();
    world.set_component(enemy, Component::Health(Health::new(10.0))).unwrap();

    world.combat_mut(attacker).unwrap().current_target = Some(enemy);

    let mut bus = EventBus::new(EventBusConfig {
        history_enabled: true,
        history_capacity: 32,
    });
    let mut combat = CombatSystem::new(99);
    let mut progression = ProgressionSystem::new();

    combat.update(&mut world, &mut bus, 1_000, 0.016).unwrap();
    assert_eq!(bus.events_by_type("ENTITY_KILLED").len(), 1);
    assert!(!world.is_alive(enemy));

    progression.grant_experience(&mut world, &mut bus, attacker, 150.0).unwrap();

    assert_eq!(world.experience(attacker).unwrap().level, 2);
    assert_eq!(world.skills(attacker).unwrap().skill_points, 1);

    let kinds: Vec<_> = bus.history().map(|h| h.event.name()).collect();
    assert!(kinds.contains(&"ENTITY_KILLED"));
    assert!(kinds.contains(&"EXPERIENCE_GAINED"));
    assert!(kinds.contains(&"LEVEL_UP"));
    assert!(kinds.contains(&"SKILL_POINTS_AWARDED"));

    let level_up_events: Vec<_> = bus
        .history()
        .filter_map(|h| match &h.event {
            EventKind::LevelUp(e) => Some(e.new_level),
            _ => None,
        })
        .collect();
    assert_eq!(level_up_events, vec![2]);
}
