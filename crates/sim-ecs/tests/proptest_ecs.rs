//! Property tests for `World`/`EntityAllocator` invariants under random
//! sequences of spawn/despawn/component operations.

use proptest::prelude::*;
use sim_ecs::prelude::{Component, ComponentKind, ComponentSignature, Health, Transform, World};

#[derive(Debug, Clone)]
enum WorldOp {
    Spawn,
    Despawn(usize),
    SetTransform(usize),
    SetHealth(usize),
    RemoveHealth(usize),
}

fn world_op_strategy() -> impl Strategy<Value = WorldOp> {
    prop_oneof![
        Just(WorldOp::Spawn),
        (0..64usize).prop_map(WorldOp::Despawn),
        (0..64usize).prop_map(WorldOp::SetTransform),
        (0..64usize).prop_map(WorldOp::SetHealth),
        (0..64usize).prop_map(WorldOp::RemoveHealth),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn random_ops_preserve_world_invariants(ops in prop::collection::vec(world_op_strategy(), 1..100)) {
        let mut world = World::new();
        let mut alive: Vec<sim_ecs::prelude::EntityId> = Vec::new();
        let mut seen_ids: std::collections::HashSet<sim_ecs::prelude::EntityId> = std::collections::HashSet::new();

        for op in ops {
            match op {
                WorldOp::Spawn => {
                    let id = world.spawn();
                    // A freshly minted id is never one still tracked as alive.
                    prop_assert!(!alive.contains(&id));
                    prop_assert!(world.is_alive(id));
                    alive.push(id);
                    seen_ids.insert(id);
                }
                WorldOp::Despawn(i) => {
                    if alive.is_empty() {
                        continue;
                    }
                    let id = alive.remove(i % alive.len());
                    prop_assert!(world.despawn(id).is_ok());
                    prop_assert!(!world.is_alive(id));
                    // Despawning the same id twice is a rejected no-op, not
                    // a second successful removal.
                    prop_assert!(world.despawn(id).is_err());
                }
                WorldOp::SetTransform(i) => {
                    if alive.is_empty() {
                        continue;
                    }
                    let id = alive[i % alive.len()];
                    let already_has = world.has_component(id, ComponentKind::Transform);
                    let result = world.set_component(id, Component::Transform(Transform::default()));
                    if already_has {
                        prop_assert!(matches!(result, Err(sim_ecs::prelude::EcsError::DuplicateComponent { .. })));
                    } else {
                        prop_assert!(result.is_ok());
                    }
                }
                WorldOp::SetHealth(i) => {
                    if alive.is_empty() {
                        continue;
                    }
                    let id = alive[i % alive.len()];
                    let already_has = world.has_component(id, ComponentKind::Health);
                    let result = world.set_component(id, Component::Health(Health::new(100.0)));
                    if already_has {
                        prop_assert!(matches!(result, Err(sim_ecs::prelude::EcsError::DuplicateComponent { .. })));
                    } else {
                        prop_assert!(result.is_ok());
                    }
                }
                WorldOp::RemoveHealth(i) => {
                    if alive.is_empty() {
                        continue;
                    }
                    let id = alive[i % alive.len()];
                    let _ = world.remove_component(id, ComponentKind::Health);
                }
            }

            // Every live entity's signature must agree with has_component
            // for every component kind, and a query over any signature must
            // return exactly the live entities whose signature satisfies it.
            for &id in &alive {
                let sig = world.signature(id).expect("alive entity has a signature");
                for kind in ComponentKind::ALL {
                    prop_assert_eq!(sig.contains(kind), world.has_component(id, kind));
                }
            }

            let health_sig = ComponentSignature::single(ComponentKind::Health);
            let queried: std::collections::HashSet<_> = world.query(health_sig).collect();
            for &id in &alive {
                let expected = world.has_component(id, ComponentKind::Health);
                prop_assert_eq!(queried.contains(&id), expected);
            }

            // No id outside the currently-alive set is ever reported alive.
            for &id in &seen_ids {
                if !alive.contains(&id) {
                    prop_assert!(!world.is_alive(id));
                }
            }

            prop_assert_eq!(world.entity_count(), alive.len());
        }
    }
}
