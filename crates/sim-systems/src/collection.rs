//! Magnet attraction and pickup of collectible entities.

use sim_ecs::prelude::{
    ComponentKind, ComponentSignature, SpatialGrid, SpatialGridConfig, World,
};
use sim_events::prelude::{CollectibleCollected, EventBus, EventKind};

use crate::error::SystemError;

/// Distance at which an attracted collectible is picked up.
const PICKUP_RADIUS: f32 = 30.0;

pub struct CollectionSystem {
    grid_config: SpatialGridConfig,
}

impl CollectionSystem {
    pub fn new(grid_config: SpatialGridConfig) -> Self {
        Self { grid_config }
    }

    pub fn update(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        _now: u64,
        dt: f32,
    ) -> Result<(), SystemError> {
        let mut grid = SpatialGrid::new(self.grid_config);
        let collectible_sig =
            ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Collectible]);
        for id in world.query(collectible_sig).collect::<Vec<_>>() {
            if let Some(transform) = world.transform(id) {
                grid.insert(id, transform.position);
            }
        }

        let magnet_sig =
            ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Magnet]);
        let collectors: Vec<_> = world.query(magnet_sig).collect();

        let mut collected = Vec::new();
        for collector in collectors {
            let Some(magnet) = world.magnet(collector).cloned() else {
                continue;
            };
            if !magnet.is_active {
                continue;
            }
            let Some(collector_pos) = world.transform(collector).map(|t| t.position) else {
                continue;
            };

            for candidate in grid.query_range(collector_pos, magnet.field.range) {
                if candidate == collector {
                    continue;
                }
                let Some(kind) = world.collectible(candidate).map(|c| c.kind) else {
                    continue;
                };
                if !magnet.accepts(kind) {
                    continue;
                }
                let Some(candidate_pos) = world.transform(candidate).map(|t| t.position) else {
                    continue;
                };

                let direction = (collector_pos - candidate_pos).normalized();
                let new_pos = candidate_pos + direction * (magnet.field.strength * dt);
                if let Some(transform) = world.transform_mut(candidate) {
                    transform.position = new_pos;
                }

                if new_pos.distance(collector_pos) <= PICKUP_RADIUS {
                    let value = world.collectible(candidate).map(|c| c.value).unwrap_or(0.0);
                    collected.push((collector, candidate, kind, value));
                }
            }
        }

        for (collector, collectible, kind, value) in collected {
            bus.emit(EventKind::CollectibleCollected(CollectibleCollected {
                collector,
                collectible,
                kind,
                value,
            }));
            world.despawn(collectible)?;
        }

        Ok(())
    }
}
