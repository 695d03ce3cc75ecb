//! World-level snapshot and restore.
//!
//! Consistency is checked in full before a single field is touched: a
//! snapshot with a dangling free-list entry, a duplicate id, or an entity
//! outside the allocator's known range is rejected wholesale rather than
//! partially applied. This mirrors the "validate, then mutate" discipline
//! the deterministic replay machinery needs everywhere it touches saved
//! state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::{AllocatorSnapshot, EntityAllocator, EntityId};
use crate::error::EcsError;
use crate::world::{Entity, World};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub allocator: AllocatorSnapshot,
    pub order: Vec<EntityId>,
    pub entities: Vec<(EntityId, Entity)>,
}

impl World {
    pub fn capture_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            allocator: self.allocator().snapshot(),
            order: self.order().clone(),
            entities: self
                .raw_entities()
                .iter()
                .map(|(id, entity)| (*id, entity.clone()))
                .collect(),
        }
    }

    pub fn restore_from_snapshot(&mut self, snapshot: WorldSnapshot) -> Result<(), EcsError> {
        validate_snapshot(&snapshot)?;

        *self.allocator_mut() = EntityAllocator::restore(snapshot.allocator);
        *self.order_mut() = snapshot.order;
        let map = self.raw_entities_mut();
        map.clear();
        for (id, entity) in snapshot.entities {
            map.insert(id, entity);
        }
        Ok(())
    }
}

fn validate_snapshot(snapshot: &WorldSnapshot) -> Result<(), EcsError> {
    let order_set: HashSet<EntityId> = snapshot.order.iter().copied().collect();
    if order_set.len() != snapshot.order.len() {
        return Err(EcsError::InvalidSnapshot {
            reason: "order list contains a duplicate entity id".into(),
        });
    }

    let entity_ids: HashSet<EntityId> = snapshot.entities.iter().map(|(id, _)| *id).collect();
    if entity_ids.len() != snapshot.entities.len() {
        return Err(EcsError::InvalidSnapshot {
            reason: "entity list contains a duplicate entity id".into(),
        });
    }
    if entity_ids != order_set {
        return Err(EcsError::InvalidSnapshot {
            reason: "order list and entity list disagree on which entities exist".into(),
        });
    }

    let free_set: HashSet<u32> = snapshot.allocator.free_stack.iter().copied().collect();
    if free_set.len() != snapshot.allocator.free_stack.len() {
        return Err(EcsError::InvalidSnapshot {
            reason: "allocator free list contains a duplicate id".into(),
        });
    }

    for id in &entity_ids {
        if id.0 == 0 || id.0 >= snapshot.allocator.next_id {
            return Err(EcsError::InvalidSnapshot {
                reason: format!(
                    "entity {id} is outside the allocator's known range (next_id = {})",
                    snapshot.allocator.next_id
                ),
            });
        }
        if free_set.contains(&id.0) {
            return Err(EcsError::InvalidSnapshot {
                reason: format!("entity {id} is both alive and on the allocator free list"),
            });
        }
    }

    for &free_id in &free_set {
        if free_id == 0 || free_id >= snapshot.allocator.next_id {
            return Err(EcsError::InvalidSnapshot {
                reason: format!(
                    "free-list id {free_id} is outside the allocator's known range (next_id = {})",
                    snapshot.allocator.next_id
                ),
            });
        }
    }

    Ok(())
}
