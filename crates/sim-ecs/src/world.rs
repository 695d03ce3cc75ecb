//! The entity-component store.
//!
//! Each entity is a fixed 12-slot array indexed by [`ComponentKind`] plus a
//! [`ComponentSignature`] bitmask kept in sync with which slots are
//! occupied, so a query is just `signature.satisfies(required)` over the
//! entities a system cares about -- no type erasure, no downcasting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::component::{
    Collectible, Combat, Component, ComponentKind, ComponentSignature, Difficulty, EnemyAi,
    Experience, Health, Inventory, Magnet, Movement, Skills, Spawner, Transform,
};
use crate::entity::{EntityAllocator, EntityId};
use crate::error::EcsError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    pub signature: ComponentSignature,
    slots: [Option<Component>; ComponentKind::COUNT],
}

impl Entity {
    fn slot(&self, kind: ComponentKind) -> &Option<Component> {
        &self.slots[kind as usize]
    }

    fn slot_mut(&mut self, kind: ComponentKind) -> &mut Option<Component> {
        &mut self.slots[kind as usize]
    }
}

/// Owns every entity and component in the simulation.
#[derive(Debug, Clone)]
pub struct World {
    allocator: EntityAllocator,
    entities: HashMap<EntityId, Entity>,
    /// Insertion order, so queries and snapshots iterate deterministically
    /// rather than at HashMap's mercy.
    order: Vec<EntityId>,
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $kind:ident, $ty:ty) => {
        pub fn $get(&self, id: EntityId) -> Option<&$ty> {
            match self.get(id, ComponentKind::$kind) {
                Some(Component::$kind(c)) => Some(c),
                _ => None,
            }
        }

        pub fn $get_mut(&mut self, id: EntityId) -> Option<&mut $ty> {
            match self.get_mut(id, ComponentKind::$kind) {
                Some(Component::$kind(c)) => Some(c),
                _ => None,
            }
        }
    };
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.insert(id, Entity::default());
        self.order.push(id);
        trace!(entity = %id, "spawned entity");
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Result<(), EcsError> {
        if self.entities.remove(&id).is_none() {
            return Err(EcsError::UnknownEntity(id));
        }
        self.order.retain(|&existing| existing != id);
        self.allocator.recycle(id);
        debug!(entity = %id, "despawned entity");
        Ok(())
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    /// Add `component` to `id`. Fails with `DuplicateComponent` if the
    /// entity already carries one of that kind -- callers that want to
    /// replace an existing component must `remove_component` first.
    pub fn set_component(&mut self, id: EntityId, component: Component) -> Result<(), EcsError> {
        let kind = component.kind();
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        if entity.signature.contains(kind) {
            return Err(EcsError::DuplicateComponent { entity: id, kind: kind.name() });
        }
        entity.signature.insert(kind);
        *entity.slot_mut(kind) = Some(component);
        Ok(())
    }

    pub fn remove_component(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
    ) -> Result<Option<Component>, EcsError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        entity.signature.remove(kind);
        Ok(entity.slot_mut(kind).take())
    }

    pub fn get(&self, id: EntityId, kind: ComponentKind) -> Option<&Component> {
        self.entities.get(&id)?.slot(kind).as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId, kind: ComponentKind) -> Option<&mut Component> {
        self.entities.get_mut(&id)?.slot_mut(kind).as_mut()
    }

    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|e| e.signature.contains(kind))
    }

    pub fn signature(&self, id: EntityId) -> Option<ComponentSignature> {
        self.entities.get(&id).map(|e| e.signature)
    }

    /// Look up a component by its registry name (e.g. `"transform"`)
    /// rather than by `ComponentKind`, for host integrations that address
    /// components as strings. Fails with `UnknownComponentType` if `name`
    /// doesn't match any known kind.
    pub fn get_by_name(&self, id: EntityId, name: &str) -> Result<Option<&Component>, EcsError> {
        let kind = ComponentKind::from_name(name)
            .ok_or_else(|| EcsError::UnknownComponentType(name.to_owned()))?;
        Ok(self.get(id, kind))
    }

    /// Entities (in insertion order) whose signature satisfies `required`.
    pub fn query(&self, required: ComponentSignature) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied().filter(move |id| {
            self.entities
                .get(id)
                .is_some_and(|e| e.signature.satisfies(required))
        })
    }

    pub(crate) fn allocator(&self) -> &EntityAllocator {
        &self.allocator
    }

    pub(crate) fn allocator_mut(&mut self) -> &mut EntityAllocator {
        &mut self.allocator
    }

    pub(crate) fn raw_entities(&self) -> &HashMap<EntityId, Entity> {
        &self.entities
    }

    pub(crate) fn raw_entities_mut(&mut self) -> &mut HashMap<EntityId, Entity> {
        &mut self.entities
    }

    pub(crate) fn order(&self) -> &Vec<EntityId> {
        &self.order
    }

    pub(crate) fn order_mut(&mut self) -> &mut Vec<EntityId> {
        &mut self.order
    }

    typed_accessors!(transform, transform_mut, Transform, Transform);
    typed_accessors!(health, health_mut, Health, Health);
    typed_accessors!(movement, movement_mut, Movement, Movement);
    typed_accessors!(combat, combat_mut, Combat, Combat);
    typed_accessors!(experience, experience_mut, Experience, Experience);
    typed_accessors!(inventory, inventory_mut, Inventory, Inventory);
    typed_accessors!(skills, skills_mut, Skills, Skills);
    typed_accessors!(collectible, collectible_mut, Collectible, Collectible);
    typed_accessors!(magnet, magnet_mut, Magnet, Magnet);
    typed_accessors!(enemy_ai, enemy_ai_mut, EnemyAi, EnemyAi);
    typed_accessors!(spawner, spawner_mut, Spawner, Spawner);
    typed_accessors!(difficulty, difficulty_mut, Difficulty, Difficulty);
}
