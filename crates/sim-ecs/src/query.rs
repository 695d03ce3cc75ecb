//! Caches the entity list matched by a [`ComponentSignature`] query.
//!
//! A system typically issues the same query every tick. Rebuilding the
//! match list by scanning every entity each time is wasted work once the
//! world is large, so results are cached by signature and invalidated
//! whenever the world's structure changes (an entity spawns, despawns, or
//! has a component added/removed). The tick loop calls [`QueryCache::invalidate`]
//! once per tick rather than chasing fine-grained dependency tracking.

use std::collections::HashMap;

use crate::component::ComponentSignature;
use crate::entity::EntityId;
use crate::world::World;

#[derive(Debug, Default)]
pub struct QueryCache {
    cache: HashMap<ComponentSignature, Vec<EntityId>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the (cached, or freshly built) list of entities matching
    /// `required`.
    pub fn query<'a>(&'a mut self, world: &World, required: ComponentSignature) -> &'a [EntityId] {
        if self.cache.contains_key(&required) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let matched: Vec<EntityId> = world.query(required).collect();
            self.cache.insert(required, matched);
        }
        self.cache.get(&required).expect("just inserted or present")
    }

    /// Drop all cached results. Must be called whenever the world's
    /// entity/component structure changes.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> QueryCacheStats {
        QueryCacheStats {
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentKind, Health};

    #[test]
    fn repeated_query_is_a_cache_hit() {
        let mut world = World::new();
        let id = world.spawn();
        world
            .set_component(id, Component::Health(Health::new(10.0)))
            .unwrap();
        let mut cache = QueryCache::new();
        let sig = ComponentSignature::single(ComponentKind::Health);
        let _ = cache.query(&world, sig);
        let _ = cache.query(&world, sig);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let mut world = World::new();
        let mut cache = QueryCache::new();
        let sig = ComponentSignature::single(ComponentKind::Transform);
        let _ = cache.query(&world, sig);
        world.spawn();
        cache.invalidate();
        let _ = cache.query(&world, sig);
        assert_eq!(cache.stats().misses, 2);
    }
}
