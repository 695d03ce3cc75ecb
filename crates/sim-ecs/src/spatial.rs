//! A uniform-cell spatial hash grid for broad-phase proximity queries.
//!
//! Entities are bucketed into fixed-size square cells keyed by their
//! truncated grid coordinate. Range and rect queries only have to visit the
//! handful of cells overlapping the query shape rather than every entity in
//! the world -- this is what the collection system's magnet-attraction pass
//! and the enemy AI's target-acquisition pass both lean on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::component::Rect;
use crate::entity::EntityId;
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpatialGridConfig {
    pub cell_size: f32,
}

impl Default for SpatialGridConfig {
    fn default() -> Self {
        Self { cell_size: 64.0 }
    }
}

type CellCoord = (i32, i32);

#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<EntityId>>,
    positions: HashMap<EntityId, Vec2>,
}

impl SpatialGrid {
    pub fn new(config: SpatialGridConfig) -> Self {
        Self {
            cell_size: config.cell_size.max(1.0),
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    fn cell_of(&self, pos: Vec2) -> CellCoord {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    fn detach(&mut self, id: EntityId) {
        if let Some(old_pos) = self.positions.remove(&id) {
            let cell = self.cell_of(old_pos);
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.retain(|&e| e != id);
                if bucket.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    pub fn insert(&mut self, id: EntityId, pos: Vec2) {
        self.detach(id);
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(id);
        self.positions.insert(id, pos);
    }

    /// Move a tracked entity to a new position. A no-op if `id` is not
    /// currently tracked.
    pub fn update(&mut self, id: EntityId, pos: Vec2) {
        if self.positions.contains_key(&id) {
            self.insert(id, pos);
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.detach(id);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Every tracked entity within `radius` of `center`, ordered arbitrarily.
    pub fn query_range(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let min_cell = self.cell_of(Vec2::new(center.x - radius, center.y - radius));
        let max_cell = self.cell_of(Vec2::new(center.x + radius, center.y + radius));
        let mut found = Vec::new();
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &id in bucket {
                    if let Some(&pos) = self.positions.get(&id) {
                        if pos.distance_squared(center) <= radius_sq {
                            found.push(id);
                        }
                    }
                }
            }
        }
        found
    }

    /// Every tracked entity within an axis-aligned rectangle.
    pub fn query_rect(&self, rect: Rect) -> Vec<EntityId> {
        let min_cell = self.cell_of(rect.min);
        let max_cell = self.cell_of(rect.max);
        let mut found = Vec::new();
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &id in bucket {
                    if let Some(&pos) = self.positions.get(&id) {
                        if pos.x >= rect.min.x
                            && pos.x <= rect.max.x
                            && pos.y >= rect.min.y
                            && pos.y <= rect.max.y
                        {
                            found.push(id);
                        }
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_range_finds_nearby_and_excludes_far() {
        let mut grid = SpatialGrid::new(SpatialGridConfig { cell_size: 16.0 });
        let near = EntityId(1);
        let far = EntityId(2);
        grid.insert(near, Vec2::new(1.0, 1.0));
        grid.insert(far, Vec2::new(500.0, 500.0));
        let hits = grid.query_range(Vec2::ZERO, 10.0);
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn update_moves_entity_between_cells() {
        let mut grid = SpatialGrid::new(SpatialGridConfig { cell_size: 16.0 });
        let id = EntityId(1);
        grid.insert(id, Vec2::new(1.0, 1.0));
        grid.update(id, Vec2::new(500.0, 500.0));
        assert!(grid.query_range(Vec2::ZERO, 10.0).is_empty());
        assert_eq!(grid.query_range(Vec2::new(500.0, 500.0), 10.0), vec![id]);
    }

    #[test]
    fn remove_stops_future_matches() {
        let mut grid = SpatialGrid::new(SpatialGridConfig::default());
        let id = EntityId(1);
        grid.insert(id, Vec2::ZERO);
        grid.remove(id);
        assert!(grid.query_range(Vec2::ZERO, 100.0).is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn query_rect_matches_containment() {
        let mut grid = SpatialGrid::new(SpatialGridConfig { cell_size: 8.0 });
        let inside = EntityId(1);
        let outside = EntityId(2);
        grid.insert(inside, Vec2::new(5.0, 5.0));
        grid.insert(outside, Vec2::new(50.0, 50.0));
        let rect = Rect {
            min: Vec2::ZERO,
            max: Vec2::new(10.0, 10.0),
        };
        assert_eq!(grid.query_rect(rect), vec![inside]);
    }
}
