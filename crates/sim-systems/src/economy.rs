//! Resource and item transfers, shop purchases, and kill-driven resource
//! drops.
//!
//! `drop_resources` is the wiring point for `ENTITY_KILLED`: like
//! [`crate::progression::ProgressionSystem::grant_experience`], this crate
//! doesn't subscribe systems to the bus directly (a deterministic,
//! single-threaded tick loop calls systems in a fixed order, not an
//! event-driven fan-out) -- a caller observing `ENTITY_KILLED` (the combat
//! or skill system, or the engine's integration layer) invokes it with the
//! killer and a caller-supplied victim type.

use std::collections::HashMap;

use rand::Rng;
use rand_pcg::Pcg32;
use sim_ecs::prelude::{EntityId, World};
use sim_events::prelude::{
    EventBus, EventKind, ItemPurchased, ItemTransferred, ResourceGained, ResourceTransferred,
};

use crate::error::SystemError;

/// A single entry in a drop table: on a roll `<= chance`, grant `amount` of
/// `resource` to the killer.
#[derive(Debug, Clone)]
pub struct DropEntry {
    pub resource: String,
    pub amount: f64,
    pub chance: f32,
}

/// A purchasable catalogue entry. `stock` of `None` means unlimited.
#[derive(Debug, Clone)]
pub struct ShopItem {
    pub item_id: String,
    pub cost: Vec<(String, f64)>,
    pub stock: Option<u32>,
}

/// Drop tables matching the enemy tiers a spawner catalogue would define
/// (see [`crate::spawner`]).
pub fn default_drop_tables() -> HashMap<String, Vec<DropEntry>> {
    let mut tables = HashMap::new();
    tables.insert(
        "basic_enemy".to_string(),
        vec![DropEntry {
            resource: "gold".to_string(),
            amount: 5.0,
            chance: 0.5,
        }],
    );
    tables.insert(
        "elite_enemy".to_string(),
        vec![
            DropEntry {
                resource: "gold".to_string(),
                amount: 20.0,
                chance: 0.75,
            },
            DropEntry {
                resource: "gem".to_string(),
                amount: 1.0,
                chance: 0.1,
            },
        ],
    );
    tables.insert(
        "boss_enemy".to_string(),
        vec![
            DropEntry {
                resource: "gold".to_string(),
                amount: 100.0,
                chance: 1.0,
            },
            DropEntry {
                resource: "gem".to_string(),
                amount: 5.0,
                chance: 0.5,
            },
        ],
    );
    tables
}

pub struct EconomySystem {
    shop_items: HashMap<String, ShopItem>,
    drop_tables: HashMap<String, Vec<DropEntry>>,
    rng: Pcg32,
}

impl EconomySystem {
    pub fn new(seed: u64) -> Self {
        Self {
            shop_items: HashMap::new(),
            drop_tables: default_drop_tables(),
            rng: Pcg32::new(seed, 0xf3b2c9a1d4e5f607),
        }
    }

    pub fn register_shop_item(&mut self, item: ShopItem) {
        self.shop_items.insert(item.item_id.clone(), item);
    }

    pub fn register_drop_table(&mut self, victim_type: impl Into<String>, entries: Vec<DropEntry>) {
        self.drop_tables.insert(victim_type.into(), entries);
    }

    pub fn grant_resource(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        entity: EntityId,
        resource: &str,
        amount: f64,
    ) -> Result<(), SystemError> {
        let Some(inventory) = world.inventory_mut(entity) else {
            return Err(SystemError::MissingComponent {
                entity,
                kind: "inventory",
            });
        };
        inventory.add_resource(resource, amount);
        bus.emit(EventKind::ResourceGained(ResourceGained {
            entity,
            resource: resource.to_owned(),
            amount,
        }));
        Ok(())
    }

    pub fn transfer_resource(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        from: EntityId,
        to: EntityId,
        resource: &str,
        amount: f64,
    ) -> Result<(), SystemError> {
        let have = world
            .inventory(from)
            .ok_or(SystemError::MissingComponent {
                entity: from,
                kind: "inventory",
            })?
            .resource(resource);
        if have < amount {
            return Err(SystemError::InsufficientResource {
                resource: resource.to_owned(),
                have,
                need: amount,
            });
        }
        world.inventory_mut(from).unwrap().remove_resource(resource, amount);
        let Some(to_inventory) = world.inventory_mut(to) else {
            // Refund, since the destination can't receive it.
            world.inventory_mut(from).unwrap().add_resource(resource, amount);
            return Err(SystemError::MissingComponent {
                entity: to,
                kind: "inventory",
            });
        };
        to_inventory.add_resource(resource, amount);
        bus.emit(EventKind::ResourceTransferred(ResourceTransferred {
            from,
            to,
            resource: resource.to_owned(),
            amount,
        }));
        Ok(())
    }

    pub fn transfer_item(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        from: EntityId,
        to: EntityId,
        item_id: &str,
        quantity: u32,
    ) -> Result<(), SystemError> {
        let from_inventory = world.inventory_mut(from).ok_or(SystemError::MissingComponent {
            entity: from,
            kind: "inventory",
        })?;
        let Some(slot) = from_inventory.slots.iter_mut().find(|s| s.item_id == item_id) else {
            return Err(SystemError::InsufficientResource {
                resource: item_id.to_owned(),
                have: 0.0,
                need: quantity as f64,
            });
        };
        if slot.quantity < quantity {
            return Err(SystemError::InsufficientResource {
                resource: item_id.to_owned(),
                have: slot.quantity as f64,
                need: quantity as f64,
            });
        }
        slot.quantity -= quantity;
        if slot.quantity == 0 {
            from_inventory.slots.retain(|s| s.item_id != item_id);
        }

        let Some(to_inventory) = world.inventory_mut(to) else {
            // Refund.
            let from_inventory = world.inventory_mut(from).unwrap();
            from_inventory.add_item(item_id, quantity);
            return Err(SystemError::MissingComponent {
                entity: to,
                kind: "inventory",
            });
        };
        if !to_inventory.add_item(item_id, quantity) {
            let from_inventory = world.inventory_mut(from).unwrap();
            from_inventory.add_item(item_id, quantity);
            return Err(SystemError::InsufficientResource {
                resource: "inventory_slot".to_owned(),
                have: 0.0,
                need: 1.0,
            });
        }

        bus.emit(EventKind::ItemTransferred(ItemTransferred {
            from,
            to,
            item_id: item_id.to_owned(),
            quantity,
        }));
        Ok(())
    }

    /// Buy one unit of a registered shop item: checks cost across every
    /// resource the item's price spans, decrements stock if bounded, and
    /// adds the item to `buyer`'s inventory.
    pub fn purchase_item(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        buyer: EntityId,
        item_id: &str,
    ) -> Result<(), SystemError> {
        let item = self
            .shop_items
            .get(item_id)
            .cloned()
            .ok_or_else(|| SystemError::UnknownShopItem(item_id.to_owned()))?;

        if item.stock == Some(0) {
            return Err(SystemError::InsufficientResource {
                resource: format!("{item_id}:stock"),
                have: 0.0,
                need: 1.0,
            });
        }

        let inventory = world.inventory_mut(buyer).ok_or(SystemError::MissingComponent {
            entity: buyer,
            kind: "inventory",
        })?;
        for (resource, amount) in &item.cost {
            if inventory.resource(resource) < *amount {
                return Err(SystemError::InsufficientResource {
                    resource: resource.clone(),
                    have: inventory.resource(resource),
                    need: *amount,
                });
            }
        }
        for (resource, amount) in &item.cost {
            inventory.remove_resource(resource, *amount);
        }
        if !inventory.add_item(item_id, 1) {
            for (resource, amount) in &item.cost {
                inventory.add_resource(resource, *amount);
            }
            return Err(SystemError::InsufficientResource {
                resource: "inventory_slot".to_owned(),
                have: 0.0,
                need: 1.0,
            });
        }

        if let Some(stock) = self.shop_items.get_mut(item_id).and_then(|i| i.stock.as_mut()) {
            *stock -= 1;
        }

        let total_cost: f64 = item.cost.iter().map(|(_, amount)| amount).sum();
        let primary_resource = item.cost.first().map(|(r, _)| r.clone()).unwrap_or_default();
        bus.emit(EventKind::ItemPurchased(ItemPurchased {
            buyer,
            item_id: item_id.to_owned(),
            cost: total_cost,
            resource: primary_resource,
        }));
        Ok(())
    }

    /// Roll `victim_type`'s drop table against `killer`'s inventory,
    /// granting each entry that beats its chance and emitting
    /// `RESOURCE_GAINED`. A no-op if no table is registered for
    /// `victim_type`.
    pub fn drop_resources(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        killer: EntityId,
        victim_type: &str,
    ) -> Result<(), SystemError> {
        let Some(table) = self.drop_tables.get(victim_type).cloned() else {
            return Ok(());
        };
        let inventory = world.inventory_mut(killer).ok_or(SystemError::MissingComponent {
            entity: killer,
            kind: "inventory",
        })?;
        for entry in &table {
            if self.rng.gen::<f32>() > entry.chance {
                continue;
            }
            inventory.add_resource(&entry.resource, entry.amount);
            bus.emit(EventKind::ResourceGained(ResourceGained {
                entity: killer,
                resource: entry.resource.clone(),
                amount: entry.amount,
            }));
        }
        Ok(())
    }

    /// Sum of `entity`'s resources and item stacks, each priced by
    /// `valuation` (keyed by resource kind or item id; entries absent from
    /// `valuation` are valued at zero).
    pub fn calculate_net_worth(&self, world: &World, entity: EntityId, valuation: &HashMap<String, f64>) -> f64 {
        let Some(inventory) = world.inventory(entity) else {
            return 0.0;
        };
        let resources: f64 = inventory
            .resources
            .iter()
            .map(|(kind, amount)| valuation.get(kind).copied().unwrap_or(0.0) * amount)
            .sum();
        let items: f64 = inventory
            .slots
            .iter()
            .map(|slot| valuation.get(&slot.item_id).copied().unwrap_or(0.0) * slot.quantity as f64)
            .sum();
        resources + items
    }
}
