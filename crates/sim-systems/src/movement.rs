//! Integrates acceleration, friction and speed clamping into position.

use sim_ecs::prelude::{ComponentKind, ComponentSignature, World};
use sim_events::prelude::EventBus;

use crate::error::SystemError;

#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn update(
        &mut self,
        world: &mut World,
        _bus: &mut EventBus,
        _now: u64,
        dt: f32,
    ) -> Result<(), SystemError> {
        let sig =
            ComponentSignature::from_kinds([ComponentKind::Transform, ComponentKind::Movement]);
        let ids: Vec<_> = world.query(sig).collect();

        for id in ids {
            let Some(movement) = world.movement_mut(id) else {
                continue;
            };
            movement.velocity += movement.acceleration * dt;

            if movement.max_speed > 0.0 && movement.velocity.length() > movement.max_speed {
                movement.velocity = movement.velocity.normalized() * movement.max_speed;
            }

            // Multiplicative drag, not a subtractive clamp to zero: a
            // friction above 1/dt reverses velocity instead of just
            // halting it, and a negative friction amplifies it.
            movement.velocity *= 1.0 - movement.friction * dt;

            let velocity = movement.velocity;
            if let Some(transform) = world.transform_mut(id) {
                transform.position += velocity * dt;
            }
        }

        Ok(())
    }
}
