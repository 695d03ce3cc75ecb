//! Engine-level snapshots: the ECS world plus the frame/sim-time counters
//! needed to resume a tick loop exactly where it left off.
//!
//! Per-system RNG state (e.g. [`sim_systems::spawner::SpawnerSystem`]'s
//! `Pcg32`) is deliberately not part of this snapshot. `Pcg32` carries no
//! serde support in the upstream crate, and the systems themselves are
//! owned by the host application, not the `Engine` -- the host reattaches
//! its systems after a restore, and a freshly-constructed system seeded the
//! same way only reproduces the exact same draws if it is restored before
//! its first draw. Hosts that need bit-exact replay across a restore point
//! should restore at a system boundary (e.g. between waves) rather than
//! mid-sequence.

use serde::{Deserialize, Serialize};

use sim_ecs::prelude::WorldSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub world: WorldSnapshot,
    pub frame: u64,
    pub sim_time_ms: u64,
}
