//! The [`Engine`] facade: owns a [`World`] and an [`EventBus`], drives
//! systems forward on a fixed- or variable-timestep tick, and reports
//! per-tick diagnostics.
//!
//! Systems are attached as named, ordered closures rather than a generic
//! scheduler trait — the set of systems is small and fixed per host, and a
//! closure lets each system carry its own state (an RNG seed, a database)
//! without an extra trait object per system kind.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sim_ecs::prelude::World;
use sim_events::prelude::{EventBus, EventBusConfig};
use sim_systems::prelude::SystemError;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::profiler::{Profiler, ProfilerConfig};
use crate::snapshot::EngineSnapshot;

/// Number of times a given system's errors are logged before being
/// silently suppressed for the rest of the run.
const ERROR_LOG_LIMIT: u32 = 5;

/// Fixed-timestep ticks performed per [`Engine::tick`] call before leftover
/// accumulator time is discarded (spiral-of-death guard).
const MAX_SUBSTEPS: u32 = 5;

/// Variable-timestep delta is clamped to this many milliseconds so a stall
/// (debugger pause, OS scheduling hiccup) can't produce a giant simulation
/// jump on the next tick.
const MAX_VARIABLE_DELTA_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub target_fps: u32,
    pub fixed_time_step: bool,
    pub enable_event_history: bool,
    pub profiler: ProfilerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            fixed_time_step: true,
            enable_event_history: false,
            profiler: ProfilerConfig::default(),
        }
    }
}

impl EngineConfig {
    fn step_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1) as f64
    }
}

type SystemFn = Box<dyn FnMut(&mut World, &mut EventBus, u64, f32) -> Result<(), SystemError>>;

struct RegisteredSystem {
    name: String,
    after: Vec<String>,
    func: SystemFn,
}

#[derive(Debug, Clone, Default)]
pub struct EngineDiagnostics {
    pub ticks_run: u64,
    pub substeps_run: u64,
    pub discarded_accumulator_events: u64,
    pub failed_system_calls: u64,
    pub last_tick_duration: Duration,
}

/// The engine facade: owns the world and event bus, schedules systems each
/// tick, and exposes lifecycle control (`start`/`stop`/`destroy`).
pub struct Engine {
    config: EngineConfig,
    world: World,
    bus: EventBus,
    profiler: Profiler,
    systems: Vec<RegisteredSystem>,
    running: bool,
    frame: u64,
    sim_time_ms: u64,
    accumulator_ms: f64,
    last_tick_at: Option<Instant>,
    error_counts: HashMap<String, u32>,
    diagnostics: EngineDiagnostics,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let bus = EventBus::new(EventBusConfig {
            history_enabled: config.enable_event_history,
            ..EventBusConfig::default()
        });
        let profiler = Profiler::new(config.profiler.clone());
        Self {
            config,
            world: World::new(),
            bus,
            profiler,
            systems: Vec::new(),
            running: false,
            frame: 0,
            sim_time_ms: 0,
            accumulator_ms: 0.0,
            last_tick_at: None,
            error_counts: HashMap::new(),
            diagnostics: EngineDiagnostics::default(),
        }
    }

    /// Attach a system to run every tick, in the order systems are
    /// attached, after every name listed in `after` has already run.
    pub fn attach_system(
        &mut self,
        name: &str,
        after: &[&str],
        func: impl FnMut(&mut World, &mut EventBus, u64, f32) -> Result<(), SystemError> + 'static,
    ) -> Result<(), EngineError> {
        if self.systems.iter().any(|s| s.name == name) {
            return Err(EngineError::SystemAlreadyAttached(name.to_owned()));
        }
        for dep in after {
            if !self.systems.iter().any(|s| s.name == *dep) {
                return Err(EngineError::UnknownDependency(name.to_owned(), (*dep).to_owned()));
            }
        }
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            after: after.iter().map(|s| s.to_string()).collect(),
            func: Box::new(func),
        });
        self.validate_system_order(name)?;
        Ok(())
    }

    fn validate_system_order(&self, just_added: &str) -> Result<(), EngineError> {
        let mut visited = vec![false; self.systems.len()];
        let mut in_stack = vec![false; self.systems.len()];

        fn dfs(systems: &[RegisteredSystem], idx: usize, visited: &mut [bool], in_stack: &mut [bool]) -> bool {
            if in_stack[idx] {
                return false;
            }
            if visited[idx] {
                return true;
            }
            visited[idx] = true;
            in_stack[idx] = true;
            for dep_name in &systems[idx].after {
                if let Some(dep_idx) = systems.iter().position(|s| s.name == *dep_name) {
                    if !dfs(systems, dep_idx, visited, in_stack) {
                        return false;
                    }
                }
            }
            in_stack[idx] = false;
            true
        }

        for i in 0..self.systems.len() {
            if !dfs(&self.systems, i, &mut visited, &mut in_stack) {
                return Err(EngineError::DependencyCycle(just_added.to_owned()));
            }
        }
        Ok(())
    }

    pub fn start(&mut self) {
        info!(frame = self.frame, "engine starting");
        self.running = true;
        self.last_tick_at = None;
        self.accumulator_ms = 0.0;
    }

    /// Latch that prevents further ticks. A tick already in progress always
    /// runs to completion since the engine is single-threaded.
    pub fn stop(&mut self) {
        info!(frame = self.frame, "engine stopping");
        self.running = false;
    }

    /// Stop the loop, clear all systems and entities, and clear the event
    /// bus. The engine is left usable for a fresh `start`.
    pub fn destroy(&mut self) {
        info!(frame = self.frame, "engine destroying world and systems");
        self.stop();
        self.systems.clear();
        self.world = World::new();
        self.bus.clear_listeners();
        self.bus.clear_history();
        self.profiler.clear();
        self.frame = 0;
        self.sim_time_ms = 0;
        self.accumulator_ms = 0.0;
        self.error_counts.clear();
        self.diagnostics = EngineDiagnostics::default();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Drive the engine forward by one wall-clock tick. No-op if the
    /// engine isn't running. Internally dispatches to fixed- or
    /// variable-timestep advancement per [`EngineConfig::fixed_time_step`].
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::default();
        }
        let now = Instant::now();
        let wall_delta_ms = match self.last_tick_at {
            Some(prev) => now.duration_since(prev).as_secs_f64() * 1000.0,
            None => 0.0,
        };
        self.last_tick_at = Some(now);
        self.dispatch(wall_delta_ms)
    }

    /// Drive the engine forward using an explicit elapsed time instead of
    /// the wall clock. Used for headless/deterministic runs and by tests
    /// that would otherwise be at the mercy of real scheduling jitter.
    pub fn step(&mut self, elapsed_ms: f64) -> TickOutcome {
        if !self.running {
            return TickOutcome::default();
        }
        self.dispatch(elapsed_ms)
    }

    fn dispatch(&mut self, wall_delta_ms: f64) -> TickOutcome {
        let tick_start = Instant::now();
        let outcome = if self.config.fixed_time_step {
            self.tick_fixed(wall_delta_ms)
        } else {
            self.tick_variable(wall_delta_ms)
        };
        self.diagnostics.last_tick_duration = tick_start.elapsed();
        outcome
    }

    fn tick_variable(&mut self, wall_delta_ms: f64) -> TickOutcome {
        let clamped_ms = wall_delta_ms.clamp(0.0, MAX_VARIABLE_DELTA_MS as f64);
        self.advance(clamped_ms);
        TickOutcome { substeps: 1, discarded_remainder: false }
    }

    fn tick_fixed(&mut self, wall_delta_ms: f64) -> TickOutcome {
        let step_ms = self.config.step_ms();
        self.accumulator_ms += wall_delta_ms;

        let mut substeps = 0;
        while self.accumulator_ms >= step_ms && substeps < MAX_SUBSTEPS {
            self.advance(step_ms);
            self.accumulator_ms -= step_ms;
            substeps += 1;
        }

        let discarded_remainder = substeps == MAX_SUBSTEPS && self.accumulator_ms >= step_ms;
        if discarded_remainder {
            warn!(
                leftover_ms = self.accumulator_ms,
                "fixed-timestep accumulator exceeded substep budget, discarding leftover time"
            );
            self.diagnostics.discarded_accumulator_events += 1;
            self.accumulator_ms = 0.0;
        }

        self.diagnostics.substeps_run += substeps as u64;
        TickOutcome { substeps, discarded_remainder }
    }

    /// Run every registered system once against the world, with `delta_ms`
    /// of simulated time, and advance the frame/sim-time counters.
    fn advance(&mut self, delta_ms: f64) {
        self.frame += 1;
        self.sim_time_ms += delta_ms.round() as u64;
        self.bus.set_time(self.sim_time_ms);
        self.diagnostics.ticks_run += 1;

        let dt_seconds = (delta_ms / 1000.0) as f32;
        self.profiler.begin_frame(self.frame);

        for system in &mut self.systems {
            self.profiler.begin_mark(&system.name, None);
            let result = (system.func)(&mut self.world, &mut self.bus, self.sim_time_ms, dt_seconds);
            self.profiler.end_mark(&system.name);

            if let Err(err) = result {
                self.diagnostics.failed_system_calls += 1;
                let count = self.error_counts.entry(system.name.clone()).or_insert(0);
                *count += 1;
                if *count <= ERROR_LOG_LIMIT {
                    warn!(system = %system.name, error = %err, "system update failed");
                    if *count == ERROR_LOG_LIMIT {
                        warn!(system = %system.name, "suppressing further errors from this system");
                    }
                }
            }
        }

        self.profiler.end_frame();
        debug!(
            frame = self.frame,
            entity_count = self.world.entity_count(),
            dt_ms = delta_ms,
            "tick complete"
        );
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn profiler_mut(&mut self) -> &mut Profiler {
        &mut self.profiler
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn sim_time_ms(&self) -> u64 {
        self.sim_time_ms
    }

    pub fn diagnostics(&self) -> &EngineDiagnostics {
        &self.diagnostics
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn capture_snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            world: self.world.capture_snapshot(),
            frame: self.frame,
            sim_time_ms: self.sim_time_ms,
        }
    }

    pub fn restore_from_snapshot(&mut self, snapshot: EngineSnapshot) -> Result<(), sim_ecs::prelude::EcsError> {
        self.world.restore_from_snapshot(snapshot.world)?;
        self.frame = snapshot.frame;
        self.sim_time_ms = snapshot.sim_time_ms;
        self.accumulator_ms = 0.0;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    pub substeps: u32,
    pub discarded_remainder: bool,
}
