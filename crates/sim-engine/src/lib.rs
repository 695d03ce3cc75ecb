#![deny(unsafe_code)]
//! Engine facade tying the ECS world, event bus, and gameplay systems
//! together into a tick loop with fixed- or variable-timestep advancement,
//! frame profiling, and lifecycle control.

pub mod error;
pub mod profiler;
pub mod snapshot;
pub mod tick;

pub mod prelude {
    pub use crate::error::EngineError;
    pub use crate::profiler::{
        FrameReport, MarkRecord, Profiler, ProfilerConfig, ProfilerReport, ProfilerScope,
    };
    pub use crate::snapshot::EngineSnapshot;
    pub use crate::tick::{Engine, EngineConfig, EngineDiagnostics, TickOutcome};
}
