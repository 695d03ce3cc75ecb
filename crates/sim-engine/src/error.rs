//! Error type for engine-level operations (system registration, lifecycle).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a system named {0:?} is already attached")]
    SystemAlreadyAttached(String),

    #[error("no system named {0:?} is attached")]
    UnknownSystem(String),

    #[error("system {0:?} declares a dependency on unattached system {1:?}")]
    UnknownDependency(String, String),

    #[error("attaching system {0:?} would create a dependency cycle")]
    DependencyCycle(String),
}
