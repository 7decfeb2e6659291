//! QuillSync Engine - readiness gating and task composition
//!
//! Provides:
//! - [`Engine`](engine::Engine) - uniform contract over one remote backend,
//!   with a readiness level and a shared concurrency budget
//! - Task framework - gated single-completion tasks and fan-out combinators
//! - Connection probe - provisions/verifies the two required remote
//!   directories and maps the outcome into engine readiness
//!
//! ## Modules
//!
//! - [`engine`] - the `Engine` wrapper and its status transitions
//! - [`gate`] - the readiness/budget gate tasks wait on
//! - [`task`] - `Task`, `run_all`, `list_then`
//! - [`probe`] - the connection probe

pub mod engine;
pub mod gate;
pub mod probe;
pub mod task;

pub use engine::Engine;
pub use gate::{TaskKind, MAX_RUNNING_OPERATIONS};
pub use probe::{run_probe, ProbeReport};
pub use task::{list_then, run_all, run_operation, ChildPolicy, Task};
