//! Service lifecycle orchestration.
//!
//! Transport adapters (HTTP server, gRPC server) expose a uniform
//! start/stop contract through [`LifecycleHook`]; the [`Coordinator`]
//! drives registered hooks through an ordered startup phase and a
//! reverse-ordered, deadline-bound shutdown phase.
//!
//! The invariants the coordinator maintains:
//!
//! - Hooks start in registration order; a startup failure unwinds the
//!   hooks that already reached `Running`, in reverse order, before the
//!   error is surfaced — no orphaned listeners.
//! - Shutdown stops hooks in strict reverse registration order, one at a
//!   time, each with the remaining share of a single global deadline. A
//!   hook that overruns its budget is abandoned and marked `Failed`;
//!   overall shutdown is bounded by the configured deadline regardless of
//!   individual hook behavior.
//! - A second shutdown is a no-op.

mod coordinator;
mod hook;
mod signal;

pub use coordinator::{
    Coordinator, LifecycleError, ShutdownPolicy, ShutdownReport, DEFAULT_START_TIMEOUT,
};
pub use hook::{HookState, LifecycleHook, StartError, StopError};
pub use signal::wait_for_signal;
