use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Per-hook lifecycle state.
///
/// `Registered → Starting → Running → Stopping → Stopped`, with `Failed`
/// terminal from `Starting` or `Stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Registered,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// Startup failure for a single hook. Fatal: aborts the whole startup
/// sequence and unwinds already-started hooks.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `on_start` did not return within the allowed window. Startup must
    /// spawn background work rather than block.
    #[error("startup did not complete within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Stop failure for a single hook.
#[derive(Debug, Error)]
pub enum StopError {
    /// In-flight work did not drain in time and connections were
    /// force-closed. Non-fatal: logged and counted.
    #[error("in-flight work did not drain before the deadline; connections were force-closed")]
    DrainTimeout,

    /// The underlying resource could not be released even after a forced
    /// close. Fatal for the component, but never blocks shutdown of
    /// sibling hooks.
    #[error("listener could not be released: {0}")]
    ForcedClose(String),
}

/// A start/stop action pair bound to one transport adapter.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &str;

    /// Bind resources and launch the serve loop on a background task.
    ///
    /// Must return control quickly, reporting only bind-time errors
    /// synchronously; the coordinator treats a slow `on_start` as a
    /// startup failure.
    async fn on_start(&self) -> Result<(), StartError>;

    /// Stop accepting new work and drain in-flight work, bounded by
    /// `remaining`. After the budget is spent the adapter force-closes
    /// whatever is left.
    async fn on_stop(&self, remaining: Duration) -> Result<(), StopError>;
}
