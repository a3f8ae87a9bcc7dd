use crate::hook::{HookState, LifecycleHook, StartError, StopError};
use crate::signal::wait_for_signal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

/// Upper bound on how long a hook's `on_start` may take before it is
/// treated as a startup failure.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(5);

/// What an unclean shutdown means for the process exit.
///
/// `BestEffort` logs drain failures and exits 0; `FailFast` turns them
/// into a process error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    #[default]
    BestEffort,
    FailFast,
}

impl ShutdownPolicy {
    /// Reads `SHUTDOWN_POLICY` ("best-effort" default, "fail-fast").
    pub fn from_env() -> Self {
        match std::env::var("SHUTDOWN_POLICY") {
            Ok(v) if v.eq_ignore_ascii_case("fail-fast") => ShutdownPolicy::FailFast,
            _ => ShutdownPolicy::BestEffort,
        }
    }
}

/// Outcome of one shutdown pass.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Hooks that stopped cleanly or after a forced close.
    pub stopped: usize,
    /// Hooks skipped because they never reached `Running`.
    pub skipped: usize,
    /// Hooks whose drain overran the budget (forced close or abandoned).
    pub drain_timeouts: Vec<String>,
    /// Hooks whose listener could not be released at all.
    pub forced_close_failures: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.drain_timeouts.is_empty() && self.forced_close_failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("hook '{name}' failed to start")]
    Start {
        name: String,
        #[source]
        source: StartError,
    },

    /// Only surfaced under [`ShutdownPolicy::FailFast`].
    #[error("shutdown completed with {failed} hook(s) not drained cleanly")]
    UncleanShutdown { failed: usize },
}

/// Drives registered hooks through ordered startup and reverse-ordered,
/// deadline-bound shutdown.
///
/// Process-wide and lifecycle-scoped: built at the entrypoint, torn down
/// at process exit. Hooks stop one at a time, so no two `on_stop` calls
/// ever run concurrently.
pub struct Coordinator {
    hooks: Vec<Arc<dyn LifecycleHook>>,
    states: Vec<HookState>,
    shutdown_timeout: Duration,
    start_timeout: Duration,
    policy: ShutdownPolicy,
    shutdown_complete: bool,
}

impl Coordinator {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            hooks: Vec::new(),
            states: Vec::new(),
            shutdown_timeout,
            start_timeout: DEFAULT_START_TIMEOUT,
            policy: ShutdownPolicy::default(),
            shutdown_complete: false,
        }
    }

    pub fn with_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Append a hook. Startup order is registration order; shutdown order
    /// is the reverse.
    pub fn register(&mut self, hook: Arc<dyn LifecycleHook>) {
        debug!(hook = hook.name(), "Lifecycle hook registered");
        self.hooks.push(hook);
        self.states.push(HookState::Registered);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Current state of every hook, in registration order.
    pub fn states(&self) -> Vec<(String, HookState)> {
        self.hooks
            .iter()
            .zip(&self.states)
            .map(|(h, s)| (h.name().to_string(), *s))
            .collect()
    }

    /// Run every hook's `on_start` in registration order.
    ///
    /// If hook *k* fails, hooks *1..k-1* are stopped in reverse order
    /// (under the shutdown deadline) before the original error is
    /// returned, so no listener is left orphaned.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        for i in 0..self.hooks.len() {
            let hook = self.hooks[i].clone();
            self.states[i] = HookState::Starting;
            info!(hook = hook.name(), "Starting");

            let outcome = match timeout(self.start_timeout, hook.on_start()).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(StartError::Timeout(self.start_timeout)),
            };

            match outcome {
                Ok(()) => {
                    self.states[i] = HookState::Running;
                    info!(hook = hook.name(), "Running");
                }
                Err(source) => {
                    self.states[i] = HookState::Failed;
                    let name = hook.name().to_string();
                    error!(hook = %name, error = %source, "Startup failed, unwinding started hooks");
                    self.shutdown().await;
                    return Err(LifecycleError::Start { name, source });
                }
            }
        }
        Ok(())
    }

    /// Stop all `Running` hooks in strict reverse registration order under
    /// one shared deadline.
    ///
    /// Each hook's `on_stop` receives the remaining budget; a hook that
    /// overruns it is abandoned (dropped mid-drain, marked `Failed`) and
    /// the coordinator proceeds to the next one. Calling this a second
    /// time is a no-op.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        if self.shutdown_complete {
            debug!("Shutdown already completed, ignoring");
            return ShutdownReport::default();
        }
        self.shutdown_complete = true;

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut report = ShutdownReport::default();

        for i in (0..self.hooks.len()).rev() {
            if self.states[i] != HookState::Running {
                report.skipped += 1;
                continue;
            }

            let hook = self.hooks[i].clone();
            let name = hook.name().to_string();
            self.states[i] = HookState::Stopping;

            let remaining = deadline.saturating_duration_since(Instant::now());
            info!(hook = %name, ?remaining, "Stopping");

            match timeout(remaining, hook.on_stop(remaining)).await {
                Ok(Ok(())) => {
                    self.states[i] = HookState::Stopped;
                    report.stopped += 1;
                    info!(hook = %name, "Stopped");
                }
                Ok(Err(StopError::DrainTimeout)) => {
                    // The adapter forced its connections closed itself;
                    // the listener is released, so the hook is stopped.
                    self.states[i] = HookState::Stopped;
                    report.stopped += 1;
                    warn!(hook = %name, "Drain incomplete, connections were force-closed");
                    report.drain_timeouts.push(name);
                }
                Ok(Err(StopError::ForcedClose(reason))) => {
                    self.states[i] = HookState::Failed;
                    error!(hook = %name, %reason, "Listener could not be released");
                    report.forced_close_failures.push(name);
                }
                Err(_) => {
                    self.states[i] = HookState::Failed;
                    warn!(hook = %name, "Stop exceeded the shutdown deadline, abandoning");
                    report.drain_timeouts.push(name);
                }
            }
        }

        report
    }

    /// Map a shutdown report to the process outcome according to the
    /// configured policy.
    pub fn conclude(&self, report: &ShutdownReport) -> Result<(), LifecycleError> {
        if report.is_clean() {
            info!(stopped = report.stopped, "Shutdown complete");
            return Ok(());
        }

        let failed = report.drain_timeouts.len() + report.forced_close_failures.len();
        warn!(
            drain_timeouts = ?report.drain_timeouts,
            forced_close_failures = ?report.forced_close_failures,
            "Shutdown completed with incomplete drains"
        );
        match self.policy {
            ShutdownPolicy::BestEffort => Ok(()),
            ShutdownPolicy::FailFast => Err(LifecycleError::UncleanShutdown { failed }),
        }
    }

    /// Start all hooks, block until a termination signal, then shut down.
    pub async fn run(&mut self) -> Result<(), LifecycleError> {
        self.start().await?;
        wait_for_signal().await;
        let report = self.shutdown().await;
        self.conclude(&report)
    }
}
