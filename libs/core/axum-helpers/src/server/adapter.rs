use async_trait::async_trait;
use axum::Router;
use core_config::server::ServerConfig;
use core_lifecycle::{LifecycleHook, StartError, StopError};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

struct Serving {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<Result<(), std::io::Error>>,
}

/// Transport adapter wrapping an axum server behind the lifecycle
/// start/stop contract.
///
/// `on_start` binds the listener and launches the accept loop on a
/// background task, reporting only bind-time errors synchronously.
/// `on_stop` signals the loop to stop accepting, waits for in-flight
/// requests to drain up to the remaining deadline, then force-closes.
///
/// Created once at startup and never restarted; a second `on_start`
/// returns an error.
pub struct HttpServerAdapter {
    name: String,
    config: ServerConfig,
    router: Mutex<Option<Router>>,
    serving: Mutex<Option<Serving>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl HttpServerAdapter {
    pub fn new(name: impl Into<String>, config: ServerConfig, router: Router) -> Self {
        Self {
            name: name.into(),
            config,
            router: Mutex::new(Some(router)),
            serving: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Address the listener is actually bound to, once started. Useful
    /// when the configured port is 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.serving.lock().unwrap().is_some()
    }
}

#[async_trait]
impl LifecycleHook for HttpServerAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_start(&self) -> Result<(), StartError> {
        let router = self
            .router
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| StartError::Other(format!("'{}' was already started", self.name)))?;

        let addr = self.config.address();
        let listener = TcpListener::bind(&addr).await.map_err(|source| StartError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local = listener
            .local_addr()
            .map_err(|source| StartError::Bind { addr, source })?;
        *self.local_addr.lock().unwrap() = Some(local);

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        info!(adapter = %self.name, addr = %local, "HTTP server listening");
        let task = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
        });

        *self.serving.lock().unwrap() = Some(Serving { shutdown_tx, task });
        Ok(())
    }

    async fn on_stop(&self, remaining: Duration) -> Result<(), StopError> {
        let Some(serving) = self.serving.lock().unwrap().take() else {
            // Never started, or already stopped.
            return Ok(());
        };

        // Stop accepting new connections; axum drains in-flight requests.
        let _ = serving.shutdown_tx.send(());

        let mut task = serving.task;
        match tokio::time::timeout(remaining, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(StopError::ForcedClose(e.to_string())),
            Ok(Err(join)) => Err(StopError::ForcedClose(format!(
                "serve task did not finish: {join}"
            ))),
            Err(_) => {
                // Budget spent: force-close whatever is still in flight.
                task.abort();
                Err(StopError::DrainTimeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    fn test_config() -> ServerConfig {
        // Port 0: let the OS pick a free port.
        ServerConfig::new("127.0.0.1".to_string(), 0)
    }

    fn test_router() -> Router {
        Router::new().route("/ping", get(|| async { "pong" }))
    }

    #[tokio::test]
    async fn test_start_serves_and_stop_drains() {
        let adapter = HttpServerAdapter::new("http-test", test_config(), test_router());

        adapter.on_start().await.unwrap();
        assert!(adapter.is_running());
        let addr = adapter.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        adapter.on_stop(Duration::from_secs(5)).await.unwrap();
        assert!(!adapter.is_running());
    }

    #[tokio::test]
    async fn test_bind_conflict_reported_synchronously() {
        let first = HttpServerAdapter::new("first", test_config(), test_router());
        first.on_start().await.unwrap();
        let port = first.local_addr().unwrap().port();

        let second = HttpServerAdapter::new(
            "second",
            ServerConfig::new("127.0.0.1".to_string(), port),
            test_router(),
        );
        let err = second.on_start().await.unwrap_err();
        assert!(matches!(err, StartError::Bind { .. }));

        first.on_stop(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_second_start_is_an_error() {
        let adapter = HttpServerAdapter::new("http-test", test_config(), test_router());
        adapter.on_start().await.unwrap();

        let err = adapter.on_start().await.unwrap_err();
        assert!(matches!(err, StartError::Other(_)));

        adapter.on_stop(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let adapter = HttpServerAdapter::new("http-test", test_config(), test_router());
        adapter.on_stop(Duration::from_secs(1)).await.unwrap();
    }
}
