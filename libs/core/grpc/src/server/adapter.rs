use super::config::ServerConfig;
use async_trait::async_trait;
use core_lifecycle::{LifecycleHook, StartError, StopError};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Router;
use tracing::info;

struct Serving {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<Result<(), tonic::transport::Error>>,
}

/// Transport adapter wrapping a tonic server behind the lifecycle
/// start/stop contract.
///
/// Service registration is the caller's responsibility: the adapter takes
/// a fully assembled [`Router`] and only binds, serves, and drains it.
/// Created once at startup and never restarted.
pub struct GrpcServerAdapter {
    name: String,
    config: ServerConfig,
    router: Mutex<Option<Router>>,
    serving: Mutex<Option<Serving>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl GrpcServerAdapter {
    pub fn new(name: impl Into<String>, config: ServerConfig, router: Router) -> Self {
        Self {
            name: name.into(),
            config,
            router: Mutex::new(Some(router)),
            serving: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Address the listener is actually bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.serving.lock().unwrap().is_some()
    }
}

#[async_trait]
impl LifecycleHook for GrpcServerAdapter {
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

        let addr = self
            .config
            .socket_addr()
            .map_err(|e| StartError::Other(format!("invalid listen address: {e}")))?;
        let listener = TcpListener::bind(addr).await.map_err(|source| StartError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local = listener.local_addr().map_err(|source| StartError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        *self.local_addr.lock().unwrap() = Some(local);

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        info!(adapter = %self.name, addr = %local, "gRPC server listening");
        let task = tokio::spawn(async move {
            router
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
        });

        *self.serving.lock().unwrap() = Some(Serving { shutdown_tx, task });
        Ok(())
    }

    async fn on_stop(&self, remaining: Duration) -> Result<(), StopError> {
        let Some(serving) = self.serving.lock().unwrap().take() else {
            return Ok(());
        };

        // Stop accepting; tonic drains in-flight RPCs before resolving.
        let _ = serving.shutdown_tx.send(());

        let mut task = serving.task;
        match tokio::time::timeout(remaining, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(StopError::ForcedClose(e.to_string())),
            Ok(Err(join)) => Err(StopError::ForcedClose(format!(
                "serve task did not finish: {join}"
            ))),
            Err(_) => {
                task.abort();
                Err(StopError::DrainTimeout)
            }
        }
    }
}
