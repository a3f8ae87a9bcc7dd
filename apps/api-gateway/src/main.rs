mod api;
mod collaborators;
mod config;
mod state;
mod ws;

use axum_helpers::HttpServerAdapter;
use collaborators::{EchoSession, StubAuthService, StubUserService};
use config::Config;
use core_lifecycle::Coordinator;
use core_registry::Registry;
use state::AppState;
use tracing::info;

fn build_registry(config: Config) -> eyre::Result<Registry> {
    let mut registry = Registry::new();

    registry.register("config", &[], move |_| Ok(config.clone()))?;
    registry.register("auth-service", &[], |_| Ok(StubAuthService::new()))?;
    registry.register("user-service", &[], |_| Ok(StubUserService::new()))?;
    registry.register("ws-handler", &[], |_| Ok(EchoSession))?;

    registry.register(
        "app-state",
        &["config", "auth-service", "user-service", "ws-handler"],
        |deps| {
            let auth = deps.get::<StubAuthService>("auth-service")?;
            Ok(AppState {
                config: deps.get::<Config>("config")?,
                auth: auth.clone(),
                validator: auth,
                users: deps.get::<StubUserService>("user-service")?,
                ws: deps.get::<EchoSession>("ws-handler")?,
            })
        },
    )?;

    registry.register("router", &["app-state"], |deps| {
        let state = deps.get::<AppState>("app-state")?;
        Ok(api::app(state.as_ref().clone()))
    })?;

    registry.register("http-server", &["config", "router"], |deps| {
        let config = deps.get::<Config>("config")?;
        let router = deps.get::<axum::Router>("router")?;
        Ok(HttpServerAdapter::new(
            "api-gateway",
            config.server.clone(),
            router.as_ref().clone(),
        ))
    })?;

    Ok(registry)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    core_config::tracing::install_color_eyre();

    let config = Config::from_env()?;
    core_config::tracing::init_tracing(&config.environment);

    info!(
        name = config.app.name,
        version = config.app.version,
        environment = ?config.environment,
        address = %config.server.address(),
        "Starting API gateway"
    );

    let shutdown_timeout = config.server.shutdown_timeout;
    let shutdown_policy = config.shutdown_policy;

    let mut registry = build_registry(config)?;
    let server = registry.resolve::<HttpServerAdapter>("http-server")?;

    let mut coordinator = Coordinator::new(shutdown_timeout).with_policy(shutdown_policy);
    coordinator.register(server);
    coordinator.run().await?;

    info!("API gateway stopped");
    Ok(())
}
