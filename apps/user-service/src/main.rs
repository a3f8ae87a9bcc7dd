mod config;

use config::Config;
use core_lifecycle::Coordinator;
use core_registry::Registry;
use grpc_server::server::{GrpcServer, GrpcServerAdapter, ServerConfig, create_health_service};
use tonic::transport::Server;
use tracing::info;

/// Fully-qualified name advertised through health checks and reflection.
const USER_SERVICE_NAME: &str = "user.v1.UserService";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    core_config::tracing::install_color_eyre();

    let config = Config::from_env()?;
    core_config::tracing::init_tracing(&config.environment);

    info!(
        name = config.app.name,
        version = config.app.version,
        environment = ?config.environment,
        addr = %config.grpc.addr_string(),
        "Starting user service"
    );

    let (health_reporter, health_service) = create_health_service();
    GrpcServer::setup_health(&health_reporter, USER_SERVICE_NAME).await;
    GrpcServer::log_startup(&config.grpc, USER_SERVICE_NAME);

    // Reflection lets grpcurl and friends discover the health service
    // without a local proto file.
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let mut registry = Registry::new();

    let grpc_config = config.grpc.clone();
    registry.register("grpc-config", &[], move |_| Ok(grpc_config.clone()))?;

    registry.register("grpc-server", &["grpc-config"], move |deps| {
        let config = deps.get::<ServerConfig>("grpc-config")?;
        let router = Server::builder()
            .add_service(health_service.clone())
            .add_service(reflection_service.clone());
        Ok(GrpcServerAdapter::new(
            "user-service",
            config.as_ref().clone(),
            router,
        ))
    })?;

    let server = registry.resolve::<GrpcServerAdapter>("grpc-server")?;

    let mut coordinator =
        Coordinator::new(config.shutdown_timeout).with_policy(config.shutdown_policy);
    coordinator.register(server);
    coordinator.run().await?;

    info!("User service stopped");
    Ok(())
}
