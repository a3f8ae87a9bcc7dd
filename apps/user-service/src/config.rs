use core_config::{AppInfo, ConfigError, Environment, app_info, env_or_default};
use core_config::server::DEFAULT_SHUTDOWN_TIMEOUT_SECS;
use core_lifecycle::ShutdownPolicy;
use std::time::Duration;

/// User-service configuration
/// Composes shared config components from the `core_config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub grpc: grpc_server::ServerConfig,
    pub environment: Environment,
    pub shutdown_timeout: Duration,
    pub shutdown_policy: ShutdownPolicy,
}

impl Config {
    /// Reads GRPC_HOST/GRPC_PORT, SHUTDOWN_TIMEOUT_SECS, APP_ENV, and
    /// SHUTDOWN_POLICY.
    pub fn from_env() -> eyre::Result<Self> {
        let shutdown_secs: u64 = env_or_default(
            "SHUTDOWN_TIMEOUT_SECS",
            &DEFAULT_SHUTDOWN_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .map_err(|e| ConfigError::ParseError {
            key: "SHUTDOWN_TIMEOUT_SECS".to_string(),
            details: format!("{}", e),
        })?;

        Ok(Self {
            app: app_info!(),
            grpc: grpc_server::ServerConfig::from_env(),
            environment: Environment::from_env(),
            shutdown_timeout: Duration::from_secs(shutdown_secs),
            shutdown_policy: ShutdownPolicy::from_env(),
        })
    }
}
