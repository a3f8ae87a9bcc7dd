use axum::http::HeaderValue;
use core_config::{AppInfo, ConfigError, FromEnv, app_info, server::ServerConfig};
use core_lifecycle::ShutdownPolicy;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `core_config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub shutdown_policy: ShutdownPolicy,
    /// Exact CORS origin (`CORS_ALLOWED_ORIGIN`); unset means the
    /// permissive development layer.
    pub cors_origin: Option<HeaderValue>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let shutdown_policy = ShutdownPolicy::from_env();
        let cors_origin = match std::env::var("CORS_ALLOWED_ORIGIN") {
            Ok(origin) => Some(origin.parse::<HeaderValue>().map_err(|e| {
                ConfigError::ParseError {
                    key: "CORS_ALLOWED_ORIGIN".to_string(),
                    details: format!("{}", e),
                }
            })?),
            Err(_) => None,
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            shutdown_policy,
            cors_origin,
        })
    }
}
