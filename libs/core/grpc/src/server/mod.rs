//! gRPC server builder and transport adapter.

mod adapter;
mod builder;
mod config;

pub use adapter::GrpcServerAdapter;
pub use builder::{GrpcServer, create_health_service};
pub use config::ServerConfig;
