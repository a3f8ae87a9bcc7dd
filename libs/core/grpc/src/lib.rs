//! gRPC server infrastructure.
//!
//! Provides the server configuration, health-reporting helpers, and the
//! transport adapter that plugs a tonic server into the lifecycle
//! coordinator.
//!
//! ## Quick Start
//!
//! ```ignore
//! use grpc_server::server::{GrpcServerAdapter, ServerConfig, create_health_service};
//! use tonic::transport::Server;
//!
//! let config = ServerConfig::from_env();
//! let (health_reporter, health_service) = create_health_service();
//!
//! let router = Server::builder().add_service(health_service);
//! let adapter = GrpcServerAdapter::new("grpc-server", config, router);
//! // register the adapter with a core_lifecycle::Coordinator
//! ```

pub mod server;

pub use server::{GrpcServer, GrpcServerAdapter, ServerConfig};
