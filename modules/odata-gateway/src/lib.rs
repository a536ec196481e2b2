//! OData Gateway Module
//!
//! Exposes configured warehouse tables as OData v4 entity sets: query-option
//! translation to parameterized SQL, stateless pagination, `$metadata`/service
//! documents, and the REST surface that serves them.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;

pub use config::GatewayConfig;
pub use domain::service::GatewayService;
