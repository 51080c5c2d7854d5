//! Gateway library
//!
//! HTTP transport for the token service. Exposed as a library so the router
//! can be driven in-process from tests.

pub mod config;
pub mod gate;
pub mod response;
pub mod router;

pub use config::GatewayConfig;
pub use router::{create_app, AppState};
