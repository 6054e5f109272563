//! Server module for hosting the user query endpoint
//!
//! `ServerBuilder` assembles the configuration, hooks and query engine into a
//! `ServerHost`, which `RestExposure` turns into a router:
//! - GET {route} and GET {route}/ for user queries
//! - GET /health and /healthz

pub mod builder;
pub mod exposure;
pub mod handlers;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use handlers::UserQueryState;
pub use host::ServerHost;
