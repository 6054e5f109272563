//! # User Query REST
//!
//! A read-only REST endpoint exposing a user directory query to HTTP clients.
//!
//! ## Features
//!
//! - **Deny by default**: only whitelisted query parameters reach the engine
//! - **Extension hooks**: eleven named filters, gates and actions with priorities
//! - **Pagination headers**: `X-WP-Total` and `X-WP-TotalPages` on every response
//! - **Pluggable engine**: any `UserQueryEngine`; an in-memory directory is included
//! - **Configuration-based**: defaults, gates and seed users from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use user_query::prelude::*;
//!
//! let store = InMemoryUserStore::with_users([
//!     UserRecord::new(1, "anna").with_role("author"),
//! ]);
//!
//! let app = ServerBuilder::new()
//!     .with_engine(store)
//!     .configure_hooks(|hooks| {
//!         // keep metadata filtering out of reach
//!         hooks.on_allow_meta(DEFAULT_PRIORITY, |_| false);
//!         // only signed-in clients
//!         hooks.on_permissions_check(DEFAULT_PRIORITY, |_, request| {
//!             request.header("authorization").is_some()
//!         });
//!     })
//!     .build()?;
//!
//! // GET /user_query/args?role=Editor&number=5
//! ```

pub mod compat;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AllowedParameterSet, DEFAULT_PRIORITY, ErrorResponse, Hook, HookRegistry,
        Pagination, QueryArgs, RequestParameters, RestRequest, UserQueryEngine, UserQueryError,
        UserQueryResponse, UserQueryResult, UserRecord, run_user_query,
    };

    // === Compatibility ===
    pub use crate::compat::SearchRelevance;

    // === Storage ===
    pub use crate::storage::InMemoryUserStore;

    // === Config ===
    pub use crate::config::UserQueryConfig;

    // === Server ===
    pub use crate::server::{RestExposure, ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{Router, http::HeaderMap};
}
