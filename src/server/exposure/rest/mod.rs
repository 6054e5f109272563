//! REST exposure of the user query endpoint
//!
//! Consumes a `ServerHost` and produces an Axum `Router` with the health
//! routes, the user query route and any custom routes, wrapped in a
//! request tracing layer.

use super::super::host::ServerHost;
use crate::server::handlers::UserQueryState;
use crate::server::router::build_user_query_routes;
use anyhow::Result;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// Returns a router with:
    /// - Health check routes
    /// - The user query route
    /// - Custom routes
    pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let state = UserQueryState {
            hooks: host.hooks.clone(),
            engine: host.engine.clone(),
        };

        let mut app = Self::health_routes().merge(build_user_query_routes(host.route(), state));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        tracing::info!(route = %host.route(), "user query endpoint mounted");

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "user-query-rest"
        }))
    }
}
