//! Router builder utilities for the user query endpoint

use crate::server::handlers::{UserQueryState, query_users};
use axum::{Router, routing::get};

/// Build the user query routes
///
/// The endpoint answers on the configured path with and without a trailing
/// slash:
/// - GET {route}
/// - GET {route}/
pub fn build_user_query_routes(route: &str, state: UserQueryState) -> Router {
    let route = route.trim_end_matches('/');
    let router = Router::new().route(&format!("{}/", route), get(query_users));

    let router = if route.is_empty() {
        router
    } else {
        router.route(route, get(query_users))
    };

    router.with_state(state)
}
