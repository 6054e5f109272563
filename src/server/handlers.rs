//! HTTP handler for the user query endpoint

use axum::extract::{RawQuery, State};
use axum::http::HeaderMap;
use std::sync::Arc;

use crate::core::engine::UserQueryEngine;
use crate::core::error::UserQueryError;
use crate::core::hooks::HookRegistry;
use crate::core::params::{RequestParameters, RestRequest};
use crate::core::pipeline::run_user_query;
use crate::core::response::UserQueryResponse;

/// State shared by user query requests
#[derive(Clone)]
pub struct UserQueryState {
    pub hooks: Arc<HookRegistry>,
    pub engine: Arc<dyn UserQueryEngine>,
}

/// GET handler: permission check, then the query pipeline
///
/// Access is open unless a `permissions_check` hook says otherwise.
pub async fn query_users(
    State(state): State<UserQueryState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<UserQueryResponse, UserQueryError> {
    let params = RequestParameters::from_query_str(query.as_deref().unwrap_or_default());
    let request = RestRequest::new(params, headers);

    if !state.hooks.apply_permissions_check(true, &request) {
        tracing::warn!(params = request.params.len(), "user query denied by permissions check");
        return Err(UserQueryError::Forbidden);
    }

    run_user_query(&state.hooks, state.engine.as_ref(), &request.params).await
}
