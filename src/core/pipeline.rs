//! The user query request pipeline
//!
//! ```text
//! RequestParameters ──▶ resolve_allowed_args ──▶ build_query_args
//!                                                     │
//!            UserQueryResponse ◀── assemble ◀── execute_query
//! ```
//!
//! Every value built here lives for one request only. The hook registry is
//! the only shared state and is read, never written.

use crate::core::args::build_query_args;
use crate::core::engine::UserQueryEngine;
use crate::core::error::UserQueryError;
use crate::core::executor::execute_query;
use crate::core::hooks::HookRegistry;
use crate::core::params::RequestParameters;
use crate::core::response::{UserQueryResponse, assemble_response};
use crate::core::whitelist::resolve_allowed_args;

/// Run the full pipeline for one request's parameters
pub async fn run_user_query(
    hooks: &HookRegistry,
    engine: &dyn UserQueryEngine,
    params: &RequestParameters,
) -> Result<UserQueryResponse, UserQueryError> {
    let allowed = resolve_allowed_args(hooks);
    let args = build_query_args(hooks, params, &allowed);
    let result = execute_query(hooks, engine, &args).await?;

    Ok(assemble_response(hooks, &result, &args))
}
