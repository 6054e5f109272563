//! Query execution with the before/after hooks around it

use crate::core::args::QueryArgs;
use crate::core::engine::{UserQueryEngine, UserQueryResult};
use crate::core::error::UserQueryError;
use crate::core::hooks::HookRegistry;

/// Run one query against the engine
///
/// `before_query` sees the arguments read-only. `after_query` may rework the
/// result in place (compatibility shims re-run searches there). Engine errors
/// propagate as-is and the query is never retried.
pub async fn execute_query(
    hooks: &HookRegistry,
    engine: &dyn UserQueryEngine,
    args: &QueryArgs,
) -> Result<UserQueryResult, UserQueryError> {
    hooks.fire_before_query(args);

    let mut result = engine.query(args).await.map_err(|e| {
        tracing::error!(error = %e, "user query engine failed");
        UserQueryError::query(e)
    })?;

    hooks.fire_after_query(&mut result);

    tracing::debug!(
        matched = result.results.len(),
        total = result.total_users,
        "user query executed"
    );

    Ok(result)
}
