//! Contract with the user-directory query engine

use crate::core::args::QueryArgs;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Outcome of a single user query
///
/// Only three facts are read by the response layer: the matched entities,
/// the total match count and the argument vector the engine ran with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserQueryResult {
    /// Matched entities, in engine order, shaped by the `fields` argument
    pub results: Vec<Value>,

    /// Number of users matching the query, ignoring pagination
    pub total_users: u64,

    /// Arguments the query was run with
    pub query_vars: QueryArgs,
}

impl UserQueryResult {
    pub fn new(results: Vec<Value>, total_users: u64, query_vars: QueryArgs) -> Self {
        Self {
            results,
            total_users,
            query_vars,
        }
    }

    pub fn results(&self) -> &[Value] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Non-empty `search` term the query carried, if any
    pub fn search_term(&self) -> Option<&str> {
        self.query_vars
            .get("search")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A user directory that can answer argument-driven queries
///
/// Implementations interpret the untyped arguments themselves; invalid
/// values are theirs to ignore or reject.
#[async_trait]
pub trait UserQueryEngine: Send + Sync {
    /// Run a query and return the matched users
    async fn query(&self, args: &QueryArgs) -> Result<UserQueryResult>;
}
