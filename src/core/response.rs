//! Response shaping for user query results

use crate::core::args::QueryArgs;
use crate::core::engine::UserQueryResult;
use crate::core::hooks::HookRegistry;
use crate::core::query::Pagination;
use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// Total number of matching users
pub const TOTAL_HEADER: &str = "X-WP-Total";

/// Total number of pages for the requested page size
pub const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// A page of users plus the totals sent as headers
#[derive(Debug, Clone, PartialEq)]
pub struct UserQueryResponse {
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

impl UserQueryResponse {
    pub fn total(&self) -> u64 {
        self.pagination.total
    }

    pub fn total_pages(&self) -> u64 {
        self.pagination.total_pages
    }
}

/// Build the response body for a query result
///
/// The body starts empty and goes through `default_data` first, so an
/// extension can supply the whole payload. Matched users are appended in
/// engine order unless `allow_query` closes the gate. `after_loop_data` gets
/// the last word.
pub fn assemble_body(hooks: &HookRegistry, result: &UserQueryResult, args: &QueryArgs) -> Vec<Value> {
    let mut data = hooks.apply_default_data(Vec::new());

    if !result.is_empty() && hooks.apply_allow_query(true) {
        data.extend(result.results().iter().cloned());
    }

    hooks.apply_after_loop_data(data, result, args)
}

/// Shape a query result into the endpoint response
pub fn assemble_response(
    hooks: &HookRegistry,
    result: &UserQueryResult,
    args: &QueryArgs,
) -> UserQueryResponse {
    let data = assemble_body(hooks, result, args);
    let pagination = Pagination::from_args(result.total_users, args);

    UserQueryResponse { data, pagination }
}

impl IntoResponse for UserQueryResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.data)).into_response();
        let headers = response.headers_mut();

        headers.insert(
            HeaderName::from_static("x-wp-total"),
            HeaderValue::from(self.pagination.total),
        );
        headers.insert(
            HeaderName::from_static("x-wp-totalpages"),
            HeaderValue::from(self.pagination.total_pages),
        );

        response
    }
}
