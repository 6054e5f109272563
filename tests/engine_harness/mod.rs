//! Shared test harness for user query engines
//!
//! Provides a fixed user directory and the `user_query_engine_tests!` macro
//! that checks an engine against the contract the endpoint relies on.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod engine_harness;
//!
//! use engine_harness::*;
//!
//! user_query_engine_tests!(|users| InMemoryUserStore::with_users(users));
//! ```

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use serde_json::Value;
use user_query::core::args::QueryArgs;
use user_query::core::user::UserRecord;

/// Twenty users: IDs 1..=20, logins `user01`..`user20`, registered one day
/// apart. Odd IDs are authors, even IDs subscribers; every fifth user is an
/// editor instead.
pub fn sample_users() -> Vec<UserRecord> {
    (1..=20u64)
        .map(|id| {
            let role = if id % 5 == 0 {
                "editor"
            } else if id % 2 == 1 {
                "author"
            } else {
                "subscriber"
            };
            UserRecord::new(id, format!("user{:02}", id))
                .with_role(role)
                .with_email(format!("user{:02}@example.com", id))
                .with_meta("score", (id * 7 % 20).to_string())
                .with_registered(
                    Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0)
                        .single()
                        .expect("valid date"),
                )
        })
        .collect()
}

/// Query arguments from a JSON object literal
pub fn args(value: Value) -> QueryArgs {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => QueryArgs::new(),
    }
}

/// IDs of the returned users, in order
pub fn ids(results: &[Value]) -> Vec<u64> {
    results.iter().filter_map(|u| u["ID"].as_u64()).collect()
}

/// Generate a `UserQueryEngine` conformance test suite.
///
/// `$factory` must be callable with a `Vec<UserRecord>` and return an engine
/// holding exactly those users. It is called once per test.
#[macro_export]
macro_rules! user_query_engine_tests {
    ($factory:expr) => {
        mod user_query_engine_contract_tests {
            use super::*;
            use serde_json::json;
            use user_query::core::engine::UserQueryEngine;

            fn engine() -> impl UserQueryEngine {
                ($factory)(sample_users())
            }

            // ==================================================================
            // Echo and totals
            // ==================================================================

            #[tokio::test]
            async fn test_query_vars_echo_arguments() {
                let query = args(json!({"role": "author", "number": 3, "lang": "fi"}));
                let result = engine().query(&query).await.expect("query should succeed");

                assert_eq!(result.query_vars, query);
            }

            #[tokio::test]
            async fn test_total_counts_all_matches() {
                let result = engine()
                    .query(&args(json!({"role": "Author", "number": 4})))
                    .await
                    .expect("query should succeed");

                assert_eq!(result.results.len(), 4);
                assert_eq!(result.total_users, 8);
            }

            #[tokio::test]
            async fn test_no_match_is_empty() {
                let result = engine()
                    .query(&args(json!({"role": "administrator"})))
                    .await
                    .expect("query should succeed");

                assert!(result.is_empty());
                assert_eq!(result.total_users, 0);
            }

            // ==================================================================
            // Paging
            // ==================================================================

            #[tokio::test]
            async fn test_pages_do_not_overlap() {
                let engine = engine();
                let mut seen = Vec::new();

                for page in 1..=4 {
                    let result = engine
                        .query(&args(json!({"number": "6", "paged": page, "orderby": "ID"})))
                        .await
                        .expect("query should succeed");
                    seen.extend(ids(&result.results));
                    assert_eq!(result.total_users, 20);
                }

                assert_eq!(seen, (1..=20).collect::<Vec<u64>>());
            }

            #[tokio::test]
            async fn test_non_positive_number_returns_everything() {
                for number in [json!(0), json!("-1")] {
                    let result = engine()
                        .query(&args(json!({"number": number})))
                        .await
                        .expect("query should succeed");
                    assert_eq!(result.results.len(), 20);
                }
            }

            // ==================================================================
            // Ordering
            // ==================================================================

            #[tokio::test]
            async fn test_order_by_registered_desc() {
                let result = engine()
                    .query(&args(json!({"orderby": "registered", "order": "DESC", "number": 3})))
                    .await
                    .expect("query should succeed");

                assert_eq!(ids(&result.results), vec![20, 19, 18]);
            }

            #[tokio::test]
            async fn test_order_by_numeric_meta() {
                let result = engine()
                    .query(&args(json!({
                        "meta_key": "score",
                        "orderby": "meta_value_num",
                        "order": "DESC",
                        "number": 2
                    })))
                    .await
                    .expect("query should succeed");

                // score = id * 7 % 20; 19 for id 17, 18 for id 14
                assert_eq!(ids(&result.results), vec![17, 14]);
            }

            // ==================================================================
            // Filtering
            // ==================================================================

            #[tokio::test]
            async fn test_include_and_exclude() {
                let result = engine()
                    .query(&args(json!({"include": [4, 2, 9], "orderby": "include"})))
                    .await
                    .expect("query should succeed");
                assert_eq!(ids(&result.results), vec![4, 2, 9]);

                let result = engine()
                    .query(&args(json!({"exclude": "1,2,3", "number": 1, "orderby": "ID"})))
                    .await
                    .expect("query should succeed");
                assert_eq!(ids(&result.results), vec![4]);
                assert_eq!(result.total_users, 17);
            }

            #[tokio::test]
            async fn test_search_by_email() {
                let result = engine()
                    .query(&args(json!({"search": "user07@example.com"})))
                    .await
                    .expect("query should succeed");

                assert_eq!(ids(&result.results), vec![7]);
            }

            #[tokio::test]
            async fn test_meta_compare() {
                let result = engine()
                    .query(&args(json!({
                        "meta_key": "score",
                        "meta_value": "17",
                        "meta_compare": ">",
                        "meta_type": "NUMERIC"
                    })))
                    .await
                    .expect("query should succeed");

                // ids with id * 7 % 20 > 17: 14 (18) and 17 (19)
                let mut matched = ids(&result.results);
                matched.sort();
                assert_eq!(matched, vec![14, 17]);
            }

            #[tokio::test]
            async fn test_single_field_projection() {
                let result = engine()
                    .query(&args(json!({"fields": "user_login", "include": 5})))
                    .await
                    .expect("query should succeed");

                assert_eq!(result.results, vec![json!("user05")]);
            }
        }
    };
}
