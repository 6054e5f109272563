//! In-memory user directory implementing UserQueryEngine

use crate::core::args::QueryArgs;
use crate::core::engine::{UserQueryEngine, UserQueryResult};
use crate::core::user::UserRecord;
use crate::storage::query_vars::QueryVars;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// In-memory user store
///
/// Useful for testing, development and small static directories. Uses RwLock
/// for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<Vec<UserRecord>>>,
}

impl InMemoryUserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given users
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users.into_iter().collect())),
        }
    }

    /// Add a user, replacing any existing user with the same ID
    pub fn insert(&self, user: UserRecord) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }

        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let users = self
            .users
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(users.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl UserQueryEngine for InMemoryUserStore {
    async fn query(&self, args: &QueryArgs) -> Result<UserQueryResult> {
        let vars = QueryVars::parse(args);

        let users = self
            .users
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matching: Vec<&UserRecord> = users.iter().filter(|u| vars.matches(u)).collect();
        matching.sort_by(|a, b| vars.compare(a, b));

        let total_users = if vars.count_total {
            matching.len() as u64
        } else {
            0
        };

        let start = vars.page_start().min(matching.len());
        let end = match vars.number {
            Some(number) => start.saturating_add(number).min(matching.len()),
            None => matching.len(),
        };

        let results = matching[start..end]
            .iter()
            .map(|user| vars.fields.project(user))
            .collect();

        Ok(UserQueryResult::new(results, total_users, args.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn args(value: Value) -> QueryArgs {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => QueryArgs::new(),
        }
    }

    fn logins(result: &UserQueryResult) -> Vec<&str> {
        result
            .results
            .iter()
            .filter_map(|u| u["user_login"].as_str())
            .collect()
    }

    fn directory() -> InMemoryUserStore {
        InMemoryUserStore::with_users([
            UserRecord::new(1, "admin")
                .with_role("administrator")
                .with_email("admin@example.com")
                .with_post_count(3)
                .with_registered(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            UserRecord::new(2, "anna")
                .with_role("author")
                .with_email("anna@example.com")
                .with_meta("city", "Turku")
                .with_meta("age", "31")
                .with_post_count(12)
                .with_registered(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()),
            UserRecord::new(3, "bob")
                .with_role("author")
                .with_email("bob@example.org")
                .with_meta("city", "Oslo")
                .with_meta("age", "9")
                .with_registered(Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap()),
            UserRecord::new(4, "carla")
                .with_role("subscriber")
                .with_email("carla@example.com")
                .with_url("https://carla.example.com")
                .with_blogs(vec![2])
                .with_registered(Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap()),
        ])
    }

    // ── filtering ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_default_role_filter_is_case_insensitive() {
        let store = directory();
        let result = store
            .query(&args(json!({"role": "Author", "number": 10})))
            .await
            .unwrap();

        assert_eq!(logins(&result), vec!["anna", "bob"]);
        assert_eq!(result.total_users, 2);
    }

    #[tokio::test]
    async fn test_role_in_and_not_in() {
        let store = directory();
        let result = store
            .query(&args(json!({"role__in": ["administrator", "subscriber"]})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["admin", "carla"]);

        let result = store
            .query(&args(json!({"role__not_in": "author"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["admin", "carla"]);
    }

    #[tokio::test]
    async fn test_include_exclude_and_blog() {
        let store = directory();

        let result = store.query(&args(json!({"include": "3,1"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["admin", "bob"]);

        let result = store.query(&args(json!({"exclude": [1, 2]}))).await.unwrap();
        assert_eq!(logins(&result), vec!["bob", "carla"]);

        let result = store.query(&args(json!({"blog_id": "2"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["carla"]);
    }

    #[tokio::test]
    async fn test_who_authors_and_published_posts() {
        let store = directory();

        let result = store.query(&args(json!({"who": "authors"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["admin", "anna", "bob"]);

        let result = store
            .query(&args(json!({"has_published_posts": "1"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["admin", "anna"]);
    }

    #[tokio::test]
    async fn test_search() {
        let store = directory();

        let result = store.query(&args(json!({"search": "*example.com"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["admin", "anna", "carla"]);

        let result = store.query(&args(json!({"search": "an*"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["anna"]);

        let result = store.query(&args(json!({"search": "4"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["carla"]);

        let result = store
            .query(&args(json!({"search": "https://carla.example.com"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["carla"]);
    }

    #[tokio::test]
    async fn test_meta_filters() {
        let store = directory();

        let result = store
            .query(&args(json!({"meta_key": "city", "meta_value": "turku"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["anna"]);

        let result = store
            .query(&args(json!({
                "meta_query": {
                    "0": {"key": "age", "value": "18", "compare": ">=", "type": "NUMERIC"}
                }
            })))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["anna"]);
    }

    // ── ordering and paging ───────────────────────────────────────────

    #[tokio::test]
    async fn test_orderby() {
        let store = directory();

        let result = store
            .query(&args(json!({"orderby": "registered", "order": "DESC"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["carla", "bob", "anna", "admin"]);

        let result = store
            .query(&args(json!({"include": [3, 1, 2], "orderby": "include"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["bob", "admin", "anna"]);

        let result = store
            .query(&args(json!({"meta_key": "age", "orderby": "meta_value_num"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["bob", "anna"]);
    }

    #[tokio::test]
    async fn test_paging_keeps_total() {
        let store = directory();

        let result = store
            .query(&args(json!({"number": "3", "paged": "2"})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["carla"]);
        assert_eq!(result.total_users, 4);

        let result = store
            .query(&args(json!({"number": 2, "offset": 1})))
            .await
            .unwrap();
        assert_eq!(logins(&result), vec!["anna", "bob"]);

        let result = store
            .query(&args(json!({"number": 2, "paged": 9})))
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.total_users, 4);
    }

    #[tokio::test]
    async fn test_count_total_disabled() {
        let store = directory();
        let result = store
            .query(&args(json!({"count_total": false})))
            .await
            .unwrap();

        assert_eq!(result.results.len(), 4);
        assert_eq!(result.total_users, 0);
    }

    // ── projection ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fields_projection() {
        let store = directory();

        let result = store
            .query(&args(json!({"fields": "ID", "role": "author"})))
            .await
            .unwrap();
        assert_eq!(result.results, vec![json!(2), json!(3)]);

        let result = store
            .query(&args(json!({"fields": ["ID", "user_email"], "include": 2})))
            .await
            .unwrap();
        assert_eq!(
            result.results,
            vec![json!({"ID": 2, "user_email": "anna@example.com"})]
        );

        let result = store
            .query(&args(json!({"fields": "all_with_meta", "include": 2})))
            .await
            .unwrap();
        assert_eq!(result.results[0]["meta"]["city"], "Turku");
    }

    #[tokio::test]
    async fn test_query_vars_echo_args() {
        let store = directory();
        let query = args(json!({"role": "author", "lang": "fi"}));

        let result = store.query(&query).await.unwrap();

        assert_eq!(result.query_vars, query);
    }

    // ── mutation ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_replaces_same_id() {
        let store = InMemoryUserStore::new();
        assert!(store.is_empty().unwrap());

        store.insert(UserRecord::new(1, "anna")).unwrap();
        store
            .insert(UserRecord::new(1, "anna").with_role("editor"))
            .unwrap();
        store.insert(UserRecord::new(2, "bob")).unwrap();

        assert_eq!(store.len().unwrap(), 2);

        let result = store.query(&args(json!({"role": "editor"}))).await.unwrap();
        assert_eq!(logins(&result), vec!["anna"]);
    }
}
