//! Hook registry for the user query extension points
//!
//! Each extension point keeps an ordered chain of callbacks. Callbacks run by
//! priority (lower first); equal priorities run in registration order.
//! Three invocation modes exist:
//!
//! - **filter**: every callback receives the previous callback's output and
//!   returns a new value; with no callbacks the input comes back unchanged
//! - **gate**: a boolean filter used to toggle optional behaviour
//! - **action**: callbacks run for their side effects only
//!
//! The registry is filled at start-up and then shared read-only behind an
//! `Arc`, so serving requests never needs a lock.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut hooks = HookRegistry::new();
//! hooks
//!     .on_allowed_args(DEFAULT_PRIORITY, |mut args| {
//!         args.push("lang".to_string());
//!         args
//!     })
//!     .on_allow_search(DEFAULT_PRIORITY, |_| false);
//! ```

use crate::core::args::QueryArgs;
use crate::core::engine::UserQueryResult;
use crate::core::params::RestRequest;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Priority used when callers have no ordering preference
pub const DEFAULT_PRIORITY: i32 = 10;

/// The extension points of the user query endpoint
///
/// The string names are the public contract third parties register against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    PermissionsCheck,
    DefaultArgs,
    AllowedArgs,
    ArgValue,
    BeforeQuery,
    AfterQuery,
    AllowMeta,
    AllowSearch,
    DefaultData,
    AllowQuery,
    AfterLoopData,
}

impl Hook {
    pub const ALL: [Hook; 11] = [
        Hook::PermissionsCheck,
        Hook::DefaultArgs,
        Hook::AllowedArgs,
        Hook::ArgValue,
        Hook::BeforeQuery,
        Hook::AfterQuery,
        Hook::AllowMeta,
        Hook::AllowSearch,
        Hook::DefaultData,
        Hook::AllowQuery,
        Hook::AfterLoopData,
    ];

    /// Public name of the hook
    pub fn name(&self) -> &'static str {
        match self {
            Hook::PermissionsCheck => "wp_user_query_to_rest_api_permissions_check",
            Hook::DefaultArgs => "wp_user_query_to_rest_api_default_args",
            Hook::AllowedArgs => "wp_user_query_to_rest_api_allowed_args",
            Hook::ArgValue => "wp_user_query_to_rest_api_arg_value",
            Hook::BeforeQuery => "wp_user_query_to_rest_api_before_query",
            Hook::AfterQuery => "wp_user_query_to_rest_api_after_query",
            Hook::AllowMeta => "wp_user_query_to_rest_api_allow_meta",
            Hook::AllowSearch => "wp_user_query_to_rest_api_allow_search",
            Hook::DefaultData => "wp_user_query_to_rest_api_default_data",
            Hook::AllowQuery => "wp_user_query_to_rest_api_allow_query",
            Hook::AfterLoopData => "wp_user_query_to_rest_api_after_loop_data",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.name() == s)
            .ok_or_else(|| format!("Unknown hook: {}", s))
    }
}

pub type PermissionsCheckFn = dyn Fn(bool, &RestRequest) -> bool + Send + Sync;
pub type DefaultArgsFn = dyn Fn(QueryArgs) -> QueryArgs + Send + Sync;
pub type AllowedArgsFn = dyn Fn(Vec<String>) -> Vec<String> + Send + Sync;
pub type ArgValueFn = dyn Fn(Value, &str, &QueryArgs) -> Value + Send + Sync;
pub type BeforeQueryFn = dyn Fn(&QueryArgs) + Send + Sync;
pub type AfterQueryFn = dyn Fn(&mut UserQueryResult) + Send + Sync;
pub type GateFn = dyn Fn(bool) -> bool + Send + Sync;
pub type DefaultDataFn = dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync;
pub type AfterLoopDataFn = dyn Fn(Vec<Value>, &UserQueryResult, &QueryArgs) -> Vec<Value> + Send + Sync;

struct Registered<F: ?Sized> {
    priority: i32,
    callback: Arc<F>,
}

/// Callbacks of one extension point, kept sorted by priority
pub struct Chain<F: ?Sized> {
    entries: Vec<Registered<F>>,
}

impl<F: ?Sized> Chain<F> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert after every callback of lower or equal priority
    fn insert(&mut self, priority: i32, callback: Arc<F>) {
        let pos = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(pos, Registered { priority, callback });
    }

    /// Callbacks in invocation order
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.entries.iter().map(|e| e.callback.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: ?Sized> Clone for Chain<F> {
    fn clone(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| Registered {
                    priority: e.priority,
                    callback: e.callback.clone(),
                })
                .collect(),
        }
    }
}

impl<F: ?Sized> Default for Chain<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of every callback attached to the user query extension points
#[derive(Clone, Default)]
pub struct HookRegistry {
    permissions_check: Chain<PermissionsCheckFn>,
    default_args: Chain<DefaultArgsFn>,
    allowed_args: Chain<AllowedArgsFn>,
    arg_value: Chain<ArgValueFn>,
    before_query: Chain<BeforeQueryFn>,
    after_query: Chain<AfterQueryFn>,
    allow_meta: Chain<GateFn>,
    allow_search: Chain<GateFn>,
    default_data: Chain<DefaultDataFn>,
    allow_query: Chain<GateFn>,
    after_loop_data: Chain<AfterLoopDataFn>,
}

impl HookRegistry {
    /// Create a registry with no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    // === Registration ===

    pub fn on_permissions_check(
        &mut self,
        priority: i32,
        f: impl Fn(bool, &RestRequest) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.permissions_check.insert(priority, Arc::new(f));
        self
    }

    pub fn on_default_args(
        &mut self,
        priority: i32,
        f: impl Fn(QueryArgs) -> QueryArgs + Send + Sync + 'static,
    ) -> &mut Self {
        self.default_args.insert(priority, Arc::new(f));
        self
    }

    pub fn on_allowed_args(
        &mut self,
        priority: i32,
        f: impl Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    ) -> &mut Self {
        self.allowed_args.insert(priority, Arc::new(f));
        self
    }

    pub fn on_arg_value(
        &mut self,
        priority: i32,
        f: impl Fn(Value, &str, &QueryArgs) -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.arg_value.insert(priority, Arc::new(f));
        self
    }

    pub fn on_before_query(
        &mut self,
        priority: i32,
        f: impl Fn(&QueryArgs) + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_query.insert(priority, Arc::new(f));
        self
    }

    pub fn on_after_query(
        &mut self,
        priority: i32,
        f: impl Fn(&mut UserQueryResult) + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_query.insert(priority, Arc::new(f));
        self
    }

    pub fn on_allow_meta(
        &mut self,
        priority: i32,
        f: impl Fn(bool) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.allow_meta.insert(priority, Arc::new(f));
        self
    }

    pub fn on_allow_search(
        &mut self,
        priority: i32,
        f: impl Fn(bool) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.allow_search.insert(priority, Arc::new(f));
        self
    }

    pub fn on_default_data(
        &mut self,
        priority: i32,
        f: impl Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.default_data.insert(priority, Arc::new(f));
        self
    }

    pub fn on_allow_query(
        &mut self,
        priority: i32,
        f: impl Fn(bool) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.allow_query.insert(priority, Arc::new(f));
        self
    }

    pub fn on_after_loop_data(
        &mut self,
        priority: i32,
        f: impl Fn(Vec<Value>, &UserQueryResult, &QueryArgs) -> Vec<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_loop_data.insert(priority, Arc::new(f));
        self
    }

    // === Invocation ===

    pub fn apply_permissions_check(&self, allowed: bool, request: &RestRequest) -> bool {
        self.permissions_check
            .iter()
            .fold(allowed, |acc, f| f(acc, request))
    }

    pub fn apply_default_args(&self, args: QueryArgs) -> QueryArgs {
        self.default_args.iter().fold(args, |acc, f| f(acc))
    }

    pub fn apply_allowed_args(&self, args: Vec<String>) -> Vec<String> {
        self.allowed_args.iter().fold(args, |acc, f| f(acc))
    }

    pub fn apply_arg_value(&self, value: Value, key: &str, args: &QueryArgs) -> Value {
        self.arg_value.iter().fold(value, |acc, f| f(acc, key, args))
    }

    pub fn fire_before_query(&self, args: &QueryArgs) {
        for f in self.before_query.iter() {
            f(args);
        }
    }

    pub fn fire_after_query(&self, result: &mut UserQueryResult) {
        for f in self.after_query.iter() {
            f(result);
        }
    }

    pub fn apply_allow_meta(&self, allow: bool) -> bool {
        self.allow_meta.iter().fold(allow, |acc, f| f(acc))
    }

    pub fn apply_allow_search(&self, allow: bool) -> bool {
        self.allow_search.iter().fold(allow, |acc, f| f(acc))
    }

    pub fn apply_default_data(&self, data: Vec<Value>) -> Vec<Value> {
        self.default_data.iter().fold(data, |acc, f| f(acc))
    }

    pub fn apply_allow_query(&self, allow: bool) -> bool {
        self.allow_query.iter().fold(allow, |acc, f| f(acc))
    }

    pub fn apply_after_loop_data(
        &self,
        data: Vec<Value>,
        result: &UserQueryResult,
        args: &QueryArgs,
    ) -> Vec<Value> {
        self.after_loop_data
            .iter()
            .fold(data, |acc, f| f(acc, result, args))
    }

    // === Introspection ===

    /// Number of callbacks attached to a hook
    pub fn handler_count(&self, hook: Hook) -> usize {
        match hook {
            Hook::PermissionsCheck => self.permissions_check.len(),
            Hook::DefaultArgs => self.default_args.len(),
            Hook::AllowedArgs => self.allowed_args.len(),
            Hook::ArgValue => self.arg_value.len(),
            Hook::BeforeQuery => self.before_query.len(),
            Hook::AfterQuery => self.after_query.len(),
            Hook::AllowMeta => self.allow_meta.len(),
            Hook::AllowSearch => self.allow_search.len(),
            Hook::DefaultData => self.default_data.len(),
            Hook::AllowQuery => self.allow_query.len(),
            Hook::AfterLoopData => self.after_loop_data.len(),
        }
    }

    pub fn has_hook(&self, hook: Hook) -> bool {
        self.handler_count(hook) > 0
    }

    /// Hooks with at least one callback attached
    pub fn registered_hooks(&self) -> impl Iterator<Item = Hook> + '_ {
        Hook::ALL.into_iter().filter(|hook| self.has_hook(*hook))
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for hook in self.registered_hooks() {
            map.entry(&hook.name(), &self.handler_count(hook));
        }
        map.finish()
    }
}
