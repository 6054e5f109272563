//! Allowed parameter resolution
//!
//! What isn't explicitly allowed is forbidden. The allowed set is rebuilt for
//! every request from the base list, the two optional groups and whatever
//! the `allowed_args` hook adds or removes.

use crate::core::hooks::HookRegistry;
use indexmap::IndexSet;

/// Directory query parameters that are always honoured
pub const BASE_ALLOWED_ARGS: &[&str] = &[
    "blog_id",
    "role",
    "role__in",
    "role__not_in",
    "capability",
    "capability__in",
    "capability__not_in",
    "include",
    "exclude",
    "orderby",
    "order",
    "offset",
    "number",
    "paged",
    "count_total",
    "fields",
    "who",
    "has_published_posts",
    "nicename",
    "nicename__in",
    "nicename__not_in",
    "login",
    "login__in",
    "login__not_in",
];

/// Metadata filtering, enabled unless `allow_meta` says otherwise
pub const META_ARGS: &[&str] = &[
    "meta_key",
    "meta_value",
    "meta_compare",
    "meta_compare_key",
    "meta_type",
    "meta_type_key",
    "meta_query",
];

/// Free-text search, enabled unless `allow_search` says otherwise
pub const SEARCH_ARGS: &[&str] = &["search", "search_columns"];

/// The parameter names honoured for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedParameterSet {
    names: IndexSet<String>,
}

impl AllowedParameterSet {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FromIterator<String> for AllowedParameterSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Compute the allowed parameter names from the current hook state
pub fn resolve_allowed_args(hooks: &HookRegistry) -> AllowedParameterSet {
    let mut allowed: Vec<String> = BASE_ALLOWED_ARGS.iter().map(|s| s.to_string()).collect();

    if hooks.apply_allow_meta(true) {
        allowed.extend(META_ARGS.iter().map(|s| s.to_string()));
    }

    if hooks.apply_allow_search(true) {
        allowed.extend(SEARCH_ARGS.iter().map(|s| s.to_string()));
    }

    // Extensions have the last word, unchecked
    let allowed: AllowedParameterSet = hooks.apply_allowed_args(allowed).into_iter().collect();

    tracing::debug!(count = allowed.len(), "resolved allowed user query parameters");
    allowed
}
