//! Query argument building
//!
//! Turns the whitelisted request parameters into the argument set handed to
//! the query engine:
//!
//! 1. keep the request parameters whose names are allowed, values untouched
//! 2. fill in every default whose name is still missing
//! 3. run every value through the `arg_value` hook, which sees the whole
//!    merged set (defaults included)

use crate::core::hooks::HookRegistry;
use crate::core::params::RequestParameters;
use crate::core::whitelist::AllowedParameterSet;
use indexmap::IndexMap;
use serde_json::{Value, json};

/// Named arguments passed to the query engine
pub type QueryArgs = IndexMap<String, Value>;

/// The two built-in defaults: authors only, ten per page
pub fn seed_default_args() -> QueryArgs {
    let mut args = QueryArgs::new();
    args.insert("role".to_string(), json!("Author"));
    args.insert("number".to_string(), json!(10));
    args
}

/// Seeded defaults after the `default_args` hook
pub fn default_args(hooks: &HookRegistry) -> QueryArgs {
    hooks.apply_default_args(seed_default_args())
}

/// Keep exactly the allowed request parameters
///
/// Anything not in the allowed set is dropped silently, whatever its name.
pub fn filter_request_params(
    params: &RequestParameters,
    allowed: &AllowedParameterSet,
) -> QueryArgs {
    params
        .iter()
        .filter(|(key, _)| allowed.contains(key))
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Layer the filtered parameters over the defaults
///
/// Defaults keep their position at the front; request values replace them
/// key by key and new keys follow in request order.
pub fn merge_defaults(filtered: QueryArgs, defaults: QueryArgs) -> QueryArgs {
    let mut merged = defaults;
    for (key, value) in filtered {
        merged.insert(key, value);
    }
    merged
}

/// Pass every value through the `arg_value` hook
///
/// Keys are visited in order and each callback sees the set as updated so far.
pub fn apply_value_filters(hooks: &HookRegistry, mut args: QueryArgs) -> QueryArgs {
    for index in 0..args.len() {
        let Some((key, value)) = args.get_index(index) else {
            break;
        };
        let key = key.clone();
        let filtered = hooks.apply_arg_value(value.clone(), &key, &args);
        if let Some((_, slot)) = args.get_index_mut(index) {
            *slot = filtered;
        }
    }
    args
}

/// Build the final query arguments for a request
pub fn build_query_args(
    hooks: &HookRegistry,
    params: &RequestParameters,
    allowed: &AllowedParameterSet,
) -> QueryArgs {
    let defaults = default_args(hooks);
    let filtered = filter_request_params(params, allowed);

    let dropped = params.len() - filtered.len();
    if dropped > 0 {
        tracing::debug!(dropped, "ignored request parameters outside the allowed set");
    }

    let merged = merge_defaults(filtered, defaults);
    let args = apply_value_filters(hooks, merged);

    tracing::debug!(keys = ?args.keys().collect::<Vec<_>>(), "built user query arguments");
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hooks::DEFAULT_PRIORITY;
    use crate::core::whitelist::resolve_allowed_args;

    fn allowed(names: &[&str]) -> AllowedParameterSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_keeps_only_allowed_keys() {
        let params = RequestParameters::from_iter([
            ("role", "Editor"),
            ("admin_override", "true"),
            ("number", "3"),
        ]);

        let filtered = filter_request_params(&params, &allowed(&["role", "number"]));

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered["role"], json!("Editor"));
        assert_eq!(filtered["number"], json!("3"));
        assert!(!filtered.contains_key("admin_override"));
    }

    #[test]
    fn test_defaults_fill_missing_keys_only() {
        let mut filtered = QueryArgs::new();
        filtered.insert("number".to_string(), json!("10"));

        let merged = merge_defaults(filtered, seed_default_args());

        assert_eq!(merged["role"], json!("Author"));
        // request value wins even when it equals the default
        assert_eq!(merged["number"], json!("10"));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["role", "number"]);
    }

    #[test]
    fn test_empty_request_gets_seed_defaults() {
        let hooks = HookRegistry::new();
        let allowed = resolve_allowed_args(&hooks);
        let args = build_query_args(&hooks, &RequestParameters::new(), &allowed);

        assert_eq!(args, seed_default_args());
    }

    #[test]
    fn test_role_in_does_not_suppress_role_default() {
        let hooks = HookRegistry::new();
        let allowed = resolve_allowed_args(&hooks);
        let params =
            RequestParameters::from_query_str("role__in[]=Editor&role__in[]=Author&number=5");

        let args = build_query_args(&hooks, &params, &allowed);

        assert_eq!(args["role__in"], json!(["Editor", "Author"]));
        assert_eq!(args["number"], json!("5"));
        assert_eq!(args["role"], json!("Author"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_default_args_hook_extends_defaults() {
        let mut hooks = HookRegistry::new();
        hooks.on_default_args(DEFAULT_PRIORITY, |mut args| {
            args.insert("orderby".to_string(), json!("registered"));
            args.shift_remove("role");
            args
        });

        let args = build_query_args(
            &hooks,
            &RequestParameters::new(),
            &resolve_allowed_args(&hooks),
        );

        assert_eq!(args["orderby"], json!("registered"));
        assert!(!args.contains_key("role"));
    }

    #[test]
    fn test_value_filters_without_hooks_are_identity() {
        let hooks = HookRegistry::new();
        let args = seed_default_args();
        assert_eq!(apply_value_filters(&hooks, args.clone()), args);
    }

    #[test]
    fn test_value_filters_see_merged_args() {
        let mut hooks = HookRegistry::new();
        hooks.on_arg_value(DEFAULT_PRIORITY, |value, key, args| {
            if key == "number" && args.contains_key("role") {
                json!(crate::core::coerce::absint(&value))
            } else {
                value
            }
        });

        let params = RequestParameters::from_iter([("number", "25")]);
        let args = build_query_args(&hooks, &params, &allowed(&["number"]));

        assert_eq!(args["number"], json!(25));
    }

    #[test]
    fn test_value_filters_apply_to_defaults() {
        let mut hooks = HookRegistry::new();
        hooks.on_arg_value(DEFAULT_PRIORITY, |value, key, _| {
            if key == "role" {
                json!(value.as_str().unwrap_or_default().to_lowercase())
            } else {
                value
            }
        });

        let args = build_query_args(&hooks, &RequestParameters::new(), &allowed(&[]));
        assert_eq!(args["role"], json!("author"));
    }

    #[test]
    fn test_value_filters_see_earlier_updates() {
        let mut hooks = HookRegistry::new();
        hooks.on_arg_value(DEFAULT_PRIORITY, |value, key, args| {
            if key == "number" {
                args["role"].clone()
            } else {
                json!("changed")
            }
        });

        let args = apply_value_filters(&hooks, seed_default_args());
        assert_eq!(args["role"], json!("changed"));
        assert_eq!(args["number"], json!("changed"));
    }
}
