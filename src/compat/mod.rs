//! Compatibility shims for third-party integrations
//!
//! Both shims hook into the regular extension points; nothing here bypasses
//! the pipeline.
//!
//! - multilingual: lets the `lang` parameter through the allowed set so a
//!   language-aware engine can scope the directory
//! - search relevance: after a query that carried a search term, hands the
//!   result to a relevance provider that may re-run or re-rank it

use crate::core::engine::UserQueryResult;
use crate::core::hooks::{DEFAULT_PRIORITY, HookRegistry};
use std::sync::Arc;

/// Query parameter used by multilingual directories
pub const LANG_ARG: &str = "lang";

/// External full-text search that can take over a user search
pub trait SearchRelevance: Send + Sync {
    /// Rework `result` for `search`; called only for non-empty searches
    fn rerun(&self, search: &str, result: &mut UserQueryResult);
}

/// Allow the `lang` parameter
pub fn register_multilingual(hooks: &mut HookRegistry) {
    hooks.on_allowed_args(DEFAULT_PRIORITY, |mut args| {
        args.push(LANG_ARG.to_string());
        args
    });
}

/// Hand searches over to a relevance provider after every query
pub fn register_search_relevance(hooks: &mut HookRegistry, provider: Arc<dyn SearchRelevance>) {
    hooks.on_after_query(DEFAULT_PRIORITY, move |result| {
        let Some(search) = result.search_term().map(str::to_string) else {
            return;
        };

        tracing::debug!(%search, "re-running user search through relevance provider");
        provider.rerun(&search, result);
    });
}

/// Install every shim; the relevance one only when a provider is available
pub fn install(hooks: &mut HookRegistry, relevance: Option<Arc<dyn SearchRelevance>>) {
    register_multilingual(hooks);

    if let Some(provider) = relevance {
        register_search_relevance(hooks, provider);
    }
}
