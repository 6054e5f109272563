//! Server host for transport-agnostic exposure of the user query endpoint
//!
//! The host holds everything a request needs: the configuration, the hook
//! registry (frozen once built) and the query engine. Exposures turn it into
//! a router.

use crate::config::UserQueryConfig;
use crate::core::engine::UserQueryEngine;
use crate::core::hooks::HookRegistry;
use anyhow::Result;
use std::sync::Arc;

/// Host context containing all endpoint state
///
/// # Example
///
/// ```rust,ignore
/// let host = ServerHost::from_builder_components(config, hooks, engine)?;
/// let app = RestExposure::build_router(Arc::new(host), vec![])?;
/// ```
pub struct ServerHost {
    pub config: Arc<UserQueryConfig>,

    /// Read-only after construction; shared by every request
    pub hooks: Arc<HookRegistry>,

    pub engine: Arc<dyn UserQueryEngine>,
}

impl ServerHost {
    /// Build the host from builder components
    ///
    /// Fails when the configured route cannot be mounted.
    pub fn from_builder_components(
        config: UserQueryConfig,
        hooks: HookRegistry,
        engine: Arc<dyn UserQueryEngine>,
    ) -> Result<Self> {
        if !config.route.starts_with('/') {
            anyhow::bail!("Route must start with '/': {}", config.route);
        }

        tracing::debug!(
            route = %config.route,
            hooks = ?hooks.registered_hooks().map(|h| h.name()).collect::<Vec<_>>(),
            "user query host ready"
        );

        Ok(Self {
            config: Arc::new(config),
            hooks: Arc::new(hooks),
            engine,
        })
    }

    /// Route of the user query endpoint
    pub fn route(&self) -> &str {
        &self.config.route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryUserStore;

    #[test]
    fn test_host_keeps_route() {
        let host = ServerHost::from_builder_components(
            UserQueryConfig::default(),
            HookRegistry::new(),
            Arc::new(InMemoryUserStore::new()),
        )
        .expect("host should build");

        assert_eq!(host.route(), "/user_query/args");
        assert_eq!(host.hooks.registered_hooks().count(), 0);
    }

    #[test]
    fn test_relative_route_rejected() {
        let config = UserQueryConfig {
            route: "user_query/args".to_string(),
            ..UserQueryConfig::default()
        };

        let result = ServerHost::from_builder_components(
            config,
            HookRegistry::new(),
            Arc::new(InMemoryUserStore::new()),
        );

        assert!(result.is_err());
    }
}
