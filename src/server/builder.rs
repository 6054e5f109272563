//! ServerBuilder for fluent API to build the user query server

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::compat::{self, SearchRelevance};
use crate::config::UserQueryConfig;
use crate::core::engine::UserQueryEngine;
use crate::core::hooks::HookRegistry;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the user query HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(UserQueryConfig::from_yaml_file("user-query.yaml")?)
///     .with_engine(InMemoryUserStore::new())
///     .configure_hooks(|hooks| {
///         hooks.on_allow_meta(DEFAULT_PRIORITY, |_| false);
///     })
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: UserQueryConfig,
    hooks: HookRegistry,
    engine: Option<Arc<dyn UserQueryEngine>>,
    relevance: Option<Arc<dyn SearchRelevance>>,
    compatibility: bool,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            config: UserQueryConfig::default(),
            hooks: HookRegistry::new(),
            engine: None,
            relevance: None,
            compatibility: true,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: UserQueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the query engine (required)
    pub fn with_engine(mut self, engine: impl UserQueryEngine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Set an already shared query engine
    pub fn with_shared_engine(mut self, engine: Arc<dyn UserQueryEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Register extension callbacks
    ///
    /// May be called several times; callbacks accumulate. The registry is
    /// frozen once the host is built.
    pub fn configure_hooks(mut self, configure: impl FnOnce(&mut HookRegistry)) -> Self {
        configure(&mut self.hooks);
        self
    }

    /// Hand non-empty searches to an external relevance provider
    pub fn with_search_relevance(mut self, provider: impl SearchRelevance + 'static) -> Self {
        self.relevance = Some(Arc::new(provider));
        self
    }

    /// Skip the compatibility shims (multilingual `lang`, search relevance)
    pub fn without_compatibility(mut self) -> Self {
        self.compatibility = false;
        self
    }

    /// Add custom routes to the server
    ///
    /// # Example
    ///
    /// ```ignore
    /// let extra = Router::new().route("/version", get(|| async { "1.0" }));
    ///
    /// ServerBuilder::new()
    ///     .with_engine(store)
    ///     .with_custom_routes(extra)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    ///
    /// Installs the configuration hooks and, unless disabled, the
    /// compatibility shims on top of the registered callbacks.
    pub fn build_host(mut self) -> Result<ServerHost> {
        let engine = self
            .engine
            .take()
            .ok_or_else(|| anyhow::anyhow!("UserQueryEngine is required. Call .with_engine()"))?;

        let mut hooks = std::mem::take(&mut self.hooks);
        self.config.install_hooks(&mut hooks);

        if self.compatibility {
            compat::install(&mut hooks, self.relevance.take());
        }

        ServerHost::from_builder_components(self.config, hooks, engine)
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);
        RestExposure::build_router(host, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on the address from the configuration
    pub async fn serve_configured(self) -> Result<()> {
        let addr = self.config.bind.clone();
        self.serve(&addr).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::LANG_ARG;
    use crate::core::engine::UserQueryResult;
    use crate::core::hooks::{DEFAULT_PRIORITY, Hook};
    use crate::core::whitelist::resolve_allowed_args;
    use crate::storage::InMemoryUserStore;

    struct NoopRelevance;

    impl SearchRelevance for NoopRelevance {
        fn rerun(&self, _search: &str, _result: &mut UserQueryResult) {}
    }

    // ── Constructor tests ────────────────────────────────────────────────

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.engine.is_none());
        assert!(builder.relevance.is_none());
        assert!(builder.compatibility);
        assert!(builder.custom_routes.is_empty());
        assert_eq!(builder.config, UserQueryConfig::default());
    }

    #[test]
    fn test_with_custom_routes_appends_router() {
        let builder = ServerBuilder::new()
            .with_custom_routes(Router::new())
            .with_custom_routes(Router::new());
        assert_eq!(builder.custom_routes.len(), 2);
    }

    #[test]
    fn test_configure_hooks_accumulates() {
        let builder = ServerBuilder::new()
            .configure_hooks(|hooks| {
                hooks.on_allow_meta(DEFAULT_PRIORITY, |_| false);
            })
            .configure_hooks(|hooks| {
                hooks.on_allow_meta(DEFAULT_PRIORITY, |allow| allow);
            });
        assert_eq!(builder.hooks.handler_count(Hook::AllowMeta), 2);
    }

    // ── build_host ───────────────────────────────────────────────────────

    #[test]
    fn test_build_host_without_engine_fails() {
        let result = ServerBuilder::new().build_host();
        assert!(result.is_err());
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert!(
            err_msg.contains("UserQueryEngine is required"),
            "error should mention the engine: {}",
            err_msg
        );
    }

    #[test]
    fn test_build_host_installs_compat_shims() {
        let host = ServerBuilder::new()
            .with_engine(InMemoryUserStore::new())
            .with_search_relevance(NoopRelevance)
            .build_host()
            .expect("build_host should succeed");

        assert!(resolve_allowed_args(&host.hooks).contains(LANG_ARG));
        assert!(host.hooks.has_hook(Hook::AfterQuery));
    }

    #[test]
    fn test_build_host_without_compatibility() {
        let host = ServerBuilder::new()
            .with_engine(InMemoryUserStore::new())
            .with_search_relevance(NoopRelevance)
            .without_compatibility()
            .build_host()
            .expect("build_host should succeed");

        assert!(!resolve_allowed_args(&host.hooks).contains(LANG_ARG));
        assert!(!host.hooks.has_hook(Hook::AfterQuery));
    }

    #[test]
    fn test_build_host_installs_config_hooks() {
        let config = UserQueryConfig::from_yaml_str("allow_search: false\nroute: /people")
            .expect("config should parse");
        let host = ServerBuilder::new()
            .with_config(config)
            .with_engine(InMemoryUserStore::new())
            .build_host()
            .expect("build_host should succeed");

        assert_eq!(host.route(), "/people");
        assert!(!resolve_allowed_args(&host.hooks).contains("search"));
    }

    // ── build (REST router) ──────────────────────────────────────────────

    #[test]
    fn test_build_without_engine_fails() {
        assert!(ServerBuilder::new().build().is_err());
    }

    #[test]
    fn test_fluent_chaining_full_pipeline() {
        use axum::routing::get;

        let result = ServerBuilder::new()
            .with_engine(InMemoryUserStore::new())
            .with_custom_routes(Router::new().route("/custom", get(|| async { "ok" })))
            .configure_hooks(|hooks| {
                hooks.on_default_args(DEFAULT_PRIORITY, |args| args);
            })
            .build();
        assert!(result.is_ok(), "full fluent pipeline should succeed");
    }
}
