//! User query server
//!
//! Usage: `user-query-server [config.yaml]`
//!
//! Loads the configuration (defaults when no path is given), seeds the
//! in-memory directory with the configured users and serves the endpoint.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use user_query::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(%path, "loading configuration");
            UserQueryConfig::from_yaml_file(&path)?
        }
        None => UserQueryConfig::default(),
    };

    let store = InMemoryUserStore::with_users(config.users.clone());
    tracing::info!(users = store.len()?, route = %config.route, "user directory ready");

    ServerBuilder::new()
        .with_config(config)
        .with_engine(store)
        .serve_configured()
        .await
}
