//! Configuration loading and management

use crate::core::args::QueryArgs;
use crate::core::error::UserQueryError;
use crate::core::hooks::HookRegistry;
use crate::core::user::UserRecord;
use serde::{Deserialize, Serialize};

/// Priority used for configuration hooks; lower than any extension default
pub const CONFIG_PRIORITY: i32 = 0;

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_route() -> String {
    "/user_query/args".to_string()
}

fn enabled() -> bool {
    true
}

/// Complete configuration for the user query endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQueryConfig {
    /// Address the server listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path the user query endpoint is mounted at
    #[serde(default = "default_route")]
    pub route: String,

    /// Defaults merged over the built-in `role` / `number` seed
    #[serde(default)]
    pub default_args: QueryArgs,

    #[serde(default = "enabled")]
    pub allow_meta: bool,

    #[serde(default = "enabled")]
    pub allow_search: bool,

    #[serde(default = "enabled")]
    pub allow_query: bool,

    /// Parameter names allowed on top of the built-in set
    #[serde(default)]
    pub extra_allowed_args: Vec<String>,

    /// Users loaded into the in-memory store at startup
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl Default for UserQueryConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            route: default_route(),
            default_args: QueryArgs::new(),
            allow_meta: true,
            allow_search: true,
            allow_query: true,
            extra_allowed_args: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl UserQueryConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, UserQueryError> {
        let content = std::fs::read_to_string(path).map_err(|err| UserQueryError::Config {
            message: format!("{}: {}", path, err),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, UserQueryError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Register the configured values as hooks
    ///
    /// Everything is installed at [`CONFIG_PRIORITY`], so callbacks added at
    /// the default priority see the configured values and can override them.
    /// Settings left at their defaults install nothing.
    pub fn install_hooks(&self, hooks: &mut HookRegistry) {
        if !self.default_args.is_empty() {
            let configured = self.default_args.clone();
            hooks.on_default_args(CONFIG_PRIORITY, move |mut args| {
                for (key, value) in &configured {
                    args.insert(key.clone(), value.clone());
                }
                args
            });
        }

        if !self.extra_allowed_args.is_empty() {
            let extra = self.extra_allowed_args.clone();
            hooks.on_allowed_args(CONFIG_PRIORITY, move |mut args| {
                args.extend(extra.iter().cloned());
                args
            });
        }

        if !self.allow_meta {
            hooks.on_allow_meta(CONFIG_PRIORITY, |_| false);
        }
        if !self.allow_search {
            hooks.on_allow_search(CONFIG_PRIORITY, |_| false);
        }
        if !self.allow_query {
            hooks.on_allow_query(CONFIG_PRIORITY, |_| false);
        }

        tracing::debug!(
            hooks = hooks.registered_hooks().count(),
            "installed configuration hooks"
        );
    }
}
