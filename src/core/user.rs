//! User records held by the directory

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Columns that can be selected through the `fields` argument
pub const USER_FIELDS: &[&str] = &[
    "ID",
    "user_login",
    "user_nicename",
    "user_email",
    "user_url",
    "user_registered",
    "display_name",
];

/// A user of the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "ID")]
    pub id: u64,

    pub user_login: String,

    #[serde(default)]
    pub user_nicename: String,

    #[serde(default)]
    pub user_email: String,

    #[serde(default)]
    pub user_url: String,

    #[serde(default = "Utc::now")]
    pub user_registered: DateTime<Utc>,

    #[serde(default)]
    pub display_name: String,

    /// Role slugs (e.g. "author", "editor")
    #[serde(default)]
    pub roles: Vec<String>,

    /// Capabilities granted on top of the roles
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Free-form user metadata
    #[serde(default)]
    pub meta: IndexMap<String, String>,

    /// Number of published posts authored by the user
    #[serde(default)]
    pub post_count: u64,

    /// Sites the user belongs to
    #[serde(default = "default_blogs")]
    pub blogs: Vec<u64>,
}

fn default_blogs() -> Vec<u64> {
    vec![1]
}

/// Capabilities granted by the built-in roles
pub fn role_capabilities(role: &str) -> &'static [&'static str] {
    match role.to_lowercase().as_str() {
        "administrator" => &[
            "manage_options",
            "list_users",
            "edit_users",
            "promote_users",
            "edit_others_posts",
            "publish_posts",
            "edit_posts",
            "upload_files",
            "read",
        ],
        "editor" => &[
            "edit_others_posts",
            "publish_posts",
            "edit_posts",
            "upload_files",
            "read",
        ],
        "author" => &["publish_posts", "edit_posts", "upload_files", "read"],
        "contributor" => &["edit_posts", "read"],
        "subscriber" => &["read"],
        _ => &[],
    }
}

impl UserRecord {
    /// Create a user with a login, nicename and display name derived from it
    pub fn new(id: u64, login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            id,
            user_nicename: login.to_lowercase().replace(' ', "-"),
            display_name: login.clone(),
            user_login: login,
            user_email: String::new(),
            user_url: String::new(),
            user_registered: Utc::now(),
            roles: Vec::new(),
            capabilities: Vec::new(),
            meta: IndexMap::new(),
            post_count: 0,
            blogs: default_blogs(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = email.into();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.user_url = url.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_post_count(mut self, count: u64) -> Self {
        self.post_count = count;
        self
    }

    pub fn with_registered(mut self, registered: DateTime<Utc>) -> Self {
        self.user_registered = registered;
        self
    }

    pub fn with_blogs(mut self, blogs: Vec<u64>) -> Self {
        self.blogs = blogs;
        self
    }

    /// Role check, ignoring case ("Author" matches "author")
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Capability check over explicit capabilities, role grants and role names
    pub fn has_cap(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
            || self.roles.iter().any(|role| {
                role.eq_ignore_ascii_case(capability)
                    || role_capabilities(role)
                        .iter()
                        .any(|c| c.eq_ignore_ascii_case(capability))
            })
    }

    /// Value of a selectable column, `None` for unknown names
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "ID" | "id" => json!(self.id),
            "user_login" => json!(self.user_login),
            "user_nicename" => json!(self.user_nicename),
            "user_email" => json!(self.user_email),
            "user_url" => json!(self.user_url),
            "user_registered" => json!(self.registered_string()),
            "display_name" => json!(self.display_name),
            _ => return None,
        };
        Some(value)
    }

    /// Registration date in `YYYY-MM-DD HH:MM:SS` form
    pub fn registered_string(&self) -> String {
        self.user_registered.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Public representation: every selectable column plus the roles
    pub fn to_public_json(&self) -> Value {
        let mut map = Map::new();
        for name in USER_FIELDS {
            if let Some(value) = self.field(name) {
                map.insert(name.to_string(), value);
            }
        }
        map.insert("roles".to_string(), json!(self.roles));
        Value::Object(map)
    }
}
