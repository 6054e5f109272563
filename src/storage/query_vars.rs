//! Typed reading of user query arguments
//!
//! Arguments reach the store untyped; this module applies the defaults and
//! loose conversions of a user directory query once, up front.

use crate::core::args::QueryArgs;
use crate::core::coerce::{absint, as_text, id_list, intval, string_list, truthy};
use crate::core::user::{USER_FIELDS, UserRecord};
use crate::storage::meta_query::{MetaQuery, MetaType, order as meta_order};
use serde_json::{Map, Value, json};
use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Missing means ascending; anything other than "ASC" means descending
    fn parse(raw: Option<&Value>) -> Self {
        match raw.and_then(as_text) {
            None => SortOrder::Asc,
            Some(s) if s.trim().eq_ignore_ascii_case("ASC") => SortOrder::Asc,
            Some(_) => SortOrder::Desc,
        }
    }
}

/// Sortable columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Id,
    Login,
    Nicename,
    Email,
    Url,
    Registered,
    DisplayName,
    PostCount,
    Include,
    LoginIn,
    NicenameIn,
    MetaValue,
    MetaValueNum,
}

impl OrderBy {
    fn parse(raw: &str) -> Option<Self> {
        let column = match raw.trim() {
            "ID" | "id" => OrderBy::Id,
            "login" | "user_login" => OrderBy::Login,
            "nicename" | "user_nicename" => OrderBy::Nicename,
            "email" | "user_email" => OrderBy::Email,
            "url" | "user_url" => OrderBy::Url,
            "registered" | "user_registered" => OrderBy::Registered,
            "name" | "display_name" => OrderBy::DisplayName,
            "post_count" => OrderBy::PostCount,
            "include" => OrderBy::Include,
            "login__in" => OrderBy::LoginIn,
            "nicename__in" => OrderBy::NicenameIn,
            "meta_value" => OrderBy::MetaValue,
            "meta_value_num" => OrderBy::MetaValueNum,
            _ => return None,
        };
        Some(column)
    }
}

/// Where a search term may match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    None,
    Leading,
    Trailing,
    Both,
}

/// Columns a search may look at
pub const SEARCH_COLUMNS: &[&str] = &[
    "ID",
    "user_login",
    "user_email",
    "user_url",
    "user_nicename",
    "display_name",
];

/// A free-text search over user columns
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub term: String,
    pub wildcard: Wildcard,
    pub columns: Vec<String>,
}

impl Search {
    fn parse(args: &QueryArgs) -> Option<Self> {
        let raw = args.get("search").and_then(as_text)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let leading = raw.starts_with('*');
        let trailing = raw.ends_with('*');
        let wildcard = match (leading, trailing) {
            (true, true) => Wildcard::Both,
            (true, false) => Wildcard::Leading,
            (false, true) => Wildcard::Trailing,
            (false, false) => Wildcard::None,
        };
        let term = raw.trim_matches('*').to_string();

        let mut columns: Vec<String> = args
            .get("search_columns")
            .map(string_list)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| SEARCH_COLUMNS.contains(&c.as_str()))
            .collect();

        if columns.is_empty() {
            columns = infer_search_columns(&term);
        }

        Some(Self {
            term,
            wildcard,
            columns,
        })
    }

    fn matches(&self, user: &UserRecord) -> bool {
        self.columns.iter().any(|column| {
            if column == "ID" {
                return user.id.to_string() == self.term;
            }

            let Some(actual) = user.field(column).as_ref().and_then(as_text) else {
                return false;
            };
            let actual = actual.to_lowercase();
            let term = self.term.to_lowercase();

            match self.wildcard {
                Wildcard::None => actual == term,
                Wildcard::Leading => actual.ends_with(&term),
                Wildcard::Trailing => actual.starts_with(&term),
                Wildcard::Both => actual.contains(&term),
            }
        })
    }
}

/// Columns searched when the client does not name any
fn infer_search_columns(term: &str) -> Vec<String> {
    let columns: &[&str] = if term.contains('@') {
        &["user_email"]
    } else if !term.is_empty() && term.parse::<f64>().is_ok() {
        &["user_login", "ID"]
    } else if term.starts_with("http://") || term.starts_with("https://") {
        &["user_url"]
    } else {
        &[
            "user_login",
            "user_url",
            "user_email",
            "user_nicename",
            "display_name",
        ]
    };
    columns.iter().map(|c| c.to_string()).collect()
}

/// Shape of each returned entity
#[derive(Debug, Clone, PartialEq)]
pub enum Fields {
    /// Public representation of every user
    All,
    /// Public representation plus metadata
    AllWithMeta,
    /// A flat list of one column
    Single(String),
    /// Objects restricted to the listed columns
    Subset(Vec<String>),
}

impl Fields {
    fn parse(raw: Option<&Value>) -> Self {
        match raw {
            Some(Value::String(s)) => match s.trim() {
                "all_with_meta" => Fields::AllWithMeta,
                "id" | "ID" => Fields::Single("ID".to_string()),
                name if USER_FIELDS.contains(&name) => Fields::Single(name.to_string()),
                _ => Fields::All,
            },
            Some(value) if value.is_array() || value.is_object() => {
                let mut columns: Vec<String> = Vec::new();
                for name in string_list(value) {
                    let name = if name.eq_ignore_ascii_case("id") {
                        "ID".to_string()
                    } else {
                        name
                    };
                    if USER_FIELDS.contains(&name.as_str()) && !columns.contains(&name) {
                        columns.push(name);
                    }
                }
                if columns.is_empty() {
                    Fields::All
                } else {
                    Fields::Subset(columns)
                }
            }
            _ => Fields::All,
        }
    }

    /// Render a user in this shape
    pub fn project(&self, user: &UserRecord) -> Value {
        match self {
            Fields::All => user.to_public_json(),
            Fields::AllWithMeta => {
                let mut value = user.to_public_json();
                value["meta"] = json!(user.meta);
                value
            }
            Fields::Single(name) => user.field(name).unwrap_or(Value::Null),
            Fields::Subset(names) => {
                let map: Map<String, Value> = names
                    .iter()
                    .filter_map(|name| user.field(name).map(|v| (name.clone(), v)))
                    .collect();
                Value::Object(map)
            }
        }
    }
}

/// Every user query argument the store understands, with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVars {
    pub blog_id: Option<u64>,
    pub roles_all: Vec<String>,
    pub role_in: Vec<String>,
    pub role_not_in: Vec<String>,
    pub caps_all: Vec<String>,
    pub cap_in: Vec<String>,
    pub cap_not_in: Vec<String>,
    pub include: Vec<u64>,
    pub exclude: Vec<u64>,
    pub login: Option<String>,
    pub login_in: Vec<String>,
    pub login_not_in: Vec<String>,
    pub nicename: Option<String>,
    pub nicename_in: Vec<String>,
    pub nicename_not_in: Vec<String>,
    pub who_authors: bool,
    pub has_published_posts: bool,
    pub search: Option<Search>,
    pub meta: Option<MetaQuery>,
    pub meta_key: Option<String>,
    pub orderby: Vec<(OrderBy, SortOrder)>,
    /// Page size; `None` returns every match
    pub number: Option<usize>,
    pub offset: usize,
    pub paged: usize,
    pub count_total: bool,
    pub fields: Fields,
}

impl QueryVars {
    pub fn parse(args: &QueryArgs) -> Self {
        let list = |name: &str| args.get(name).map(string_list).unwrap_or_default();
        let text = |name: &str| {
            args.get(name)
                .and_then(as_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let include = args.get("include").map(id_list).unwrap_or_default();
        let exclude = if include.is_empty() {
            args.get("exclude").map(id_list).unwrap_or_default()
        } else {
            // include wins over exclude
            Vec::new()
        };

        let number = args
            .get("number")
            .map(intval)
            .filter(|n| *n > 0)
            .map(|n| n as usize);

        let meta_key = text("meta_key");

        Self {
            blog_id: args.get("blog_id").map(absint).filter(|id| *id > 0),
            roles_all: list("role"),
            role_in: list("role__in"),
            role_not_in: list("role__not_in"),
            caps_all: list("capability"),
            cap_in: list("capability__in"),
            cap_not_in: list("capability__not_in"),
            include,
            exclude,
            login: text("login"),
            login_in: list("login__in"),
            login_not_in: list("login__not_in"),
            nicename: text("nicename"),
            nicename_in: list("nicename__in"),
            nicename_not_in: list("nicename__not_in"),
            who_authors: text("who").is_some_and(|w| w.eq_ignore_ascii_case("authors")),
            has_published_posts: args.get("has_published_posts").is_some_and(truthy),
            search: Search::parse(args),
            meta: MetaQuery::from_args(args),
            orderby: parse_orderby(args),
            meta_key,
            number,
            offset: args.get("offset").map_or(0, absint) as usize,
            paged: args.get("paged").map_or(1, absint).max(1) as usize,
            count_total: args.get("count_total").is_none_or(truthy),
            fields: Fields::parse(args.get("fields")),
        }
    }

    /// Whether a user passes every filter
    pub fn matches(&self, user: &UserRecord) -> bool {
        if let Some(blog_id) = self.blog_id {
            if !user.blogs.contains(&blog_id) {
                return false;
            }
        }

        if !self.roles_all.iter().all(|r| user.has_role(r))
            || (!self.role_in.is_empty() && !self.role_in.iter().any(|r| user.has_role(r)))
            || self.role_not_in.iter().any(|r| user.has_role(r))
        {
            return false;
        }

        if !self.caps_all.iter().all(|c| user.has_cap(c))
            || (!self.cap_in.is_empty() && !self.cap_in.iter().any(|c| user.has_cap(c)))
            || self.cap_not_in.iter().any(|c| user.has_cap(c))
        {
            return false;
        }

        if !self.include.is_empty() && !self.include.contains(&user.id) {
            return false;
        }
        if self.exclude.contains(&user.id) {
            return false;
        }

        if !text_filter(&user.user_login, &self.login, &self.login_in, &self.login_not_in)
            || !text_filter(
                &user.user_nicename,
                &self.nicename,
                &self.nicename_in,
                &self.nicename_not_in,
            )
        {
            return false;
        }

        if self.who_authors && !user.has_cap("edit_posts") {
            return false;
        }
        if self.has_published_posts && user.post_count == 0 {
            return false;
        }

        if self.search.as_ref().is_some_and(|s| !s.matches(user)) {
            return false;
        }

        self.meta.as_ref().is_none_or(|m| m.matches(user))
    }

    /// Ordering of two users under the requested sort columns
    pub fn compare(&self, a: &UserRecord, b: &UserRecord) -> Ordering {
        for (column, direction) in &self.orderby {
            let ordering = self.compare_column(column, a, b);
            let ordering = match direction {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn compare_column(&self, column: &OrderBy, a: &UserRecord, b: &UserRecord) -> Ordering {
        match column {
            OrderBy::Id => a.id.cmp(&b.id),
            OrderBy::Login => caseless(&a.user_login, &b.user_login),
            OrderBy::Nicename => caseless(&a.user_nicename, &b.user_nicename),
            OrderBy::Email => caseless(&a.user_email, &b.user_email),
            OrderBy::Url => caseless(&a.user_url, &b.user_url),
            OrderBy::Registered => a.user_registered.cmp(&b.user_registered),
            OrderBy::DisplayName => caseless(&a.display_name, &b.display_name),
            OrderBy::PostCount => a.post_count.cmp(&b.post_count),
            OrderBy::Include => position(&self.include, &a.id).cmp(&position(&self.include, &b.id)),
            OrderBy::LoginIn => position(&self.login_in, &a.user_login)
                .cmp(&position(&self.login_in, &b.user_login)),
            OrderBy::NicenameIn => position(&self.nicename_in, &a.user_nicename)
                .cmp(&position(&self.nicename_in, &b.user_nicename)),
            OrderBy::MetaValue => self.compare_meta(a, b, MetaType::Char),
            OrderBy::MetaValueNum => self.compare_meta(a, b, MetaType::Numeric),
        }
    }

    fn compare_meta(&self, a: &UserRecord, b: &UserRecord, meta_type: MetaType) -> Ordering {
        let Some(key) = &self.meta_key else {
            return Ordering::Equal;
        };
        let a = a.meta.get(key).map(String::as_str).unwrap_or_default();
        let b = b.meta.get(key).map(String::as_str).unwrap_or_default();
        meta_order(a, b, meta_type)
    }

    /// Index of the first user on the requested page
    pub fn page_start(&self) -> usize {
        match self.number {
            Some(number) if self.offset == 0 => number.saturating_mul(self.paged - 1),
            _ => self.offset,
        }
    }
}

fn text_filter(actual: &str, exact: &Option<String>, any_of: &[String], none_of: &[String]) -> bool {
    exact.as_ref().is_none_or(|e| e.eq_ignore_ascii_case(actual))
        && (any_of.is_empty() || any_of.iter().any(|v| v.eq_ignore_ascii_case(actual)))
        && !none_of.iter().any(|v| v.eq_ignore_ascii_case(actual))
}

fn caseless(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn position<T: PartialEq>(list: &[T], item: &T) -> usize {
    list.iter().position(|x| x == item).unwrap_or(usize::MAX)
}

/// Sort columns from `orderby` / `order`, falling back to login ascending
fn parse_orderby(args: &QueryArgs) -> Vec<(OrderBy, SortOrder)> {
    let default_order = SortOrder::parse(args.get("order"));

    let mut orderby = match args.get("orderby") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(column, order)| {
                // numeric keys carry the column name as the value
                if column.parse::<usize>().is_ok() {
                    as_text(order)
                        .and_then(|c| OrderBy::parse(&c))
                        .map(|c| (c, default_order))
                } else {
                    OrderBy::parse(column).map(|c| (c, SortOrder::parse(Some(order))))
                }
            })
            .collect(),
        Some(value) => string_list(value)
            .iter()
            .filter_map(|c| OrderBy::parse(c))
            .map(|c| (c, default_order))
            .collect(),
        None => Vec::new(),
    };

    if orderby.is_empty() {
        orderby.push((OrderBy::Login, default_order));
    }
    orderby
}
