//! Metadata clauses for the in-memory user store
//!
//! Supports the flat `meta_key` / `meta_value` / `meta_compare` arguments and
//! nested `meta_query` groups:
//!
//! ```json
//! {
//!   "relation": "OR",
//!   "0": { "key": "city", "value": "Turku" },
//!   "1": { "key": "age", "value": "30", "compare": ">=", "type": "NUMERIC" }
//! }
//! ```
//!
//! When both forms are given they are combined with AND.

use crate::core::args::QueryArgs;
use crate::core::coerce::{as_text, string_list};
use crate::core::user::UserRecord;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// How sibling clauses combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    And,
    Or,
}

/// Value comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    Exists,
    NotExists,
    Regexp,
    NotRegexp,
}

impl Compare {
    fn parse(raw: Option<&Value>, has_list_value: bool) -> Self {
        let Some(raw) = raw.and_then(as_text) else {
            // A list value without an explicit operator means IN
            return if has_list_value { Compare::In } else { Compare::Eq };
        };

        match raw.trim().to_uppercase().as_str() {
            "!=" => Compare::NotEq,
            ">" => Compare::Gt,
            ">=" => Compare::Gte,
            "<" => Compare::Lt,
            "<=" => Compare::Lte,
            "LIKE" => Compare::Like,
            "NOT LIKE" => Compare::NotLike,
            "IN" => Compare::In,
            "NOT IN" => Compare::NotIn,
            "BETWEEN" => Compare::Between,
            "NOT BETWEEN" => Compare::NotBetween,
            "EXISTS" => Compare::Exists,
            "NOT EXISTS" => Compare::NotExists,
            "REGEXP" | "RLIKE" => Compare::Regexp,
            "NOT REGEXP" => Compare::NotRegexp,
            _ => Compare::Eq,
        }
    }

    fn is_regexp(self) -> bool {
        matches!(self, Compare::Regexp | Compare::NotRegexp)
    }
}

/// Cast applied to meta values before comparing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaType {
    Char,
    Numeric,
    Binary,
}

impl MetaType {
    fn parse(raw: Option<&Value>) -> Self {
        match raw.and_then(as_text).map(|s| s.trim().to_uppercase()).as_deref() {
            Some("NUMERIC" | "SIGNED" | "UNSIGNED" | "DECIMAL") => MetaType::Numeric,
            Some("BINARY") => MetaType::Binary,
            _ => MetaType::Char,
        }
    }
}

/// A `REGEXP` operand compiled once per query
///
/// Patterns that do not compile never match.
#[derive(Debug, Clone)]
pub struct Pattern(Option<Regex>);

impl Pattern {
    fn compile(pattern: &str, case_sensitive: bool) -> Self {
        Self(
            RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .ok(),
        )
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.as_ref().is_some_and(|re| re.is_match(haystack))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref().map(Regex::as_str) == other.0.as_ref().map(Regex::as_str)
    }
}

/// A single metadata condition
#[derive(Debug, Clone, PartialEq)]
pub struct MetaClause {
    pub key: Option<String>,
    pub compare_key: Compare,
    pub key_type: MetaType,
    pub value: Option<Value>,
    pub compare: Compare,
    pub meta_type: MetaType,
    key_pattern: Option<Pattern>,
    value_pattern: Option<Pattern>,
}

/// A tree of metadata conditions
#[derive(Debug, Clone, PartialEq)]
pub enum MetaQuery {
    Clause(MetaClause),
    Group {
        relation: Relation,
        queries: Vec<MetaQuery>,
    },
}

const CLAUSE_KEYS: &[&str] = &["key", "value", "compare", "compare_key", "type", "type_key"];

impl MetaQuery {
    /// Read the metadata conditions from the query arguments, if any
    pub fn from_args(args: &QueryArgs) -> Option<Self> {
        let primary = MetaClause::from_fields(|name| args.get(&format!("meta_{}", name)));
        let nested = args.get("meta_query").and_then(Self::from_value);

        match (primary, nested) {
            (Some(primary), Some(nested)) => Some(MetaQuery::Group {
                relation: Relation::And,
                queries: vec![MetaQuery::Clause(primary), nested],
            }),
            (Some(primary), None) => Some(MetaQuery::Clause(primary)),
            (None, nested) => nested,
        }
    }

    /// Parse a `meta_query` value (object or list of clauses)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) if is_clause(map) => {
                MetaClause::from_fields(|name| map.get(name)).map(MetaQuery::Clause)
            }
            Value::Object(map) => {
                let relation = match map.get("relation").and_then(as_text) {
                    Some(r) if r.trim().eq_ignore_ascii_case("OR") => Relation::Or,
                    _ => Relation::And,
                };
                let queries = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != "relation")
                    .filter_map(|(_, v)| Self::from_value(v))
                    .collect();
                Self::group(relation, queries)
            }
            Value::Array(items) => {
                let queries = items.iter().filter_map(Self::from_value).collect();
                Self::group(Relation::And, queries)
            }
            _ => None,
        }
    }

    fn group(relation: Relation, queries: Vec<MetaQuery>) -> Option<Self> {
        if queries.is_empty() {
            None
        } else {
            Some(MetaQuery::Group { relation, queries })
        }
    }

    /// Whether a user satisfies the conditions
    pub fn matches(&self, user: &UserRecord) -> bool {
        match self {
            MetaQuery::Clause(clause) => clause.matches(user),
            MetaQuery::Group { relation, queries } => match relation {
                Relation::And => queries.iter().all(|q| q.matches(user)),
                Relation::Or => queries.iter().any(|q| q.matches(user)),
            },
        }
    }
}

fn is_clause(map: &Map<String, Value>) -> bool {
    CLAUSE_KEYS.iter().any(|k| map.contains_key(*k))
}

impl MetaClause {
    fn from_fields<'a>(get: impl Fn(&str) -> Option<&'a Value>) -> Option<Self> {
        let key = get("key").and_then(as_text).filter(|k| !k.is_empty());
        let value = get("value").filter(|v| !v.is_null()).cloned();

        if key.is_none() && value.is_none() {
            return None;
        }

        let has_list_value = value.as_ref().is_some_and(Value::is_array);
        let compare_key = Compare::parse(get("compare_key"), false);
        let key_type = MetaType::parse(get("type_key"));
        let compare = Compare::parse(get("compare"), has_list_value);
        let meta_type = MetaType::parse(get("type"));

        let key_pattern = key
            .as_deref()
            .filter(|_| compare_key.is_regexp())
            .map(|k| Pattern::compile(k, key_type == MetaType::Binary));
        let value_pattern = value
            .as_ref()
            .filter(|_| compare.is_regexp())
            .map(|v| {
                let pattern = as_text(v).unwrap_or_default();
                Pattern::compile(&pattern, meta_type == MetaType::Binary)
            });

        Some(Self {
            key,
            compare_key,
            key_type,
            value,
            compare,
            meta_type,
            key_pattern,
            value_pattern,
        })
    }

    /// Meta values of the entries whose key matches this clause
    fn candidates<'u>(&self, user: &'u UserRecord) -> Vec<&'u str> {
        user.meta
            .iter()
            .filter(|(k, _)| match &self.key {
                None => true,
                Some(key) => self.key_matches(k, key),
            })
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        let candidates = self.candidates(user);

        match self.compare {
            Compare::Exists => !candidates.is_empty(),
            Compare::NotExists => candidates.is_empty(),
            _ => match &self.value {
                None => !candidates.is_empty(),
                Some(expected) => candidates
                    .iter()
                    .any(|actual| self.value_matches(actual, expected)),
            },
        }
    }

    fn key_matches(&self, actual: &str, expected: &str) -> bool {
        let case_sensitive = self.key_type == MetaType::Binary;
        match self.compare_key {
            Compare::NotEq => !text_eq(actual, expected, case_sensitive),
            Compare::Like => text_contains(actual, expected, case_sensitive),
            Compare::NotLike => !text_contains(actual, expected, case_sensitive),
            Compare::In => string_list(&Value::String(expected.to_string()))
                .iter()
                .any(|k| text_eq(actual, k, case_sensitive)),
            Compare::NotIn => !string_list(&Value::String(expected.to_string()))
                .iter()
                .any(|k| text_eq(actual, k, case_sensitive)),
            Compare::Regexp => pattern_matches(self.key_pattern.as_ref(), actual),
            Compare::NotRegexp => !pattern_matches(self.key_pattern.as_ref(), actual),
            _ => text_eq(actual, expected, case_sensitive),
        }
    }

    fn value_matches(&self, actual: &str, expected: &Value) -> bool {
        let meta_type = self.meta_type;
        let case_sensitive = meta_type == MetaType::Binary;
        let expected_text = as_text(expected).unwrap_or_default();

        match self.compare {
            Compare::Eq => order(actual, &expected_text, meta_type) == Ordering::Equal,
            Compare::NotEq => order(actual, &expected_text, meta_type) != Ordering::Equal,
            Compare::Gt => order(actual, &expected_text, meta_type) == Ordering::Greater,
            Compare::Gte => order(actual, &expected_text, meta_type) != Ordering::Less,
            Compare::Lt => order(actual, &expected_text, meta_type) == Ordering::Less,
            Compare::Lte => order(actual, &expected_text, meta_type) != Ordering::Greater,
            Compare::Like => text_contains(actual, &expected_text, case_sensitive),
            Compare::NotLike => !text_contains(actual, &expected_text, case_sensitive),
            Compare::In => string_list(expected)
                .iter()
                .any(|v| order(actual, v, meta_type) == Ordering::Equal),
            Compare::NotIn => !string_list(expected)
                .iter()
                .any(|v| order(actual, v, meta_type) == Ordering::Equal),
            Compare::Between | Compare::NotBetween => {
                let bounds = string_list(expected);
                let inside = match bounds.as_slice() {
                    [low, high, ..] => {
                        order(actual, low, meta_type) != Ordering::Less
                            && order(actual, high, meta_type) != Ordering::Greater
                    }
                    _ => false,
                };
                if self.compare == Compare::Between { inside } else { !inside }
            }
            Compare::Regexp => pattern_matches(self.value_pattern.as_ref(), actual),
            Compare::NotRegexp => !pattern_matches(self.value_pattern.as_ref(), actual),
            Compare::Exists => true,
            Compare::NotExists => false,
        }
    }
}

fn pattern_matches(pattern: Option<&Pattern>, haystack: &str) -> bool {
    pattern.is_some_and(|p| p.is_match(haystack))
}

/// Compare two meta values under a cast
pub fn order(actual: &str, expected: &str, meta_type: MetaType) -> Ordering {
    match meta_type {
        MetaType::Numeric => numeric(actual).total_cmp(&numeric(expected)),
        MetaType::Binary => actual.cmp(expected),
        MetaType::Char => actual.to_lowercase().cmp(&expected.to_lowercase()),
    }
}

/// Numeric reading of a meta value; non-numeric text counts as zero
pub fn numeric(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(0.0)
}

fn text_eq(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

fn text_contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}
