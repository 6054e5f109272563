//! Request parameters decoded from the raw query string
//!
//! Bracketed keys follow the usual form conventions:
//!
//! ```text
//! number=5                      → {"number": "5"}
//! role__in[]=Editor&role__in[]=Author
//!                               → {"role__in": ["Editor", "Author"]}
//! meta_query[0][key]=city       → {"meta_query": {"0": {"key": "city"}}}
//! ```
//!
//! Values are never coerced: everything arrives as a string, an array or an
//! object of strings. Keys nested deeper than [`MAX_NESTING_DEPTH`] brackets
//! are dropped.

use axum::http::HeaderMap;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Deepest bracket path a key may carry
pub const MAX_NESTING_DEPTH: usize = 64;

/// Query parameters of a single request, as sent by the client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParameters {
    values: IndexMap<String, Value>,
}

impl RequestParameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw query string (without the leading `?`)
    ///
    /// Decoding is lossy: invalid percent escapes and UTF-8 are replaced, never
    /// rejected.
    pub fn from_query_str(raw: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_else(|err| {
            tracing::debug!(%err, "undecodable query string ignored");
            Vec::new()
        });
        pairs.into_iter().collect()
    }

    /// Get a parameter value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over parameters in the order they first appeared
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn insert_pair(&mut self, key: &str, value: String) {
        match split_key(key) {
            KeyShape::Plain => {
                self.values.insert(key.to_string(), Value::String(value));
            }
            KeyShape::Nested(name, path) => {
                let slot = self.values.entry(name.to_string()).or_insert(Value::Null);
                insert_path(slot, &path, value);
            }
            KeyShape::TooDeep(name) => {
                tracing::debug!(param = %name, "parameter nested too deeply, dropped");
            }
        }
    }
}

impl FromIterator<(String, String)> for RequestParameters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert_pair(&key, value);
        }
        params
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RequestParameters {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

enum KeyShape<'k> {
    Plain,
    Nested(&'k str, Vec<&'k str>),
    TooDeep(&'k str),
}

/// Split `name[a][b][]` into `name` and `["a", "b", ""]`
///
/// Keys without a name or whose first bracket never closes are plain and
/// stored verbatim. Anything after the last closed bracket is dropped.
fn split_key(key: &str) -> KeyShape<'_> {
    let Some(open) = key.find('[') else {
        return KeyShape::Plain;
    };
    if open == 0 {
        return KeyShape::Plain;
    }

    let name = &key[..open];
    let mut rest = &key[open..];
    let mut path = Vec::new();

    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        if path.len() == MAX_NESTING_DEPTH {
            return KeyShape::TooDeep(name);
        }
        path.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }

    if path.is_empty() {
        KeyShape::Plain
    } else {
        KeyShape::Nested(name, path)
    }
}

fn insert_path(slot: &mut Value, path: &[&str], value: String) {
    let mut slot = slot;
    for segment in path {
        slot = if segment.is_empty() {
            append_slot(slot)
        } else {
            named_slot(slot, segment)
        };
    }
    *slot = Value::String(value);
}

/// `key[]`: push a new element
fn append_slot(slot: &mut Value) -> &mut Value {
    if !slot.is_array() && !slot.is_object() {
        *slot = Value::Array(Vec::new());
    }

    match slot {
        Value::Object(map) => {
            let next = next_index(map);
            map.entry(next.to_string()).or_insert(Value::Null)
        }
        Value::Array(items) => {
            items.push(Value::Null);
            let last = items.len() - 1;
            &mut items[last]
        }
        other => other,
    }
}

/// `key[name]`: address a named member, turning lists into maps
fn named_slot<'v>(slot: &'v mut Value, segment: &str) -> &'v mut Value {
    if let Value::Array(items) = slot {
        let map: Map<String, Value> = items
            .drain(..)
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *slot = Value::Object(map);
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }

    match slot {
        Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
        other => other,
    }
}

fn next_index(map: &Map<String, Value>) -> u64 {
    map.keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1)
}

/// An inbound request as seen by the permission hook
#[derive(Debug, Clone, Default)]
pub struct RestRequest {
    pub params: RequestParameters,
    pub headers: HeaderMap,
}

impl RestRequest {
    pub fn new(params: RequestParameters, headers: HeaderMap) -> Self {
        Self { params, headers }
    }

    /// Header value as text, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
