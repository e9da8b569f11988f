//! Query-string construction for GET requests
//!
//! Parameters are kept in insertion order. Keys whose value is absent are
//! dropped when the query string is written, so callers can pass optional
//! filters straight through.

use crate::error::{ApiError, ApiResult};
use reqwest::Url;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Ordered query parameters with optional values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryParams {
    /// Create an empty parameter list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    #[must_use]
    pub fn insert(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), Some(value.to_string())));
        self
    }

    /// Add a parameter that is dropped from the query string when `None`
    #[must_use]
    pub fn insert_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.pairs
            .push((key.into(), value.map(|v| v.to_string())));
        self
    }

    /// Flatten any serializable struct, map or list of `(key, value)` pairs
    ///
    /// `null` values become absent parameters, strings are kept verbatim,
    /// numbers and booleans are stringified, arrays are joined with `,` and
    /// nested objects are written as JSON text. Pair lists (including a
    /// serialized `QueryParams`) keep repeated keys.
    pub fn from_serialize<Q: Serialize + ?Sized>(params: &Q) -> ApiResult<Self> {
        match serde_json::to_value(params)? {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key, stringify(value)))
                .collect()),
            Value::Array(items) => items.into_iter().map(pair).collect(),
            Value::Null => Ok(Self::new()),
            other => Err(ApiError::InvalidQuery(format!(
                "expected a map of parameters, got {other}"
            ))),
        }
    }

    /// Pairs that will be written, in order
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (key.as_str(), value)))
    }

    /// Whether no parameter would be written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// Append the present parameters to `url`, keeping any existing query
    pub fn append_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.present());
    }
}

impl FromIterator<(String, Option<String>)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Serialized as `[[key, value], ...]` so repeated keys survive
impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.pairs)
    }
}

fn pair(item: Value) -> ApiResult<(String, Option<String>)> {
    if let Value::Array(parts) = &item {
        if let [Value::String(key), value] = parts.as_slice() {
            return Ok((key.clone(), stringify(value.clone())));
        }
    }
    Err(ApiError::InvalidQuery(format!(
        "expected a [key, value] pair, got {item}"
    )))
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| stringify(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
