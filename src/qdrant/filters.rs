//! Filter helpers for Qdrant search and scroll requests.

use serde_json::{Map, Value, json};

/// Translate a caller-supplied filter into the value sent to Qdrant.
///
/// Filters pass through untouched; an absent filter becomes the match-all `{"must": []}`.
pub fn native_filter(filter: Option<&Value>) -> Value {
    match filter {
        Some(value) => value.clone(),
        None => match_all(),
    }
}

/// Qdrant filter matching every point.
pub fn match_all() -> Value {
    json!({ "must": [] })
}

/// Incrementally compose a Qdrant `must` filter over payload fields.
///
/// Blank keys and values are ignored, so optional caller input can be fed in directly.
#[derive(Debug, Default, Clone)]
pub struct FilterBuilder {
    must: Vec<Value>,
}

impl FilterBuilder {
    /// Start an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact match on `key`.
    pub fn must_match(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if let Some(key) = non_empty(key)
            && !is_blank(&value)
        {
            self.must.push(json!({
                "key": key,
                "match": { "value": value }
            }));
        }
        self
    }

    /// Require `key` to match any of `values`.
    pub fn must_match_any<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned: Vec<String> = values
            .into_iter()
            .filter_map(|value| non_empty(value.as_ref()).map(str::to_string))
            .collect();
        if let Some(key) = non_empty(key)
            && !cleaned.is_empty()
        {
            self.must.push(json!({
                "key": key,
                "match": { "any": cleaned }
            }));
        }
        self
    }

    /// Require `key` to fall inside an inclusive range. Open ends are omitted.
    pub fn must_range(mut self, key: &str, gte: Option<Value>, lte: Option<Value>) -> Self {
        let mut boundaries = Map::new();
        if let Some(start) = gte.filter(|value| !is_blank(value)) {
            boundaries.insert("gte".into(), start);
        }
        if let Some(end) = lte.filter(|value| !is_blank(value)) {
            boundaries.insert("lte".into(), end);
        }
        if let Some(key) = non_empty(key)
            && !boundaries.is_empty()
        {
            self.must.push(json!({
                "key": key,
                "range": Value::Object(boundaries)
            }));
        }
        self
    }

    /// Finish the filter, returning `None` when no condition was added.
    pub fn build(self) -> Option<Value> {
        if self.must.is_empty() {
            None
        } else {
            Some(json!({ "must": self.must }))
        }
    }
}

fn non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
