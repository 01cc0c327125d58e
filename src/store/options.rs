//! Per-call options accepted by store operations.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::dedup::Deduplicator;
use super::types::StoreError;

/// Options for a single add or search call. `Default` means "no options supplied".
#[derive(Clone, Default)]
pub struct SearchOptions {
    /// Minimum similarity score accepted from the backend, validated to lie in `[0, 1]`.
    pub score_threshold: Option<f32>,
    /// Backend-native filter value; `None` matches everything.
    pub filters: Option<Value>,
    /// Overrides the store's default deduplicator for this call.
    pub deduplicator: Option<Arc<dyn Deduplicator>>,
    /// Overrides the store's collection for this call.
    pub collection: Option<String>,
}

impl SearchOptions {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return hits scoring at least `threshold`.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Restrict results with a backend-native filter.
    pub fn with_filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Drop documents for which `deduplicator` reports a duplicate before embedding.
    pub fn with_deduplicator(mut self, deduplicator: Arc<dyn Deduplicator>) -> Self {
        self.deduplicator = Some(deduplicator);
        self
    }

    /// Target a different collection than the store default.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("score_threshold", &self.score_threshold)
            .field("filters", &self.filters)
            .field("deduplicator", &self.deduplicator.is_some())
            .field("collection", &self.collection)
            .finish()
    }
}

/// Validate an optional score threshold. An unset threshold accepts every hit.
pub(crate) fn resolve_score_threshold(threshold: Option<f32>) -> Result<Option<f32>, StoreError> {
    match threshold {
        None => Ok(None),
        Some(value) if (0.0..=1.0).contains(&value) => Ok(Some(value)),
        Some(value) => Err(StoreError::InvalidScoreThreshold(value)),
    }
}

pub(crate) fn resolve_num_results(num_results: usize) -> Result<usize, StoreError> {
    if num_results == 0 {
        Err(StoreError::InvalidNumResults)
    } else {
        Ok(num_results)
    }
}
