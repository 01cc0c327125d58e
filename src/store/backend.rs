//! Backend seam between the store pipeline and a concrete vector database.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::types::BackendError;
use crate::qdrant::{self, QdrantService, Record, ScoredPoint};

/// Remote index operations the store relies on.
///
/// Implementations own their filter grammar: `native_filter` turns the caller's opaque filter
/// into the value passed to `search_points` and `scroll`, and must map `None` to a match-all.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Store one point per vector/payload pair and return the assigned identifiers in order.
    async fn upsert_points(
        &self,
        collection: &str,
        vectors: Vec<Vec<f32>>,
        payloads: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>, BackendError>;

    /// Return up to `limit` points nearest to `vector`, best match first.
    async fn search_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
        filter: Value,
    ) -> Result<Vec<ScoredPoint>, BackendError>;

    /// Enumerate up to `limit` payload records matching `filter`.
    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        filter: Value,
    ) -> Result<Vec<Record>, BackendError>;

    /// Translate a caller-supplied filter into the backend's native representation.
    fn native_filter(&self, filters: Option<&Value>) -> Value;
}

#[async_trait]
impl VectorBackend for QdrantService {
    async fn upsert_points(
        &self,
        collection: &str,
        vectors: Vec<Vec<f32>>,
        payloads: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>, BackendError> {
        Ok(QdrantService::upsert_points(self, collection, vectors, payloads).await?)
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
        filter: Value,
    ) -> Result<Vec<ScoredPoint>, BackendError> {
        Ok(
            QdrantService::search_points(self, collection, vector, limit, score_threshold, filter)
                .await?,
        )
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        filter: Value,
    ) -> Result<Vec<Record>, BackendError> {
        Ok(QdrantService::scroll(self, collection, limit, filter).await?)
    }

    fn native_filter(&self, filters: Option<&Value>) -> Value {
        qdrant::native_filter(filters)
    }
}
