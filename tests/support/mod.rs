//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use rustyvec::{
    embedding::{EmbeddingClient, EmbeddingClientError, HashingEmbedder},
    qdrant::{Record, ScoredPoint, match_all},
    store::{BackendError, VectorBackend, VectorStore},
};
use serde_json::{Map, Value};

/// Embedding client wrapper that counts calls and can misbehave on demand.
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    pub document_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub drop_last_vector: bool,
    pub hang: bool,
    pub fail_with: Option<String>,
}

impl CountingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            document_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            drop_last_vector: false,
            hang: false,
            fail_with: None,
        }
    }

    pub fn failing(dimension: usize, message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(dimension)
        }
    }

    pub fn dropping_last_vector(dimension: usize) -> Self {
        Self {
            drop_last_vector: true,
            ..Self::new(dimension)
        }
    }

    pub fn hanging(dimension: usize) -> Self {
        Self {
            hang: true,
            ..Self::new(dimension)
        }
    }

    fn check_failure(&self) -> Result<(), EmbeddingClientError> {
        match &self.fail_with {
            Some(message) => Err(EmbeddingClientError::GenerationFailed(message.clone())),
            None => Ok(()),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst) + self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for CountingEmbedder {
    async fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.check_failure()?;
        let mut vectors = self.inner.embed_documents(texts).await?;
        if self.drop_last_vector {
            vectors.pop();
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.check_failure()?;
        self.inner.embed_query(text).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

/// Point kept by [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: String,
    pub collection: String,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

/// Backend keeping points in memory and recording every request it receives.
#[derive(Default)]
pub struct MemoryBackend {
    pub points: Mutex<Vec<StoredPoint>>,
    pub upserts: AtomicUsize,
    pub searches: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub last_filter: Mutex<Option<Value>>,
    pub last_threshold: Mutex<Option<f32>>,
    pub fail_with: Option<String>,
}

impl MemoryBackend {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<StoredPoint> {
        self.points.lock().expect("points").clone()
    }

    pub fn last_filter(&self) -> Option<Value> {
        self.last_filter.lock().expect("filter").clone()
    }

    pub fn last_threshold(&self) -> Option<f32> {
        *self.last_threshold.lock().expect("threshold")
    }

    pub fn total_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
            + self.searches.load(Ordering::SeqCst)
            + self.scrolls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        match &self.fail_with {
            Some(message) => Err(BackendError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorBackend for MemoryBackend {
    async fn upsert_points(
        &self,
        collection: &str,
        vectors: Vec<Vec<f32>>,
        payloads: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>, BackendError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        assert_eq!(vectors.len(), payloads.len(), "vectors and payloads differ");

        let mut points = self.points.lock().expect("points");
        let mut ids = Vec::with_capacity(vectors.len());
        for (vector, payload) in vectors.into_iter().zip(payloads) {
            let id = format!("point-{}", points.len());
            ids.push(id.clone());
            points.push(StoredPoint {
                id,
                collection: collection.to_string(),
                vector,
                payload,
            });
        }
        Ok(ids)
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
        filter: Value,
    ) -> Result<Vec<ScoredPoint>, BackendError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().expect("filter") = Some(filter);
        *self.last_threshold.lock().expect("threshold") = score_threshold;
        self.check_failure()?;

        let points = self.points.lock().expect("points");
        let mut hits: Vec<ScoredPoint> = points
            .iter()
            .filter(|point| point.collection == collection)
            .map(|point| ScoredPoint {
                id: point.id.clone(),
                score: cosine(&vector, &point.vector),
                payload: Some(point.payload.clone()),
            })
            .filter(|hit| score_threshold.is_none_or(|threshold| hit.score >= threshold))
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        filter: Value,
    ) -> Result<Vec<Record>, BackendError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().expect("filter") = Some(filter);
        self.check_failure()?;

        let points = self.points.lock().expect("points");
        Ok(points
            .iter()
            .filter(|point| point.collection == collection)
            .take(limit)
            .map(|point| Record {
                id: point.id.clone(),
                payload: point.payload.clone(),
            })
            .collect())
    }

    fn native_filter(&self, filters: Option<&Value>) -> Value {
        filters.cloned().unwrap_or_else(match_all)
    }
}

/// Store wired to the supplied fakes.
pub fn store_with(embedder: Arc<CountingEmbedder>, backend: Arc<MemoryBackend>) -> VectorStore {
    VectorStore::builder()
        .embedder(embedder)
        .backend(backend)
        .collection_name("docs")
        .build()
        .expect("store")
}
