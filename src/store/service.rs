//! Vector store coordinating deduplication, embedding, and backend writes and reads.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    embedding::{EmbeddingClient, build_embedding_client},
    qdrant::QdrantService,
    store::{
        DEFAULT_CONTENT_KEY,
        backend::VectorBackend,
        dedup::{Deduplicator, deduplicate, record_written},
        options::{SearchOptions, resolve_num_results, resolve_score_threshold},
        payload::{build_payload, payload_into_document},
        types::{Document, StoreError},
    },
};

/// Stores and retrieves documents through an embedding client and a vector backend.
///
/// Configuration is fixed at construction, so one instance can be shared behind an `Arc` by any
/// number of concurrent callers. Every operation takes a [`CancellationToken`]; cancelling it
/// aborts the in-flight embedding or backend call and yields [`StoreError::Cancelled`].
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingClient>,
    backend: Arc<dyn VectorBackend>,
    deduplicator: Option<Arc<dyn Deduplicator>>,
    collection_name: String,
    content_key: String,
}

/// Construction-time parameters for a [`VectorStore`].
#[derive(Default)]
pub struct VectorStoreBuilder {
    embedder: Option<Arc<dyn EmbeddingClient>>,
    backend: Option<Arc<dyn VectorBackend>>,
    deduplicator: Option<Arc<dyn Deduplicator>>,
    collection_name: Option<String>,
    endpoint: Option<String>,
    api_key: Option<String>,
    content_key: Option<String>,
}

impl VectorStoreBuilder {
    /// Embedding client used for documents and queries. Required.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Collection holding the points. Required.
    pub fn collection_name(mut self, collection_name: impl Into<String>) -> Self {
        self.collection_name = Some(collection_name.into());
        self
    }

    /// Qdrant base URL. Required unless a custom backend is supplied.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// API key sent to Qdrant.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Payload field holding document text. Defaults to [`DEFAULT_CONTENT_KEY`].
    pub fn content_key(mut self, content_key: impl Into<String>) -> Self {
        self.content_key = Some(content_key.into());
        self
    }

    /// Use a custom backend instead of the Qdrant HTTP client.
    pub fn backend(mut self, backend: Arc<dyn VectorBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Deduplicator applied to every add unless a call overrides it.
    pub fn deduplicator(mut self, deduplicator: Arc<dyn Deduplicator>) -> Self {
        self.deduplicator = Some(deduplicator);
        self
    }

    /// Validate the parameters and assemble the store.
    pub fn build(self) -> Result<VectorStore, StoreError> {
        let embedder = self.embedder.ok_or_else(|| {
            StoreError::Configuration("an embedding client is required".to_string())
        })?;

        let collection_name = self
            .collection_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::Configuration("collection name is required".to_string()))?;

        let content_key = match self.content_key {
            None => DEFAULT_CONTENT_KEY.to_string(),
            Some(key) if key.trim().is_empty() => {
                return Err(StoreError::Configuration(
                    "content key must not be blank".to_string(),
                ));
            }
            Some(key) => key,
        };

        let backend: Arc<dyn VectorBackend> = match (self.backend, self.endpoint) {
            (Some(backend), _) => backend,
            (None, Some(endpoint)) => {
                let api_key = self.api_key.filter(|key| !key.trim().is_empty());
                let service = QdrantService::new(&endpoint, api_key)
                    .map_err(|error| StoreError::Configuration(error.to_string()))?;
                Arc::new(service)
            }
            (None, None) => {
                return Err(StoreError::Configuration(
                    "a backend endpoint is required".to_string(),
                ));
            }
        };

        tracing::debug!(
            collection = %collection_name,
            content_key = %content_key,
            dimension = embedder.dimension(),
            has_deduplicator = self.deduplicator.is_some(),
            "Vector store ready"
        );

        Ok(VectorStore {
            embedder,
            backend,
            deduplicator: self.deduplicator,
            collection_name,
            content_key,
        })
    }
}

impl VectorStore {
    /// Start configuring a store.
    pub fn builder() -> VectorStoreBuilder {
        VectorStoreBuilder::default()
    }

    /// Build a Qdrant-backed store from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let embedder = build_embedding_client(&config.embedding)
            .map_err(|error| StoreError::Configuration(error.to_string()))?;

        let mut builder = Self::builder()
            .embedder(Arc::from(embedder))
            .collection_name(&config.qdrant_collection_name)
            .endpoint(&config.qdrant_url)
            .content_key(&config.content_key);
        if let Some(api_key) = &config.qdrant_api_key {
            builder = builder.api_key(api_key);
        }
        builder.build()
    }

    /// Collection targeted when a call does not override it.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Payload field holding document text.
    pub fn content_key(&self) -> &str {
        &self.content_key
    }

    /// Embedding client shared by all calls.
    pub fn embedder(&self) -> &dyn EmbeddingClient {
        self.embedder.as_ref()
    }

    /// Deduplicate, embed, and upsert documents, returning the backend identifiers.
    ///
    /// A batch in which every document is a duplicate succeeds with no identifiers and makes no
    /// embedding or backend call.
    pub async fn add_documents(
        &self,
        ctx: &CancellationToken,
        documents: &[Document],
        options: &SearchOptions,
    ) -> Result<Vec<String>, StoreError> {
        ensure_active(ctx)?;
        let collection = self.collection_for(options);

        let deduplicator = options
            .deduplicator
            .as_deref()
            .or(self.deduplicator.as_deref());
        let survivors = deduplicate(ctx, deduplicator, documents).await;
        let skipped_duplicates = documents.len() - survivors.len();

        if survivors.is_empty() {
            tracing::debug!(
                collection,
                skipped_duplicates,
                "No documents left to add"
            );
            return Ok(Vec::new());
        }

        let texts: Vec<String> = survivors
            .iter()
            .map(|document| document.page_content.clone())
            .collect();

        let vectors = cancellable(ctx, self.embedder.embed_documents(&texts)).await?;
        if vectors.len() != survivors.len() {
            let error = StoreError::LengthMismatch {
                expected: survivors.len(),
                actual: vectors.len(),
            };
            tracing::error!(collection, error = %error, "Embedding count mismatch");
            return Err(error);
        }

        let payloads = survivors
            .iter()
            .zip(&texts)
            .map(|(document, text)| build_payload(&document.metadata, &self.content_key, text))
            .collect();

        let ids = cancellable(
            ctx,
            self.backend.upsert_points(collection, vectors, payloads),
        )
        .await?;
        record_written(ctx, deduplicator, &survivors).await;

        tracing::info!(
            collection,
            documents = ids.len(),
            skipped_duplicates,
            "Documents added"
        );
        Ok(ids)
    }

    /// Embed `query` and return up to `num_results` nearest documents, best match first.
    pub async fn similarity_search(
        &self,
        ctx: &CancellationToken,
        query: &str,
        num_results: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>, StoreError> {
        ensure_active(ctx)?;
        let collection = self.collection_for(options);
        let filter = self.backend.native_filter(options.filters.as_ref());
        let score_threshold = resolve_score_threshold(options.score_threshold)?;
        let limit = resolve_num_results(num_results)?;

        let vector = cancellable(ctx, self.embedder.embed_query(query)).await?;
        let hits = cancellable(
            ctx,
            self.backend
                .search_points(collection, vector, limit, score_threshold, filter),
        )
        .await?;

        tracing::debug!(
            collection,
            limit,
            score_threshold = ?score_threshold,
            hits = hits.len(),
            "Similarity search complete"
        );

        hits.into_iter()
            .map(|hit| {
                payload_into_document(
                    &hit.id,
                    hit.payload.unwrap_or_default(),
                    &self.content_key,
                    Some(hit.score),
                )
            })
            .collect()
    }

    /// Return up to `num_results` documents matching the filter, without a similarity query.
    pub async fn payload_search(
        &self,
        ctx: &CancellationToken,
        num_results: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>, StoreError> {
        ensure_active(ctx)?;
        let collection = self.collection_for(options);
        let filter = self.backend.native_filter(options.filters.as_ref());
        let limit = resolve_num_results(num_results)?;

        let records = cancellable(ctx, self.backend.scroll(collection, limit, filter)).await?;

        tracing::debug!(
            collection,
            limit,
            records = records.len(),
            "Payload search complete"
        );

        records
            .into_iter()
            .map(|record| payload_into_document(&record.id, record.payload, &self.content_key, None))
            .collect()
    }

    /// Collection a call with `options` targets: a non-blank override, else the store default.
    pub fn collection_for<'a>(&'a self, options: &'a SearchOptions) -> &'a str {
        options
            .collection
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.collection_name)
    }
}

fn ensure_active(ctx: &CancellationToken) -> Result<(), StoreError> {
    if ctx.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        Ok(())
    }
}

/// Race an external call against cancellation.
async fn cancellable<T, E, F>(ctx: &CancellationToken, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, E>>,
    StoreError: From<E>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(StoreError::Cancelled),
        result = operation => result.map_err(StoreError::from),
    }
}
