//! Documents and error definitions for the vector store pipeline.

use crate::{embedding::EmbeddingClientError, qdrant::QdrantError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A unit of text plus arbitrary metadata handled by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Raw text that gets embedded and stored under the content key.
    pub page_content: String,
    /// Caller-defined metadata persisted alongside the text.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Similarity score reported by the backend for search hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            ..Self::default()
        }
    }

    /// Attach metadata to the document.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Errors surfaced by a [`crate::store::VectorBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// Qdrant rejected or failed the request.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] QdrantError),
    /// Any other backend failure.
    #[error("Backend request failed: {0}")]
    Other(String),
}

/// Errors emitted by [`crate::store::VectorStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store construction received missing or invalid parameters.
    #[error("Invalid store configuration: {0}")]
    Configuration(String),
    /// Score threshold fell outside `[0, 1]`.
    #[error("Score threshold must be between 0 and 1, got {0}")]
    InvalidScoreThreshold(f32),
    /// Search requested zero results.
    #[error("Number of results must be greater than zero")]
    InvalidNumResults,
    /// Embedding provider returned a different number of vectors than documents submitted.
    #[error("Number of vectors from embedder ({actual}) does not match number of documents ({expected})")]
    LengthMismatch {
        /// Documents submitted for embedding.
        expected: usize,
        /// Vectors returned by the provider.
        actual: usize,
    },
    /// Embedding provider failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Backend RPC failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A stored record has no text under the configured content key.
    #[error("Point {id} has no text under content key '{content_key}'")]
    MissingContent {
        /// Backend identifier of the offending point.
        id: String,
        /// Content key that was expected in the payload.
        content_key: String,
    },
    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}
