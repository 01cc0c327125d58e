//! Embedding client abstraction and provider adapters.

mod hashing;
mod ollama;
mod openai;

pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// HTTP layer failed before receiving a response.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected embedding response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider returned no vectors.
    #[error("Embedding provider returned no vectors")]
    EmptyResponse,
}

/// Interface implemented by embedding backends.
///
/// `embed_documents` must preserve input order. Callers verify the returned length themselves.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied text.
    async fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;

    /// Produce a single embedding vector for a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingClientError::EmptyResponse)
    }

    /// Dimensionality of the vectors this client produces.
    fn dimension(&self) -> usize;
}

/// Build an embedding client suitable for the supplied settings.
pub fn build_embedding_client(
    settings: &EmbeddingSettings,
) -> Result<Box<dyn EmbeddingClient>, EmbeddingClientError> {
    tracing::debug!(
        provider = ?settings.provider,
        model = %settings.model,
        dimension = settings.dimension,
        "Building embedding client"
    );

    let client: Box<dyn EmbeddingClient> = match settings.provider {
        EmbeddingProvider::Hash => Box::new(HashingEmbedder::new(settings.dimension)),
        EmbeddingProvider::Ollama => Box::new(OllamaEmbedder::new(
            &settings.ollama_url,
            &settings.model,
            settings.dimension,
        )?),
        EmbeddingProvider::OpenAI => {
            let api_key = settings.openai_api_key.clone().ok_or_else(|| {
                EmbeddingClientError::GenerationFailed("OpenAI API key required".to_string())
            })?;
            Box::new(OpenAiEmbedder::new(
                &settings.openai_base_url,
                api_key,
                &settings.model,
                settings.dimension,
            )?)
        }
    };

    Ok(client)
}

pub(crate) fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
