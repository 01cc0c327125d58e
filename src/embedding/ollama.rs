use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingClient, EmbeddingClientError, format_endpoint};

/// Ollama embedding API client using the batch `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a client for the Ollama runtime at `base_url`.
    pub fn new(
        base_url: &str,
        model: &str,
        dimension: usize,
    ) -> Result<Self, EmbeddingClientError> {
        let client = Client::builder().user_agent("rustyvec/0.1").build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedder {
    async fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, texts = texts.len(), "Requesting Ollama embeddings");

        let response = self
            .client
            .post(format_endpoint(&self.base_url, "api/embed"))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingClientError::UnexpectedStatus { status, body };
            tracing::error!(model = %self.model, error = %error, "Ollama embedding failed");
            return Err(error);
        }

        let payload: EmbedResponse = response.json().await?;
        Ok(payload.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
