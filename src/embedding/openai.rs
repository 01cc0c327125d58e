use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingClient, EmbeddingClientError, format_endpoint};

/// OpenAI-compatible embedding API client.
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedder {
    /// Create a client for the embeddings API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: &str,
        dimension: usize,
    ) -> Result<Self, EmbeddingClientError> {
        let client = Client::builder().user_agent("rustyvec/0.1").build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.into(),
            model: model.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedder {
    async fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, texts = texts.len(), "Requesting OpenAI embeddings");

        let response = self
            .client
            .post(format_endpoint(&self.base_url, "v1/embeddings"))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: texts,
                model: &self.model,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingClientError::UnexpectedStatus { status, body };
            tracing::error!(model = %self.model, error = %error, "OpenAI embedding failed");
            return Err(error);
        }

        let mut payload: EmbeddingResponse = response.json().await?;
        payload.data.sort_by_key(|entry| entry.index);
        Ok(payload
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
