use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::store::DEFAULT_CONTENT_KEY;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for a Rusty Vectors store.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for document storage.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Payload field holding the original document text.
    pub content_key: String,
    /// Settings for the embedding provider.
    pub embedding: EmbeddingSettings,
}

/// Embedding provider selection and connection details.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    /// Embedding provider used to generate vector representations.
    pub provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub model: String,
    /// Dimensionality of the produced vectors.
    pub dimension: usize,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// API key for the OpenAI embeddings API.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible embeddings API.
    pub openai_base_url: String,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI embeddings API.
    OpenAI,
    /// Deterministic offline hashing embedder.
    Hash,
}

impl Config {
    /// Read `.env` when present, then load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        tracing::debug!(
            qdrant_url = %config.qdrant_url,
            collection = %config.qdrant_collection_name,
            content_key = %config.content_key,
            embedding_provider = ?config.embedding.provider,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            optional(&lookup, key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
        };

        let provider: EmbeddingProvider = required("EMBEDDING_PROVIDER")?
            .parse()
            .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?;

        let model = match provider {
            EmbeddingProvider::Hash => {
                optional(&lookup, "EMBEDDING_MODEL").unwrap_or_else(|| "hash".to_string())
            }
            _ => required("EMBEDDING_MODEL")?,
        };

        let dimension: usize = required("EMBEDDING_DIMENSION")?
            .parse()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?;

        let openai_api_key = optional(&lookup, "OPENAI_API_KEY");
        if provider == EmbeddingProvider::OpenAI && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
        }

        Ok(Self {
            qdrant_url: required("QDRANT_URL")?,
            qdrant_collection_name: required("QDRANT_COLLECTION_NAME")?,
            qdrant_api_key: optional(&lookup, "QDRANT_API_KEY"),
            content_key: optional(&lookup, "QDRANT_CONTENT_KEY")
                .unwrap_or_else(|| DEFAULT_CONTENT_KEY.to_string()),
            embedding: EmbeddingSettings {
                provider,
                model,
                dimension,
                ollama_url: optional(&lookup, "OLLAMA_URL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                openai_api_key,
                openai_base_url: optional(&lookup, "OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "hash" => Ok(Self::Hash),
            _ => Err(()),
        }
    }
}
