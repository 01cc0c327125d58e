#![deny(missing_docs)]

//! Core library for Rusty Vectors: a document store over Qdrant with pluggable embeddings.

/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Qdrant vector store integration.
pub mod qdrant;
/// Document ingestion and retrieval pipeline.
pub mod store;

pub use store::{Document, SearchOptions, StoreError, VectorStore};
pub use tokio_util::sync::CancellationToken;
