//! Document store pipeline: deduplication, embedding, payload assembly, and retrieval.

pub mod backend;
pub mod dedup;
pub mod options;
pub mod payload;
mod service;
pub mod types;

pub use backend::VectorBackend;
pub use dedup::{ContentHashDeduplicator, Deduplicator, compute_content_hash};
pub use options::SearchOptions;
pub use payload::{build_payload, payload_into_document};
pub use service::{VectorStore, VectorStoreBuilder};
pub use types::{BackendError, Document, StoreError};

/// Payload field used for document text when none is configured.
pub const DEFAULT_CONTENT_KEY: &str = "content";
