//! Qdrant vector store integration.

pub mod client;
pub mod filters;
/// Streaming helpers for Qdrant scroll pagination.
pub mod scroller;
pub mod types;

pub use client::QdrantService;
pub use filters::{FilterBuilder, match_all, native_filter};
pub use types::{QdrantError, Record, ScoredPoint};
