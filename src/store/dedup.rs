//! Pluggable duplicate detection applied before documents are embedded.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use super::types::Document;

/// Predicate deciding whether a document should be dropped before embedding.
///
/// Returning `true` means "duplicate, drop it". Plain closures over `&Document` implement
/// this trait directly.
#[async_trait]
pub trait Deduplicator: Send + Sync {
    /// Report whether `document` is already represented in the store.
    async fn is_duplicate(&self, ctx: &CancellationToken, document: &Document) -> bool;

    /// Key identifying repeats inside a single batch; documents sharing a key with an earlier
    /// survivor of the same call are dropped. `None` disables the check.
    fn batch_key(&self, _document: &Document) -> Option<String> {
        None
    }

    /// Called for each written document once the backend has accepted the batch.
    async fn record(&self, _ctx: &CancellationToken, _document: &Document) {}
}

#[async_trait]
impl<F> Deduplicator for F
where
    F: Fn(&Document) -> bool + Send + Sync,
{
    async fn is_duplicate(&self, _ctx: &CancellationToken, document: &Document) -> bool {
        self(document)
    }
}

/// Keep the documents the predicate does not flag, preserving input order.
pub(crate) async fn deduplicate<'a>(
    ctx: &CancellationToken,
    deduplicator: Option<&dyn Deduplicator>,
    documents: &'a [Document],
) -> Vec<&'a Document> {
    let Some(deduplicator) = deduplicator else {
        return documents.iter().collect();
    };

    let mut batch_keys = HashSet::new();
    let mut survivors = Vec::with_capacity(documents.len());
    for document in documents {
        if deduplicator.is_duplicate(ctx, document).await {
            continue;
        }
        if let Some(key) = deduplicator.batch_key(document)
            && !batch_keys.insert(key)
        {
            continue;
        }
        survivors.push(document);
    }
    survivors
}

/// Tell the deduplicator which documents were written.
pub(crate) async fn record_written(
    ctx: &CancellationToken,
    deduplicator: Option<&dyn Deduplicator>,
    documents: &[&Document],
) {
    let Some(deduplicator) = deduplicator else {
        return;
    };
    for document in documents {
        deduplicator.record(ctx, document).await;
    }
}

/// Compute a deterministic SHA-256 hash for document text.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Flags documents whose text hash is known to be stored.
///
/// Hashes are remembered only after a successful write, so a failed add can be retried.
/// Repeats inside one batch are dropped through [`Deduplicator::batch_key`].
#[derive(Debug, Default)]
pub struct ContentHashDeduplicator {
    seen: Mutex<HashSet<String>>,
}

impl ContentHashDeduplicator {
    /// Start with no known content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the set with hashes of content already stored, e.g. from a previous scroll.
    pub fn with_known_hashes<I>(hashes: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            seen: Mutex::new(hashes.into_iter().collect()),
        }
    }

    /// Whether `text` is known to be stored.
    pub fn contains(&self, text: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&compute_content_hash(text))
    }
}

#[async_trait]
impl Deduplicator for ContentHashDeduplicator {
    async fn is_duplicate(&self, _ctx: &CancellationToken, document: &Document) -> bool {
        self.contains(&document.page_content)
    }

    fn batch_key(&self, document: &Document) -> Option<String> {
        Some(compute_content_hash(&document.page_content))
    }

    async fn record(&self, _ctx: &CancellationToken, document: &Document) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(compute_content_hash(&document.page_content));
    }
}
