use std::sync::Arc;

use httpmock::{Method::POST, Method::PUT, MockServer};
use rustyvec::{
    CancellationToken, Document, SearchOptions, StoreError, VectorStore,
    embedding::HashingEmbedder,
    qdrant::FilterBuilder,
    store::BackendError,
};
use serde_json::json;

fn store_for(server: &MockServer) -> VectorStore {
    VectorStore::builder()
        .embedder(Arc::new(HashingEmbedder::new(4)))
        .collection_name("docs")
        .endpoint(server.base_url())
        .api_key("secret")
        .content_key("text")
        .build()
        .expect("store")
}

#[tokio::test]
async fn add_documents_upserts_payloads_under_content_key() {
    let server = MockServer::start_async().await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/collections/docs/points")
                .query_param("wait", "true")
                .header("api-key", "secret")
                .body_contains("\"text\":\"hello\"")
                .body_contains("\"job\":\"engineer\"");
            then.status(200).json_body(json!({
                "result": { "operation_id": 7, "status": "completed" }
            }));
        })
        .await;

    let store = store_for(&server);
    let metadata = json!({ "job": "engineer" })
        .as_object()
        .cloned()
        .expect("object");
    let ids = store
        .add_documents(
            &CancellationToken::new(),
            &[Document::new("hello").with_metadata(metadata)],
            &SearchOptions::default(),
        )
        .await
        .expect("add");

    upsert.assert();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn similarity_search_sends_match_all_and_maps_hits() {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/docs/points/query")
                .body_contains("\"filter\":{\"must\":[]}")
                .body_contains("\"limit\":3")
                .body_contains("\"with_payload\":true");
            then.status(200).json_body(json!({
                "result": [
                    { "id": "b", "score": 0.9, "payload": { "text": "second", "job": "pilot" } },
                    { "id": "a", "score": 0.4, "payload": { "text": "first" } }
                ]
            }));
        })
        .await;

    let store = store_for(&server);
    let documents = store
        .similarity_search(&CancellationToken::new(), "query", 3, &SearchOptions::default())
        .await
        .expect("search");

    query.assert();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].page_content, "second");
    assert_eq!(documents[0].metadata["job"], "pilot");
    assert!(!documents[0].metadata.contains_key("text"));
    assert_eq!(documents[0].score, Some(0.9));
    assert_eq!(documents[1].page_content, "first");
}

#[tokio::test]
async fn similarity_search_forwards_filter_and_threshold() {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/docs/points/query")
                .body_contains("\"score_threshold\":0.5")
                .body_contains("\"key\":\"job\"");
            then.status(200).json_body(json!({ "result": { "points": [] } }));
        })
        .await;

    let filter = FilterBuilder::new()
        .must_match("job", "engineer")
        .build()
        .expect("filter");
    let options = SearchOptions::new()
        .with_filters(filter)
        .with_score_threshold(0.5);

    let store = store_for(&server);
    let documents = store
        .similarity_search(&CancellationToken::new(), "query", 2, &options)
        .await
        .expect("search");

    query.assert();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn hits_without_content_are_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/collections/docs/points/query");
            then.status(200).json_body(json!({
                "result": [{ "id": "x", "score": 0.3, "payload": { "job": "pilot" } }]
            }));
        })
        .await;

    let store = store_for(&server);
    let error = store
        .similarity_search(&CancellationToken::new(), "query", 1, &SearchOptions::default())
        .await
        .expect_err("missing content");

    assert!(matches!(error, StoreError::MissingContent { ref id, .. } if id == "x"));
}

#[tokio::test]
async fn payload_search_scrolls_without_embedding() {
    let server = MockServer::start_async().await;
    let scroll = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/docs/points/scroll")
                .body_contains("\"limit\":2")
                .body_contains("\"with_vector\":false");
            then.status(200).json_body(json!({
                "result": {
                    "points": [
                        { "id": 1, "payload": { "text": "one", "n": 1 } },
                        { "id": 2, "payload": { "text": "two", "n": 2 } }
                    ],
                    "next_page_offset": 3
                }
            }));
        })
        .await;

    let store = store_for(&server);
    let documents = store
        .payload_search(&CancellationToken::new(), 2, &SearchOptions::default())
        .await
        .expect("scroll");

    scroll.assert_hits(1);
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[1].page_content, "two");
    assert_eq!(documents[1].metadata["n"], 2);
    assert!(documents[1].score.is_none());
}

#[tokio::test]
async fn qdrant_errors_surface_as_backend_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/collections/docs/points/query");
            then.status(500).body("boom");
        })
        .await;

    let store = store_for(&server);
    let error = store
        .similarity_search(&CancellationToken::new(), "query", 1, &SearchOptions::default())
        .await
        .expect_err("failure");

    assert!(matches!(error, StoreError::Backend(BackendError::Qdrant(_))));
}
