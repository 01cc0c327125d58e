//! Streaming helpers for iterating Qdrant scroll endpoints without manual loops.

use async_stream::try_stream;
use futures_core::Stream;
use reqwest::Method;
use serde_json::{Value, json};

use super::client::{QdrantService, stringify_point_id};
use super::types::{QdrantError, Record, ScrollResponse};

const MAX_SCROLL_PAGE: usize = 512;

/// Stream up to `limit` payload records from a collection using the scroll API.
///
/// Pages are requested lazily and never ask for more points than are still needed.
pub fn stream_records<'a>(
    service: &'a QdrantService,
    collection: &'a str,
    filter: Value,
    limit: usize,
) -> impl Stream<Item = Result<Record, QdrantError>> + 'a {
    try_stream! {
        let mut offset: Option<Value> = None;
        let mut remaining = limit;

        while remaining > 0 {
            let body = json!({
                "with_payload": true,
                "with_vector": false,
                "limit": remaining.min(MAX_SCROLL_PAGE),
                "filter": filter.clone(),
                "offset": offset.clone().unwrap_or(Value::Null),
            });

            let response = service
                .request(Method::POST, &format!("collections/{collection}/points/scroll"))
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let ScrollResponse { result } = response.json().await?;
                if result.points.is_empty() {
                    break;
                }

                for point in result.points {
                    if remaining == 0 {
                        break;
                    }
                    remaining -= 1;
                    yield Record {
                        id: point.id.map(stringify_point_id).unwrap_or_default(),
                        payload: point.payload.unwrap_or_default(),
                    };
                }

                match result.next_page_offset {
                    Some(next) => offset = Some(next),
                    None => break,
                }
            } else {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(collection = collection, status = %status, "Failed to scroll payloads");
                Err(QdrantError::UnexpectedStatus { status, body })?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{pin_mut, stream::StreamExt};
    use httpmock::{Method::POST, MockServer};

    fn service_for(server: &MockServer) -> QdrantService {
        QdrantService::new(&server.base_url(), None).expect("client")
    }

    #[tokio::test]
    async fn stream_records_collects_multiple_pages() {
        let server = MockServer::start_async().await;
        let service = service_for(&server);

        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/demo/points/scroll")
                    .body_contains("\"offset\":null")
                    .body_contains("\"limit\":5");
                then.status(200).json_body(json!({
                    "result": {
                        "points": [
                            { "id": "a", "payload": { "value": 1 } }
                        ],
                        "next_page_offset": "b"
                    }
                }));
            })
            .await;

        let second = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/demo/points/scroll")
                    .body_contains("\"offset\":\"b\"")
                    .body_contains("\"limit\":4");
                then.status(200).json_body(json!({
                    "result": {
                        "points": [
                            { "id": "b", "payload": { "value": 2 } }
                        ],
                        "next_page_offset": null
                    }
                }));
            })
            .await;

        let stream = stream_records(&service, "demo", json!({ "must": [] }), 5);
        pin_mut!(stream);
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item.expect("record"));
        }

        first.assert();
        second.assert();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].payload.get("value").and_then(Value::as_i64), Some(1));
        assert_eq!(items[1].id, "b");
    }

    #[tokio::test]
    async fn stream_records_stops_at_limit() {
        let server = MockServer::start_async().await;
        let service = service_for(&server);

        let page = server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/demo/points/scroll");
                then.status(200).json_body(json!({
                    "result": {
                        "points": [
                            { "id": 1, "payload": { "value": 1 } },
                            { "id": 2, "payload": { "value": 2 } }
                        ],
                        "next_page_offset": 3
                    }
                }));
            })
            .await;

        let stream = stream_records(&service, "demo", json!({ "must": [] }), 2);
        pin_mut!(stream);
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item.expect("record"));
        }

        page.assert_hits(1);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "2");
    }

    #[tokio::test]
    async fn stream_records_surfaces_errors() {
        let server = MockServer::start_async().await;
        let service = service_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/demo/points/scroll");
                then.status(404).body("collection not found");
            })
            .await;

        let stream = stream_records(&service, "demo", json!({ "must": [] }), 3);
        pin_mut!(stream);
        let first = stream.next().await.expect("item");
        assert!(matches!(
            first,
            Err(QdrantError::UnexpectedStatus { .. })
        ));
    }
}
