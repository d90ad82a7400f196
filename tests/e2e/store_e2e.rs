//! End-to-end store flow against a mocked Cairn HTTP service.
//!
//! Exercises the real HTTP client, retry layer, and store façade together;
//! only the service itself and the embedding model are stubbed.

use std::sync::Arc;
use std::time::Duration;

use cairn_client::RetryPolicy;
use cairn_store::{CairnStore, DeleteSelector, Document, MockEmbedder, SearchFilter, StoreConfig};
use httpmock::prelude::*;
use serde_json::json;

fn test_config(server: &MockServer) -> StoreConfig {
    StoreConfig::new("test-api-key", "notes", 3)
        .with_base_url(server.base_url())
        .with_retry_policy(
            RetryPolicy::new(3)
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5)),
        )
        .with_poll_interval(Duration::from_millis(5))
        .with_wait_timeout(Duration::from_millis(500))
}

#[tokio::test]
async fn add_documents_end_to_end_with_mock_service() {
    let server = MockServer::start();

    let list_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/collections")
            .header("authorization", "Bearer test-api-key");
        then.status(200)
            .json_body(json!({"collections": [{"name": "notes", "status": "ACTIVE"}]}));
    });

    let upsert_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/collections/notes/docs");
        then.status(200).json_body(json!({}));
    });

    let embedder = Arc::new(MockEmbedder::new());
    embedder.enqueue_documents(Ok(vec![vec![0.1, 0.2, 0.3]]));

    let store = CairnStore::connect(test_config(&server), embedder)
        .await
        .expect("store should connect");

    let docs = vec![Document::new("hello").with_field("source", json!("x"))];
    let ids = store.add_documents(&docs).await.expect("add should succeed");

    list_mock.assert();
    upsert_mock.assert();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn similarity_search_end_to_end_with_mock_service() {
    let server = MockServer::start();

    let query_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/collections/notes/query")
            .header("authorization", "Bearer test-api-key");
        then.status(200).json_body(json!({
            "docs": [
                {"doc": {"id": "a", "text": "alpha", "source": "x"}, "score": 0.9},
                {"doc": {"id": "b", "text": "beta", "source": "y"}, "score": 0.4}
            ]
        }));
    });

    let embedder = Arc::new(MockEmbedder::new());
    embedder.enqueue_query(Ok(vec![1.0, 0.0, 0.0]));

    let store = CairnStore::connect(test_config(&server), embedder)
        .await
        .expect("store should connect");

    let results = store
        .similarity_search_with_score("query text", 2, None)
        .await
        .expect("search should succeed");

    query_mock.assert();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.content, "alpha");
    assert_eq!(results[0].1, 0.9);
    assert_eq!(results[0].0.metadata.get("source"), Some(&json!("x")));
}

#[tokio::test]
async fn transient_failures_are_retried_end_to_end() {
    let server = MockServer::start();

    let failure_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/collections/notes/query");
        then.status(503).body("unavailable");
    });

    let embedder = Arc::new(MockEmbedder::new());
    embedder.enqueue_query(Ok(vec![1.0, 0.0, 0.0]));

    let store = CairnStore::connect(test_config(&server), embedder)
        .await
        .expect("store should connect");

    let err = store
        .similarity_search("query text", 2, None)
        .await
        .expect_err("all attempts hit the failing mock");

    failure_mock.assert_hits(3);
    assert!(matches!(err, cairn_store::StoreError::Connection(_)));
}

#[tokio::test]
async fn filtered_deletion_scans_pages_end_to_end() {
    let server = MockServer::start();

    let first_page = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/collections/notes/docs/list")
            .json_body(json!({"limit": 100}));
        then.status(200).json_body(json!({
            "docs": [
                {"id": "a", "text": "a", "source": "x"},
                {"id": "b", "text": "b", "source": "y"}
            ],
            "nextCursor": "p2"
        }));
    });

    let second_page = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/collections/notes/docs/list")
            .json_body(json!({"cursor": "p2", "limit": 100}));
        then.status(200).json_body(json!({
            "docs": [{"id": "c", "text": "c", "source": "x"}]
        }));
    });

    let delete_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/collections/notes/docs/delete")
            .json_body(json!({"ids": ["a", "c"]}));
        then.status(200).json_body(json!({}));
    });

    let embedder = Arc::new(MockEmbedder::new());
    let store = CairnStore::connect(test_config(&server), embedder)
        .await
        .expect("store should connect");

    let filter = SearchFilter::predicate(|doc| doc.metadata.get("source") == Some(&json!("x")));
    store
        .delete_documents(DeleteSelector::ByFilter(filter))
        .await
        .expect("deletion should succeed");

    first_page.assert();
    second_page.assert();
    delete_mock.assert();
}
