//! Index service abstraction and scripted test stub.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{
    CollectionInfo, CollectionStatus, CollectionSummary, CreateCollectionRequest, DocPage,
    QueryRequest, QueryResponse, WireDoc,
};

/// The Cairn index service surface consumed by the store layer.
///
/// The HTTP implementation is [`crate::http::CairnClient`]; tests script
/// [`MockIndexApi`] instead.
#[async_trait]
pub trait IndexApi: Send + Sync {
    /// Create a collection with the given index configuration.
    async fn create_collection(&self, request: CreateCollectionRequest) -> ApiResult<()>;

    /// Fetch collection metadata, including its lifecycle status.
    async fn get_collection(&self, name: &str) -> ApiResult<CollectionInfo>;

    /// List all collections visible to the credentials.
    async fn list_collections(&self) -> ApiResult<Vec<CollectionSummary>>;

    /// Delete a collection unconditionally.
    async fn delete_collection(&self, name: &str) -> ApiResult<()>;

    /// Upsert a batch of wire documents.
    async fn upsert_docs(&self, name: &str, docs: Vec<WireDoc>) -> ApiResult<()>;

    /// Delete documents by id.
    async fn delete_docs(&self, name: &str, ids: Vec<String>) -> ApiResult<()>;

    /// Fetch one page of the collection's documents.
    async fn list_docs(
        &self,
        name: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> ApiResult<DocPage>;

    /// Run a KNN similarity query.
    async fn query(&self, name: &str, request: QueryRequest) -> ApiResult<QueryResponse>;
}

/// Scripted in-memory implementation of [`IndexApi`] for tests.
///
/// Each method pops its queue of scripted results; an empty queue yields a
/// benign default (empty listing, active collection, successful write) so
/// tests only script what they assert on. Every call is recorded for
/// inspection.
#[derive(Debug, Default)]
pub struct MockIndexApi {
    create_queue: Mutex<VecDeque<ApiResult<()>>>,
    get_queue: Mutex<VecDeque<ApiResult<CollectionInfo>>>,
    list_queue: Mutex<VecDeque<ApiResult<Vec<CollectionSummary>>>>,
    delete_collection_queue: Mutex<VecDeque<ApiResult<()>>>,
    upsert_queue: Mutex<VecDeque<ApiResult<()>>>,
    delete_docs_queue: Mutex<VecDeque<ApiResult<()>>>,
    list_docs_queue: Mutex<VecDeque<ApiResult<DocPage>>>,
    query_queue: Mutex<VecDeque<ApiResult<QueryResponse>>>,

    creates: Mutex<Vec<CreateCollectionRequest>>,
    get_calls: Mutex<Vec<String>>,
    list_calls: Mutex<Vec<()>>,
    delete_collection_calls: Mutex<Vec<String>>,
    upserts: Mutex<Vec<(String, Vec<WireDoc>)>>,
    deleted_ids: Mutex<Vec<Vec<String>>>,
    list_docs_cursors: Mutex<Vec<Option<String>>>,
    queries: Mutex<Vec<(String, QueryRequest)>>,
}

impl MockIndexApi {
    /// New stub with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `create_collection` result.
    pub fn enqueue_create(&self, result: ApiResult<()>) {
        self.create_queue
            .lock()
            .expect("mock create queue poisoned")
            .push_back(result);
    }

    /// Script the next `get_collection` result.
    pub fn enqueue_get_collection(&self, result: ApiResult<CollectionInfo>) {
        self.get_queue
            .lock()
            .expect("mock get queue poisoned")
            .push_back(result);
    }

    /// Script the next `get_collection` result as a bare status.
    pub fn enqueue_status(&self, status: CollectionStatus) {
        self.enqueue_get_collection(Ok(CollectionInfo {
            status,
            num_docs: 0,
            index_configs: serde_json::Map::new(),
        }));
    }

    /// Script the next `list_collections` result.
    pub fn enqueue_list_collections(&self, result: ApiResult<Vec<CollectionSummary>>) {
        self.list_queue
            .lock()
            .expect("mock list queue poisoned")
            .push_back(result);
    }

    /// Script the next `delete_collection` result.
    pub fn enqueue_delete_collection(&self, result: ApiResult<()>) {
        self.delete_collection_queue
            .lock()
            .expect("mock delete-collection queue poisoned")
            .push_back(result);
    }

    /// Script the next `upsert_docs` result.
    pub fn enqueue_upsert(&self, result: ApiResult<()>) {
        self.upsert_queue
            .lock()
            .expect("mock upsert queue poisoned")
            .push_back(result);
    }

    /// Script the next `delete_docs` result.
    pub fn enqueue_delete_docs(&self, result: ApiResult<()>) {
        self.delete_docs_queue
            .lock()
            .expect("mock delete-docs queue poisoned")
            .push_back(result);
    }

    /// Script the next `list_docs` page.
    pub fn enqueue_list_docs(&self, result: ApiResult<DocPage>) {
        self.list_docs_queue
            .lock()
            .expect("mock list-docs queue poisoned")
            .push_back(result);
    }

    /// Script the next `query` result.
    pub fn enqueue_query(&self, result: ApiResult<QueryResponse>) {
        self.query_queue
            .lock()
            .expect("mock query queue poisoned")
            .push_back(result);
    }

    /// Recorded `create_collection` requests.
    pub fn creates(&self) -> Vec<CreateCollectionRequest> {
        self.creates.lock().expect("mock creates poisoned").clone()
    }

    /// Number of `get_collection` calls so far.
    pub fn get_collection_calls(&self) -> usize {
        self.get_calls.lock().expect("mock get calls poisoned").len()
    }

    /// Number of `list_collections` calls so far.
    pub fn list_collections_calls(&self) -> usize {
        self.list_calls.lock().expect("mock list calls poisoned").len()
    }

    /// Recorded `delete_collection` names.
    pub fn delete_collection_calls(&self) -> Vec<String> {
        self.delete_collection_calls
            .lock()
            .expect("mock delete-collection calls poisoned")
            .clone()
    }

    /// Recorded upsert batches as `(collection, docs)` pairs.
    pub fn upserts(&self) -> Vec<(String, Vec<WireDoc>)> {
        self.upserts.lock().expect("mock upserts poisoned").clone()
    }

    /// Recorded id batches passed to `delete_docs`.
    pub fn deleted_ids(&self) -> Vec<Vec<String>> {
        self.deleted_ids
            .lock()
            .expect("mock deleted ids poisoned")
            .clone()
    }

    /// Cursors seen by `list_docs`, in call order.
    pub fn list_docs_cursors(&self) -> Vec<Option<String>> {
        self.list_docs_cursors
            .lock()
            .expect("mock list-docs cursors poisoned")
            .clone()
    }

    /// Recorded queries as `(collection, request)` pairs.
    pub fn queries(&self) -> Vec<(String, QueryRequest)> {
        self.queries.lock().expect("mock queries poisoned").clone()
    }

    fn pop<T>(queue: &Mutex<VecDeque<ApiResult<T>>>, default: impl FnOnce() -> T) -> ApiResult<T> {
        queue
            .lock()
            .expect("mock queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(default()))
    }
}

#[async_trait]
impl IndexApi for MockIndexApi {
    async fn create_collection(&self, request: CreateCollectionRequest) -> ApiResult<()> {
        self.creates
            .lock()
            .expect("mock creates poisoned")
            .push(request);
        Self::pop(&self.create_queue, || ())
    }

    async fn get_collection(&self, name: &str) -> ApiResult<CollectionInfo> {
        self.get_calls
            .lock()
            .expect("mock get calls poisoned")
            .push(name.to_string());
        Self::pop(&self.get_queue, || CollectionInfo {
            status: CollectionStatus::Active,
            num_docs: 0,
            index_configs: serde_json::Map::new(),
        })
    }

    async fn list_collections(&self) -> ApiResult<Vec<CollectionSummary>> {
        self.list_calls
            .lock()
            .expect("mock list calls poisoned")
            .push(());
        Self::pop(&self.list_queue, Vec::new)
    }

    async fn delete_collection(&self, name: &str) -> ApiResult<()> {
        self.delete_collection_calls
            .lock()
            .expect("mock delete-collection calls poisoned")
            .push(name.to_string());
        Self::pop(&self.delete_collection_queue, || ())
    }

    async fn upsert_docs(&self, name: &str, docs: Vec<WireDoc>) -> ApiResult<()> {
        self.upserts
            .lock()
            .expect("mock upserts poisoned")
            .push((name.to_string(), docs));
        Self::pop(&self.upsert_queue, || ())
    }

    async fn delete_docs(&self, name: &str, ids: Vec<String>) -> ApiResult<()> {
        let _ = name;
        self.deleted_ids
            .lock()
            .expect("mock deleted ids poisoned")
            .push(ids);
        Self::pop(&self.delete_docs_queue, || ())
    }

    async fn list_docs(
        &self,
        name: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> ApiResult<DocPage> {
        let _ = (name, limit);
        self.list_docs_cursors
            .lock()
            .expect("mock list-docs cursors poisoned")
            .push(cursor);
        Self::pop(&self.list_docs_queue, DocPage::default)
    }

    async fn query(&self, name: &str, request: QueryRequest) -> ApiResult<QueryResponse> {
        self.queries
            .lock()
            .expect("mock queries poisoned")
            .push((name.to_string(), request));
        Self::pop(&self.query_queue, QueryResponse::default)
    }
}
