//! Document store façade over the Cairn index service.

use std::fmt;
use std::sync::Arc;

use cairn_client::{
    with_retry, CairnClient, ClientConfig, CollectionInfo, IndexApi, KnnQuery, QueryClause,
    QueryRequest, QueryResponse,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::collection::CollectionManager;
use crate::config::{StoreConfig, MAX_CONTENT_LENGTH, SCAN_PAGE_SIZE, UPSERT_CHUNK_SIZE};
use crate::document::Document;
use crate::embedding::Embedder;
use crate::error::{StoreError, StoreResult};
use crate::{mmr, schema};

/// Client-side document predicate.
pub type DocPredicate = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

/// Server-side field filter or client-side predicate.
#[derive(Clone)]
pub enum SearchFilter {
    /// Passed through verbatim as the KNN query's server-side filter.
    Fields(Map<String, Value>),
    /// Evaluated client-side; honored by deletion only.
    Predicate(DocPredicate),
}

impl SearchFilter {
    /// Field filter from a JSON object.
    pub fn fields(fields: Map<String, Value>) -> Self {
        Self::Fields(fields)
    }

    /// Predicate filter from a closure.
    pub fn predicate(predicate: impl Fn(&Document) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(predicate))
    }
}

impl fmt::Debug for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Selector for [`CairnStore::delete_documents`].
#[derive(Debug, Clone)]
pub enum DeleteSelector {
    /// Delete exactly these ids.
    ByIds(Vec<String>),
    /// Scan the collection and delete matching documents.
    ByFilter(SearchFilter),
    /// Scan the collection and delete everything.
    All,
}

/// Per-document or shared metadata for [`CairnStore::from_texts`].
#[derive(Debug, Clone)]
pub enum Metadatas {
    /// One metadata object applied to every text.
    Shared(Map<String, Value>),
    /// Metadata at index `i` applies to text `i`; missing tails are empty.
    PerDocument(Vec<Map<String, Value>>),
}

impl From<Map<String, Value>> for Metadatas {
    fn from(shared: Map<String, Value>) -> Self {
        Self::Shared(shared)
    }
}

impl From<Vec<Map<String, Value>>> for Metadatas {
    fn from(per_document: Vec<Map<String, Value>>) -> Self {
        Self::PerDocument(per_document)
    }
}

/// Options for diversity-aware search.
#[derive(Debug, Clone)]
pub struct MmrOptions {
    /// Number of results to return.
    pub k: usize,
    /// Number of candidates to fetch before re-ranking.
    pub fetch_k: usize,
    /// Relevance/diversity trade-off in `[0, 1]`; 1 is pure relevance.
    pub lambda: f32,
    /// Optional filter; field filters apply server-side at fetch time.
    pub filter: Option<SearchFilter>,
}

impl MmrOptions {
    /// Options returning `k` results from 20 fetched candidates with a
    /// balanced trade-off.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            fetch_k: 20,
            lambda: 0.5,
            filter: None,
        }
    }

    /// Set the candidate pool size.
    pub fn with_fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = fetch_k;
        self
    }

    /// Set the relevance/diversity trade-off.
    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the filter applied at fetch time.
    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// The public store surface: batched writes, similarity and MMR search,
/// deletion, and collection management.
pub struct CairnStore {
    api: Arc<dyn IndexApi>,
    embedder: Arc<dyn Embedder>,
    config: StoreConfig,
    collections: CollectionManager,
}

impl std::fmt::Debug for CairnStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CairnStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CairnStore {
    /// Connect to the service with a fresh HTTP client.
    pub async fn connect(config: StoreConfig, embedder: Arc<dyn Embedder>) -> StoreResult<Self> {
        config.validate()?;
        let client = CairnClient::new(
            ClientConfig::new(config.base_url.clone(), config.api_key.clone())
                .with_timeout(config.timeout_secs),
        )?;
        Self::with_api(Arc::new(client), embedder, config).await
    }

    /// Build on an existing API handle (custom transport or test stub).
    pub async fn with_api(
        api: Arc<dyn IndexApi>,
        embedder: Arc<dyn Embedder>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        config.validate()?;
        let collections = CollectionManager::new(api.clone(), config.clone());
        let store = Self {
            api,
            embedder,
            config,
            collections,
        };

        if store.config.check_collection_on_init {
            let existing = with_retry(&store.config.retry, || store.api.list_collections()).await?;
            if !existing
                .iter()
                .any(|summary| summary.name == store.config.collection)
            {
                return Err(StoreError::CollectionMissing(store.config.collection.clone()));
            }
        }

        Ok(store)
    }

    /// Embed texts, construct documents, and add them to a new store.
    pub async fn from_texts(
        texts: Vec<String>,
        metadatas: Metadatas,
        embedder: Arc<dyn Embedder>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        Self::from_documents(zip_texts(texts, &metadatas), embedder, config).await
    }

    /// Add documents to a new store.
    pub async fn from_documents(
        documents: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let store = Self::connect(config, embedder).await?;
        store.add_documents(&documents).await?;
        Ok(store)
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The collection lifecycle manager.
    pub fn collections(&self) -> &CollectionManager {
        &self.collections
    }

    /// Embed and upsert documents; returns the generated ids.
    ///
    /// Content length is validated against the service limit before the
    /// embedding capability is invoked.
    pub async fn add_documents(&self, documents: &[Document]) -> StoreResult<Vec<String>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        for (index, document) in documents.iter().enumerate() {
            let length = document.content.chars().count();
            if length > MAX_CONTENT_LENGTH {
                return Err(StoreError::DocumentTooLarge {
                    index,
                    length,
                    limit: MAX_CONTENT_LENGTH,
                });
            }
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self
            .embedder
            .embed_documents(&texts)
            .await
            .map_err(StoreError::Embedding)?;
        self.add_vectors(&vectors, documents).await
    }

    /// Upsert pre-embedded documents; returns the generated ids.
    ///
    /// The batch is assumed homogeneous: the first vector's dimension is
    /// validated for all. Upserts go out in chunks of
    /// [`UPSERT_CHUNK_SIZE`], strictly sequentially.
    pub async fn add_vectors(
        &self,
        vectors: &[Vec<f32>],
        documents: &[Document],
    ) -> StoreResult<Vec<String>> {
        if vectors.len() != documents.len() {
            return Err(StoreError::LengthMismatch {
                vectors: vectors.len(),
                documents: documents.len(),
            });
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(first) = vectors.first() {
            schema::validate_dimension(first, self.config.dimension)?;
        }

        self.collections.ensure_exists().await?;

        let mut ids = Vec::with_capacity(documents.len());
        let mut wire_docs = Vec::with_capacity(documents.len());
        for (vector, document) in vectors.iter().zip(documents) {
            let id = schema::generate_id();
            ids.push(id.clone());
            wire_docs.push(schema::to_wire(&self.config, document, vector, Some(id)));
        }

        for chunk in wire_docs.chunks(UPSERT_CHUNK_SIZE) {
            debug!(
                collection = %self.config.collection,
                count = chunk.len(),
                "upserting document chunk"
            );
            let docs = chunk.to_vec();
            with_retry(&self.config.retry, || {
                self.api.upsert_docs(&self.config.collection, docs.clone())
            })
            .await?;
        }

        Ok(ids)
    }

    /// KNN search by vector; results carry the server's similarity score and
    /// arrive in server ranking order.
    pub async fn similarity_search_by_vector(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> StoreResult<Vec<(Document, f32)>> {
        let response = self.knn_query(query, k, filter, false).await?;
        Ok(schema::scored_documents(&self.config, &response.docs))
    }

    /// KNN search by text, discarding scores.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .similarity_search_with_score(query, k, filter)
            .await?
            .into_iter()
            .map(|(document, _)| document)
            .collect())
    }

    /// KNN search by text with scores.
    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> StoreResult<Vec<(Document, f32)>> {
        let vector = self
            .embedder
            .embed_query(query)
            .await
            .map_err(StoreError::Embedding)?;
        self.similarity_search_by_vector(&vector, k, filter).await
    }

    /// Diversity-aware search: fetch `fetch_k` candidates with their vectors,
    /// then greedily re-rank with maximal marginal relevance.
    pub async fn max_marginal_relevance_search(
        &self,
        query: &str,
        options: &MmrOptions,
    ) -> StoreResult<Vec<Document>> {
        let query_vector = self
            .embedder
            .embed_query(query)
            .await
            .map_err(StoreError::Embedding)?;
        let response = self
            .knn_query(&query_vector, options.fetch_k, options.filter.as_ref(), true)
            .await?;

        let mut documents = Vec::with_capacity(response.docs.len());
        let mut vectors = Vec::with_capacity(response.docs.len());
        for scored in &response.docs {
            match schema::wire_vector(&self.config, &scored.doc) {
                Some(vector) => {
                    vectors.push(vector);
                    documents.push(schema::from_wire(&self.config, &scored.doc));
                }
                None => warn!("search result is missing its vector; skipping for re-ranking"),
            }
        }

        let selected = mmr::select(&query_vector, &vectors, options.lambda, options.k);
        Ok(selected
            .into_iter()
            .map(|index| documents[index].clone())
            .collect())
    }

    /// Create the collection and wait until it is active.
    pub async fn create_collection(
        &self,
        extra_index_configs: Option<Map<String, Value>>,
    ) -> StoreResult<()> {
        self.collections.create(extra_index_configs).await
    }

    /// Delete the collection.
    pub async fn delete_collection(&self) -> StoreResult<()> {
        self.collections.delete().await
    }

    /// Fetch collection metadata.
    pub async fn get_collection_info(&self) -> StoreResult<CollectionInfo> {
        self.collections.info().await
    }

    /// Delete documents by id, by predicate, or wholesale.
    ///
    /// The predicate and delete-all paths scan the collection page by page;
    /// each call restarts the scan from the beginning. Field filters are not
    /// supported for deletion.
    pub async fn delete_documents(&self, selector: DeleteSelector) -> StoreResult<()> {
        match selector {
            DeleteSelector::ByIds(ids) => self.delete_ids(ids).await,
            DeleteSelector::ByFilter(SearchFilter::Fields(_)) => {
                Err(StoreError::UnsupportedFilter(
                    "field filters are not supported for deletion; use a predicate".to_string(),
                ))
            }
            DeleteSelector::ByFilter(SearchFilter::Predicate(predicate)) => {
                let ids = self.scan_matching_ids(Some(predicate.as_ref())).await?;
                self.delete_ids(ids).await
            }
            DeleteSelector::All => {
                let ids = self.scan_matching_ids(None).await?;
                self.delete_ids(ids).await
            }
        }
    }

    async fn delete_ids(&self, ids: Vec<String>) -> StoreResult<()> {
        if ids.is_empty() {
            debug!(collection = %self.config.collection, "nothing to delete");
            return Ok(());
        }
        for chunk in ids.chunks(UPSERT_CHUNK_SIZE) {
            let batch = chunk.to_vec();
            with_retry(&self.config.retry, || {
                self.api.delete_docs(&self.config.collection, batch.clone())
            })
            .await?;
        }
        Ok(())
    }

    /// Paginated scan collecting the ids of documents matching `predicate`
    /// (all documents when `None`). An empty page ends the scan.
    async fn scan_matching_ids(
        &self,
        predicate: Option<&(dyn Fn(&Document) -> bool + Send + Sync)>,
    ) -> StoreResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = with_retry(&self.config.retry, || {
                self.api
                    .list_docs(&self.config.collection, cursor.clone(), SCAN_PAGE_SIZE)
            })
            .await?;

            if page.docs.is_empty() {
                break;
            }

            for wire in &page.docs {
                let Some(id) = schema::wire_id(wire) else {
                    continue;
                };
                match predicate {
                    Some(predicate) => {
                        if predicate(&schema::from_wire(&self.config, wire)) {
                            ids.push(id.to_string());
                        }
                    }
                    None => ids.push(id.to_string()),
                }
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(ids)
    }

    async fn knn_query(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&SearchFilter>,
        include_vectors: bool,
    ) -> StoreResult<QueryResponse> {
        schema::validate_dimension(query, self.config.dimension)?;

        let server_filter = match filter {
            Some(SearchFilter::Fields(fields)) => Some(fields.clone()),
            Some(SearchFilter::Predicate(_)) => {
                warn!("predicate filters are not applied to similarity search; ignoring");
                None
            }
            None => None,
        };

        let request = QueryRequest {
            size: k,
            query: QueryClause {
                knn: KnnQuery {
                    field: self.config.vector_field.clone(),
                    query_vector: query.to_vec(),
                    k,
                    filter: server_filter,
                },
            },
            consistent_read: self.config.consistent_read,
            include_vectors,
        };

        Ok(with_retry(&self.config.retry, || {
            self.api.query(&self.config.collection, request.clone())
        })
        .await?)
    }
}

/// Pair each text with its shared or per-document metadata.
fn zip_texts(texts: Vec<String>, metadatas: &Metadatas) -> Vec<Document> {
    texts
        .into_iter()
        .enumerate()
        .map(|(index, content)| {
            let metadata = match metadatas {
                Metadatas::Shared(shared) => shared.clone(),
                Metadatas::PerDocument(list) => list.get(index).cloned().unwrap_or_default(),
            };
            Document::with_metadata(content, metadata)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cairn_client::{
        CollectionStatus, CollectionSummary, DocPage, MockIndexApi, RetryPolicy, ScoredDoc,
        TransportError, WireDoc,
    };
    use serde_json::json;

    use super::*;
    use crate::config::DEFAULT_CONSISTENT_READ;
    use crate::embedding::MockEmbedder;

    fn fast_config() -> StoreConfig {
        StoreConfig::new("key", "notes", 3)
            .with_poll_interval(Duration::from_millis(5))
            .with_wait_timeout(Duration::from_millis(200))
            .with_retry_policy(
                RetryPolicy::new(3)
                    .with_initial_delay(Duration::from_millis(1))
                    .with_max_delay(Duration::from_millis(5)),
            )
    }

    fn existing_collection(api: &MockIndexApi) {
        api.enqueue_list_collections(Ok(vec![CollectionSummary {
            name: "notes".to_string(),
            status: Some(CollectionStatus::Active),
        }]));
    }

    async fn store_with(api: Arc<MockIndexApi>, embedder: Arc<MockEmbedder>) -> CairnStore {
        CairnStore::with_api(api, embedder, fast_config())
            .await
            .unwrap()
    }

    fn wire(value: Value) -> WireDoc {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn add_documents_upserts_translated_batch() {
        let api = Arc::new(MockIndexApi::new());
        existing_collection(&api);
        let embedder = Arc::new(MockEmbedder::new());
        embedder.enqueue_documents(Ok(vec![vec![0.1, 0.2, 0.3]]));
        let store = store_with(api.clone(), embedder.clone()).await;

        let docs = vec![Document::new("hello").with_field("source", json!("x"))];
        let ids = store.add_documents(&docs).await.unwrap();
        assert_eq!(ids.len(), 1);

        let upserts = api.upserts();
        assert_eq!(upserts.len(), 1);
        let (collection, batch) = &upserts[0];
        assert_eq!(collection, "notes");
        assert_eq!(batch.len(), 1);

        let doc = &batch[0];
        assert_eq!(doc.get("text"), Some(&json!("hello")));
        assert_eq!(doc.get("source"), Some(&json!("x")));
        assert_eq!(doc.get("id").and_then(Value::as_str), Some(ids[0].as_str()));
        let vector: Vec<f64> = doc
            .get("vector")
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_eq!(vector.len(), 3);
        assert!((vector[0] - 0.1).abs() < 1e-6);
        assert!((vector[2] - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn add_documents_empty_input_is_a_noop() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder.clone()).await;

        let ids = store.add_documents(&[]).await.unwrap();
        assert!(ids.is_empty());
        assert!(embedder.document_calls().is_empty());
        assert!(api.upserts().is_empty());
        assert_eq!(api.list_collections_calls(), 0);
    }

    #[tokio::test]
    async fn oversized_document_rejected_before_embedding() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder.clone()).await;

        let docs = vec![
            Document::new("fine"),
            Document::new("a".repeat(50_001)),
        ];
        let err = store.add_documents(&docs).await.unwrap_err();
        match err {
            StoreError::DocumentTooLarge { index, length, .. } => {
                assert_eq!(index, 1);
                assert_eq!(length, 50_001);
            }
            other => panic!("expected oversized document error, got {other:?}"),
        }
        assert!(embedder.document_calls().is_empty());
        assert_eq!(api.list_collections_calls(), 0);
        assert!(api.upserts().is_empty());
    }

    #[tokio::test]
    async fn add_vectors_rejects_length_mismatch_without_network() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let err = store
            .add_vectors(
                &[vec![0.5, 0.25, 1.0], vec![0.5, 0.25, 1.0]],
                &[Document::new("only one")],
            )
            .await
            .unwrap_err();
        match err {
            StoreError::LengthMismatch { vectors, documents } => {
                assert_eq!(vectors, 2);
                assert_eq!(documents, 1);
            }
            other => panic!("expected length mismatch, got {other:?}"),
        }
        assert_eq!(api.list_collections_calls(), 0);
        assert!(api.upserts().is_empty());
    }

    #[tokio::test]
    async fn add_vectors_rejects_wrong_dimension_without_network() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let err = store
            .add_vectors(&[vec![0.5, 0.25]], &[Document::new("short vector")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidDimension {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(api.list_collections_calls(), 0);
    }

    #[tokio::test]
    async fn add_vectors_upserts_in_sequential_chunks() {
        let api = Arc::new(MockIndexApi::new());
        existing_collection(&api);
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let count = 250;
        let vectors = vec![vec![0.5, 0.25, 1.0]; count];
        let documents: Vec<Document> = (0..count)
            .map(|i| Document::new(format!("doc {i}")))
            .collect();

        let ids = store.add_vectors(&vectors, &documents).await.unwrap();
        assert_eq!(ids.len(), count);

        let upserts = api.upserts();
        assert_eq!(upserts.len(), 3);
        assert_eq!(upserts[0].1.len(), 100);
        assert_eq!(upserts[1].1.len(), 100);
        assert_eq!(upserts[2].1.len(), 50);
    }

    #[tokio::test]
    async fn upsert_failure_is_classified_after_retries() {
        let api = Arc::new(MockIndexApi::new());
        existing_collection(&api);
        for _ in 0..3 {
            api.enqueue_upsert(Err(TransportError::Status {
                status: 503,
                message: "unavailable".into(),
                retry_after: None,
            }));
        }
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let err = store
            .add_vectors(&[vec![0.5, 0.25, 1.0]], &[Document::new("doc")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
        assert_eq!(api.upserts().len(), 3);
    }

    #[tokio::test]
    async fn vector_search_preserves_server_order_and_filter() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_query(Ok(cairn_client::QueryResponse {
            docs: vec![
                ScoredDoc {
                    doc: wire(json!({"id": "b", "text": "second", "source": "x"})),
                    score: Some(0.9),
                },
                ScoredDoc {
                    doc: wire(json!({"id": "a", "text": "first", "source": "x"})),
                    score: None,
                },
            ],
        }));
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let mut fields = Map::new();
        fields.insert("source".to_string(), json!("x"));
        let filter = SearchFilter::fields(fields.clone());

        let results = store
            .similarity_search_by_vector(&[1.0, 0.0, 0.0], 2, Some(&filter))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "second");
        assert_eq!(results[0].1, 0.9);
        assert_eq!(results[1].0.content, "first");
        assert_eq!(results[1].1, 0.0);

        let queries = api.queries();
        assert_eq!(queries.len(), 1);
        let (collection, request) = &queries[0];
        assert_eq!(collection, "notes");
        assert_eq!(request.size, 2);
        assert_eq!(request.query.knn.k, 2);
        assert_eq!(request.query.knn.field, "vector");
        assert_eq!(request.query.knn.filter, Some(fields));
        assert_eq!(request.consistent_read, DEFAULT_CONSISTENT_READ);
        assert!(!request.include_vectors);
    }

    #[tokio::test]
    async fn vector_search_rejects_wrong_dimension_without_network() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let err = store
            .similarity_search_by_vector(&[1.0], 2, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDimension { .. }));
        assert!(api.queries().is_empty());
    }

    #[tokio::test]
    async fn predicate_filter_is_ignored_for_search() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_query(Ok(cairn_client::QueryResponse::default()));
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let filter = SearchFilter::predicate(|_| false);
        store
            .similarity_search_by_vector(&[1.0, 0.0, 0.0], 2, Some(&filter))
            .await
            .unwrap();

        let queries = api.queries();
        assert_eq!(queries[0].1.query.knn.filter, None);
    }

    #[tokio::test]
    async fn text_search_embeds_the_query() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_query(Ok(cairn_client::QueryResponse {
            docs: vec![ScoredDoc {
                doc: wire(json!({"id": "a", "text": "hello"})),
                score: Some(0.5),
            }],
        }));
        let embedder = Arc::new(MockEmbedder::new());
        embedder.enqueue_query(Ok(vec![1.0, 0.0, 0.0]));
        let store = store_with(api.clone(), embedder.clone()).await;

        let docs = store.similarity_search("greeting", 1, None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "hello");
        assert_eq!(embedder.query_calls(), vec!["greeting".to_string()]);
        assert_eq!(api.queries()[0].1.query.knn.query_vector, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn embedding_failure_surfaces_as_typed_error() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        embedder.enqueue_query(Err(anyhow::anyhow!("model offline")));
        let store = store_with(api.clone(), embedder).await;

        let err = store.similarity_search("q", 1, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Embedding(_)));
        assert!(api.queries().is_empty());
    }

    #[tokio::test]
    async fn mmr_fetches_vectors_and_prefers_diverse_results() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_query(Ok(cairn_client::QueryResponse {
            docs: vec![
                ScoredDoc {
                    doc: wire(json!({"id": "a", "text": "a", "vector": [1.0, 0.0, 0.0]})),
                    score: Some(1.0),
                },
                ScoredDoc {
                    doc: wire(json!({"id": "b", "text": "b", "vector": [1.0, 0.0, 0.0]})),
                    score: Some(0.99),
                },
                ScoredDoc {
                    doc: wire(json!({"id": "c", "text": "c", "vector": [0.0, 1.0, 0.0]})),
                    score: Some(0.1),
                },
            ],
        }));
        let embedder = Arc::new(MockEmbedder::new());
        embedder.enqueue_query(Ok(vec![1.0, 0.0, 0.0]));
        let store = store_with(api.clone(), embedder).await;

        let options = MmrOptions::new(2).with_fetch_k(3).with_lambda(0.3);
        let docs = store
            .max_marginal_relevance_search("query", &options)
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "a");
        assert_eq!(docs[1].content, "c");
        assert!(!docs[0].metadata.contains_key("vector"));

        let (_, request) = &api.queries()[0];
        assert_eq!(request.size, 3);
        assert!(request.include_vectors);
    }

    #[tokio::test]
    async fn delete_by_ids_chunks_requests() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let ids: Vec<String> = (0..150).map(|i| format!("id-{i}")).collect();
        store
            .delete_documents(DeleteSelector::ByIds(ids))
            .await
            .unwrap();

        let batches = api.deleted_ids();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 100);
        assert_eq!(batches[1].len(), 50);
    }

    #[tokio::test]
    async fn delete_rejects_field_filters() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let err = store
            .delete_documents(DeleteSelector::ByFilter(SearchFilter::fields(Map::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFilter(_)));
        assert!(api.list_docs_cursors().is_empty());
        assert!(api.deleted_ids().is_empty());
    }

    #[tokio::test]
    async fn predicate_deletion_scans_all_pages() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_list_docs(Ok(DocPage {
            docs: vec![
                wire(json!({"id": "a", "text": "a", "source": "x"})),
                wire(json!({"id": "b", "text": "b", "source": "y"})),
            ],
            next_cursor: Some("p2".to_string()),
        }));
        api.enqueue_list_docs(Ok(DocPage {
            docs: vec![wire(json!({"id": "c", "text": "c", "source": "x"}))],
            next_cursor: None,
        }));
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        let filter =
            SearchFilter::predicate(|doc| doc.metadata.get("source") == Some(&json!("x")));
        store
            .delete_documents(DeleteSelector::ByFilter(filter))
            .await
            .unwrap();

        assert_eq!(
            api.list_docs_cursors(),
            vec![None, Some("p2".to_string())]
        );
        assert_eq!(
            api.deleted_ids(),
            vec![vec!["a".to_string(), "c".to_string()]]
        );
    }

    #[tokio::test]
    async fn delete_all_restarts_the_scan_each_call() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_list_docs(Ok(DocPage {
            docs: vec![
                wire(json!({"id": "a", "text": "a"})),
                wire(json!({"id": "b", "text": "b"})),
            ],
            next_cursor: None,
        }));
        let embedder = Arc::new(MockEmbedder::new());
        let store = store_with(api.clone(), embedder).await;

        store.delete_documents(DeleteSelector::All).await.unwrap();
        store.delete_documents(DeleteSelector::All).await.unwrap();

        assert_eq!(api.list_docs_cursors(), vec![None, None]);
        assert_eq!(
            api.deleted_ids(),
            vec![vec!["a".to_string(), "b".to_string()]]
        );
    }

    #[tokio::test]
    async fn init_check_requires_the_collection() {
        let api = Arc::new(MockIndexApi::new());
        api.enqueue_list_collections(Ok(vec![CollectionSummary {
            name: "other".to_string(),
            status: None,
        }]));
        let embedder = Arc::new(MockEmbedder::new());

        let config = fast_config().with_check_collection_on_init(true);
        let err = CairnStore::with_api(api, embedder, config).await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionMissing(name) if name == "notes"));
    }

    #[tokio::test]
    async fn construction_fails_fast_on_invalid_config() {
        let api = Arc::new(MockIndexApi::new());
        let embedder = Arc::new(MockEmbedder::new());
        let config = StoreConfig::new("", "notes", 3);
        assert!(matches!(
            CairnStore::with_api(api, embedder, config).await,
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zip_texts_pairs_shared_and_per_document_metadata() {
        let mut shared = Map::new();
        shared.insert("origin".to_string(), json!("import"));
        let docs = zip_texts(
            vec!["a".to_string(), "b".to_string()],
            &Metadatas::Shared(shared.clone()),
        );
        assert_eq!(docs[0].metadata, shared);
        assert_eq!(docs[1].metadata, shared);

        let mut first = Map::new();
        first.insert("page".to_string(), json!(1));
        let docs = zip_texts(
            vec!["a".to_string(), "b".to_string()],
            &Metadatas::PerDocument(vec![first.clone()]),
        );
        assert_eq!(docs[0].metadata, first);
        assert!(docs[1].metadata.is_empty());
    }
}
