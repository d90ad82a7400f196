//! Embedding capability seam.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

/// External embedding capability consumed by the store.
///
/// Output vector at index `i` corresponds to input text at index `i`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts.
    async fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Scripted embedder for tests.
///
/// Results pop in queue order; an empty queue is an error so tests notice
/// unexpected embedding calls. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockEmbedder {
    document_queue: Mutex<VecDeque<anyhow::Result<Vec<Vec<f32>>>>>,
    query_queue: Mutex<VecDeque<anyhow::Result<Vec<f32>>>>,
    document_calls: Mutex<Vec<Vec<String>>>,
    query_calls: Mutex<Vec<String>>,
}

impl MockEmbedder {
    /// New stub with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `embed_documents` result.
    pub fn enqueue_documents(&self, result: anyhow::Result<Vec<Vec<f32>>>) {
        self.document_queue
            .lock()
            .expect("mock document queue poisoned")
            .push_back(result);
    }

    /// Script the next `embed_query` result.
    pub fn enqueue_query(&self, result: anyhow::Result<Vec<f32>>) {
        self.query_queue
            .lock()
            .expect("mock query queue poisoned")
            .push_back(result);
    }

    /// Recorded `embed_documents` inputs.
    pub fn document_calls(&self) -> Vec<Vec<String>> {
        self.document_calls
            .lock()
            .expect("mock document calls poisoned")
            .clone()
    }

    /// Recorded `embed_query` inputs.
    pub fn query_calls(&self) -> Vec<String> {
        self.query_calls
            .lock()
            .expect("mock query calls poisoned")
            .clone()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.document_calls
            .lock()
            .expect("mock document calls poisoned")
            .push(texts.to_vec());
        self.document_queue
            .lock()
            .expect("mock document queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("mock embedder has no queued batch response")))
    }

    async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.query_calls
            .lock()
            .expect("mock query calls poisoned")
            .push(text.to_string());
        self.query_queue
            .lock()
            .expect("mock query queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("mock embedder has no queued query response")))
    }
}
