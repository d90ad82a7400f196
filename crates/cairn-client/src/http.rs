//! HTTP implementation of the Cairn index API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::IndexApi;
use crate::error::{ApiResult, TransportError};
use crate::types::{
    CollectionInfo, CollectionSummary, CreateCollectionRequest, DeleteDocsRequest, DocPage,
    ListCollectionsResponse, ListDocsRequest, QueryRequest, QueryResponse, UpsertDocsRequest,
    WireDoc,
};

/// Connection settings for [`CairnClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, without a trailing slash.
    pub base_url: String,
    /// Project API key, sent as a bearer token.
    pub api_key: String,
    /// Network-level timeout applied to each individual request.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Settings for the given endpoint and credentials, with a 30s timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// reqwest-backed [`IndexApi`] implementation.
pub struct CairnClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CairnClient {
    /// Build a client with its own connection pool.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn send_unit(&self, request: RequestBuilder) -> ApiResult<()> {
        self.dispatch(request).await?;
        Ok(())
    }

    async fn dispatch(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read body>".to_string());

        Err(TransportError::Status {
            status: status.as_u16(),
            message,
            retry_after,
        })
    }
}

fn classify_send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Connect(err.to_string())
    }
}

#[async_trait]
impl IndexApi for CairnClient {
    async fn create_collection(&self, request: CreateCollectionRequest) -> ApiResult<()> {
        debug!(collection = %request.name, "creating collection");
        self.send_unit(
            self.client
                .post(self.endpoint("/v1/collections"))
                .json(&request),
        )
        .await
    }

    async fn get_collection(&self, name: &str) -> ApiResult<CollectionInfo> {
        self.send_json(
            self.client
                .get(self.endpoint(&format!("/v1/collections/{name}"))),
        )
        .await
    }

    async fn list_collections(&self) -> ApiResult<Vec<CollectionSummary>> {
        let response: ListCollectionsResponse =
            self.send_json(self.client.get(self.endpoint("/v1/collections"))).await?;
        Ok(response.collections)
    }

    async fn delete_collection(&self, name: &str) -> ApiResult<()> {
        debug!(collection = %name, "deleting collection");
        self.send_unit(
            self.client
                .delete(self.endpoint(&format!("/v1/collections/{name}"))),
        )
        .await
    }

    async fn upsert_docs(&self, name: &str, docs: Vec<WireDoc>) -> ApiResult<()> {
        debug!(collection = %name, count = docs.len(), "upserting documents");
        self.send_unit(
            self.client
                .post(self.endpoint(&format!("/v1/collections/{name}/docs")))
                .json(&UpsertDocsRequest { docs }),
        )
        .await
    }

    async fn delete_docs(&self, name: &str, ids: Vec<String>) -> ApiResult<()> {
        debug!(collection = %name, count = ids.len(), "deleting documents");
        self.send_unit(
            self.client
                .post(self.endpoint(&format!("/v1/collections/{name}/docs/delete")))
                .json(&DeleteDocsRequest { ids }),
        )
        .await
    }

    async fn list_docs(
        &self,
        name: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> ApiResult<DocPage> {
        self.send_json(
            self.client
                .post(self.endpoint(&format!("/v1/collections/{name}/docs/list")))
                .json(&ListDocsRequest { cursor, limit }),
        )
        .await
    }

    async fn query(&self, name: &str, request: QueryRequest) -> ApiResult<QueryResponse> {
        self.send_json(
            self.client
                .post(self.endpoint(&format!("/v1/collections/{name}/query")))
                .json(&request),
        )
        .await
    }
}
