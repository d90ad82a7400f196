//! Collection lifecycle management.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cairn_client::{
    with_retry, CollectionInfo, CollectionStatus, CreateCollectionRequest, IndexApi,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Creates the remote collection, waits for it to become active, and keeps
/// `ensure_exists` idempotent under concurrent creators.
pub struct CollectionManager {
    api: Arc<dyn IndexApi>,
    config: StoreConfig,
}

impl CollectionManager {
    /// Manager for the configured collection.
    pub fn new(api: Arc<dyn IndexApi>, config: StoreConfig) -> Self {
        Self { api, config }
    }

    /// Index configuration derived from the store config, merged with the
    /// config's additive entries and then caller extras; later keys win.
    fn index_configs(&self, extra: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut configs = Map::new();
        configs.insert(
            self.config.vector_field.clone(),
            json!({
                "type": "vector",
                "dimension": self.config.dimension,
                "metric": self.config.metric.as_str(),
            }),
        );
        for (key, value) in &self.config.index_configs {
            configs.insert(key.clone(), value.clone());
        }
        if let Some(extra) = extra {
            for (key, value) in extra {
                configs.insert(key.clone(), value.clone());
            }
        }
        configs
    }

    /// Create the collection and wait until it is active.
    pub async fn create(&self, extra_index_configs: Option<Map<String, Value>>) -> StoreResult<()> {
        let request = CreateCollectionRequest {
            name: self.config.collection.clone(),
            index_configs: self.index_configs(extra_index_configs.as_ref()),
        };

        info!(collection = %self.config.collection, "creating collection");
        with_retry(&self.config.retry, || {
            self.api.create_collection(request.clone())
        })
        .await?;

        self.wait_until_active(self.config.wait_timeout, self.config.poll_interval)
            .await
    }

    /// Poll collection status until it is active.
    ///
    /// A terminal `FAILED`/`ERROR` status fails immediately. A transient
    /// status-fetch failure before the deadline is swallowed and polling
    /// continues; only a failure seen after the deadline propagates. The
    /// deadline is wall-clock and independent of the per-call network
    /// timeout.
    pub async fn wait_until_active(
        &self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> StoreResult<()> {
        let started = Instant::now();
        loop {
            match self.api.get_collection(&self.config.collection).await {
                Ok(info) => {
                    if info.status == CollectionStatus::Active {
                        debug!(collection = %self.config.collection, "collection is active");
                        return Ok(());
                    }
                    if info.status.is_terminal_failure() {
                        return Err(StoreError::CollectionFailed {
                            name: self.config.collection.clone(),
                            status: info.status.as_str().to_string(),
                        });
                    }
                    debug!(
                        collection = %self.config.collection,
                        status = %info.status,
                        "collection not ready yet"
                    );
                }
                Err(err) => {
                    if started.elapsed() >= timeout {
                        return Err(StoreError::from_transport(err));
                    }
                    debug!(error = %err, "status fetch failed, continuing to poll");
                }
            }

            if started.elapsed() >= timeout {
                return Err(StoreError::WaitTimeout {
                    name: self.config.collection.clone(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Create the collection if it does not exist.
    ///
    /// Never fails loudly: a failed listing falls back to creating directly,
    /// and a failed create (for example a lost creation race) is swallowed
    /// with a warning.
    pub async fn ensure_exists(&self) -> StoreResult<()> {
        match with_retry(&self.config.retry, || self.api.list_collections()).await {
            Ok(collections) => {
                if collections
                    .iter()
                    .any(|summary| summary.name == self.config.collection)
                {
                    return Ok(());
                }
                if let Err(err) = self.create(None).await {
                    warn!(
                        collection = %self.config.collection,
                        error = %err,
                        "create after missing listing entry failed; assuming concurrent creation"
                    );
                }
            }
            Err(err) => {
                warn!(error = %err, "listing collections failed; attempting create directly");
                if let Err(err) = self.create(None).await {
                    warn!(
                        collection = %self.config.collection,
                        error = %err,
                        "fallback create failed; assuming the collection exists"
                    );
                }
            }
        }
        Ok(())
    }

    /// Fetch collection metadata.
    pub async fn info(&self) -> StoreResult<CollectionInfo> {
        Ok(with_retry(&self.config.retry, || {
            self.api.get_collection(&self.config.collection)
        })
        .await?)
    }

    /// Delete the collection unconditionally.
    pub async fn delete(&self) -> StoreResult<()> {
        Ok(with_retry(&self.config.retry, || {
            self.api.delete_collection(&self.config.collection)
        })
        .await?)
    }
}
