use super::{IndexSink, SinkResult};
use crate::common::error::SinkError;
use crate::common::types::CanonicalEvent;
use crate::config::IndexConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Meilisearch over its REST API
pub struct MeilisearchSink {
    client: Client,
    base_url: String,
    index: String,
    api_key: Option<String>,
}

impl MeilisearchSink {
    pub fn new(base_url: impl Into<String>, index: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(&config.url, &config.name, config.api_key.clone())
    }

    fn documents_url(&self) -> String {
        format!("{}/indexes/{}/documents", self.base_url, self.index)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> SinkResult<Response> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SinkError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl IndexSink for MeilisearchSink {
    #[instrument(skip(self, events), fields(index = %self.index, count = events.len()))]
    async fn add_documents(&self, events: &[CanonicalEvent], primary_key: &str) -> SinkResult<()> {
        let request = self
            .client
            .post(self.documents_url())
            .query(&[("primaryKey", primary_key)])
            .json(events);
        let task: Value = self.send(request).await?.json().await?;
        info!(
            "Enqueued {} documents (task {})",
            events.len(),
            task.get("taskUid").cloned().unwrap_or(serde_json::Value::Null)
        );
        Ok(())
    }

    async fn delete_all_documents(&self) -> SinkResult<()> {
        self.send(self.client.delete(self.documents_url())).await?;
        debug!("Requested deletion of all documents in {}", self.index);
        Ok(())
    }

    async fn search(&self, query: &str) -> SinkResult<Value> {
        let url = format!("{}/indexes/{}/search", self.base_url, self.index);
        let request = self.client.post(url).json(&json!({ "q": query }));
        Ok(self.send(request).await?.json().await?)
    }

    async fn health(&self) -> SinkResult<()> {
        let url = format!("{}/health", self.base_url);
        self.send(self.client.get(url))
            .await
            .map(|_| ())
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "meilisearch"
    }
}
