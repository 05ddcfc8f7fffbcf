use super::{search_documents, to_documents, upsert, IndexSink, SinkResult};
use crate::common::types::CanonicalEvent;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory index for development/testing
#[derive(Clone, Default)]
pub struct InMemorySink {
    documents: Arc<Mutex<Vec<Value>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        // A poisoned lock still holds a consistent Vec
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of every stored document
    pub fn documents(&self) -> Vec<Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl IndexSink for InMemorySink {
    async fn add_documents(&self, events: &[CanonicalEvent], primary_key: &str) -> SinkResult<()> {
        let incoming = to_documents(events)?;
        let mut documents = self.lock();
        upsert(&mut documents, incoming, primary_key)?;
        debug!("Stored {} documents ({} total)", events.len(), documents.len());
        Ok(())
    }

    async fn delete_all_documents(&self) -> SinkResult<()> {
        self.lock().clear();
        Ok(())
    }

    async fn search(&self, query: &str) -> SinkResult<Value> {
        Ok(search_documents(&self.lock(), query))
    }

    async fn health(&self) -> SinkResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
