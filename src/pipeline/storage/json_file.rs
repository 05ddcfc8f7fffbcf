use super::{search_documents, to_documents, upsert, IndexSink, SinkResult};
use crate::common::error::SinkError;
use crate::common::types::CanonicalEvent;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::info;

/// Keeps the whole index as one pretty-printed JSON array on disk
pub struct JsonFileSink {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_documents(&self) -> SinkResult<Vec<Value>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(SinkError::Io(e)),
        }
    }

    async fn write_documents(&self, documents: &[Value]) -> SinkResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json_content = serde_json::to_string_pretty(documents)?;
        fs::write(&self.path, json_content).await?;
        Ok(())
    }
}

#[async_trait]
impl IndexSink for JsonFileSink {
    async fn add_documents(&self, events: &[CanonicalEvent], primary_key: &str) -> SinkResult<()> {
        let incoming = to_documents(events)?;
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_documents().await?;
        upsert(&mut documents, incoming, primary_key)?;
        self.write_documents(&documents).await?;
        info!(
            "Saved {} events to {} ({} total)",
            events.len(),
            self.path.display(),
            documents.len()
        );
        Ok(())
    }

    async fn delete_all_documents(&self) -> SinkResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_documents(&[]).await
    }

    async fn search(&self, query: &str) -> SinkResult<Value> {
        let documents = self.read_documents().await?;
        Ok(search_documents(&documents, query))
    }

    /// Healthy when the file is absent or holds a JSON array
    async fn health(&self) -> SinkResult<()> {
        self.read_documents()
            .await
            .map(|_| ())
            .map_err(|e| SinkError::Unavailable(format!("{}: {}", self.path.display(), e)))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
