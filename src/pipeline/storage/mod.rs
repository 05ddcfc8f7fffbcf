// Index sinks: where a refresh batch ends up

pub mod in_memory;
pub mod json_file;
pub mod meilisearch;

pub use in_memory::InMemorySink;
pub use json_file::JsonFileSink;
pub use meilisearch::MeilisearchSink;

use crate::common::error::SinkError;
use crate::common::types::CanonicalEvent;
use async_trait::async_trait;
use serde_json::{json, Value};

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// A searchable document store keyed by a primary-key field
#[async_trait]
pub trait IndexSink: Send + Sync {
    /// Upsert documents; an existing document with the same key is replaced.
    async fn add_documents(&self, events: &[CanonicalEvent], primary_key: &str) -> SinkResult<()>;

    async fn delete_all_documents(&self) -> SinkResult<()>;

    /// Search response shaped like `{"query": .., "hits": [..], "estimatedTotalHits": n}`
    async fn search(&self, query: &str) -> SinkResult<Value>;

    async fn health(&self) -> SinkResult<()>;

    /// Short name for logs and metrics
    fn name(&self) -> &'static str;
}

pub(crate) fn to_documents(events: &[CanonicalEvent]) -> SinkResult<Vec<Value>> {
    events
        .iter()
        .map(|e| serde_json::to_value(e).map_err(SinkError::from))
        .collect()
}

fn key_of(document: &Value, primary_key: &str) -> Option<String> {
    match document.get(primary_key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Replace-or-append by primary key, keeping first-insert order
pub(crate) fn upsert(
    stored: &mut Vec<Value>,
    incoming: Vec<Value>,
    primary_key: &str,
) -> SinkResult<()> {
    for document in incoming {
        let key = key_of(&document, primary_key).ok_or_else(|| {
            SinkError::Unavailable(format!("document has no '{}' field", primary_key))
        })?;
        match stored
            .iter_mut()
            .find(|d| key_of(d, primary_key).as_deref() == Some(key.as_str()))
        {
            Some(existing) => *existing = document,
            None => stored.push(document),
        }
    }
    Ok(())
}

/// Case-insensitive substring match over every string field. An empty query matches all.
pub(crate) fn search_documents(documents: &[Value], query: &str) -> Value {
    let needle = query.trim().to_lowercase();
    let hits: Vec<Value> = documents
        .iter()
        .filter(|d| needle.is_empty() || contains_text(d, &needle))
        .cloned()
        .collect();
    json!({
        "query": query,
        "estimatedTotalHits": hits.len(),
        "hits": hits,
    })
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| contains_text(v, needle)),
        Value::Object(map) => map.values().any(|v| contains_text(v, needle)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_by_key() {
        let mut stored = vec![json!({"id": "a", "name": "old"}), json!({"id": "b"})];
        upsert(
            &mut stored,
            vec![json!({"id": "a", "name": "new"}), json!({"id": "c"})],
            "id",
        )
        .unwrap();

        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0]["name"], "new");
        assert_eq!(stored[2]["id"], "c");
    }

    #[test]
    fn test_upsert_rejects_missing_key() {
        let mut stored = Vec::new();
        assert!(upsert(&mut stored, vec![json!({"name": "x"})], "id").is_err());
    }

    #[test]
    fn test_search_matches_nested_strings() {
        let docs = vec![
            json!({"id": "1", "name": "Deep Night", "artists": ["Alice"]}),
            json!({"id": "2", "name": "Warehouse", "artists": ["Bob"]}),
        ];
        let result = search_documents(&docs, "ALICE");
        assert_eq!(result["estimatedTotalHits"], 1);
        assert_eq!(result["hits"][0]["id"], "1");

        assert_eq!(search_documents(&docs, "")["estimatedTotalHits"], 2);
    }
}
