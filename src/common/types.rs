use crate::common::error::FetchError;
use serde::{Deserialize, Serialize};

/// One detected listing row, before normalization. Every field is best-effort text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub title: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub artists: Vec<String>,
    pub tags: String,
    pub price: String,
    pub organizer: String,
}

/// The pipeline's unit of record, as handed to the index sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub venue: String,
    pub city: String,
    pub country: String,
    /// ISO-8601, always UTC with a `Z` suffix
    pub date: String,
}

impl CanonicalEvent {
    /// Calendar-day part of `date` (`YYYY-MM-DD`)
    pub fn day(&self) -> &str {
        self.date.split('T').next().unwrap_or(&self.date)
    }
}

/// Outcome of one region's fetch/parse/normalize task.
#[derive(Debug)]
pub struct RegionResult {
    pub region: String,
    pub outcome: std::result::Result<Vec<CanonicalEvent>, RegionFailure>,
}

impl RegionResult {
    pub fn events(region: impl Into<String>, events: Vec<CanonicalEvent>) -> Self {
        Self {
            region: region.into(),
            outcome: Ok(events),
        }
    }

    pub fn failed(region: impl Into<String>, failure: RegionFailure) -> Self {
        Self {
            region: region.into(),
            outcome: Err(failure),
        }
    }

    pub fn event_count(&self) -> usize {
        self.outcome.as_ref().map(Vec::len).unwrap_or(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegionFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("region task aborted: {0}")]
    Aborted(String),
}

/// Per-region line of the refresh statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate statistics of one refresh run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshStats {
    pub regions_requested: usize,
    pub regions_with_events: usize,
    pub events_before_dedup: usize,
    pub events_after_dedup: usize,
    pub regions: Vec<RegionSummary>,
}

/// Deduplicated events plus the statistics describing how they were produced
#[derive(Debug, Clone)]
pub struct RefreshOutput {
    pub events: Vec<CanonicalEvent>,
    pub stats: RefreshStats,
}
