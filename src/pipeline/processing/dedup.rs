use crate::common::types::CanonicalEvent;
use std::collections::HashSet;

/// Two events are treated as the same listing when they share a calendar day
/// and a lineup, compared case-insensitively and ignoring artist order. Venue
/// is deliberately not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub day: String,
    pub artists: Vec<String>,
}

impl DedupKey {
    pub fn of(event: &CanonicalEvent) -> Self {
        let mut artists: Vec<String> = event.artists.iter().map(|a| a.to_lowercase()).collect();
        artists.sort();
        Self {
            day: event.day().to_string(),
            artists,
        }
    }
}

/// Keep the first event of every key, preserving input order.
pub fn dedupe(events: Vec<CanonicalEvent>) -> Vec<CanonicalEvent> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|event| seen.insert(DedupKey::of(event)))
        .collect()
}
