pub mod dates;

use crate::common::constants::{DEFAULT_EVENT_NAME, MAX_ARTISTS, UNKNOWN_CITY, UNKNOWN_VENUE};
use crate::common::error::NormalizeError;
use crate::common::types::{CanonicalEvent, RawEvent};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Maps raw listing rows onto the canonical event schema.
///
/// Malformed fields get defaults rather than errors. `None` is reserved for the
/// case where even the defaulted record would break the schema (for example an
/// empty configured country); that is logged and the row is dropped.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fallback_city: String,
    country: String,
}

impl Normalizer {
    pub fn new(fallback_city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            fallback_city: fallback_city.into(),
            country: country.into(),
        }
    }

    pub fn normalize(&self, raw: &RawEvent) -> Option<CanonicalEvent> {
        match self.normalize_at(raw, Utc::now()) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(id = %raw.id, title = %raw.title, "Could not normalize event: {}", e);
                None
            }
        }
    }

    /// Normalize with an explicit "now" for current-year and fallback dates.
    pub fn normalize_at(
        &self,
        raw: &RawEvent,
        now: DateTime<Utc>,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let event = CanonicalEvent {
            id: non_empty_or(&raw.id, || format!("event-{}", Uuid::new_v4())),
            name: non_empty_or(&raw.title, || DEFAULT_EVENT_NAME.to_string()),
            artists: clean_artists(&raw.artists),
            venue: non_empty_or(&raw.venue, || UNKNOWN_VENUE.to_string()),
            city: self.resolve_city(&raw.location),
            country: self.country.trim().to_string(),
            date: dates::resolve_date_at(&raw.date, now),
        };
        validate(&event)?;
        Ok(event)
    }

    fn resolve_city(&self, location: &str) -> String {
        let location = location.trim();
        if location.is_empty() || location.eq_ignore_ascii_case(UNKNOWN_CITY) {
            self.fallback_city.trim().to_string()
        } else {
            location.to_string()
        }
    }
}

fn non_empty_or(value: &str, default: impl FnOnce() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default()
    } else {
        trimmed.to_string()
    }
}

fn clean_artists(artists: &[String]) -> Vec<String> {
    artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .take(MAX_ARTISTS)
        .map(str::to_string)
        .collect()
}

/// Check every canonical-schema invariant on a finished record
pub fn validate(event: &CanonicalEvent) -> Result<(), NormalizeError> {
    let required = [
        ("id", &event.id),
        ("name", &event.name),
        ("venue", &event.venue),
        ("city", &event.city),
        ("country", &event.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(NormalizeError::Invariant {
                field,
                message: "must not be empty".to_string(),
            });
        }
    }

    if event.artists.len() > MAX_ARTISTS {
        return Err(NormalizeError::Invariant {
            field: "artists",
            message: format!("{} entries, at most {} allowed", event.artists.len(), MAX_ARTISTS),
        });
    }
    if event.artists.iter().any(|a| a.trim().is_empty()) {
        return Err(NormalizeError::Invariant {
            field: "artists",
            message: "contains an empty name".to_string(),
        });
    }

    if !event.date.ends_with('Z') || DateTime::parse_from_rfc3339(&event.date).is_err() {
        return Err(NormalizeError::Invariant {
            field: "date",
            message: format!("'{}' is not an ISO-8601 UTC timestamp", event.date),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn normalizer() -> Normalizer {
        Normalizer::new("Los Angeles", "United States")
    }

    #[test]
    fn test_empty_raw_event_gets_every_default() {
        let event = normalizer().normalize(&RawEvent::default()).unwrap();

        assert!(event.id.starts_with("event-"));
        assert_eq!(event.name, DEFAULT_EVENT_NAME);
        assert!(event.artists.is_empty());
        assert_eq!(event.venue, UNKNOWN_VENUE);
        assert_eq!(event.city, "Los Angeles");
        assert_eq!(event.country, "United States");
        assert!(validate(&event).is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = normalizer().normalize(&RawEvent::default()).unwrap();
        let b = normalizer().normalize(&RawEvent::default()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_unknown_city_sentinel_uses_fallback() {
        let raw = RawEvent {
            location: UNKNOWN_CITY.to_string(),
            ..RawEvent::default()
        };
        assert_eq!(normalizer().normalize(&raw).unwrap().city, "Los Angeles");

        let raw = RawEvent {
            location: " Oakland ".to_string(),
            ..RawEvent::default()
        };
        assert_eq!(normalizer().normalize(&raw).unwrap().city, "Oakland");
    }

    #[test]
    fn test_fields_are_trimmed_and_artists_capped() {
        let raw = RawEvent {
            id: " 19hz-la-4 ".to_string(),
            title: "  Deep Night ".to_string(),
            venue: " Club ".to_string(),
            artists: ["a", " ", "b", "c", "d", "e", "f"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..RawEvent::default()
        };
        let event = normalizer().normalize(&raw).unwrap();
        assert_eq!(event.id, "19hz-la-4");
        assert_eq!(event.name, "Deep Night");
        assert_eq!(event.venue, "Club");
        assert_eq!(event.artists, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_dates_follow_resolution_order() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let with_date = |date: &str| RawEvent {
            date: date.to_string(),
            ..RawEvent::default()
        };

        let iso = normalizer().normalize_at(&with_date("2024-08-15T20:00:00Z"), now).unwrap();
        assert_eq!(iso.date, "2024-08-15T20:00:00Z");

        let month = normalizer().normalize_at(&with_date("Aug 15"), now).unwrap();
        assert_eq!(month.date, "2026-08-15T00:00:00Z");

        let junk = normalizer().normalize_at(&with_date("TBA"), now).unwrap();
        assert_eq!(junk.date, "2026-01-02T03:04:05Z");
    }

    #[test]
    fn test_month_day_uses_real_current_year() {
        let raw = RawEvent {
            date: "Aug 15".to_string(),
            ..RawEvent::default()
        };
        let event = normalizer().normalize(&raw).unwrap();
        let parsed = DateTime::parse_from_rfc3339(&event.date).unwrap();
        assert_eq!(parsed.year(), Utc::now().year());
        assert_eq!((parsed.month(), parsed.day()), (8, 15));
    }

    #[test]
    fn test_empty_country_is_an_invariant_failure() {
        let broken = Normalizer::new("Los Angeles", "  ");
        assert!(broken.normalize(&RawEvent::default()).is_none());
        assert!(matches!(
            broken.normalize_at(&RawEvent::default(), Utc::now()),
            Err(NormalizeError::Invariant { field: "country", .. })
        ));
    }
}
