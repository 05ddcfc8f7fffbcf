use super::strategies::{extract_artists, extract_cell};
use super::ListingParser;
use crate::common::constants::SOURCE_NAME;
use crate::common::error::RowError;
use crate::common::types::RawEvent;
use crate::observability::metrics::ROWS_SKIPPED_TOTAL;
use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid row selector"));

// Event cells shorter than this are spacers or stray markup
const MIN_EVENT_CELL_CHARS: usize = 5;

/// Parser for the 19hz.info table layout:
/// `Date/Time | Title @ Venue (City)... | Tags | Price | Organizers | Links`
#[derive(Debug, Default, Clone)]
pub struct NineteenHzParser;

impl NineteenHzParser {
    pub fn new() -> Self {
        Self
    }

    /// Turn one row's cell texts into a raw event. `seq` numbers the provisional id.
    pub fn parse_row(&self, cells: &[String], seq: usize) -> Result<RawEvent, RowError> {
        if cells.len() < 2 {
            return Err(RowError::Skipped("fewer than two cells"));
        }

        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        let date_cell = cell(0);
        let event_cell = cell(1);

        if event_cell.chars().count() < MIN_EVENT_CELL_CHARS {
            return Err(RowError::Skipped("no listing text"));
        }
        if !event_cell.chars().any(char::is_alphanumeric) {
            return Err(RowError::Malformed(format!(
                "listing cell has no readable text: {:?}",
                event_cell
            )));
        }

        let (parts, strategy) = extract_cell(&event_cell);
        debug!(strategy, title = %parts.title, "Extracted listing cell");

        let artists = extract_artists(&parts.title);
        Ok(RawEvent {
            id: format!("{}-{}", SOURCE_NAME, seq),
            date: parts.date.unwrap_or(date_cell),
            title: parts.title,
            venue: parts.venue,
            location: parts.city,
            artists,
            tags: cell(2),
            price: cell(3),
            organizer: cell(4),
        })
    }
}

/// Text of a cell with every text node trimmed and joined without separators.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Direct `td` children only, so nested tables don't shift the positional cells
fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name().eq_ignore_ascii_case("td"))
        .map(cell_text)
        .collect()
}

impl ListingParser for NineteenHzParser {
    fn parse(&self, raw: &str) -> Vec<RawEvent> {
        let document = Html::parse_document(raw);
        let mut events = Vec::new();
        let mut skipped = 0usize;

        for (row_index, row) in document.select(&ROW_SELECTOR).enumerate() {
            let cells = row_cells(row);
            match self.parse_row(&cells, events.len()) {
                Ok(event) => events.push(event),
                Err(RowError::Skipped(reason)) => {
                    debug!(row_index, reason, "Skipping row");
                }
                Err(e) => {
                    warn!(row_index, "Could not parse event row: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            counter!(ROWS_SKIPPED_TOTAL).increment(skipped as u64);
        }
        info!("Found {} events ({} malformed rows skipped)", events.len(), skipped);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::{UNKNOWN_CITY, UNKNOWN_VENUE};

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_row_full_listing() {
        let parser = NineteenHzParser::new();
        let event = parser
            .parse_row(
                &cells(&[
                    "Sun: Sep 1 (9pm-2am)",
                    "Bass Drop: Alice, Bob @ Venue A (Austin)2024/09/01",
                    "dnb, jungle",
                    "$20",
                    "Crew",
                ]),
                3,
            )
            .unwrap();

        assert_eq!(event.id, "19hz-3");
        assert_eq!(event.title, "Bass Drop: Alice, Bob");
        assert_eq!(event.venue, "Venue A");
        assert_eq!(event.location, "Austin");
        assert_eq!(event.date, "2024/09/01");
        assert_eq!(event.artists, vec!["Alice", "Bob"]);
        assert_eq!(event.tags, "dnb, jungle");
        assert_eq!(event.price, "$20");
        assert_eq!(event.organizer, "Crew");
    }

    #[test]
    fn test_parse_row_without_marker_uses_date_cell() {
        let parser = NineteenHzParser::new();
        let event = parser.parse_row(&cells(&["Aug 15", "Just A Title"]), 0).unwrap();

        assert_eq!(event.title, "Just A Title");
        assert_eq!(event.venue, UNKNOWN_VENUE);
        assert_eq!(event.location, UNKNOWN_CITY);
        assert_eq!(event.date, "Aug 15");
        assert_eq!(event.artists, vec!["Just A Title"]);
        assert_eq!(event.tags, "");
    }

    #[test]
    fn test_parse_row_skips_short_and_empty_rows() {
        let parser = NineteenHzParser::new();
        assert_eq!(
            parser.parse_row(&cells(&["only one"]), 0),
            Err(RowError::Skipped("fewer than two cells"))
        );
        assert_eq!(
            parser.parse_row(&cells(&["date", "abc"]), 0),
            Err(RowError::Skipped("no listing text"))
        );
        assert!(matches!(
            parser.parse_row(&cells(&["date", "-----!!"]), 0),
            Err(RowError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_document_keeps_row_order_and_skips_bad_rows() {
        let html = r#"
            <html><body><table>
              <tr><th>Date/Time</th><th>Event Title @ Venue</th></tr>
              <tr><td>Fri: Aug 30</td><td><a href="/e1">Warehouse: DJ One &amp; DJ Two</a> @ The Yard (Oakland)</td><td>techno</td><td>$15</td><td>Org</td></tr>
              <tr><td>sep</td></tr>
              <tr><td>Sat</td><td>~~~~~~</td></tr>
              <tr><td>Sat: Aug 31</td><td><a href="/e2">Solo Artist</a> @ Club Nine (San Jose)2024/08/31</td><td></td><td></td><td></td></tr>
            </table></body></html>
        "#;

        let events = NineteenHzParser::new().parse(html);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "19hz-0");
        assert_eq!(events[0].title, "Warehouse: DJ One & DJ Two");
        assert_eq!(events[0].artists, vec!["DJ One", "DJ Two"]);
        assert_eq!(events[0].venue, "The Yard");
        assert_eq!(events[0].location, "Oakland");
        assert_eq!(events[0].date, "Fri: Aug 30");
        assert_eq!(events[1].id, "19hz-1");
        assert_eq!(events[1].artists, vec!["Solo Artist"]);
        assert_eq!(events[1].date, "2024/08/31");
        assert_eq!(events[1].location, "San Jose");
    }

    #[test]
    fn test_parse_garbage_yields_nothing() {
        assert!(NineteenHzParser::new().parse("not html at all").is_empty());
        assert!(NineteenHzParser::new().parse("").is_empty());
    }
}
