//! Ordered extraction strategies for the free-text listing cell.
//!
//! Each strategy either claims its input (`Some`) or passes (`None`); the
//! first claim wins. Keeping them as data makes the fallback order explicit and
//! lets each rule be tested on its own.

use crate::common::constants::{MAX_ARTISTS, UNKNOWN_CITY, UNKNOWN_VENUE};
use once_cell::sync::Lazy;
use regex::Regex;

const VENUE_MARKER: &str = "@ ";

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}/\d{2}/\d{2}").expect("valid date token regex"));
static VENUE_WITH_CITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(]+)\s*\(([^)]+)\)").expect("valid venue regex"));
static DAY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:sat|sun|mon|tue|wed|thu|fri)[\s:]+").expect("valid day prefix regex")
});
static FEATURING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:ft\.?|feat\.?|featuring)\s+").expect("valid featuring regex")
});
static ARTIST_SEPARATORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[,&+]|\s+(?:w/|with|and|b2b)\s+").expect("valid separator regex")
});

/// Fields recovered from the combined title/venue/metadata cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellParts {
    pub title: String,
    pub venue: String,
    pub city: String,
    /// Authoritative `YYYY/MM/DD` token, when the cell carries one
    pub date: Option<String>,
}

pub struct CellStrategy {
    pub name: &'static str,
    pub extract: fn(&str) -> Option<CellParts>,
}

pub const CELL_STRATEGIES: &[CellStrategy] = &[
    CellStrategy {
        name: "venue_with_city",
        extract: venue_with_city,
    },
    CellStrategy {
        name: "venue_first_token",
        extract: venue_first_token,
    },
    CellStrategy {
        name: "title_only",
        extract: title_only,
    },
];

/// Run the cell strategies in order. The last one always claims, so this never fails.
pub fn extract_cell(cell: &str) -> (CellParts, &'static str) {
    for strategy in CELL_STRATEGIES {
        if let Some(parts) = (strategy.extract)(cell) {
            return (parts, strategy.name);
        }
    }
    (
        CellParts {
            title: cell.trim().to_string(),
            venue: UNKNOWN_VENUE.to_string(),
            city: UNKNOWN_CITY.to_string(),
            date: None,
        },
        "title_only",
    )
}

/// Split at the first `"@ "`, then peel the last date token off the right side.
/// Returns (title, venue-and-location, date).
fn split_title_and_rest(cell: &str) -> Option<(String, String, Option<String>)> {
    let (title, rest) = cell.split_once(VENUE_MARKER)?;
    let rest = rest.trim();
    let (venue_and_location, date) = match DATE_TOKEN.find_iter(rest).last() {
        Some(m) => (rest[..m.start()].trim(), Some(m.as_str().to_string())),
        None => (rest, None),
    };
    Some((title.trim().to_string(), venue_and_location.to_string(), date))
}

/// `Title @ Venue Name (City) ...`
pub fn venue_with_city(cell: &str) -> Option<CellParts> {
    let (title, rest, date) = split_title_and_rest(cell)?;
    let caps = VENUE_WITH_CITY.captures(&rest)?;
    Some(CellParts {
        title,
        venue: caps[1].trim().to_string(),
        city: caps[2].trim().to_string(),
        date,
    })
}

/// `Title @ Venue ...` without a parenthesised city: first token is the venue.
pub fn venue_first_token(cell: &str) -> Option<CellParts> {
    let (title, rest, date) = split_title_and_rest(cell)?;
    let venue = rest
        .split_whitespace()
        .next()
        .unwrap_or(UNKNOWN_VENUE)
        .to_string();
    Some(CellParts {
        title,
        venue,
        city: UNKNOWN_CITY.to_string(),
        date,
    })
}

/// No venue marker at all: the whole cell is the title.
pub fn title_only(cell: &str) -> Option<CellParts> {
    Some(CellParts {
        title: cell.trim().to_string(),
        venue: UNKNOWN_VENUE.to_string(),
        city: UNKNOWN_CITY.to_string(),
        date: None,
    })
}

pub struct ArtistStrategy {
    pub name: &'static str,
    pub extract: fn(&str) -> Option<Vec<String>>,
}

pub const ARTIST_STRATEGIES: &[ArtistStrategy] = &[
    ArtistStrategy {
        name: "prefixed_list",
        extract: prefixed_list,
    },
    ArtistStrategy {
        name: "separated_list",
        extract: separated_list,
    },
    ArtistStrategy {
        name: "whole_title",
        extract: whole_title,
    },
];

/// Derive the lineup from an event title. At most five trimmed, non-empty names.
pub fn extract_artists(title: &str) -> Vec<String> {
    let title = strip_day_prefix(title);
    let names = ARTIST_STRATEGIES
        .iter()
        .find_map(|strategy| (strategy.extract)(title))
        .unwrap_or_default();
    clean_names(names)
}

pub fn strip_day_prefix(title: &str) -> &str {
    let title = title.trim();
    match DAY_PREFIX.find(title) {
        Some(m) => &title[m.end()..],
        None => title,
    }
}

fn split_names(text: &str) -> Vec<String> {
    ARTIST_SEPARATORS
        .split(text)
        .map(|name| name.to_string())
        .collect()
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .take(MAX_ARTISTS)
        .collect()
}

/// `Party Name: A, B` or `Party Name ft. A & B`. The prefix is context, not lineup.
pub fn prefixed_list(title: &str) -> Option<Vec<String>> {
    if let Some((_, lineup)) = title.split_once(':') {
        return Some(split_names(lineup));
    }
    let m = FEATURING.find(title)?;
    Some(split_names(&title[m.end()..]))
}

/// `A, B & C`, `A w/ B`, `A b2b B` ...
pub fn separated_list(title: &str) -> Option<Vec<String>> {
    if ARTIST_SEPARATORS.is_match(title) {
        Some(split_names(title))
    } else {
        None
    }
}

pub fn whole_title(title: &str) -> Option<Vec<String>> {
    Some(vec![title.to_string()])
}
