pub mod nineteen_hz;
pub mod strategies;

use crate::common::types::RawEvent;

pub use nineteen_hz::NineteenHzParser;

/// Turns one region's raw markup into raw event records.
///
/// Implementations are CPU-only and never fail as a whole: rows that cannot be
/// read are skipped and logged, and parsing continues with the next row.
pub trait ListingParser: Send + Sync {
    fn parse(&self, raw: &str) -> Vec<RawEvent>;
}
