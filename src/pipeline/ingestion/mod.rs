// Ingestion: retrieving raw listing markup per region

pub mod fetcher;

pub use fetcher::{HttpFetcher, SourceFetcher};
