// Pipeline processing: parsing, normalization and deduplication

pub mod dedup;
pub mod normalize;
pub mod parser;

pub use dedup::dedupe;
pub use normalize::Normalizer;
pub use parser::{ListingParser, NineteenHzParser};
