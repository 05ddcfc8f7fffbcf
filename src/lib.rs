pub mod common;
pub mod config;
pub mod observability;
pub mod pipeline;

pub use common::error::{Result, ScraperError};
pub use common::types::{CanonicalEvent, RawEvent, RefreshOutput, RefreshStats};
pub use config::Config;
