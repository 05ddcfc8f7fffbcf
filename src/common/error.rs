use thiserror::Error;

/// Top-level error for fatal conditions surfaced to whoever composes the pipeline.
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Index sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, ScraperError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No regions configured")]
    NoRegions,

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Failure of a single region fetch. Always carries the region id.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("region '{region}' has no configured source URL")]
    UnknownRegion { region: String },

    #[error("region '{region}': request timed out")]
    Timeout { region: String },

    #[error("region '{region}': HTTP request failed: {source}")]
    Http {
        region: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("region '{region}': upstream responded with status {status}")]
    Status { region: String, status: u16 },
}

impl FetchError {
    pub fn region(&self) -> &str {
        match self {
            FetchError::UnknownRegion { region }
            | FetchError::Timeout { region }
            | FetchError::Http { region, .. }
            | FetchError::Status { region, .. } => region,
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::UnknownRegion { .. } => "unknown_region",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Http { .. } => "http",
            FetchError::Status { .. } => "status",
        }
    }
}

/// Why a listing row did not produce a raw event.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    /// Header, spacer or otherwise non-listing row. Not worth a warning.
    #[error("row skipped: {0}")]
    Skipped(&'static str),

    #[error("malformed row: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("field '{field}' violates the canonical schema: {message}")]
    Invariant { field: &'static str, message: String },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("HTTP request to index failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("index responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index unavailable: {0}")]
    Unavailable(String),
}
