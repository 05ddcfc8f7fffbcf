use crate::common::error::FetchError;
use crate::config::Config;
use crate::observability::metrics::{FETCH_DURATION_SECONDS, FETCH_TOTAL};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Retrieves the raw listing markup of one region.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, region: &str) -> Result<String, FetchError>;
}

/// Plain HTTP GET against the region's configured URL. One attempt, bounded by a timeout.
pub struct HttpFetcher {
    client: Client,
    urls: HashMap<String, String>,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(urls: HashMap<String, String>, user_agent: &str, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            urls,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let urls = config
            .regions
            .iter()
            .map(|(id, region)| (id.clone(), region.url.clone()))
            .collect();
        Self::new(urls, &config.fetch.user_agent, config.fetch.timeout())
    }

    async fn get(&self, region: &str, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(region, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                region: region.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(region, e))
    }
}

fn classify(region: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            region: region.to_string(),
        }
    } else {
        FetchError::Http {
            region: region.to_string(),
            source: err,
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, region: &str) -> Result<String, FetchError> {
        let url = self
            .urls
            .get(region)
            .ok_or_else(|| FetchError::UnknownRegion {
                region: region.to_string(),
            })?;

        debug!("GET {} (timeout {:?})", url, self.timeout);
        let started = Instant::now();
        let result = self.get(region, url).await;
        histogram!(FETCH_DURATION_SECONDS, "region" => region.to_string())
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(body) => {
                counter!(FETCH_TOTAL, "region" => region.to_string(), "outcome" => "success")
                    .increment(1);
                debug!("Fetched {} bytes", body.len());
            }
            Err(e) => {
                counter!(FETCH_TOTAL, "region" => region.to_string(), "outcome" => e.kind())
                    .increment(1);
            }
        }
        result
    }
}
