// Counter retrieval from printer web interfaces: retried GET, vendor classification,
// same-body parser fallback, then alternate endpoints for SyncThru devices.

mod family;

pub use family::{SYNCTHRU_ALTERNATE_PATHS, VendorFamily};

use std::time::Duration;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::models::{Counters, PrinterSource};

const USER_AGENT: &str = "PrintDashboard/1.0";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Rejected before any request was made.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}

/// Attempts and per-attempt timeouts for the primary counter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    /// Whole-request budget once connected.
    pub read_timeout: Duration,
}

impl RetryPolicy {
    /// Longest one fetch can take: every primary attempt plus each alternate endpoint
    /// running into its timeouts.
    pub fn worst_case(&self) -> Duration {
        let requests = self.max_attempts.max(1) + SYNCTHRU_ALTERNATE_PATHS.len() as u32;
        (self.connect_timeout + self.read_timeout) * requests
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(15),
        }
    }
}

pub struct CounterFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl CounterFetcher {
    pub fn new(policy: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.read_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, policy))
    }

    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Current counters at `url` for a device of `brand`. All-zero when nothing was extractable.
    pub async fn fetch_counters(&self, url: &str, brand: &str) -> Result<Counters, FetchError> {
        self.fetch(url, brand, "").await
    }

    /// Like `fetch_counters`, with the source's model also used for classification.
    pub async fn fetch_source(&self, source: &PrinterSource) -> Result<Counters, FetchError> {
        self.fetch(&source.counter_url, &source.brand, &source.model)
            .await
    }

    #[instrument(skip(self), fields(operation = "fetch_counters"))]
    async fn fetch(&self, url: &str, brand: &str, model: &str) -> Result<Counters, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FetchError::Configuration("counter_url is empty".into()));
        }
        if brand.trim().is_empty() {
            return Err(FetchError::Configuration("brand is empty".into()));
        }
        let url = Url::parse(url)
            .map_err(|e| FetchError::Configuration(format!("invalid counter_url {url:?}: {e}")))?;

        let body = self.get_with_retry(&url).await?;
        let family = VendorFamily::classify(brand, model, &body);
        let counters = family.parse(&body);
        if !counters.is_empty() {
            return Ok(counters);
        }

        for path in family.alternate_paths() {
            let Ok(candidate) = url.join(path) else {
                continue;
            };
            match self.get_text(&candidate).await {
                Ok(text) => {
                    let counters = family.parse(&text);
                    if !counters.is_empty() {
                        debug!(url = %candidate, "counters found on alternate endpoint");
                        return Ok(counters);
                    }
                }
                Err(e) => {
                    debug!(url = %candidate, error = %e, "alternate endpoint failed");
                }
            }
        }

        debug!(?family, "no counters found; returning zeros");
        Ok(Counters::default())
    }

    async fn get_with_retry(&self, url: &Url) -> Result<String, FetchError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(source) if attempt >= attempts => {
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        attempts,
                        source,
                    });
                }
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "counter request failed; retrying");
                    attempt += 1;
                }
            }
        }
    }

    async fn get_text(&self, url: &Url) -> Result<String, reqwest::Error> {
        self.client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
