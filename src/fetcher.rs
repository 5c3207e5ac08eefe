//! ==============================================================================
//! fetcher.rs - upstream temperature service client
//! ==============================================================================
//!
//! purpose:
//!     one GET per endpoint against the configured temperature service.
//!     `/current` is plain text, everything else is json. no retries and no
//!     caching: a failed request is reported once and the page moves on.
//!
//! relationships:
//!     - used by: dashboard.rs (collects one page worth of data)
//!     - uses: series.rs (normalizer), error.rs (FetchError, ViewError)
//!     - configured by: config.rs (UpstreamConfig)
//!
//! ==============================================================================

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::{FetchError, ViewError};
use crate::series::{self, Series};

/// the four fixed endpoints of the temperature service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    AllReadings,
    HourlyAverage,
    DailyAverage,
}

/// how an endpoint's body is decoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Json,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "/current",
            Endpoint::AllReadings => "/all_readings",
            Endpoint::HourlyAverage => "/hourly_average",
            Endpoint::DailyAverage => "/daily_average",
        }
    }

    pub fn kind(self) -> PayloadKind {
        match self {
            Endpoint::Current => PayloadKind::Text,
            _ => PayloadKind::Json,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// a decoded response body
#[derive(Clone, Debug, PartialEq)]
pub enum RawPayload {
    Text(String),
    Json(Value),
}

/// cheap to clone: reqwest clients share their connection pool
#[derive(Clone)]
pub struct DataFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl DataFetcher {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let parsed = reqwest::Url::parse(&config.base_url)
            .with_context(|| format!("invalid upstream base url {:?}", config.base_url))?;
        if parsed.cannot_be_a_base() {
            bail!("upstream base url {:?} cannot be used as a base", config.base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// issue exactly one GET and decode the body according to the endpoint
    pub async fn fetch(&self, endpoint: Endpoint) -> Result<RawPayload, FetchError> {
        let result = self.request(endpoint).await;
        if let Err(e) = &result {
            warn!(%endpoint, error = %e, "upstream request failed");
        }
        result
    }

    async fn request(&self, endpoint: Endpoint) -> Result<RawPayload, FetchError> {
        let started = Instant::now();

        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        let status = response.status();
        debug!(
            %endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        if !status.is_success() {
            return Err(FetchError::Status { endpoint, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        match endpoint.kind() {
            PayloadKind::Text => Ok(RawPayload::Text(body)),
            PayloadKind::Json => serde_json::from_str(&body)
                .map(RawPayload::Json)
                .map_err(|source| FetchError::Decode { endpoint, source }),
        }
    }

    /// the instantaneous reading, passed through as text
    pub async fn fetch_current(&self) -> Result<String, FetchError> {
        match self.fetch(Endpoint::Current).await? {
            RawPayload::Text(text) => Ok(text.trim().to_string()),
            RawPayload::Json(value) => Ok(value.to_string()),
        }
    }

    /// fetch one time-series endpoint and normalize it
    pub async fn fetch_series(&self, endpoint: Endpoint) -> Result<Series, ViewError> {
        let payload = match self.fetch(endpoint).await? {
            RawPayload::Json(value) => value,
            RawPayload::Text(text) => Value::String(text),
        };

        series::normalize(&payload).map_err(|source| {
            warn!(%endpoint, error = %source, "upstream payload has the wrong shape");
            ViewError::Schema { endpoint, source }
        })
    }
}
