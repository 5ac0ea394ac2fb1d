//! Occurrence sources: the SIGO backend over HTTP, or a saved response on disk.

use crate::config::SourceConfig;
use crate::data::record::RawOccurrence;
use crate::error::{ConfigError, EtlError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Information about a source, recorded in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source_type: String,
    pub location: String,
}

/// Something that yields the full set of raw occurrences in one call.
#[async_trait]
pub trait OccurrenceSource: Send + Sync {
    /// Fetch every occurrence. No pagination, no retry.
    async fn fetch(&self) -> Result<Vec<RawOccurrence>, EtlError>;

    /// Metadata about this source for the run report.
    fn describe(&self) -> SourceInfo;
}

/// Parse a response body into raw occurrences.
///
/// The body must be a JSON array whose elements are all objects.
pub fn parse_occurrences(body: &str) -> Result<Vec<RawOccurrence>, EtlError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| EtlError::malformed(format!("body is not valid JSON: {e}")))?;

    let serde_json::Value::Array(items) = value else {
        return Err(EtlError::malformed(format!(
            "expected a JSON array of occurrences, got {}",
            json_kind(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::Object(map) => Ok(RawOccurrence::new(map)),
            other => Err(EtlError::malformed(format!(
                "element {i} is {}, expected an object",
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// HttpOccurrenceSource
// ---------------------------------------------------------------------------

/// The SIGO backend's occurrence endpoint, authenticated with a bearer token.
pub struct HttpOccurrenceSource {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpOccurrenceSource {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, EtlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ConfigError::invalid(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    /// Build the source from configuration, resolving the token.
    pub fn from_config(config: &SourceConfig) -> Result<Self, EtlError> {
        let token = config.resolve_token()?;
        Self::new(
            config.endpoint.clone(),
            token,
            config.timeout(),
            config.connect_timeout(),
        )
    }

    fn unavailable(&self, status: Option<u16>, message: impl Into<String>) -> EtlError {
        EtlError::SourceUnavailable {
            endpoint: self.endpoint.clone(),
            status,
            message: message.into(),
        }
    }
}

#[async_trait]
impl OccurrenceSource for HttpOccurrenceSource {
    async fn fetch(&self) -> Result<Vec<RawOccurrence>, EtlError> {
        debug!(endpoint = %self.endpoint, "Requesting occurrences");

        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "request timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                self.unavailable(None, format!("{kind}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(
                Some(status.as_u16()),
                format!("API request failed with status {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(Some(status.as_u16()), format!("reading body: {e}")))?;

        let rows = parse_occurrences(&body)?;
        info!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            rows = rows.len(),
            "Fetched occurrences"
        );
        Ok(rows)
    }

    fn describe(&self) -> SourceInfo {
        SourceInfo {
            source_type: "api".to_string(),
            location: self.endpoint.clone(),
        }
    }
}

/// One-shot fetch with the default timeouts.
pub async fn fetch_occurrences(
    endpoint: &str,
    auth_token: &str,
) -> Result<Vec<RawOccurrence>, EtlError> {
    let defaults = SourceConfig::default();
    HttpOccurrenceSource::new(
        endpoint,
        auth_token,
        defaults.timeout(),
        defaults.connect_timeout(),
    )?
    .fetch()
    .await
}

// ---------------------------------------------------------------------------
// JsonFileOccurrenceSource
// ---------------------------------------------------------------------------

/// A previously saved API response, for replaying a run offline.
pub struct JsonFileOccurrenceSource {
    pub path: PathBuf,
}

impl JsonFileOccurrenceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OccurrenceSource for JsonFileOccurrenceSource {
    async fn fetch(&self) -> Result<Vec<RawOccurrence>, EtlError> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EtlError::SourceUnavailable {
                endpoint: self.path.display().to_string(),
                status: None,
                message: format!("cannot read file: {e}"),
            }
        })?;
        let rows = parse_occurrences(&body)?;
        info!(path = %self.path.display(), rows = rows.len(), "Loaded occurrences from file");
        Ok(rows)
    }

    fn describe(&self) -> SourceInfo {
        SourceInfo {
            source_type: "file".to_string(),
            location: self.path.display().to_string(),
        }
    }
}
