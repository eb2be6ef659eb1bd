//! Report service client.
//!
//! POSTs `{lat, lon, date}` to the configured endpoint and decodes the
//! weather analysis package it returns.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::errors::FetchError;
use crate::models::{Report, ReportRequest};

/// Anything that can produce a report for a (location, date) request.
///
/// The returned future owns everything it needs so it can be spawned and
/// aborted independently of the source.
pub trait ReportSource: Send + Sync {
    fn fetch_report(&self, request: ReportRequest) -> BoxFuture<'static, Result<Report, FetchError>>;
}

/// HTTP client for the report service.
#[derive(Debug, Clone)]
pub struct HttpReportClient {
    client: reqwest::Client,
    url: String,
}

impl HttpReportClient {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| FetchError::Transport(format!("Invalid User-Agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Fetch one report.
    pub async fn fetch(&self, request: ReportRequest) -> Result<Report, FetchError> {
        tracing::debug!(
            "Requesting report for ({:.4}, {:.4}) on {}",
            request.lat,
            request.lon,
            request.date
        );

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("report request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("report body read failed: {}", e)))?;

        let raw: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Decode(format!("report JSON parse error: {}", e)))?;

        Report::from_value(raw)
            .map_err(|e| FetchError::Decode(format!("report structure error: {}", e)))
    }
}

impl ReportSource for HttpReportClient {
    fn fetch_report(&self, request: ReportRequest) -> BoxFuture<'static, Result<Report, FetchError>> {
        let this = self.clone();
        Box::pin(async move { this.fetch(request).await })
    }
}
