//! HTTP client for a coordinate-to-timezone web service.
//!
//! Speaks the `timeapi.io` shape: `GET {base}TimeZone/coordinate?latitude=..&longitude=..`
//! returning `{"timeZone": "America/Chicago", ...}`. A `400`, `404` or `422`
//! response, or a body with an empty or missing `timeZone`, means no zone
//! covers the point. Other non-success statuses are service failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::LookupError;
use crate::lookup::TimezoneLookup;

const COORDINATE_PATH: &str = "TimeZone/coordinate";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoordinateZoneResponse {
    #[serde(default)]
    time_zone: Option<String>,
}

/// Timezone lookup backed by a remote HTTP service.
pub struct HttpTimezoneLookup {
    client: Client,
    base_url: Url,
}

impl HttpTimezoneLookup {
    /// Creates a client against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`LookupError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| LookupError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    fn build_url(&self, latitude: f64, longitude: f64) -> Result<Url, LookupError> {
        let mut url = self
            .base_url
            .join(COORDINATE_PATH)
            .map_err(|e| LookupError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("latitude", &latitude.to_string())
            .append_pair("longitude", &longitude.to_string());
        Ok(url)
    }
}

/// Statuses the service uses for coordinates it cannot place.
fn status_means_no_zone(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
    )
}

#[async_trait]
impl TimezoneLookup for HttpTimezoneLookup {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<String>, LookupError> {
        let url = self.build_url(latitude, longitude)?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status_means_no_zone(status) {
            tracing::debug!(latitude, longitude, %status, "timezone service reported no zone");
            return Ok(None);
        }
        let body = response.error_for_status()?.text().await?;
        let parsed: CoordinateZoneResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        Ok(parsed
            .time_zone
            .map(|tz| tz.trim().to_owned())
            .filter(|tz| !tz.is_empty()))
    }
}
