//! HTTP client for a Google-style geocoding API.
//!
//! Wraps `reqwest` with a bounded timeout, API key management and typed
//! response decoding. A non-`OK` `"status"` field in the JSON envelope is
//! surfaced as [`GeocodeError::Upstream`].

use std::time::Duration;

use reqwest::{Client, Url};
use ssn_core::Coordinates;

use crate::error::GeocodeError;
use crate::types::GeocodeResponse;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const GEOCODE_PATH: &str = "maps/api/geocode/json";

/// Geocoding client.
///
/// Use [`GeocodeClient::new`] for production or
/// [`GeocodeClient::with_base_url`] to point at a mock server in tests.
pub struct GeocodeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl GeocodeClient {
    /// Creates a client pointed at the production geocoding API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, GeocodeError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`GeocodeError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join` appends rather than replaces
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Resolves a (normalised) postcode to coordinates.
    ///
    /// Makes exactly one request; there is no retry.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Http`] on network failure, timeout or non-2xx status.
    /// - [`GeocodeError::Deserialize`] if the body is not the expected JSON.
    /// - [`GeocodeError::NoResults`] for `ZERO_RESULTS` or an empty result list.
    /// - [`GeocodeError::Upstream`] for any other non-`OK` status.
    pub async fn geocode(&self, postcode: &str) -> Result<Coordinates, GeocodeError> {
        let url = self.build_url(postcode)?;
        tracing::debug!(postcode, "geocoding postcode");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let parsed: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: format!("geocode(postcode={postcode})"),
                source: e,
            })?;

        match parsed.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => {
                return Err(GeocodeError::NoResults {
                    postcode: postcode.to_string(),
                })
            }
            _ => {
                return Err(GeocodeError::Upstream {
                    message: parsed
                        .error_message
                        .unwrap_or_else(|| "unknown error".to_string()),
                    status: parsed.status,
                })
            }
        }

        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResults {
                postcode: postcode.to_string(),
            })?;
        let location = first.geometry.location;
        Ok(Coordinates::new(location.lat, location.lng))
    }

    /// Builds the request URL with percent-encoded query parameters.
    fn build_url(&self, postcode: &str) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join(GEOCODE_PATH)
            .map_err(|e| GeocodeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("address", postcode)
            .append_pair("components", "country:GB")
            .append_pair("key", &self.api_key);
        Ok(url)
    }
}
