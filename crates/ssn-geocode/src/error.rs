use thiserror::Error;

/// Errors returned by the geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network, TLS, timeout or non-2xx failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered but reported a non-OK status.
    #[error("geocoding service returned status {status}: {message}")]
    Upstream { status: String, message: String },

    /// The upstream found nothing for the postcode.
    #[error("no results for postcode {postcode}")]
    NoResults { postcode: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid geocoding base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// No geocoder is configured (no API key).
    #[error("geocoding is not configured")]
    NotConfigured,
}

/// Postcode input rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostcodeError {
    #[error("postcode is required")]
    Empty,

    #[error("postcode is longer than {max} characters")]
    TooLong { max: usize },

    #[error("postcode must contain letters or digits")]
    InvalidCharacters,
}

/// Why a postcode submission did not produce a location.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] PostcodeError),

    #[error("could not resolve postcode: {0}")]
    Geocode(#[from] GeocodeError),
}
