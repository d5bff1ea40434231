//! Turns a device position or a postcode into a session [`Location`].
//!
//! Every attempt takes a new generation number. A result is only written to
//! the session if no newer attempt has started in the meantime, so a slow
//! geocode for an old postcode can never overwrite a newer one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ssn_core::{Coordinates, Location};
use tokio::sync::Mutex;

use crate::client::GeocodeClient;
use crate::error::{GeocodeError, ResolveError};
use crate::postcode::normalize_postcode;

/// Default bound on waiting for a device position.
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can turn a normalised postcode into coordinates.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, postcode: &str)
        -> impl Future<Output = Result<Coordinates, GeocodeError>> + Send;
}

impl Geocoder for GeocodeClient {
    async fn geocode(&self, postcode: &str) -> Result<Coordinates, GeocodeError> {
        GeocodeClient::geocode(self, postcode).await
    }
}

impl<T: Geocoder> Geocoder for Arc<T> {
    fn geocode(
        &self,
        postcode: &str,
    ) -> impl Future<Output = Result<Coordinates, GeocodeError>> + Send {
        (**self).geocode(postcode)
    }
}

/// A missing geocoder fails every lookup with [`GeocodeError::NotConfigured`].
impl<T: Geocoder> Geocoder for Option<T> {
    async fn geocode(&self, postcode: &str) -> Result<Coordinates, GeocodeError> {
        match self {
            Some(geocoder) => geocoder.geocode(postcode).await,
            None => Err(GeocodeError::NotConfigured),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("position permission denied")]
    Denied,
    #[error("position unavailable")]
    Unavailable,
}

/// Source of the device's current position.
pub trait PositionProvider: Send + Sync {
    fn current_position(&self)
        -> impl Future<Output = Result<Coordinates, PositionError>> + Send;
}

/// Position a browser reported alongside a request.
///
/// `None` means the browser did not share one, which is handled exactly like a
/// denied permission prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedPosition(pub Option<Coordinates>);

impl ReportedPosition {
    #[must_use]
    pub fn from_query(lat: Option<f64>, lng: Option<f64>) -> Self {
        Self(Coordinates::from_parts(lat, lng))
    }
}

impl PositionProvider for ReportedPosition {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        match self.0 {
            Some(coords) if coords.is_valid() => Ok(coords),
            Some(_) => Err(PositionError::Unavailable),
            None => Err(PositionError::Denied),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Location),
    /// The device path failed or timed out; ask the user for a postcode.
    ManualEntry,
    /// A newer attempt started while this one was in flight; result dropped.
    Stale,
}

/// Resolves and caches the user's location for one session.
pub struct LocationResolver<G> {
    geocoder: G,
    geolocation_timeout: Duration,
    generation: AtomicU64,
    current: Mutex<Option<Location>>,
}

impl<G: Geocoder> LocationResolver<G> {
    pub fn new(geocoder: G, geolocation_timeout: Duration) -> Self {
        Self {
            geocoder,
            geolocation_timeout,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Ask the device for its position, bounded by the geolocation timeout.
    ///
    /// Denial, unavailability and timeout all fall back to
    /// [`Resolution::ManualEntry`]; none of them is an error.
    pub async fn locate_device<P: PositionProvider>(&self, provider: &P) -> Resolution {
        let generation = self.next_generation();

        match tokio::time::timeout(self.geolocation_timeout, provider.current_position()).await {
            Ok(Ok(coords)) => self.commit(generation, Location::from_coordinates(coords)).await,
            Ok(Err(e)) => {
                tracing::debug!(
                    error = %e,
                    "device position unavailable; falling back to postcode entry"
                );
                Resolution::ManualEntry
            }
            Err(_) => {
                tracing::debug!(
                    timeout_secs = self.geolocation_timeout.as_secs(),
                    "device position timed out; falling back to postcode entry"
                );
                Resolution::ManualEntry
            }
        }
    }

    /// Resolve a free-text postcode.
    ///
    /// Input is validated before anything else, so invalid input never reaches
    /// the geocoder. Resubmitting the postcode already held by the session
    /// returns the cached location without a lookup.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Validation`] for blank or malformed input.
    /// - [`ResolveError::Geocode`] when the single lookup fails.
    pub async fn submit_postcode(&self, raw: &str) -> Result<Resolution, ResolveError> {
        let postcode = normalize_postcode(raw)?;
        let generation = self.next_generation();

        if let Some(cached) = self.cached_for(&postcode).await {
            return Ok(Resolution::Resolved(cached));
        }

        let result = self.geocoder.geocode(&postcode).await;

        if !self.is_current(generation) {
            tracing::debug!(
                postcode = %postcode,
                "discarding geocode result from a superseded submission"
            );
            return Ok(Resolution::Stale);
        }

        let coords = result.inspect_err(|e| {
            tracing::warn!(error = %e, postcode = %postcode, "could not resolve postcode");
        })?;
        Ok(self.commit(generation, Location::from_postcode(postcode, coords)).await)
    }

    /// The location currently held by the session, if any.
    pub async fn current(&self) -> Option<Location> {
        self.current.lock().await.clone()
    }

    /// Forget the session location and drop any in-flight result.
    pub async fn clear(&self) {
        self.next_generation();
        *self.current.lock().await = None;
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn cached_for(&self, postcode: &str) -> Option<Location> {
        self.current
            .lock()
            .await
            .as_ref()
            .filter(|loc| loc.postcode() == Some(postcode) && loc.coordinates().is_some())
            .cloned()
    }

    async fn commit(&self, generation: u64, location: Location) -> Resolution {
        let mut current = self.current.lock().await;
        if !self.is_current(generation) {
            return Resolution::Stale;
        }
        *current = Some(location.clone());
        Resolution::Resolved(location)
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
