//! User position types.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a pair only when both halves are present.
    ///
    /// A lone latitude or longitude is treated as no coordinate at all.
    #[must_use]
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }

    /// True when both values are finite and inside the valid degree ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A resolved user position.
///
/// Always carries a postcode, a coordinate pair, or both. The constructors are
/// the only way to build one, so an empty `Location` cannot exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lng: Option<f64>,
}

impl Location {
    /// Position reported by a device.
    #[must_use]
    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self {
            postcode: None,
            lat: Some(coordinates.lat),
            lng: Some(coordinates.lng),
        }
    }

    /// Position resolved from a postcode by the geocoder.
    #[must_use]
    pub fn from_postcode(postcode: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            postcode: Some(postcode.into()),
            lat: Some(coordinates.lat),
            lng: Some(coordinates.lng),
        }
    }

    /// A postcode that has not (yet) been geocoded.
    ///
    /// Returns `None` for a blank postcode.
    #[must_use]
    pub fn postcode_only(postcode: impl Into<String>) -> Option<Self> {
        let postcode = postcode.into();
        if postcode.trim().is_empty() {
            return None;
        }
        Some(Self {
            postcode: Some(postcode),
            lat: None,
            lng: None,
        })
    }

    #[must_use]
    pub fn postcode(&self) -> Option<&str> {
        self.postcode.as_deref()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }
}
