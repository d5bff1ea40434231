//! Postcode geocoding and user-location resolution.

pub mod client;
pub mod error;
pub mod postcode;
pub mod resolver;
pub mod types;

pub use client::GeocodeClient;
pub use error::{GeocodeError, PostcodeError, ResolveError};
pub use postcode::normalize_postcode;
pub use resolver::{
    Geocoder, LocationResolver, PositionError, PositionProvider, ReportedPosition, Resolution,
};
