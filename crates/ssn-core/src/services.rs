//! Service catalog record types.

use serde::{Deserialize, Serialize};

use crate::location::Coordinates;

/// One opening window of a service, e.g. Monday 09:00-17:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTime {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// A service flattened together with the fields of its owning organisation.
///
/// Category, subcategory and coordinates are optional; records without
/// coordinates are still listed but never ranked by distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub open_times: Vec<OpenTime>,
    #[serde(default)]
    pub client_groups: Vec<String>,
    #[serde(default)]
    pub organisation_id: Option<String>,
    #[serde(rename = "organisationName", alias = "organisation")]
    pub organisation: String,
    pub organisation_slug: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "postcode", alias = "orgPostcode", default)]
    pub org_postcode: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl ServiceRecord {
    /// The service's position, if both latitude and longitude are known.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

/// An entry in the location navigation list (e.g. a town page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub id: String,
    pub name: String,
    pub slug: String,
}
