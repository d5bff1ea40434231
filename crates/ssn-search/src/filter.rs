//! Filter, rank and sort a service catalog for one search.

use std::cmp::Ordering;
use std::str::FromStr;

use icu_collator::{Collator, CollatorOptions, Strength};
use icu_locid::locale;
use serde::{Deserialize, Serialize};
use ssn_core::{Location, ServiceRecord};

use crate::distance::distance_km;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Nearest first; records without a distance go last.
    #[default]
    Distance,
    /// By organisation name, case-insensitive, in en-GB collation order.
    Alpha,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Distance => write!(f, "distance"),
            SortOrder::Alpha => write!(f, "alpha"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(Self::Distance),
            "alpha" => Ok(Self::Alpha),
            other => Err(format!(
                "unknown sort order '{other}'; expected 'distance' or 'alpha'"
            )),
        }
    }
}

/// User-selected filters for one search.
///
/// Blank strings are treated the same as unset, matching how an "All" option
/// in a select box submits an empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub selected_category: Option<String>,
    #[serde(default)]
    pub selected_sub_category: Option<String>,
    #[serde(default)]
    pub client_group: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Drop records further away than this many kilometres.
    #[serde(default)]
    pub radius_km: Option<f64>,
}

/// A catalog record plus its distance from the searcher, when known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    #[serde(flatten)]
    pub record: ServiceRecord,
    pub distance_km: Option<f64>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

/// en-GB collator at secondary strength: accents are significant, case is
/// not, so "École" sorts between "Abbey" and "Zebra" and equals "école".
fn organisation_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    Collator::try_new(&locale!("en-GB").into(), options).ok()
}

fn compare_organisations(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Run the filter/rank/sort pipeline.
///
/// 1. keep only `selected_category` matches (exact, case-sensitive);
/// 2. then `selected_sub_category` matches, but only when a category is set;
/// 3. then records whose client groups contain `client_group`;
/// 4. attach a distance when both the location and the record have coordinates;
/// 5. sort stably by distance (unknown last) or by organisation name;
/// 6. drop records beyond `radius_km`. Records with no distance are kept.
///
/// The input slice is left untouched. With no location every distance is
/// unknown, so distance ordering keeps the input order.
#[must_use]
pub fn apply(
    services: &[ServiceRecord],
    location: Option<&Location>,
    filters: &FilterState,
) -> Vec<RankedResult> {
    let category = non_blank(filters.selected_category.as_ref());
    let sub_category = category.and(non_blank(filters.selected_sub_category.as_ref()));
    let client_group = non_blank(filters.client_group.as_ref());
    let origin = location.and_then(Location::coordinates);

    let mut results: Vec<RankedResult> = services
        .iter()
        .filter(|s| category.is_none_or(|c| s.category.as_deref() == Some(c)))
        .filter(|s| sub_category.is_none_or(|sc| s.sub_category.as_deref() == Some(sc)))
        .filter(|s| client_group.is_none_or(|g| s.client_groups.iter().any(|cg| cg == g)))
        .map(|s| RankedResult {
            distance_km: distance_km(origin, s.coordinates()),
            record: s.clone(),
        })
        .collect();

    match filters.sort_order {
        // `sort_by` is stable, so equal keys keep their input order.
        SortOrder::Distance => {
            results.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
        }
        SortOrder::Alpha => {
            let collator = organisation_collator();
            results.sort_by(|a, b| {
                compare_organisations(
                    collator.as_ref(),
                    &a.record.organisation,
                    &b.record.organisation,
                )
            });
        }
    }

    if let Some(radius) = filters.radius_km.filter(|r| !r.is_nan()) {
        results.retain(|r| r.distance_km.is_none_or(|d| d <= radius));
    }

    results
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
