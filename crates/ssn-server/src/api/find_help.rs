//! `GET /api/find-help`: resolve the searcher's location, load the catalog,
//! then filter, rank and page the results in one request.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use ssn_core::Location;
use ssn_geocode::{LocationResolver, ReportedPosition, Resolution, ResolveError};
use ssn_search::{apply, paginate, FilterState, Page, RankedResult, SortOrder};

use crate::catalog::CatalogLoad;
use crate::middleware::RequestId;

use super::{map_geocode_error, ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FindHelpQuery {
    pub postcode: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub client_group: Option<String>,
    pub sort: Option<SortOrder>,
    pub radius: Option<f64>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl FindHelpQuery {
    fn filters(&self) -> FilterState {
        FilterState {
            selected_category: self.category.clone(),
            selected_sub_category: self.sub_category.clone(),
            client_group: self.client_group.clone(),
            sort_order: self.sort.unwrap_or_default(),
            radius_km: self.radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum SearchStatus {
    Ok,
    NoMatches,
    CatalogUnavailable,
}

#[derive(Debug, Serialize)]
pub(super) struct FindHelpResponse {
    pub status: SearchStatus,
    pub location: Option<Location>,
    pub results: Page<RankedResult>,
}

pub(super) async fn find_help(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FindHelpQuery>,
) -> Result<Json<FindHelpResponse>, ApiError> {
    if query.radius.is_some_and(|r| !r.is_finite() || r < 0.0) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "radius must be a non-negative number of kilometres",
        ));
    }

    let location = resolve_location(&state, &req_id.0, &query).await?;
    let filters = query.filters();

    let (status, ranked) = match state.catalog.services().await {
        CatalogLoad::Available(services) => {
            let ranked = apply(&services, location.as_ref(), &filters);
            let status = if ranked.is_empty() {
                SearchStatus::NoMatches
            } else {
                SearchStatus::Ok
            };
            (status, ranked)
        }
        CatalogLoad::Unavailable => (SearchStatus::CatalogUnavailable, Vec::new()),
    };

    tracing::debug!(
        status = ?status,
        count = ranked.len(),
        sort = %filters.sort_order,
        "find-help search complete"
    );

    Ok(Json(FindHelpResponse {
        status,
        location,
        results: paginate(ranked, query.page, query.per_page),
    }))
}

/// Device path first, then postcode. No location at all is allowed and
/// simply leaves every result unranked.
async fn resolve_location(
    state: &AppState,
    request_id: &str,
    query: &FindHelpQuery,
) -> Result<Option<Location>, ApiError> {
    let resolver = LocationResolver::new(state.geocoder.clone(), state.geolocation_timeout);

    if query.lat.is_some() || query.lng.is_some() {
        let reported = ReportedPosition::from_query(query.lat, query.lng);
        if let Resolution::Resolved(location) = resolver.locate_device(&reported).await {
            return Ok(Some(location));
        }
    }

    let Some(raw) = query.postcode.as_deref() else {
        return Ok(None);
    };

    match resolver.submit_postcode(raw).await {
        Ok(Resolution::Resolved(location)) => Ok(Some(location)),
        Ok(Resolution::ManualEntry | Resolution::Stale) => Ok(None),
        Err(ResolveError::Validation(e)) => {
            Err(ApiError::new(request_id, "validation_error", e.to_string()))
        }
        Err(ResolveError::Geocode(e)) => Err(map_geocode_error(request_id.to_string(), &e)),
    }
}
