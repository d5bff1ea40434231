use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use ssn_core::Coordinates;
use ssn_geocode::{normalize_postcode, Geocoder};

use crate::middleware::RequestId;

use super::{map_geocode_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeQuery {
    pub postcode: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct GeocodeResponse {
    pub location: Coordinates,
}

/// `GET /api/geocode?postcode=`: one upstream lookup, no retry.
pub(super) async fn geocode_postcode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>, ApiError> {
    let raw = query.postcode.unwrap_or_default();
    let postcode = normalize_postcode(&raw)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let location = state
        .geocoder
        .geocode(&postcode)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;

    tracing::debug!(postcode = %postcode, "postcode geocoded");
    Ok(Json(GeocodeResponse { location }))
}
