use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use ssn_core::ServiceRecord;
use ssn_search::{group_by_category, group_by_organisation, CategoryBucket, OrganisationGroup};

use crate::catalog::CatalogLoad;
use crate::middleware::RequestId;

use super::{catalog_unavailable, require_services, ApiError, AppState};

/// Flat list of every service with its organisation fields.
pub(super) async fn list_service_providers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let services = require_services(&state, &req_id.0).await?;
    Ok(Json(&*services).into_response())
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    match state.catalog.locations().await {
        CatalogLoad::Available(locations) => Ok(Json(&*locations).into_response()),
        CatalogLoad::Unavailable => Err(catalog_unavailable(&req_id.0)),
    }
}

pub(super) async fn list_service_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<Vec<CategoryBucket>>, ApiError> {
    let services = require_services(&state, &req_id.0).await?;
    Ok(Json(group_by_category(&services)))
}

pub(super) async fn get_organisation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<OrganisationGroup>, ApiError> {
    let services = require_services(&state, &req_id.0).await?;
    let owned: Vec<ServiceRecord> = services
        .iter()
        .filter(|s| s.organisation_slug == slug)
        .cloned()
        .collect();

    group_by_organisation(&owned)
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| {
            ApiError::new(
                req_id.0,
                "not_found",
                format!("organisation '{slug}' not found"),
            )
        })
}
