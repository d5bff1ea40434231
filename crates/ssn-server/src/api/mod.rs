mod find_help;
mod geocode;
mod providers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ssn_core::ServiceRecord;
use ssn_geocode::{GeocodeClient, GeocodeError};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{Catalog, CatalogLoad};
use crate::middleware::{enforce_rate_limit, request_id, RateLimitState};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    /// `None` when no geocoding API key is configured.
    pub geocoder: Option<Arc<GeocodeClient>>,
    pub geolocation_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    catalog: &'static str,
    source: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "catalog_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// The full service list, or a `catalog_unavailable` error.
pub(super) async fn require_services(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<[ServiceRecord]>, ApiError> {
    match state.catalog.services().await {
        CatalogLoad::Available(services) => Ok(services),
        CatalogLoad::Unavailable => Err(catalog_unavailable(request_id)),
    }
}

pub(super) fn catalog_unavailable(request_id: &str) -> ApiError {
    ApiError::new(
        request_id,
        "catalog_unavailable",
        "service catalog is temporarily unavailable",
    )
}

/// Both cases are a 500; `error.code` tells a missing credential
/// (`geocoding_unconfigured`) apart from an upstream failure (`geocode_failed`).
pub(super) fn map_geocode_error(request_id: String, error: &GeocodeError) -> ApiError {
    if matches!(error, GeocodeError::NotConfigured) {
        tracing::error!("geocode requested but SSN_GEOCODE_API_KEY is not configured");
        return ApiError::new(
            request_id,
            "geocoding_unconfigured",
            "geocoding is not configured on this server",
        );
    }
    tracing::warn!(error = %error, "geocode lookup failed");
    ApiError::new(request_id, "geocode_failed", "could not resolve postcode")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Routes that call the paid geocoding upstream, behind the rate limiter.
fn geocoding_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/geocode", get(geocode::geocode_postcode))
        .route("/api/find-help", get(find_help::find_help))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/get-service-providers",
            get(providers::list_service_providers),
        )
        .route("/api/get-locations", get(providers::list_locations))
        .route(
            "/api/service-categories",
            get(providers::list_service_categories),
        )
        .route(
            "/api/organisations/{slug}",
            get(providers::get_organisation),
        );

    Router::new()
        .merge(public_routes)
        .merge(geocoding_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let source = state.catalog.mode();

    match state.catalog.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                catalog: "ok",
                source,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: catalog unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    catalog: "unavailable",
                    source,
                }),
            )
        }
    }
}

pub fn rate_limit_state(max_per_minute: usize) -> RateLimitState {
    RateLimitState::new(max_per_minute, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
