use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use ssn_core::{CatalogSnapshot, LocationEntry};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

fn service(
    id: &str,
    org: &str,
    category: Option<&str>,
    coords: Option<(f64, f64)>,
) -> ServiceRecord {
    ServiceRecord {
        id: id.to_string(),
        name: format!("{org} service"),
        category: category.map(str::to_string),
        sub_category: None,
        description: None,
        open_times: vec![],
        client_groups: vec!["adults".to_string()],
        organisation_id: Some(format!("org-{id}")),
        organisation: org.to_string(),
        organisation_slug: org.to_lowercase().replace(' ', "-"),
        latitude: coords.map(|c| c.0),
        longitude: coords.map(|c| c.1),
        org_postcode: None,
        verified: false,
    }
}

fn location(name: &str) -> LocationEntry {
    LocationEntry {
        id: format!("loc-{name}"),
        name: name.to_string(),
        slug: name.to_lowercase(),
    }
}

fn snapshot_catalog() -> Catalog {
    Catalog::from_snapshot(CatalogSnapshot {
        services: vec![
            service("1", "Beta Org", Some("health"), Some((53.1, -0.5))),
            service("2", "alpha org", Some("health"), Some((53.9, -1.9))),
            service("3", "Pantry", Some("food"), None),
        ],
        locations: vec![location("lincoln"), location("Boston")],
    })
}

fn app_with(catalog: Catalog, geocoder: Option<GeocodeClient>) -> Router {
    build_app(
        AppState {
            catalog,
            geocoder: geocoder.map(Arc::new),
            geolocation_timeout: Duration::from_secs(1),
        },
        rate_limit_state(120),
    )
}

fn mock_geocoder(server: &MockServer) -> GeocodeClient {
    GeocodeClient::with_base_url("test-key", 5, "ssn-test/0.1", &server.uri())
        .expect("geocode client")
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, headers, json)
}

fn names(results: &serde_json::Value) -> Vec<&str> {
    results["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["organisationName"].as_str().expect("organisationName"))
        .collect()
}

// -------------------------------------------------------------------------
// Error mapping
// -------------------------------------------------------------------------

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("geocode_failed", StatusCode::INTERNAL_SERVER_ERROR),
        ("catalog_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("geocoding_unconfigured", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

#[test]
fn geocode_errors_are_server_errors_told_apart_by_code() {
    let unconfigured = map_geocode_error("req-1".to_string(), &GeocodeError::NotConfigured);
    assert_eq!(unconfigured.error.code, "geocoding_unconfigured");
    assert_eq!(
        unconfigured.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let failed = map_geocode_error(
        "req-2".to_string(),
        &GeocodeError::NoResults {
            postcode: "ZZ9 9ZZ".to_string(),
        },
    );
    assert_eq!(failed.error.code, "geocode_failed");
    assert_eq!(
        failed.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// -------------------------------------------------------------------------
// Health and request ids
// -------------------------------------------------------------------------

#[tokio::test]
async fn health_ok_for_loaded_snapshot() {
    let (status, headers, json) = get(app_with(snapshot_catalog(), None), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["source"], "snapshot");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn health_degraded_when_snapshot_missing() {
    let (status, _, json) = get(app_with(Catalog::Missing, None), "/api/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["catalog"], "unavailable");
}

#[tokio::test]
async fn incoming_request_id_is_echoed() {
    let response = app_with(snapshot_catalog(), None)
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some("req-abc".as_bytes())
    );
}

// -------------------------------------------------------------------------
// Catalog endpoints
// -------------------------------------------------------------------------

#[tokio::test]
async fn service_providers_is_a_flat_array() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/get-service-providers",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["organisationName"], "Beta Org");
    assert_eq!(rows[0]["organisationId"], "org-1");
    assert_eq!(rows[0]["latitude"], 53.1);
    assert_eq!(rows[0]["verified"], false);
}

#[tokio::test]
async fn service_providers_reports_unavailable_catalog() {
    let (status, _, json) = get(
        app_with(Catalog::Missing, None),
        "/api/get-service-providers",
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "catalog_unavailable");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn locations_are_sorted_by_name() {
    let (status, _, json) = get(app_with(snapshot_catalog(), None), "/api/get-locations").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|l| l["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Boston", "lincoln"]);
}

#[tokio::test]
async fn service_categories_are_bucketed() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/service-categories",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|b| b["key"].as_str().expect("key"))
        .collect();
    assert_eq!(keys, vec!["food", "health"]);
    assert_eq!(json[1]["serviceCount"], 2);
}

#[tokio::test]
async fn service_categories_keep_a_category_named_other_apart_from_the_catch_all() {
    let catalog = Catalog::from_snapshot(CatalogSnapshot {
        services: vec![
            service("1", "Pantry", Some("other"), None),
            service("2", "Shelter", None, None),
        ],
        locations: vec![],
    });

    let (status, _, json) = get(app_with(catalog, None), "/api/service-categories").await;

    assert_eq!(status, StatusCode::OK);
    let buckets = json.as_array().expect("array");
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0]["key"], "other");
    assert_eq!(buckets[0]["isOther"], false);
    assert!(buckets[1]["key"].is_null());
    assert_eq!(buckets[1]["isOther"], true);
}

#[tokio::test]
async fn organisation_page_lists_its_services() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/organisations/beta-org",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Beta Org");
    assert_eq!(json["services"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unknown_organisation_is_404() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/organisations/nobody",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

// -------------------------------------------------------------------------
// Geocode endpoint
// -------------------------------------------------------------------------

#[tokio::test]
async fn geocode_without_api_key_is_500() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/geocode?postcode=LN1%201AA",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "geocoding_unconfigured");
}

#[tokio::test]
async fn geocode_missing_postcode_is_400_without_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_with(snapshot_catalog(), Some(mock_geocoder(&server)));
    let (status, _, json) = get(app.clone(), "/api/geocode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _, _) = get(app, "/api/geocode?postcode=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn geocode_returns_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "LN1 1AA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{ "geometry": { "location": { "lat": 53.2307, "lng": -0.5406 } } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, json) = get(
        app_with(snapshot_catalog(), Some(mock_geocoder(&server))),
        "/api/geocode?postcode=ln1%201aa",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"]["lat"], 53.2307);
    assert_eq!(json["location"]["lng"], -0.5406);
}

#[tokio::test]
async fn geocode_upstream_failure_is_500_geocode_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "bad key",
            "results": []
        })))
        .mount(&server)
        .await;

    let (status, _, json) = get(
        app_with(snapshot_catalog(), Some(mock_geocoder(&server))),
        "/api/geocode?postcode=LN1",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "geocode_failed");
}

// -------------------------------------------------------------------------
// Find-help pipeline
// -------------------------------------------------------------------------

#[tokio::test]
async fn find_help_ranks_by_distance_from_reported_position() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/find-help?lat=53.1&lng=-0.5&sort=distance",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["location"]["lat"], 53.1);
    assert_eq!(names(&json["results"]), vec!["Beta Org", "alpha org", "Pantry"]);
    assert_eq!(json["results"]["items"][0]["distanceKm"], 0.0);
    assert!(json["results"]["items"][2]["distanceKm"].is_null());
}

#[tokio::test]
async fn find_help_alpha_sort_works_without_location() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/find-help?sort=alpha",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["location"].is_null());
    assert_eq!(names(&json["results"]), vec!["alpha org", "Beta Org", "Pantry"]);
}

#[tokio::test]
async fn find_help_filters_and_reports_no_matches() {
    let app = app_with(snapshot_catalog(), None);

    let (_, _, json) = get(app.clone(), "/api/find-help?category=health").await;
    assert_eq!(json["results"]["total"], 2);

    let (status, _, json) = get(app, "/api/find-help?category=legal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "no_matches");
    assert_eq!(json["results"]["total"], 0);
}

#[tokio::test]
async fn find_help_radius_keeps_unranked_records() {
    let (_, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/find-help?lat=53.1&lng=-0.5&radius=5",
    )
    .await;

    assert_eq!(names(&json["results"]), vec!["Beta Org", "Pantry"]);
}

#[tokio::test]
async fn find_help_rejects_negative_radius() {
    let (status, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/find-help?radius=-1",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn find_help_paginates() {
    let (_, _, json) = get(
        app_with(snapshot_catalog(), None),
        "/api/find-help?sort=alpha&page=2&perPage=1",
    )
    .await;

    assert_eq!(json["results"]["page"], 2);
    assert_eq!(json["results"]["perPage"], 1);
    assert_eq!(json["results"]["totalPages"], 3);
    assert_eq!(names(&json["results"]), vec!["Beta Org"]);
}

#[tokio::test]
async fn find_help_distinguishes_unavailable_catalog() {
    let (status, _, json) = get(
        app_with(Catalog::Missing, None),
        "/api/find-help?sort=alpha",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "catalog_unavailable");
    assert_eq!(json["results"]["total"], 0);
}

#[tokio::test]
async fn find_help_blank_postcode_is_400_without_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _, json) = get(
        app_with(snapshot_catalog(), Some(mock_geocoder(&server))),
        "/api/find-help?postcode=%20",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn find_help_geocodes_postcode_when_no_position_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("address", "LN1 1AA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{ "geometry": { "location": { "lat": 53.9, "lng": -1.9 } } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, json) = get(
        app_with(snapshot_catalog(), Some(mock_geocoder(&server))),
        "/api/find-help?postcode=LN1%201AA",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"]["postcode"], "LN1 1AA");
    assert_eq!(names(&json["results"]), vec!["alpha org", "Beta Org", "Pantry"]);
}

#[tokio::test]
async fn find_help_prefers_reported_position_over_postcode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _, json) = get(
        app_with(snapshot_catalog(), Some(mock_geocoder(&server))),
        "/api/find-help?lat=53.1&lng=-0.5&postcode=LN1%201AA",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["location"]["postcode"].is_null());
}

#[tokio::test]
async fn find_help_geocode_failure_is_500_geocode_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, _, json) = get(
        app_with(snapshot_catalog(), Some(mock_geocoder(&server))),
        "/api/find-help?postcode=LN1",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "geocode_failed");
}

// -------------------------------------------------------------------------
// Rate limiting
// -------------------------------------------------------------------------

#[tokio::test]
async fn geocoding_routes_are_rate_limited_but_catalog_routes_are_not() {
    let app = build_app(
        AppState {
            catalog: snapshot_catalog(),
            geocoder: None,
            geolocation_timeout: Duration::from_secs(1),
        },
        rate_limit_state(1),
    );

    let (status, _, _) = get(app.clone(), "/api/find-help").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, json) = get(app.clone(), "/api/geocode?postcode=LN1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    for _ in 0..3 {
        let (status, _, _) = get(app.clone(), "/api/get-locations").await;
        assert_eq!(status, StatusCode::OK);
    }
}
