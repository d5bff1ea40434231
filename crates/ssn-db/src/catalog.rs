//! Read queries for the service catalog and the location navigation list.

use sqlx::types::Json;
use sqlx::PgPool;
use ssn_core::{LocationEntry, OpenTime, ServiceRecord};

/// A service joined with its organisation and aggregated open times.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub description: Option<String>,
    pub client_groups: Vec<String>,
    pub organisation_id: String,
    pub organisation: String,
    pub organisation_slug: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub org_postcode: Option<String>,
    pub verified: bool,
    pub open_times: Json<Vec<OpenTime>>,
}

impl From<ServiceRow> for ServiceRecord {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            sub_category: row.sub_category,
            description: row.description,
            open_times: row.open_times.0,
            client_groups: row.client_groups,
            organisation_id: Some(row.organisation_id),
            organisation: row.organisation,
            organisation_slug: row.organisation_slug,
            latitude: row.latitude,
            longitude: row.longitude,
            org_postcode: row.org_postcode,
            verified: row.verified,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationRow {
    pub external_id: String,
    pub name: String,
    pub slug: String,
}

impl From<LocationRow> for LocationEntry {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.external_id,
            name: row.name,
            slug: row.slug,
        }
    }
}

/// Load every service flattened with its organisation, in insertion order.
///
/// No filtering happens here; the search engine works on the full set.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_service_records(pool: &PgPool) -> Result<Vec<ServiceRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ServiceRow>(
        "SELECT s.external_id AS id, s.name, s.category, s.sub_category, \
                s.description, s.client_groups, \
                o.external_id AS organisation_id, o.name AS organisation, \
                o.slug AS organisation_slug, \
                s.latitude::float8 AS latitude, s.longitude::float8 AS longitude, \
                o.postcode AS org_postcode, o.verified, \
                COALESCE(( \
                    SELECT json_agg(json_build_object( \
                               'day', t.day, 'start', t.starts_at, 'end', t.ends_at) \
                           ORDER BY t.id) \
                    FROM service_open_times t \
                    WHERE t.service_id = s.id \
                ), '[]'::json) AS open_times \
         FROM services s \
         JOIN organisations o ON o.id = s.organisation_id \
         ORDER BY s.id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ServiceRecord::from).collect())
}

/// Location navigation entries, sorted case-insensitively by name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_locations(pool: &PgPool) -> Result<Vec<LocationEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT external_id, name, slug FROM locations ORDER BY LOWER(name), name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LocationEntry::from).collect())
}
