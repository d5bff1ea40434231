use sqlx::{PgPool, Postgres, Transaction};
use ssn_core::{CatalogSnapshot, LocationEntry, ServiceRecord};

use crate::DbError;

/// Row counts written by [`seed_snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub organisations: usize,
    pub services: usize,
    pub locations: usize,
}

/// Upsert a catalog snapshot into the database.
///
/// Organisations are keyed by slug, services and locations by their external
/// id. A service's open times are replaced wholesale. Everything runs inside
/// a single transaction; if any statement fails the whole batch is rolled
/// back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_snapshot(
    pool: &PgPool,
    snapshot: &CatalogSnapshot,
) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();
    let mut seen_orgs = std::collections::HashSet::new();

    for service in &snapshot.services {
        let organisation_id = upsert_organisation(&mut tx, service).await?;
        if seen_orgs.insert(organisation_id) {
            summary.organisations += 1;
        }
        upsert_service(&mut tx, organisation_id, service).await?;
        summary.services += 1;
    }

    for location in &snapshot.locations {
        upsert_location(&mut tx, location).await?;
        summary.locations += 1;
    }

    tx.commit().await?;
    Ok(summary)
}

async fn upsert_organisation(
    tx: &mut Transaction<'_, Postgres>,
    service: &ServiceRecord,
) -> Result<i64, sqlx::Error> {
    // Snapshots without an organisation id fall back to the slug.
    let external_id = service
        .organisation_id
        .as_deref()
        .unwrap_or(&service.organisation_slug);

    sqlx::query_scalar(
        "INSERT INTO organisations (external_id, slug, name, postcode, verified) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (slug) DO UPDATE SET \
             external_id = EXCLUDED.external_id, \
             name = EXCLUDED.name, \
             postcode = EXCLUDED.postcode, \
             verified = EXCLUDED.verified, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(external_id)
    .bind(&service.organisation_slug)
    .bind(&service.organisation)
    .bind(&service.org_postcode)
    .bind(service.verified)
    .fetch_one(&mut **tx)
    .await
}

async fn upsert_service(
    tx: &mut Transaction<'_, Postgres>,
    organisation_id: i64,
    service: &ServiceRecord,
) -> Result<(), sqlx::Error> {
    // A half-known coordinate is stored as unknown.
    let coords = service.coordinates();

    let service_id: i64 = sqlx::query_scalar(
        "INSERT INTO services (external_id, organisation_id, name, category, sub_category, \
                               description, client_groups, latitude, longitude) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (external_id) DO UPDATE SET \
             organisation_id = EXCLUDED.organisation_id, \
             name = EXCLUDED.name, \
             category = EXCLUDED.category, \
             sub_category = EXCLUDED.sub_category, \
             description = EXCLUDED.description, \
             client_groups = EXCLUDED.client_groups, \
             latitude = EXCLUDED.latitude, \
             longitude = EXCLUDED.longitude, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(&service.id)
    .bind(organisation_id)
    .bind(&service.name)
    .bind(&service.category)
    .bind(&service.sub_category)
    .bind(&service.description)
    .bind(&service.client_groups)
    .bind(coords.map(|c| c.lat))
    .bind(coords.map(|c| c.lng))
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM service_open_times WHERE service_id = $1")
        .bind(service_id)
        .execute(&mut **tx)
        .await?;

    for open in &service.open_times {
        sqlx::query(
            "INSERT INTO service_open_times (service_id, day, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(service_id)
        .bind(&open.day)
        .bind(&open.start)
        .bind(&open.end)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn upsert_location(
    tx: &mut Transaction<'_, Postgres>,
    location: &LocationEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO locations (external_id, name, slug) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (external_id) DO UPDATE SET \
             name = EXCLUDED.name, \
             slug = EXCLUDED.slug, \
             updated_at = NOW()",
    )
    .bind(&location.id)
    .bind(&location.name)
    .bind(&location.slug)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
