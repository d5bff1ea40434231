//! Catalog loader shared by every handler.
//!
//! The loader never fails past its boundary: a load error is logged and
//! reported as [`CatalogLoad::Unavailable`] so callers can tell "no data"
//! apart from "no matches".

use std::sync::Arc;

use sqlx::PgPool;
use ssn_core::{CatalogSnapshot, LocationEntry, ServiceRecord};

/// Where the catalog comes from for the lifetime of the server.
#[derive(Clone)]
pub enum Catalog {
    /// Loaded once at startup and shared read-only.
    Snapshot {
        services: Arc<[ServiceRecord]>,
        locations: Arc<[LocationEntry]>,
    },
    /// Queried from Postgres on every request.
    Live(PgPool),
    /// The startup snapshot could not be loaded.
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLoad<T> {
    Available(T),
    Unavailable,
}

impl Catalog {
    /// Wraps a loaded snapshot, sorting its location list once up front.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let CatalogSnapshot {
            services,
            mut locations,
        } = snapshot;
        sort_locations(&mut locations);
        Self::Snapshot {
            services: services.into(),
            locations: locations.into(),
        }
    }

    pub async fn services(&self) -> CatalogLoad<Arc<[ServiceRecord]>> {
        match self {
            Self::Snapshot { services, .. } => CatalogLoad::Available(Arc::clone(services)),
            Self::Live(pool) => match ssn_db::list_service_records(pool).await {
                Ok(records) => CatalogLoad::Available(records.into()),
                Err(e) => {
                    tracing::error!(error = %e, "failed to load service catalog");
                    CatalogLoad::Unavailable
                }
            },
            Self::Missing => CatalogLoad::Unavailable,
        }
    }

    /// Location entries sorted by name, case-insensitively.
    pub async fn locations(&self) -> CatalogLoad<Arc<[LocationEntry]>> {
        match self {
            Self::Snapshot { locations, .. } => CatalogLoad::Available(Arc::clone(locations)),
            Self::Live(pool) => match ssn_db::list_locations(pool).await {
                Ok(mut locations) => {
                    sort_locations(&mut locations);
                    CatalogLoad::Available(locations.into())
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to load locations");
                    CatalogLoad::Unavailable
                }
            },
            Self::Missing => CatalogLoad::Unavailable,
        }
    }

    /// `Ok` when the catalog can currently be served.
    pub async fn health(&self) -> Result<(), String> {
        match self {
            Self::Snapshot { .. } => Ok(()),
            Self::Live(pool) => ssn_db::health_check(pool).await.map_err(|e| e.to_string()),
            Self::Missing => Err("catalog snapshot failed to load".to_string()),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } | Self::Missing => "snapshot",
            Self::Live(_) => "live",
        }
    }

    /// Close the database pool, if any. Called on graceful shutdown.
    pub async fn close(&self) {
        if let Self::Live(pool) = self {
            pool.close().await;
        }
    }
}

fn sort_locations(locations: &mut [LocationEntry]) {
    locations.sort_by_cached_key(|l| (l.name.to_lowercase(), l.name.clone()));
}
