//! `geocode` and `search` command handlers.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use ssn_core::{AppConfig, CatalogSource, Location, ServiceRecord};
use ssn_geocode::{GeocodeClient, LocationResolver, ReportedPosition, Resolution};
use ssn_search::{apply, FilterState, RankedResult, SortOrder};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Postcode to search around
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub postcode: Option<String>,
    /// Latitude to search around (requires --lng)
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude to search around (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
    #[arg(long)]
    pub category: Option<String>,
    /// Only meaningful together with --category
    #[arg(long)]
    pub sub_category: Option<String>,
    #[arg(long)]
    pub client_group: Option<String>,
    /// Result order: distance or alpha
    #[arg(long, default_value_t = SortOrder::Distance)]
    pub sort: SortOrder,
    /// Drop results further than this many kilometres
    #[arg(long)]
    pub radius: Option<f64>,
    /// Read the catalog from this snapshot file instead of the configured source
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Maximum rows to print
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl SearchArgs {
    fn filters(&self) -> FilterState {
        FilterState {
            selected_category: self.category.clone(),
            selected_sub_category: self.sub_category.clone(),
            client_group: self.client_group.clone(),
            sort_order: self.sort,
            radius_km: self.radius,
        }
    }
}

fn geocoder(config: &AppConfig) -> anyhow::Result<Option<GeocodeClient>> {
    config
        .geocode_api_key
        .as_deref()
        .map(|key| {
            GeocodeClient::with_base_url(
                key,
                config.geocode_timeout_secs,
                &config.user_agent,
                &config.geocode_base_url,
            )
        })
        .transpose()
        .map_err(anyhow::Error::from)
}

pub(crate) async fn run_geocode(config: &AppConfig, postcode: &str) -> anyhow::Result<()> {
    let resolver = LocationResolver::new(
        geocoder(config)?,
        Duration::from_secs(config.geolocation_timeout_secs),
    );

    match resolver.submit_postcode(postcode).await? {
        Resolution::Resolved(location) => {
            print_location(&location);
            Ok(())
        }
        Resolution::ManualEntry | Resolution::Stale => {
            anyhow::bail!("postcode '{postcode}' did not resolve")
        }
    }
}

pub(crate) async fn run_search(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let services = load_services(config, args.snapshot.as_deref()).await?;
    let location = resolve_location(config, &args).await?;

    let results = apply(&services, location.as_ref(), &args.filters());
    if let Some(location) = &location {
        print_location(location);
    }

    if results.is_empty() {
        println!("no services match these filters");
        return Ok(());
    }

    print_results(&results, args.limit);
    Ok(())
}

async fn load_services(
    config: &AppConfig,
    snapshot_override: Option<&std::path::Path>,
) -> anyhow::Result<Vec<ServiceRecord>> {
    let source = snapshot_override.map_or_else(
        || config.catalog_source.clone(),
        |path| CatalogSource::Snapshot(path.to_path_buf()),
    );

    match source {
        CatalogSource::Snapshot(path) => Ok(ssn_core::load_snapshot(&path)?.services),
        CatalogSource::Live => {
            let pool = ssn_db::connect_pool_from_config(config).await?;
            let services = ssn_db::list_service_records(&pool).await;
            pool.close().await;
            Ok(services?)
        }
    }
}

async fn resolve_location(
    config: &AppConfig,
    args: &SearchArgs,
) -> anyhow::Result<Option<Location>> {
    let resolver = LocationResolver::new(
        geocoder(config)?,
        Duration::from_secs(config.geolocation_timeout_secs),
    );

    if args.lat.is_some() {
        let reported = ReportedPosition::from_query(args.lat, args.lng);
        return match resolver.locate_device(&reported).await {
            Resolution::Resolved(location) => Ok(Some(location)),
            Resolution::ManualEntry | Resolution::Stale => {
                anyhow::bail!("--lat/--lng are outside the valid coordinate range")
            }
        };
    }

    match args.postcode.as_deref() {
        Some(postcode) => match resolver.submit_postcode(postcode).await? {
            Resolution::Resolved(location) => Ok(Some(location)),
            Resolution::ManualEntry | Resolution::Stale => Ok(None),
        },
        None => Ok(None),
    }
}

fn print_location(location: &Location) {
    let postcode = location.postcode().unwrap_or("-");
    match location.coordinates() {
        Some(c) => println!("location: {postcode} ({:.5}, {:.5})", c.lat, c.lng),
        None => println!("location: {postcode}"),
    }
}

fn print_results(results: &[RankedResult], limit: usize) {
    let header = format!(
        "{:<10}{:<32}{:<20}SERVICE",
        "KM", "ORGANISATION", "CATEGORY"
    );
    println!("{header}");

    for result in results.iter().take(limit) {
        let record = &result.record;
        let distance = result
            .distance_km
            .map_or_else(|| "-".to_string(), |d| format!("{d:.1}"));
        println!(
            "{:<10}{:<32}{:<20}{}",
            distance,
            truncate(&record.organisation, 30),
            truncate(record.category.as_deref().unwrap_or("-"), 18),
            record.name
        );
    }

    if results.len() > limit {
        println!("... {} more (use --limit to show more)", results.len() - limit);
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max - 3).collect::<String>())
    } else {
        text.to_string()
    }
}
