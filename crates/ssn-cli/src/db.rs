//! Database command handlers.

use std::path::PathBuf;

use clap::Subcommand;
use ssn_core::AppConfig;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check the database connection
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Load a catalog snapshot into the database
    Seed {
        /// Snapshot file (.json, .yaml or .yml)
        #[arg(long, default_value = "./data/catalog.json")]
        file: PathBuf,
    },
}

pub(crate) async fn run(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = ssn_db::connect_pool_from_config(config).await?;

    let result = match command {
        DbCommands::Ping => run_ping(&pool).await,
        DbCommands::Migrate => run_migrate(&pool).await,
        DbCommands::Seed { file } => run_seed(&pool, &file).await,
    };

    pool.close().await;
    result
}

async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    ssn_db::health_check(pool).await?;
    println!("database ok");
    Ok(())
}

async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = ssn_db::run_migrations(pool).await?;
    if applied == 0 {
        println!("database is up to date");
    } else {
        println!("applied {applied} migration(s)");
    }
    Ok(())
}

/// Validates the snapshot before touching the database, then upserts it in
/// one transaction.
async fn run_seed(pool: &sqlx::PgPool, file: &std::path::Path) -> anyhow::Result<()> {
    let snapshot = ssn_core::load_snapshot(file)?;
    tracing::info!(
        path = %file.display(),
        services = snapshot.services.len(),
        locations = snapshot.locations.len(),
        "seeding catalog snapshot"
    );

    let summary = ssn_db::seed_snapshot(pool, &snapshot).await?;
    println!(
        "seeded {} organisation(s), {} service(s), {} location(s)",
        summary.organisations, summary.services, summary.locations
    );
    Ok(())
}
