mod db;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;
use crate::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "ssn-cli")]
#[command(about = "Support services finder command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Resolve a UK postcode to coordinates
    Geocode {
        /// Postcode or outward code, e.g. "LN1 1AA"
        postcode: String,
    },
    /// Search the catalog and print ranked results
    Search(SearchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ssn_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => db::run(&config, command).await,
        Some(Commands::Geocode { postcode }) => search::run_geocode(&config, &postcode).await,
        Some(Commands::Search(args)) => search::run_search(&config, args).await,
        None => {
            println!("ssn-cli ready; run `ssn-cli --help` for commands");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
