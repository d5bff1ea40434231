use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where the service catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A pre-fetched snapshot file, loaded once at startup.
    Snapshot(PathBuf),
    /// Live queries against Postgres on every request.
    Live,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::Snapshot(path) => write!(f, "snapshot ({})", path.display()),
            CatalogSource::Live => write!(f, "live"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub catalog_source: CatalogSource,
    /// Required when `catalog_source` is [`CatalogSource::Live`].
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocode_api_key: Option<String>,
    pub geocode_base_url: String,
    pub geocode_timeout_secs: u64,
    pub geolocation_timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_source", &self.catalog_source)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "geocode_api_key",
                &self.geocode_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocode_base_url", &self.geocode_base_url)
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .field("geolocation_timeout_secs", &self.geolocation_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
