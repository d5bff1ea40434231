use crate::app_config::{AppConfig, CatalogSource, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    // Empty strings count as unset so `.env` templates with blank values behave.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("SSN_ENV", "development"))?;

    let bind_addr = or_default("SSN_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SSN_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("SSN_LOG_LEVEL", "info");

    let snapshot_path = PathBuf::from(or_default(
        "SSN_CATALOG_SNAPSHOT_PATH",
        "./data/catalog.json",
    ));
    let catalog_source = match or_default("SSN_CATALOG_SOURCE", "snapshot").as_str() {
        "snapshot" => CatalogSource::Snapshot(snapshot_path),
        "live" => CatalogSource::Live,
        other => {
            return Err(invalid(
                "SSN_CATALOG_SOURCE",
                format!("expected 'snapshot' or 'live', got '{other}'"),
            ))
        }
    };

    let database_url = optional("DATABASE_URL");
    if catalog_source == CatalogSource::Live && database_url.is_none() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }

    let db_max_connections = parse_u32("SSN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SSN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SSN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let geocode_api_key = optional("SSN_GEOCODE_API_KEY");
    let geocode_base_url = or_default("SSN_GEOCODE_BASE_URL", "https://maps.googleapis.com");
    let geocode_timeout_secs = parse_u64("SSN_GEOCODE_TIMEOUT_SECS", "10")?;
    let geolocation_timeout_secs = parse_u64("SSN_GEOLOCATION_TIMEOUT_SECS", "10")?;
    if geocode_timeout_secs == 0 {
        return Err(invalid(
            "SSN_GEOCODE_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let user_agent = or_default("SSN_USER_AGENT", "ssn/0.1 (find-help)");
    let rate_limit_per_minute = parse_usize("SSN_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_source,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        geocode_api_key,
        geocode_base_url,
        geocode_timeout_secs,
        geolocation_timeout_secs,
        user_agent,
        rate_limit_per_minute,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SSN_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
