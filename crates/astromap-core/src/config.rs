use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
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
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
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

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let secs = or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if secs == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(secs)
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, format!("expected a boolean, got '{raw}'"))),
        }
    };

    let env = parse_environment(&or_default("ASTROMAP_ENV", "development"));
    let bind_addr = parse_addr("ASTROMAP_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ASTROMAP_LOG_LEVEL", "info");
    let cities_path = PathBuf::from(or_default(
        "ASTROMAP_CITIES_PATH",
        "./data/world_cities.csv",
    ));
    let results_dir = PathBuf::from(or_default("ASTROMAP_RESULTS_DIR", "./data/results"));

    let tz_lookup_url = or_default("ASTROMAP_TZ_LOOKUP_URL", "https://timeapi.io/api/");
    let tz_lookup_timeout_secs = parse_secs("ASTROMAP_TZ_LOOKUP_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("ASTROMAP_USER_AGENT", "astromap/0.1 (power-spots)");

    let request_timeout_secs = parse_secs("ASTROMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let match_parallel = parse_bool("ASTROMAP_MATCH_PARALLEL", "true")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        cities_path,
        results_dir,
        tz_lookup_url,
        tz_lookup_timeout_secs,
        user_agent,
        request_timeout_secs,
        match_parallel,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
