use std::net::SocketAddr;
use std::path::PathBuf;

use crate::app_config::{
    AppConfig, DbSsl, Environment, DEFAULT_INGEST_BATCH_SIZE, DEFAULT_UPLOAD_MAX_BYTES,
    MAX_INGEST_BATCH_SIZE,
};
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
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

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

    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        or_default(var, &default.to_string())
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PDASH_ENV", "development"))?;

    let bind_addr = or_default("PDASH_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PDASH_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("PDASH_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("PDASH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PDASH_DB_MIN_CONNECTIONS", "0")?;
    let db_acquire_timeout_secs = parse_u64("PDASH_DB_ACQUIRE_TIMEOUT_SECS", "30")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "PDASH_DB_MIN_CONNECTIONS",
            format!("must not exceed PDASH_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let db_ssl = if parse_flag(&or_default("PDASH_DB_SSL", "false")) {
        let ca_path = lookup("PDASH_DB_SSL_CA_PATH").ok().map(PathBuf::from);
        if let Some(path) = &ca_path {
            if !path.exists() {
                return Err(invalid(
                    "PDASH_DB_SSL_CA_PATH",
                    format!("CA file not found at {}", path.display()),
                ));
            }
        }
        DbSsl::Required {
            verify: or_default("PDASH_DB_SSL_REJECT_UNAUTHORIZED", "true") != "false",
            ca_path,
            // Single-line env values carry PEM newlines as literal `\n`.
            ca_pem: lookup("PDASH_DB_SSL_CA")
                .ok()
                .map(|pem| pem.replace("\\n", "\n")),
        }
    } else {
        DbSsl::Disabled
    };

    let ingest_batch_size = parse_usize("PDASH_INGEST_BATCH_SIZE", DEFAULT_INGEST_BATCH_SIZE)?;
    if !(1..=MAX_INGEST_BATCH_SIZE).contains(&ingest_batch_size) {
        return Err(invalid(
            "PDASH_INGEST_BATCH_SIZE",
            format!("must be between 1 and {MAX_INGEST_BATCH_SIZE}, got {ingest_batch_size}"),
        ));
    }

    let upload_max_bytes = parse_usize("PDASH_UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?;
    let api_keys = parse_api_keys(&or_default("PDASH_API_KEYS", ""));

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        db_ssl,
        ingest_batch_size,
        upload_max_bytes,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PDASH_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

/// Comma-separated tokens, trimmed, blanks dropped.
fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// `true`, `1` and `yes` (any case) enable a flag; anything else disables it.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
