use std::path::PathBuf;

use crate::app_config::AppConfig;
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

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the real environment so it
/// can be tested with a pure `HashMap` lookup.
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

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let catalog_base_url = require("CATSYNC_CATALOG_BASE_URL")?;
    let catalog_api_token = lookup("CATSYNC_CATALOG_API_TOKEN").ok();

    let log_level = or_default("CATSYNC_LOG_LEVEL", "info");
    let suppliers_path = PathBuf::from(or_default(
        "CATSYNC_SUPPLIERS_PATH",
        "./config/suppliers.yaml",
    ));

    let request_timeout_secs = parse_u64("CATSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CATSYNC_USER_AGENT", "catsync/0.1 (catalog-sync)");
    let max_retries = parse_u32("CATSYNC_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("CATSYNC_RETRY_BACKOFF_BASE_SECS", "5")?;

    let batch_pause_every = parse_usize("CATSYNC_BATCH_PAUSE_EVERY", "1000")?;
    let batch_pause_secs = parse_u64("CATSYNC_BATCH_PAUSE_SECS", "10")?;

    let image_dir = PathBuf::from(or_default("CATSYNC_IMAGE_DIR", "./media/feed-images"));
    let image_concurrency = parse_usize("CATSYNC_IMAGE_CONCURRENCY", "10")?;

    Ok(AppConfig {
        catalog_base_url,
        catalog_api_token,
        log_level,
        suppliers_path,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        batch_pause_every,
        batch_pause_secs,
        image_dir,
        image_concurrency,
    })
}
