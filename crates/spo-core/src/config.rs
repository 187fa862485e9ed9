use crate::app_config::AppConfig;
use crate::rates::ValuationPolicy;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so only malformed values fail.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
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

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let api_base_url = or_default("SPO_API_BASE_URL", "http://localhost:5000");
    url::Url::parse(&api_base_url).map_err(|e| invalid("SPO_API_BASE_URL", e.to_string()))?;

    let log_level = or_default("SPO_LOG_LEVEL", "info");
    let cache_ttl_secs = parse_u64("SPO_CACHE_TTL_SECS", "300")?;
    let request_timeout_secs = parse_u64("SPO_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SPO_USER_AGENT", "spo/0.1 (shopping-points-optimiser)");
    let max_retries = parse_u32("SPO_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("SPO_RETRY_BACKOFF_BASE_MS", "500")?;
    let include_absolute = parse_bool("SPO_RATE_INCLUDE_ABSOLUTE", "false")?;
    let shops_path = lookup("SPO_SHOPS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let session_cookie = lookup("SPO_SESSION_COOKIE")
        .ok()
        .filter(|c| !c.trim().is_empty());

    Ok(AppConfig {
        api_base_url,
        log_level,
        cache_ttl_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        valuation: ValuationPolicy { include_absolute },
        shops_path,
        session_cookie,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
