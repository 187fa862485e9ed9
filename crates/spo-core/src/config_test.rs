use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.api_base_url, "http://localhost:5000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.cache_ttl_secs, 300);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "spo/0.1 (shopping-points-optimiser)");
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 500);
    assert!(!cfg.valuation.include_absolute);
    assert!(cfg.shops_path.is_none());
    assert!(cfg.session_cookie.is_none());
}

#[test]
fn build_app_config_overrides() {
    let mut map = HashMap::new();
    map.insert("SPO_API_BASE_URL", "https://points.example.com");
    map.insert("SPO_CACHE_TTL_SECS", "60");
    map.insert("SPO_MAX_RETRIES", "0");
    map.insert("SPO_RATE_INCLUDE_ABSOLUTE", "TRUE");
    map.insert("SPO_SHOPS_PATH", "./config/shops.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).expect("overrides should be valid");
    assert_eq!(cfg.api_base_url, "https://points.example.com");
    assert_eq!(cfg.cache_ttl_secs, 60);
    assert_eq!(cfg.max_retries, 0);
    assert!(cfg.valuation.include_absolute);
    assert_eq!(
        cfg.shops_path.as_deref(),
        Some(std::path::Path::new("./config/shops.yaml"))
    );
}

#[test]
fn build_app_config_blank_shops_path_is_none() {
    let mut map = HashMap::new();
    map.insert("SPO_SHOPS_PATH", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.shops_path.is_none());
}

#[test]
fn build_app_config_rejects_invalid_base_url() {
    let mut map = HashMap::new();
    map.insert("SPO_API_BASE_URL", "localhost without scheme");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SPO_API_BASE_URL"),
        "expected InvalidEnvVar(SPO_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_ttl() {
    let mut map = HashMap::new();
    map.insert("SPO_CACHE_TTL_SECS", "five minutes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SPO_CACHE_TTL_SECS"),
        "expected InvalidEnvVar(SPO_CACHE_TTL_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_retries() {
    let mut map = HashMap::new();
    map.insert("SPO_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SPO_MAX_RETRIES"),
        "expected InvalidEnvVar(SPO_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_bool() {
    let mut map = HashMap::new();
    map.insert("SPO_RATE_INCLUDE_ABSOLUTE", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SPO_RATE_INCLUDE_ABSOLUTE"),
        "expected InvalidEnvVar(SPO_RATE_INCLUDE_ABSOLUTE), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_session_cookie() {
    let mut map = HashMap::new();
    map.insert("SPO_SESSION_COOKIE", "session=super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.session_cookie.as_deref(), Some("session=super-secret"));
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("super-secret"), "cookie leaked: {debug}");
    assert!(debug.contains("[redacted]"));
}

#[test]
fn build_app_config_ignores_unrelated_variables() {
    let mut map = HashMap::new();
    map.insert("SPO_ENV", "staging");
    map.insert("SPO_UNKNOWN", "whatever");
    let cfg = build_app_config(lookup_from_map(&map)).expect("unknown vars are not config");
    assert_eq!(cfg.api_base_url, "http://localhost:5000");
    assert!(!format!("{cfg:?}").contains("staging"));
}
