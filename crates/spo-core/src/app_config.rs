use std::path::PathBuf;

use crate::rates::ValuationPolicy;

#[derive(Clone)]
pub struct AppConfig {
    /// Root of the shop-data service, e.g. `http://localhost:5000`.
    pub api_base_url: String,
    pub log_level: String,
    /// How long a fetched shop list is reused before refetching.
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub valuation: ValuationPolicy,
    /// Optional offline shop list; when set, the CLI matches against it
    /// instead of calling `/api/shops`.
    pub shops_path: Option<PathBuf>,
    /// Cookie header value of a logged-in web session, needed for login
    /// status and proposals.
    pub session_cookie: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("log_level", &self.log_level)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("valuation", &self.valuation)
            .field("shops_path", &self.shops_path)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
