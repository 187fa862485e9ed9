//! HTTP client for the shop-data service.
//!
//! Wraps `reqwest` with typed endpoints, error-body handling and automatic
//! retries for idempotent requests. Proposal submission is a `POST` and is
//! attempted exactly once.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use spo_core::{AppConfig, RatesPayload, Shop};

use crate::error::ClientError;
use crate::retry::retry_with_backoff;
use crate::types::{
    ErrorBody, ProposalReceipt, ShopSuggestion, ShopsResponse, UrlProposalRequest, UserStatus,
};

/// Autocomplete queries shorter than this are answered locally with no hits.
pub const MIN_SEARCH_CHARS: usize = 2;

/// Client for the shop-data service REST API.
///
/// Use [`ShopApiClient::from_config`] in the application or
/// [`ShopApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ShopApiClient {
    client: Client,
    base_url: Url,
    session_cookie: Option<HeaderValue>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ShopApiClient {
    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the configured base URL (or
    /// session cookie) is unusable, or [`ClientError::Http`] if the
    /// `reqwest::Client` cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let client = Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?;
        match &config.session_cookie {
            Some(cookie) => client.with_session_cookie(cookie),
            None => Ok(client),
        }
    }

    /// Creates a client with a custom base URL.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for transient errors; `0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let client = Self::build_http(timeout_secs, user_agent)?;
        Ok(Self {
            client,
            base_url: normalise_base_url(base_url)?,
            session_cookie: None,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Returns a copy of this client that sends `cookie` (e.g.
    /// `session=abc123`) with every request, for endpoints that need a
    /// logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the cookie is not a valid
    /// header value.
    pub fn with_session_cookie(self, cookie: &str) -> Result<Self, ClientError> {
        let mut value = HeaderValue::from_str(cookie).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: self.base_url.to_string(),
            reason: format!("session cookie is not a valid header value: {e}"),
        })?;
        value.set_sensitive(true);
        Ok(Self {
            session_cookie: Some(value),
            ..self
        })
    }

    fn build_http(timeout_secs: u64, user_agent: &str) -> Result<Client, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?)
    }

    /// Attaches the session cookie, if any.
    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(COOKIE, cookie.clone()),
            None => request,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches every known shop.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] / [`ClientError::UnexpectedStatus`] /
    ///   [`ClientError::Api`] when the request fails after retries.
    /// - [`ClientError::Deserialize`] if the body is not a shop list.
    pub async fn fetch_shops(&self) -> Result<Vec<Shop>, ClientError> {
        let url = self.endpoint("api/shops")?;
        let body: ShopsResponse = self.get_json(url, "shop list").await?;
        tracing::debug!(count = body.shops.len(), "fetched shop list");
        Ok(body.shops)
    }

    /// Fetches the current rates of one shop, in whichever shape the service
    /// returns them.
    ///
    /// # Errors
    ///
    /// Same as [`ShopApiClient::fetch_shops`]; an unknown shop id is
    /// [`ClientError::NotFound`].
    pub async fn fetch_rates(&self, shop_id: i64) -> Result<RatesPayload, ClientError> {
        let url = self.endpoint(&format!("api/shops/{shop_id}/rates"))?;
        self.get_json(url, &format!("rates of shop {shop_id}")).await
    }

    /// Shop-name autocomplete.
    ///
    /// Queries shorter than [`MIN_SEARCH_CHARS`] (after trimming) return an
    /// empty list without a request.
    ///
    /// # Errors
    ///
    /// Same as [`ShopApiClient::fetch_shops`].
    pub async fn search_shops(&self, query: &str) -> Result<Vec<ShopSuggestion>, ClientError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        let mut url = self.endpoint("shop_names")?;
        url.query_pairs_mut().append_pair("q", query);
        self.get_json(url, &format!("shop search '{query}'")).await
    }

    /// Whether the session this client carries belongs to a logged-in user.
    ///
    /// # Errors
    ///
    /// Same as [`ShopApiClient::fetch_shops`].
    pub async fn login_status(&self) -> Result<bool, ClientError> {
        let url = self.endpoint("api/user/status")?;
        let status: UserStatus = self.get_json(url, "login status").await?;
        Ok(status.logged_in)
    }

    /// Proposes `url` as an additional address of shop `shop_id`.
    ///
    /// Not retried: a timed-out `POST` may already have created the proposal.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] with the service's message on a JSON error reply
    ///   (e.g. not logged in, duplicate proposal).
    /// - [`ClientError::Http`] / [`ClientError::UnexpectedStatus`] otherwise.
    pub async fn create_url_proposal(
        &self,
        shop_id: i64,
        url: &str,
    ) -> Result<ProposalReceipt, ClientError> {
        let endpoint = self.endpoint("api/proposals/url")?;
        let request = self.authorised(
            self.client
                .post(endpoint.clone())
                .json(&UrlProposalRequest { shop_id, url }),
        );
        let body = send_checked(request, &endpoint).await?;
        if body.trim().is_empty() {
            return Ok(ProposalReceipt::default());
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: format!("proposal for shop {shop_id}"),
            source: e,
        })
    }

    /// Resolves `path` (no leading slash) against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: format!("cannot join '{path}': {e}"),
            })
    }

    /// Sends a GET with retries and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let request = self.authorised(self.client.get(url.clone()));
                let body = send_checked(request, &url).await?;
                serde_json::from_str::<T>(&body).map_err(|e| ClientError::Deserialize {
                    context: context.to_owned(),
                    source: e,
                })
            }
        })
        .await
    }
}

/// Ensures the base URL ends with exactly one slash so that relative joins
/// append to its path instead of replacing the last segment.
fn normalise_base_url(base_url: &str) -> Result<Url, ClientError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Sends `request` and maps non-2xx replies to typed errors, returning the
/// body text on success.
async fn send_checked(request: RequestBuilder, url: &Url) -> Result<String, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ClientError::RateLimited { retry_after_secs });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        return Err(error_from_response(response, url).await);
    }

    Ok(response.text().await?)
}

/// Turns an error reply into [`ClientError::Api`] when it carries a JSON
/// `error` field, or [`ClientError::UnexpectedStatus`] otherwise (HTML error
/// pages, empty bodies).
async fn error_from_response(response: Response, url: &Url) -> ClientError {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let body = response.text().await.unwrap_or_default();
    if is_json {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
            return ClientError::Api {
                status,
                message: parsed.error,
            };
        }
    } else if !body.is_empty() {
        let preview: String = body.chars().take(200).collect();
        tracing::debug!(status, url = %url, body = %preview, "non-JSON error response");
    }

    ClientError::UnexpectedStatus {
        status,
        url: url.to_string(),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
