//! URL to domain-key extraction.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::CoreError;

/// The last two dot-separated labels of a lower-cased hostname, e.g.
/// `amazon.de` for `https://www.amazon.de/cart`.
///
/// Two URLs with the same key are treated as the same shop site regardless of
/// subdomain, scheme or path. Single-label hosts such as `localhost` are kept
/// as they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainKey(String);

impl DomainKey {
    /// Builds a key from an already-parsed hostname.
    #[must_use]
    pub fn from_host(host: &str) -> Self {
        let host = host.to_lowercase();
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() >= 2 {
            Self(labels[labels.len() - 2..].join("."))
        } else {
            Self(host)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn parse_with_host(raw: &str) -> Result<(Url, String), CoreError> {
    let parsed = Url::parse(raw).map_err(|e| CoreError::MalformedUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| CoreError::MalformedUrl {
            url: raw.to_owned(),
            reason: "URL has no host".to_owned(),
        })?;
    Ok((parsed, host))
}

/// Extracts the [`DomainKey`] of an absolute URL.
///
/// # Errors
///
/// Returns [`CoreError::MalformedUrl`] if `raw` does not parse as an absolute
/// URL or has no host component.
pub fn extract_domain_key(raw: &str) -> Result<DomainKey, CoreError> {
    let (_, host) = parse_with_host(raw)?;
    Ok(DomainKey::from_host(&host))
}

/// Reduces a page URL to `scheme://domain-key`, e.g.
/// `https://www.amazon.de/gp/cart/view.html` becomes `https://amazon.de`.
///
/// This is the form submitted when proposing a new URL for an existing shop.
///
/// # Errors
///
/// Returns [`CoreError::MalformedUrl`] under the same conditions as
/// [`extract_domain_key`].
pub fn domain_url(raw: &str) -> Result<String, CoreError> {
    let (parsed, host) = parse_with_host(raw)?;
    Ok(format!("{}://{}", parsed.scheme(), DomainKey::from_host(&host)))
}
