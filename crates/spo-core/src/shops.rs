use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{extract_domain_key, DomainKey};
use crate::ConfigError;

/// A merchant record as served by the shop-data service.
///
/// `url` and `alternative_urls` are candidate addresses used only for
/// matching; they are neither guaranteed unique nor well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alternative_urls: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_owned()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Shop {
    /// Domain keys of every parseable candidate URL, primary URL first.
    ///
    /// Malformed entries are skipped individually.
    pub fn domain_keys(&self) -> impl Iterator<Item = DomainKey> + '_ {
        self.url
            .iter()
            .chain(self.alternative_urls.iter())
            .filter_map(|candidate| extract_domain_key(candidate).ok())
    }

    /// Returns `true` if any candidate URL of this shop shares `key`.
    #[must_use]
    pub fn matches_key(&self, key: &DomainKey) -> bool {
        self.domain_keys().any(|k| &k == key)
    }
}

/// Finds the first shop whose primary or alternative URL has the same
/// [`DomainKey`] as `page_url`.
///
/// Shops are scanned in input order, so the first match wins ties. Returns
/// `None` if `page_url` is malformed or nothing matches.
#[must_use]
pub fn match_shop<'a>(page_url: &str, shops: &'a [Shop]) -> Option<&'a Shop> {
    let page_key = extract_domain_key(page_url).ok()?;
    shops.iter().find(|shop| shop.matches_key(&page_key))
}

/// Pre-built lookup from [`DomainKey`] to shops, for repeated matching
/// against the same shop list.
///
/// Positions per key are kept in input order, so [`ShopIndex::lookup`] returns
/// the same shop as [`match_shop`].
#[derive(Debug)]
pub struct ShopIndex<'a> {
    shops: &'a [Shop],
    by_key: HashMap<DomainKey, Vec<usize>>,
}

impl<'a> ShopIndex<'a> {
    #[must_use]
    pub fn build(shops: &'a [Shop]) -> Self {
        let mut by_key: HashMap<DomainKey, Vec<usize>> = HashMap::new();
        for (pos, shop) in shops.iter().enumerate() {
            for key in shop.domain_keys() {
                let positions = by_key.entry(key).or_default();
                if positions.last() != Some(&pos) {
                    positions.push(pos);
                }
            }
        }
        Self { shops, by_key }
    }

    /// All shops registered under `key`, in input order.
    pub fn candidates(&self, key: &DomainKey) -> impl Iterator<Item = &'a Shop> + '_ {
        let shops = self.shops;
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&pos| &shops[pos])
    }

    #[must_use]
    pub fn lookup(&self, page_url: &str) -> Option<&'a Shop> {
        let key = extract_domain_key(page_url).ok()?;
        self.candidates(&key).next()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// On-disk shop list, same shape as the `/api/shops` response.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShopsFile {
    #[serde(default)]
    pub shops: Vec<Shop>,
}

/// Load and validate a shops fixture from a YAML (or JSON) file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_shops_file(path: &Path) -> Result<ShopsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ShopsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let shops_file: ShopsFile = serde_yaml::from_str(&content)?;
    validate_shops(&shops_file)?;
    Ok(shops_file)
}

fn validate_shops(shops_file: &ShopsFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for shop in &shops_file.shops {
        if shop.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "shop {} has an empty name",
                shop.id
            )));
        }

        if !seen_ids.insert(shop.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate shop id {} ('{}')",
                shop.id, shop.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "shops_test.rs"]
mod tests;
