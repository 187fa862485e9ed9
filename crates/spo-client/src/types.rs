//! Response bodies of the shop-data service that are not core domain types.

use serde::{Deserialize, Serialize};
use spo_core::Shop;

/// `GET /api/shops` → `{ "shops": [...] }`. A missing key means no shops.
#[derive(Debug, Deserialize)]
pub(crate) struct ShopsResponse {
    #[serde(default)]
    pub shops: Vec<Shop>,
}

/// One hit of the shop-name autocomplete (`GET /shop_names?q=`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSuggestion {
    pub id: i64,
    pub name: String,
}

/// `GET /api/user/status`
#[derive(Debug, Deserialize)]
pub(crate) struct UserStatus {
    #[serde(default)]
    pub logged_in: bool,
}

/// Body sent to `POST /api/proposals/url`.
#[derive(Debug, Serialize)]
pub(crate) struct UrlProposalRequest<'a> {
    pub shop_id: i64,
    pub url: &'a str,
}

/// Acknowledgement of a created URL proposal. The service's reply varies
/// between versions, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalReceipt {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "id")]
    pub proposal_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error envelope used by the service for JSON error responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
