//! Client side of the shop-data service: typed HTTP client, retry policy and
//! the cache-owning [`ShopDirectory`].

pub mod client;
pub mod directory;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::{ShopApiClient, MIN_SEARCH_CHARS};
pub use directory::ShopDirectory;
pub use error::ClientError;
pub use types::{ProposalReceipt, ShopSuggestion};
