//! Core domain logic for the shopping points optimiser.
//!
//! Everything in this crate is synchronous and free of I/O apart from the
//! configuration loaders: URL-to-domain-key extraction, shop matching, rate
//! ranking, purchase estimates, the shop cache value and the popup view-state
//! machine.

pub mod app_config;
pub mod cache;
pub mod config;
pub mod domain;
pub mod estimate;
pub mod rates;
pub mod shops;
pub mod view;

use thiserror::Error;

pub use app_config::AppConfig;
pub use cache::ShopCache;
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{domain_url, extract_domain_key, DomainKey};
pub use estimate::{estimate_purchase, estimate_voucher, PurchaseEstimate, VoucherEstimate};
pub use rates::{
    best_per_program, effective_value, select_best_program, select_best_rate, ProgramBest,
    ProgramRates, RateOffer, RatesPayload, ValuationPolicy, DEFAULT_POINT_VALUE_EUR,
};
pub use shops::{load_shops_file, match_shop, Shop, ShopIndex, ShopsFile};
pub use view::{transition, LoginState, ProposalState, ViewEvent, ViewState};

/// Errors produced by the pure domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A URL string could not be parsed or has no host. Callers skip the
    /// offending item instead of aborting.
    #[error("malformed URL \"{url}\": {reason}")]
    MalformedUrl { url: String, reason: String },
}

/// Errors produced while loading configuration or the shops fixture file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read shops file {path}: {source}")]
    ShopsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shops file: {0}")]
    ShopsFileParse(#[from] serde_yaml::Error),

    #[error("shops file validation failed: {0}")]
    Validation(String),
}
