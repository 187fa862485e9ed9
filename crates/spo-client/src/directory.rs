//! Cache-owning shop lookup service.
//!
//! [`ShopDirectory`] is built once per process. It owns the HTTP client and
//! the [`ShopCache`], refreshes the shop list when it goes stale, and turns a
//! page URL into a popup [`ViewState`]. Fetch failures never surface as
//! errors here: they are logged and degrade to empty results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use spo_core::{
    match_shop, transition, AppConfig, ProgramRates, Shop, ShopCache, ValuationPolicy, ViewEvent,
    ViewState,
};

use crate::client::ShopApiClient;
use crate::error::ClientError;

pub struct ShopDirectory {
    client: ShopApiClient,
    cache: ShopCache,
    ttl: Duration,
    policy: ValuationPolicy,
    /// Shop list came from a local file; never refetch it.
    pinned: bool,
}

impl ShopDirectory {
    #[must_use]
    pub fn new(client: ShopApiClient, ttl: Duration, policy: ValuationPolicy) -> Self {
        Self {
            client,
            cache: ShopCache::new(),
            ttl,
            policy,
            pinned: false,
        }
    }

    /// # Errors
    ///
    /// Returns [`ClientError`] if the HTTP client cannot be built from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self::new(
            ShopApiClient::from_config(config)?,
            Duration::from_secs(config.cache_ttl_secs),
            config.valuation,
        ))
    }

    /// A directory whose shop list is fixed (e.g. loaded from a file). Rates,
    /// login and proposals still go through `client`.
    #[must_use]
    pub fn pinned(client: ShopApiClient, shops: Vec<Shop>, policy: ValuationPolicy) -> Self {
        let mut cache = ShopCache::new();
        cache.replace(shops, Utc::now());
        Self {
            client,
            cache,
            ttl: Duration::MAX,
            policy,
            pinned: true,
        }
    }

    #[must_use]
    pub fn policy(&self) -> ValuationPolicy {
        self.policy
    }

    #[must_use]
    pub fn client(&self) -> &ShopApiClient {
        &self.client
    }

    /// The shop list, refetched first if the cache is stale.
    pub async fn shops(&mut self) -> &[Shop] {
        self.shops_at(Utc::now()).await
    }

    /// Like [`ShopDirectory::shops`] with an explicit clock.
    ///
    /// A failed refresh yields an empty list and leaves the old snapshot in
    /// place for the next attempt.
    pub async fn shops_at(&mut self, now: DateTime<Utc>) -> &[Shop] {
        if !self.pinned && self.cache.is_stale(now, self.ttl) {
            if let Err(err) = self.try_refresh(now).await {
                tracing::warn!(error = %err, "could not fetch shop list, continuing with none");
                return &[];
            }
        }
        self.cache.shops()
    }

    /// Refetches the shop list regardless of staleness.
    ///
    /// Returns the new list, or an empty one if the fetch failed.
    pub async fn refresh(&mut self) -> Vec<Shop> {
        if self.pinned {
            return self.cache.shops().to_vec();
        }
        match self.try_refresh(Utc::now()).await {
            Ok(()) => self.cache.shops().to_vec(),
            Err(err) => {
                tracing::warn!(error = %err, "shop list refresh failed");
                Vec::new()
            }
        }
    }

    async fn try_refresh(&mut self, now: DateTime<Utc>) -> Result<(), ClientError> {
        let shops = self.client.fetch_shops().await?;
        tracing::info!(count = shops.len(), "shop cache refreshed");
        self.cache.replace(shops, now);
        Ok(())
    }

    /// The shop `page_url` belongs to, if any.
    pub async fn match_url(&mut self, page_url: &str) -> Option<Shop> {
        match_shop(page_url, self.shops().await).cloned()
    }

    /// Rates of `shop_id` grouped by program; empty if they cannot be loaded.
    pub async fn rates_for(&self, shop_id: i64) -> Vec<ProgramRates> {
        match self.client.fetch_rates(shop_id).await {
            Ok(payload) => payload.into_program_groups(),
            Err(err) => {
                tracing::warn!(shop_id, error = %err, "could not load rates");
                Vec::new()
            }
        }
    }

    /// Runs the popup flow for `page_url` and returns the view to show.
    ///
    /// A matched shop gets its rates loaded; an unmatched page gets the
    /// proposal form with the user's login state.
    pub async fn lookup(&mut self, page_url: &str) -> ViewState {
        let mut state = transition(ViewState::Loading, ViewEvent::Started);

        if let Some(shop) = self.match_url(page_url).await {
            tracing::debug!(shop_id = shop.id, shop = %shop.name, "page matched shop");
            let shop_id = shop.id;
            state = transition(state, ViewEvent::ShopMatched { shop });
            let programs = self.rates_for(shop_id).await;
            return transition(state, ViewEvent::RatesLoaded { programs });
        }

        tracing::debug!(page_url, "no shop matched page");
        state = transition(
            state,
            ViewEvent::NoShopMatched {
                page_url: page_url.to_owned(),
            },
        );
        let logged_in = match self.client.login_status().await {
            Ok(logged_in) => logged_in,
            Err(err) => {
                tracing::warn!(error = %err, "login status check failed, assuming logged out");
                false
            }
        };
        transition(state, ViewEvent::LoginChecked { logged_in })
    }

    /// Submits the proposal form of `state` for `shop_id`.
    ///
    /// Only acts on a `ShopNotFound` view with a logged-in user and no
    /// proposal in flight; any other state is returned unchanged. On success
    /// the suggested shop's rates are attached as a preview and the shop
    /// cache is refreshed.
    pub async fn propose(&mut self, state: ViewState, shop_id: i64) -> ViewState {
        let submitting = transition(state.clone(), ViewEvent::ProposalSubmitted { shop_id });
        if submitting == state {
            return state;
        }
        let ViewState::ShopNotFound { proposal_url, .. } = &submitting else {
            return submitting;
        };

        match self.client.create_url_proposal(shop_id, proposal_url).await {
            Ok(receipt) => {
                tracing::info!(shop_id, url = %proposal_url, ?receipt, "url proposal created");
                let programs = self.rates_for(shop_id).await;
                self.refresh().await;
                transition(submitting, ViewEvent::ProposalCreated { programs })
            }
            Err(err) => {
                tracing::warn!(shop_id, error = %err, "url proposal failed");
                transition(
                    submitting,
                    ViewEvent::Failed {
                        message: format!("could not create proposal: {err}"),
                    },
                )
            }
        }
    }
}
