//! Command handlers for the CLI.
//!
//! Handlers build the client or directory they need from `AppConfig`, run a
//! single operation and print to stdout. Service failures inside the popup
//! flow (`lookup`, `propose`) degrade the same way the popup does; direct
//! queries (`rates`, `search`, `estimate`) report them as errors.

use anyhow::Context;
use serde::Serialize;
use spo_client::{ShopApiClient, ShopDirectory, ShopSuggestion, MIN_SEARCH_CHARS};
use spo_core::{
    domain_url, estimate_purchase, estimate_voucher, extract_domain_key, load_shops_file,
    AppConfig, DomainKey, LoginState, Shop, ShopIndex, ViewState,
};

use crate::render::{self, Output};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EstimateMode {
    Purchase(f64),
    Voucher(f64),
}

/// Builds the shop directory, pinned to a local shop list when
/// `config.shops_path` is set.
///
/// # Errors
///
/// Returns an error if the shops file cannot be loaded or the HTTP client
/// cannot be constructed.
pub(crate) fn build_directory(config: &AppConfig) -> anyhow::Result<ShopDirectory> {
    tracing::debug!(config = ?config, "building shop directory");
    let Some(path) = &config.shops_path else {
        return Ok(ShopDirectory::from_config(config)?);
    };
    let file = load_shops_file(path)
        .with_context(|| format!("failed to load shops from {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        count = file.shops.len(),
        "using local shop list"
    );
    let client = ShopApiClient::from_config(config)?;
    Ok(ShopDirectory::pinned(client, file.shops, config.valuation))
}

#[derive(Debug, Serialize)]
struct DomainInfo {
    domain_key: DomainKey,
    proposal_url: String,
}

pub(crate) fn run_domain(url: &str, output: Output) -> anyhow::Result<()> {
    let info = DomainInfo {
        domain_key: extract_domain_key(url)?,
        proposal_url: domain_url(url)?,
    };
    render::emit(output, &info, || {
        format!(
            "domain key:   {}\nproposal url: {}",
            info.domain_key, info.proposal_url
        )
    })
}

/// Prints the shop a page belongs to, or why none matched.
///
/// JSON output is the matched shop, or `null`.
pub(crate) async fn run_match(config: &AppConfig, url: &str, output: Output) -> anyhow::Result<()> {
    let key = extract_domain_key(url)?;
    let mut directory = build_directory(config)?;
    let shops = directory.shops().await;
    if shops.is_empty() {
        return render::emit(output, &None::<&Shop>, || {
            "shop list is empty; check SPO_API_BASE_URL or --shops-file".to_owned()
        });
    }

    let index = ShopIndex::build(shops);
    let candidates = index.candidates(&key).count();
    let matched = index.lookup(url);
    render::emit(output, &matched, || match matched {
        Some(shop) if candidates > 1 => format!(
            "{} (shop #{})\n{candidates} shops share domain {key}; first match shown",
            shop.name, shop.id
        ),
        Some(shop) => format!("{} (shop #{})", shop.name, shop.id),
        None => format!("no known shop for {key} ({} shops checked)", shops.len()),
    })
}

/// Prints the best offer per program for `shop_id`.
///
/// # Errors
///
/// Returns an error if the rates cannot be fetched.
pub(crate) async fn run_rates(
    config: &AppConfig,
    shop_id: i64,
    output: Output,
) -> anyhow::Result<()> {
    let client = ShopApiClient::from_config(config)?;
    let groups = client
        .fetch_rates(shop_id)
        .await
        .with_context(|| format!("failed to fetch rates of shop {shop_id}"))?
        .into_program_groups();
    render::emit(output, &groups, || {
        render::programs_block(&groups, config.valuation)
    })
}

pub(crate) async fn run_lookup(config: &AppConfig, url: &str, output: Output) -> anyhow::Result<()> {
    let mut directory = build_directory(config)?;
    let state = directory.lookup(url).await;
    tracing::debug!(view = state.name(), "lookup finished");
    render::emit(output, &state, || {
        render::view_text(&state, directory.policy())
    })
}

pub(crate) async fn run_search(config: &AppConfig, query: &str, output: Output) -> anyhow::Result<()> {
    if query.trim().chars().count() < MIN_SEARCH_CHARS {
        return render::emit(output, &Vec::<ShopSuggestion>::new(), || {
            format!("type at least {MIN_SEARCH_CHARS} characters to search")
        });
    }
    let client = ShopApiClient::from_config(config)?;
    let hits = client
        .search_shops(query)
        .await
        .context("shop search failed")?;
    render::emit(output, &hits, || render::suggestions_text(query.trim(), &hits))
}

/// Looks `url` up and, if no shop owns it, proposes it for `shop_id`.
pub(crate) async fn run_propose(
    config: &AppConfig,
    url: &str,
    shop_id: i64,
    output: Output,
) -> anyhow::Result<()> {
    let mut directory = build_directory(config)?;
    let state = directory.lookup(url).await;

    if let ViewState::ShopFound { shop, .. } = &state {
        return render::emit(output, &state, || {
            format!("{url} already belongs to {} (shop #{})", shop.name, shop.id)
        });
    }
    if matches!(
        state,
        ViewState::ShopNotFound {
            login: LoginState::LoggedOut | LoginState::Unknown,
            ..
        }
    ) {
        anyhow::bail!("not logged in; set SPO_SESSION_COOKIE to a valid session to propose URLs");
    }

    let state = directory.propose(state, shop_id).await;
    render::emit(output, &state, || {
        render::view_text(&state, directory.policy())
    })?;
    if let ViewState::Error { message } = &state {
        anyhow::bail!("{message}");
    }
    Ok(())
}

/// Prints purchase or voucher estimates for every offer of `shop_id`.
pub(crate) async fn run_estimate(
    config: &AppConfig,
    shop_id: i64,
    mode: EstimateMode,
    output: Output,
) -> anyhow::Result<()> {
    let client = ShopApiClient::from_config(config)?;
    let offers = client
        .fetch_rates(shop_id)
        .await
        .with_context(|| format!("failed to fetch rates of shop {shop_id}"))?
        .into_offers();

    match mode {
        EstimateMode::Purchase(amount) => {
            let estimates = estimate_purchase(amount, &offers);
            render::emit(output, &estimates, || {
                render::purchase_table(amount, &estimates)
            })
        }
        EstimateMode::Voucher(voucher_eur) => {
            let estimates = estimate_voucher(voucher_eur, &offers);
            render::emit(output, &estimates, || {
                render::voucher_table(voucher_eur, &estimates)
            })
        }
    }
}
