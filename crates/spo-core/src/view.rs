//! Popup view-state machine.
//!
//! The popup shows exactly one of four views. Which one is decided here, by a
//! pure [`transition`] from the current state and an event; renderers only
//! read the resulting [`ViewState`].

use serde::Serialize;

use crate::domain::domain_url;
use crate::rates::ProgramRates;
use crate::shops::Shop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginState {
    Unknown,
    LoggedIn,
    LoggedOut,
}

/// Progress of a "this URL belongs to shop X" proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ProposalState {
    NotStarted,
    Submitting {
        shop_id: i64,
    },
    /// The proposal was accepted by the service; `programs` are the suggested
    /// shop's rates, shown as a preview.
    Created {
        shop_id: i64,
        programs: Vec<ProgramRates>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "view")]
pub enum ViewState {
    Loading,
    ShopFound {
        shop: Shop,
        programs: Vec<ProgramRates>,
    },
    ShopNotFound {
        /// `scheme://domain-key` of the page, prefilled into the proposal.
        proposal_url: String,
        login: LoginState,
        proposal: ProposalState,
    },
    Error {
        message: String,
    },
}

impl ViewState {
    /// Stable view name, e.g. for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::ShopFound { .. } => "shop-found",
            ViewState::ShopNotFound { .. } => "shop-not-found",
            ViewState::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Popup opened or re-initialised.
    Started,
    ShopMatched { shop: Shop },
    NoShopMatched { page_url: String },
    RatesLoaded { programs: Vec<ProgramRates> },
    LoginChecked { logged_in: bool },
    ProposalSubmitted { shop_id: i64 },
    ProposalCreated { programs: Vec<ProgramRates> },
    Failed { message: String },
    Retry,
}

/// Computes the next view.
///
/// Events that make no sense in the current state leave it unchanged.
/// `Started`, `Retry` and `Failed` apply from any state.
#[must_use]
pub fn transition(state: ViewState, event: ViewEvent) -> ViewState {
    match (state, event) {
        (_, ViewEvent::Started | ViewEvent::Retry) => ViewState::Loading,
        (_, ViewEvent::Failed { message }) => ViewState::Error { message },

        (ViewState::Loading, ViewEvent::ShopMatched { shop }) => ViewState::ShopFound {
            shop,
            programs: Vec::new(),
        },
        (ViewState::Loading, ViewEvent::NoShopMatched { page_url }) => ViewState::ShopNotFound {
            proposal_url: domain_url(&page_url).unwrap_or(page_url),
            login: LoginState::Unknown,
            proposal: ProposalState::NotStarted,
        },

        (ViewState::ShopFound { shop, .. }, ViewEvent::RatesLoaded { programs }) => {
            ViewState::ShopFound { shop, programs }
        }

        (
            ViewState::ShopNotFound {
                proposal_url,
                proposal,
                ..
            },
            ViewEvent::LoginChecked { logged_in },
        ) => ViewState::ShopNotFound {
            proposal_url,
            login: if logged_in {
                LoginState::LoggedIn
            } else {
                LoginState::LoggedOut
            },
            proposal,
        },

        (
            ViewState::ShopNotFound {
                proposal_url,
                login: LoginState::LoggedIn,
                proposal: ProposalState::NotStarted,
            },
            ViewEvent::ProposalSubmitted { shop_id },
        ) => ViewState::ShopNotFound {
            proposal_url,
            login: LoginState::LoggedIn,
            proposal: ProposalState::Submitting { shop_id },
        },

        (
            ViewState::ShopNotFound {
                proposal_url,
                login,
                proposal: ProposalState::Submitting { shop_id },
            },
            ViewEvent::ProposalCreated { programs },
        ) => ViewState::ShopNotFound {
            proposal_url,
            login,
            proposal: ProposalState::Created { shop_id, programs },
        },

        (state, _) => state,
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
