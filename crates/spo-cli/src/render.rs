//! Text rendering of views, program cards and estimate tables.
//!
//! Everything here returns a `String` so output can be asserted on without
//! capturing stdout.

use std::fmt::Write as _;

use serde::Serialize;
use spo_client::ShopSuggestion;
use spo_core::{
    best_per_program, estimate_purchase, select_best_program, LoginState, ProgramRates,
    ProposalState, PurchaseEstimate, RateOffer, ValuationPolicy, ViewState, VoucherEstimate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    Text,
    Json,
}

/// Prints `value` as pretty JSON or as the text produced by `text`.
pub(crate) fn emit<T: Serialize>(
    output: Output,
    value: &T,
    text: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Output::Text => println!("{}", text()),
    }
    Ok(())
}

/// One-line summary of an offer, e.g.
/// `1 points/€ + 2% cashback (≈ 2.50€ per 100€)`.
pub(crate) fn offer_line(offer: &RateOffer) -> String {
    let mut parts = Vec::new();
    if let Some(ppe) = offer.points_per_eur {
        parts.push(format!("{ppe} points/€"));
    }
    if let Some(pct) = offer.cashback_pct {
        parts.push(format!("{pct}% cashback"));
    }
    if let Some(points) = offer.points_absolute {
        parts.push(format!("{points} points per order"));
    }
    if let Some(euros) = offer.cashback_absolute {
        parts.push(format!("{euros:.2}€ per order"));
    }

    let mut line = if parts.is_empty() {
        "no rate".to_owned()
    } else {
        parts.join(" + ")
    };
    if offer.points_per_eur.is_some() || offer.cashback_pct.is_some() {
        let per_100 = estimate_purchase(100.0, std::slice::from_ref(offer))
            .first()
            .map_or(0.0, |estimate| estimate.euros);
        let _ = write!(line, " (≈ {per_100:.2}€ per 100€)");
    }
    if let Some(text) = offer.incentive_text.as_deref().filter(|t| !t.trim().is_empty()) {
        let _ = write!(line, " [{}]", text.trim());
    }
    line
}

/// Best offer of each program, with the overall winner marked `*`.
pub(crate) fn programs_block(groups: &[ProgramRates], policy: ValuationPolicy) -> String {
    let bests = best_per_program(groups, policy);
    if bests.is_empty() {
        return "no rates available".to_owned();
    }
    let winner = select_best_program(groups, policy);

    let mut out = String::new();
    for (i, best) in bests.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let marker = match &winner {
            Some(w) if std::ptr::eq(w.offer, best.offer) => '*',
            _ => ' ',
        };
        let _ = write!(out, "{marker} {}: {}", best.program, offer_line(best.offer));
    }
    out
}

pub(crate) fn view_text(state: &ViewState, policy: ValuationPolicy) -> String {
    match state {
        ViewState::Loading => "loading...".to_owned(),
        ViewState::ShopFound { shop, programs } => format!(
            "{} (shop #{})\n{}",
            shop.name,
            shop.id,
            programs_block(programs, policy)
        ),
        ViewState::ShopNotFound {
            proposal_url,
            login,
            proposal,
        } => {
            let status = match (login, proposal) {
                (LoginState::Unknown, _) => "checking login status...".to_owned(),
                (LoginState::LoggedOut, _) => {
                    "log in (SPO_SESSION_COOKIE) to propose this address".to_owned()
                }
                (LoginState::LoggedIn, ProposalState::NotStarted) => format!(
                    "propose it with `spo propose {proposal_url} --shop-id <id>`"
                ),
                (LoginState::LoggedIn, ProposalState::Submitting { shop_id }) => {
                    format!("submitting proposal for shop #{shop_id}...")
                }
                (LoginState::LoggedIn, ProposalState::Created { shop_id, programs }) => format!(
                    "proposal for shop #{shop_id} created\n{}",
                    programs_block(programs, policy)
                ),
            };
            format!("no known shop for {proposal_url}\n{status}")
        }
        ViewState::Error { message } => format!("error: {message}\nrun the command again to retry"),
    }
}

pub(crate) fn purchase_table(amount: f64, estimates: &[PurchaseEstimate]) -> String {
    if estimates.is_empty() {
        return "no rates available".to_owned();
    }
    let mut out = format!(
        "purchase of {amount:.2}€\n{:<24}{:>12}{:>10}",
        "PROGRAM", "POINTS", "EUROS"
    );
    for e in estimates {
        let _ = write!(out, "\n{:<24}{:>12.1}{:>10.2}", e.program, e.points, e.euros);
    }
    out
}

pub(crate) fn voucher_table(voucher_eur: f64, estimates: &[VoucherEstimate]) -> String {
    if estimates.is_empty() {
        return "no rates available".to_owned();
    }
    let mut out = format!(
        "voucher worth {voucher_eur:.2}€\n{:<24}{:>12}{:>12}",
        "PROGRAM", "POINTS", "SPEND"
    );
    for e in estimates {
        let _ = write!(
            out,
            "\n{:<24}{:>12}{:>12}",
            e.program,
            finite_or_dash(e.required_points, 0),
            finite_or_dash(e.spend, 2)
        );
    }
    out
}

/// Autocomplete hits, one `id  name` row each.
pub(crate) fn suggestions_text(query: &str, hits: &[ShopSuggestion]) -> String {
    if hits.is_empty() {
        return format!("no shops match '{query}'");
    }
    hits.iter()
        .map(|hit| format!("{:>6}  {}", hit.id, hit.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn finite_or_dash(value: f64, precision: usize) -> String {
    if value.is_finite() {
        format!("{value:.precision$}")
    } else {
        "-".to_owned()
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
