//! Rate offers and best-rate selection.
//!
//! Every offer is reduced to a single euro-equivalent score,
//! `points_per_eur * point_value_eur + cashback_pct`, and the highest score
//! wins. Ties always go to the offer seen first.

use serde::{Deserialize, Deserializer, Serialize};

/// Euro value of one loyalty point when the program does not say otherwise.
pub const DEFAULT_POINT_VALUE_EUR: f64 = 0.005;

/// One loyalty or cashback program's current rate for a shop.
///
/// Offers are read-only snapshots fetched per lookup. Any precomputed score the
/// service sends along is ignored; ranking always goes through
/// [`effective_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOffer {
    /// Program name. Rates nested under a program group may omit it.
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub points_per_eur: Option<f64>,
    #[serde(default)]
    pub cashback_pct: Option<f64>,
    /// Fixed points per completed purchase or contract.
    #[serde(default)]
    pub points_absolute: Option<f64>,
    /// Fixed euro cashback per completed purchase or contract.
    #[serde(default)]
    pub cashback_absolute: Option<f64>,
    #[serde(default)]
    pub point_value_eur: Option<f64>,
    #[serde(default)]
    pub incentive_text: Option<String>,
}

impl RateOffer {
    #[must_use]
    pub fn point_value(&self) -> f64 {
        self.point_value_eur.unwrap_or(DEFAULT_POINT_VALUE_EUR)
    }
}

/// Controls which offer fields feed the comparison score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationPolicy {
    /// Fold `points_absolute * point_value_eur + cashback_absolute` into the
    /// score. Off by default: the absolute fields are display-only.
    pub include_absolute: bool,
}

impl ValuationPolicy {
    #[must_use]
    pub fn with_absolute() -> Self {
        Self {
            include_absolute: true,
        }
    }
}

/// Euro-equivalent score used to rank competing offers.
#[must_use]
pub fn effective_value(offer: &RateOffer, policy: ValuationPolicy) -> f64 {
    let point_value = offer.point_value();
    let mut value =
        offer.points_per_eur.unwrap_or(0.0) * point_value + offer.cashback_pct.unwrap_or(0.0);
    if policy.include_absolute {
        value += offer.points_absolute.unwrap_or(0.0) * point_value
            + offer.cashback_absolute.unwrap_or(0.0);
    }
    value
}

/// Returns the offer with the strictly greatest [`effective_value`].
///
/// Ties keep the earliest offer. `None` means there are no rates at all and
/// the caller should show its "no rates available" fallback.
#[must_use]
pub fn select_best_rate(offers: &[RateOffer], policy: ValuationPolicy) -> Option<&RateOffer> {
    best_with_score(offers, policy).map(|(offer, _)| offer)
}

fn best_with_score(offers: &[RateOffer], policy: ValuationPolicy) -> Option<(&RateOffer, f64)> {
    let mut iter = offers.iter();
    let first = iter.next()?;
    let seed = (first, effective_value(first, policy));
    Some(iter.fold(seed, |best, current| {
        let score = effective_value(current, policy);
        if score > best.1 {
            (current, score)
        } else {
            best
        }
    }))
}

/// Rates of a single program, as in the grouped `{ programs: [...] }` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRates {
    pub program: String,
    #[serde(default)]
    pub rates: Vec<RateOffer>,
}

/// The winning offer of one program group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramBest<'a> {
    pub program: &'a str,
    pub offer: &'a RateOffer,
    pub effective: f64,
}

/// Picks the best offer inside each program group, keeping group order.
///
/// Groups without any rates are dropped.
#[must_use]
pub fn best_per_program(groups: &[ProgramRates], policy: ValuationPolicy) -> Vec<ProgramBest<'_>> {
    groups
        .iter()
        .filter_map(|group| {
            best_with_score(&group.rates, policy).map(|(offer, effective)| ProgramBest {
                program: &group.program,
                offer,
                effective,
            })
        })
        .collect()
}

/// Ranks the per-program winners against each other with the same score and
/// tie rule as [`select_best_rate`].
#[must_use]
pub fn select_best_program(
    groups: &[ProgramRates],
    policy: ValuationPolicy,
) -> Option<ProgramBest<'_>> {
    best_per_program(groups, policy)
        .into_iter()
        .reduce(|best, current| {
            if current.effective > best.effective {
                current
            } else {
                best
            }
        })
}

/// Body of the per-shop rates endpoint, which comes in two shapes.
///
/// The shape is chosen by key: `rates` means flat, anything else is grouped
/// (an object with neither key is an empty grouped payload). A malformed
/// offer is a decode error in both shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RatesPayload {
    /// `{ "rates": [...] }`
    Flat { rates: Vec<RateOffer> },
    /// `{ "programs": [{ "program": ..., "rates": [...] }] }`
    Grouped { programs: Vec<ProgramRates> },
}

#[derive(Deserialize)]
struct RawRatesPayload {
    #[serde(default)]
    rates: Option<Vec<RateOffer>>,
    #[serde(default)]
    programs: Option<Vec<ProgramRates>>,
}

impl<'de> Deserialize<'de> for RatesPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawRatesPayload::deserialize(deserializer)?;
        Ok(match raw.rates {
            Some(rates) => RatesPayload::Flat { rates },
            None => RatesPayload::Grouped {
                programs: raw.programs.unwrap_or_default(),
            },
        })
    }
}

impl RatesPayload {
    /// Normalises either shape into program groups.
    ///
    /// Flat rates are grouped by program name in first-seen order. Nested rates
    /// that omit their program name inherit it from the group.
    #[must_use]
    pub fn into_program_groups(self) -> Vec<ProgramRates> {
        match self {
            RatesPayload::Flat { rates } => {
                let mut groups: Vec<ProgramRates> = Vec::new();
                for offer in rates {
                    match groups.iter_mut().find(|g| g.program == offer.program) {
                        Some(group) => group.rates.push(offer),
                        None => groups.push(ProgramRates {
                            program: offer.program.clone(),
                            rates: vec![offer],
                        }),
                    }
                }
                groups
            }
            RatesPayload::Grouped { mut programs } => {
                for group in &mut programs {
                    for offer in &mut group.rates {
                        if offer.program.is_empty() {
                            offer.program.clone_from(&group.program);
                        }
                    }
                }
                programs
            }
        }
    }

    /// All offers regardless of grouping, in payload order.
    #[must_use]
    pub fn into_offers(self) -> Vec<RateOffer> {
        match self {
            RatesPayload::Flat { rates } => rates,
            grouped @ RatesPayload::Grouped { .. } => grouped
                .into_program_groups()
                .into_iter()
                .flat_map(|g| g.rates)
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "rates_test.rs"]
mod tests;
