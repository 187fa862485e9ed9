//! Purchase and voucher estimates over a shop's current rates.

use serde::{Serialize, Serializer};

use crate::rates::RateOffer;

/// What a purchase of a given amount earns with one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseEstimate {
    pub program: String,
    pub points: f64,
    /// Euro-equivalent of the points plus the cashback on the amount.
    pub euros: f64,
}

/// How much has to be spent with one program to earn a voucher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoucherEstimate {
    pub program: String,
    /// Points needed for the voucher. Infinite if the program's points are worthless.
    #[serde(serialize_with = "finite_or_null")]
    pub required_points: f64,
    /// Euros to spend at the shop. Infinite if the offer earns no points.
    #[serde(serialize_with = "finite_or_null")]
    pub spend: f64,
}

/// Unreachable (non-finite) amounts serialise as `null`.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Estimates the return of spending `amount` euros, best first.
///
/// Cashback here is a real percentage of the amount. Equal results keep their
/// input order.
#[must_use]
pub fn estimate_purchase(amount: f64, offers: &[RateOffer]) -> Vec<PurchaseEstimate> {
    let mut results: Vec<PurchaseEstimate> = offers
        .iter()
        .map(|offer| {
            let points = amount * offer.points_per_eur.unwrap_or(0.0);
            let euros =
                points * offer.point_value() + amount * offer.cashback_pct.unwrap_or(0.0) / 100.0;
            PurchaseEstimate {
                program: offer.program.clone(),
                points,
                euros,
            }
        })
        .collect();
    results.sort_by(|a, b| b.euros.total_cmp(&a.euros));
    results
}

/// Estimates the spend needed to collect a voucher worth `voucher_eur`,
/// cheapest first.
#[must_use]
pub fn estimate_voucher(voucher_eur: f64, offers: &[RateOffer]) -> Vec<VoucherEstimate> {
    let mut results: Vec<VoucherEstimate> = offers
        .iter()
        .map(|offer| {
            let point_value = offer.point_value();
            let required_points = if point_value > 0.0 {
                voucher_eur / point_value
            } else {
                f64::INFINITY
            };
            let points_per_eur = offer.points_per_eur.unwrap_or(0.0);
            let spend = if points_per_eur > 0.0 {
                required_points / points_per_eur
            } else {
                f64::INFINITY
            };
            VoucherEstimate {
                program: offer.program.clone(),
                required_points,
                spend,
            }
        })
        .collect();
    results.sort_by(|a, b| a.spend.total_cmp(&b.spend));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(program: &str, points_per_eur: f64, cashback_pct: f64, pv: f64) -> RateOffer {
        RateOffer {
            program: program.to_owned(),
            points_per_eur: Some(points_per_eur),
            cashback_pct: Some(cashback_pct),
            point_value_eur: Some(pv),
            ..RateOffer::default()
        }
    }

    #[test]
    fn purchase_combines_points_and_cashback() {
        let results = estimate_purchase(100.0, &[offer("payback", 1.0, 2.0, 0.01)]);
        assert_eq!(results.len(), 1);
        assert!((results[0].points - 100.0).abs() < 1e-9);
        assert!((results[0].euros - 3.0).abs() < 1e-9);
    }

    #[test]
    fn purchase_results_are_sorted_best_first() {
        let results = estimate_purchase(
            50.0,
            &[
                offer("low", 1.0, 0.0, 0.005),
                offer("high", 0.0, 5.0, 0.005),
                offer("mid", 2.0, 0.0, 0.01),
            ],
        );
        let order: Vec<&str> = results.iter().map(|r| r.program.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
    }

    #[test]
    fn purchase_with_no_offers_is_empty() {
        assert!(estimate_purchase(10.0, &[]).is_empty());
    }

    #[test]
    fn voucher_spend_is_sorted_cheapest_first() {
        let results = estimate_voucher(
            10.0,
            &[offer("slow", 1.0, 0.0, 0.01), offer("fast", 4.0, 0.0, 0.01)],
        );
        assert_eq!(results[0].program, "fast");
        assert!((results[0].required_points - 1000.0).abs() < 1e-9);
        assert!((results[0].spend - 250.0).abs() < 1e-9);
        assert!((results[1].spend - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn voucher_without_points_needs_infinite_spend() {
        let results = estimate_voucher(
            10.0,
            &[offer("cashback-only", 0.0, 3.0, 0.01), offer("zero-value", 1.0, 0.0, 0.0)],
        );
        assert!(results.iter().all(|r| r.spend.is_infinite()));
        assert!(results
            .iter()
            .any(|r| r.program == "zero-value" && r.required_points.is_infinite()));
    }

    #[test]
    fn unreachable_voucher_serializes_as_null() {
        let results = estimate_voucher(
            10.0,
            &[offer("fast", 4.0, 0.0, 0.01), offer("cashback-only", 0.0, 3.0, 0.01)],
        );
        let json = serde_json::to_value(&results).expect("serialize");
        let spend = json[0]["spend"].as_f64().expect("finite spend is a number");
        assert!((spend - 250.0).abs() < 1e-9);
        assert_eq!(json[1]["program"], "cashback-only");
        assert!(json[1]["spend"].is_null());
        assert!(json[1]["required_points"].is_number());
    }
}
