use spo_core::Shop;

use super::*;

fn offer(program: &str, ppe: Option<f64>, cashback: Option<f64>) -> RateOffer {
    RateOffer {
        program: program.to_owned(),
        points_per_eur: ppe,
        cashback_pct: cashback,
        ..RateOffer::default()
    }
}

fn group(program: &str, rates: Vec<RateOffer>) -> ProgramRates {
    ProgramRates {
        program: program.to_owned(),
        rates,
    }
}

#[test]
fn offer_line_shows_per_hundred_value() {
    let line = offer_line(&RateOffer {
        point_value_eur: Some(0.01),
        ..offer("Payback", Some(1.0), Some(2.0))
    });
    assert_eq!(line, "1 points/€ + 2% cashback (≈ 3.00€ per 100€)");
}

#[test]
fn offer_line_absolute_only_has_no_per_hundred_value() {
    let line = offer_line(&RateOffer {
        program: "Payback".to_owned(),
        points_absolute: Some(500.0),
        incentive_text: Some("  for new contracts ".to_owned()),
        ..RateOffer::default()
    });
    assert_eq!(line, "500 points per order [for new contracts]");
}

#[test]
fn offer_line_without_any_rate() {
    assert_eq!(offer_line(&RateOffer::default()), "no rate");
}

#[test]
fn programs_block_marks_overall_best() {
    let groups = vec![
        group("Payback", vec![offer("Payback", Some(0.5), None)]),
        group("Shoop", vec![offer("Shoop", None, Some(4.0))]),
    ];
    let block = programs_block(&groups, ValuationPolicy::default());
    let lines: Vec<&str> = block.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("  Payback: "), "got: {block}");
    assert!(lines[1].starts_with("* Shoop: 4% cashback"), "got: {block}");
}

#[test]
fn programs_block_without_rates_falls_back() {
    let groups = vec![group("Payback", Vec::new())];
    assert_eq!(
        programs_block(&groups, ValuationPolicy::default()),
        "no rates available"
    );
    assert_eq!(
        programs_block(&[], ValuationPolicy::default()),
        "no rates available"
    );
}

#[test]
fn view_text_shop_found() {
    let state = ViewState::ShopFound {
        shop: Shop {
            id: 2,
            name: "Otto".to_owned(),
            url: Some("https://www.otto.de".to_owned()),
            alternative_urls: Vec::new(),
            status: "active".to_owned(),
        },
        programs: Vec::new(),
    };
    assert_eq!(
        view_text(&state, ValuationPolicy::default()),
        "Otto (shop #2)\nno rates available"
    );
}

#[test]
fn view_text_logged_out_asks_for_login() {
    let state = ViewState::ShopNotFound {
        proposal_url: "https://newshop.de".to_owned(),
        login: LoginState::LoggedOut,
        proposal: ProposalState::NotStarted,
    };
    let text = view_text(&state, ValuationPolicy::default());
    assert!(text.starts_with("no known shop for https://newshop.de\n"));
    assert!(text.contains("log in"));
}

#[test]
fn view_text_created_proposal_shows_preview() {
    let state = ViewState::ShopNotFound {
        proposal_url: "https://newshop.de".to_owned(),
        login: LoginState::LoggedIn,
        proposal: ProposalState::Created {
            shop_id: 5,
            programs: vec![group("Payback", vec![offer("Payback", Some(1.0), None)])],
        },
    };
    let text = view_text(&state, ValuationPolicy::default());
    assert!(text.contains("proposal for shop #5 created"), "got: {text}");
    assert!(text.contains("* Payback: 1 points/€"), "got: {text}");
}

#[test]
fn view_text_error_offers_retry() {
    let state = ViewState::Error {
        message: "timeout".to_owned(),
    };
    assert_eq!(
        view_text(&state, ValuationPolicy::default()),
        "error: timeout\nrun the command again to retry"
    );
}

#[test]
fn voucher_table_marks_unreachable_programs() {
    let estimates = vec![
        VoucherEstimate {
            program: "Payback".to_owned(),
            required_points: 1000.0,
            spend: 1000.0,
        },
        VoucherEstimate {
            program: "Shoop".to_owned(),
            required_points: 2000.0,
            spend: f64::INFINITY,
        },
    ];
    let table = voucher_table(10.0, &estimates);
    let last = table.lines().last().unwrap_or_default();
    assert!(last.starts_with("Shoop"), "got: {table}");
    assert!(last.trim_end().ends_with('-'), "got: {table}");
}

#[test]
fn purchase_table_lists_every_program() {
    let estimates = vec![PurchaseEstimate {
        program: "Payback".to_owned(),
        points: 50.0,
        euros: 0.25,
    }];
    let table = purchase_table(50.0, &estimates);
    assert!(table.starts_with("purchase of 50.00€\n"));
    assert!(table.contains("Payback"));
    assert!(table.contains("0.25"));
    assert_eq!(purchase_table(50.0, &[]), "no rates available");
}

#[test]
fn suggestions_text_lists_hits_or_explains_none() {
    let hits = vec![
        ShopSuggestion {
            id: 1,
            name: "Amazon".to_owned(),
        },
        ShopSuggestion {
            id: 12,
            name: "Amazon Fresh".to_owned(),
        },
    ];
    assert_eq!(
        suggestions_text("ama", &hits),
        "     1  Amazon\n    12  Amazon Fresh"
    );
    assert_eq!(suggestions_text("zz", &[]), "no shops match 'zz'");
}

#[test]
fn voucher_estimates_serialize_unreachable_spend_as_null() {
    let estimates = vec![VoucherEstimate {
        program: "Shoop".to_owned(),
        required_points: 2000.0,
        spend: f64::INFINITY,
    }];
    let json = serde_json::to_string(&estimates).expect("serialize");
    assert_eq!(
        json,
        r#"[{"program":"Shoop","required_points":2000.0,"spend":null}]"#
    );
}
