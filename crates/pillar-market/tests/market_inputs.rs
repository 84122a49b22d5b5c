//! End-to-end loading of quotes, conventions and configurations.

use pillar_market::config::{sorted_unique, Validate};
use pillar_market::prelude::*;
use proptest::prelude::*;

const QUOTES: &str = "\
2024-01-15,MM/RATE/EUR/0D/1D,0.0390
2024-01-15,IR_SWAP/RATE/EUR/2D/1D/1Y,0.0350
2024-01-15,IR_SWAP/RATE/EUR/2D/1D/2Y,0.0310
2024-01-15,IR_SWAP/RATE/EUR/2D/1D/5Y,0.0270
2024-01-15,IR_SWAP/RATE/EUR/2D/6M/5Y,0.0290
2024-01-15,COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2024-06-01/90,0.35
2024-01-15,COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2024-06-01/100,0.32
2024-01-15,COMMODITY_OPTION/PRICE/WTI/USD/c1/100/C,2.5
";

const CONVENTIONS: &str = r#"{
    "EUR-ON": { "type": "Deposit", "index": "EUR-ESTER" },
    "EUR-OIS": { "type": "Ois", "index": "EUR-ESTER", "fixed_day_count": "A360", "spot_lag": 2 }
}"#;

const CONFIGS: &str = r#"
[[yield_curves]]
curve_id = "EUR-ESTR"
currency = "EUR"
interpolation_method = "LogLinear"

[[yield_curves.segments]]
type = "Deposit"
conventions_id = "EUR-ON"
quotes = ["MM/RATE/EUR/0D/1D"]

[[yield_curves.segments]]
type = "Ois"
conventions_id = "EUR-OIS"
quotes = ["IR_SWAP/RATE/EUR/2D/1D/*"]
priority = 1
min_distance = 5
"#;

fn asof() -> Date {
    Date::from_ymd(2024, 1, 15).unwrap()
}

#[test]
fn test_segment_quotes_resolve_against_store() {
    let store = InMemoryQuoteStore::from_csv_reader(QUOTES.as_bytes()).unwrap();
    let conventions = Conventions::from_json_str(CONVENTIONS).unwrap();
    let configs = CurveConfigurations::from_toml_str(CONFIGS).unwrap();
    assert!(configs.is_valid());

    let config = configs.yield_curve("EUR-ESTR").unwrap();
    let ois = &config.segments[1];
    assert_eq!(ois.priority, 1);
    let convention = conventions.ois(&ois.conventions_id).unwrap();
    assert!(convention.index.is_overnight());

    match ois.quote_selection(&config.curve_id).unwrap() {
        QuoteSelection::Wildcard(w) => {
            let names: Vec<String> = store
                .get_pattern(&w, asof())
                .iter()
                .map(|q| q.name().to_string())
                .collect();
            assert_eq!(
                names,
                vec![
                    "IR_SWAP/RATE/EUR/2D/1D/1Y",
                    "IR_SWAP/RATE/EUR/2D/1D/2Y",
                    "IR_SWAP/RATE/EUR/2D/1D/5Y"
                ]
            );
        }
        QuoteSelection::Explicit(_) => panic!("expected wildcard mode"),
    }
}

#[test]
fn test_commodity_option_quotes_parse() {
    let store = InMemoryQuoteStore::from_csv_reader(QUOTES.as_bytes()).unwrap();
    let w = Wildcard::new("COMMODITY_OPTION/*/WTI/USD/*").unwrap();
    let options = store.get_pattern(&w, asof());
    assert_eq!(options.len(), 3);
    let price = store
        .get("COMMODITY_OPTION/PRICE/WTI/USD/c1/100/C", asof())
        .unwrap();
    assert_eq!(price.quote_type(), QuoteType::Price);
    match price.details() {
        QuoteDetails::CommodityOption { expiry, strike, .. } => {
            assert_eq!(*expiry, Expiry::FutureContinuation(1));
            assert_eq!(strike.absolute(), Some(100.0));
        }
        other => panic!("unexpected details {other:?}"),
    }
}

#[test]
fn test_wrong_convention_kind_is_reported() {
    let conventions = Conventions::from_json_str(CONVENTIONS).unwrap();
    let err = conventions.deposit("EUR-OIS").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Conventions ID does not give deposit rate conventions."
    );
}

proptest! {
    #[test]
    fn prop_prefix_wildcard_matches_exactly_the_prefixed_names(
        prefix in "[A-Z]{1,4}/[A-Z]{1,3}",
        suffix in "[A-Z0-9/]{0,8}",
        other in "[A-Z0-9/]{1,12}",
    ) {
        let w = Wildcard::new(&format!("{prefix}*")).unwrap();
        let name = format!("{prefix}{suffix}");
        prop_assert!(w.matches(&name));
        prop_assert_eq!(w.matches(&other), other.starts_with(&prefix));
    }

    #[test]
    fn prop_sorted_unique_is_strictly_increasing(levels in prop::collection::vec(0.01f64..10.0, 1..12)) {
        match sorted_unique("X", &levels, "dup") {
            Ok(sorted) => {
                prop_assert_eq!(sorted.len(), levels.len());
                prop_assert!(sorted.windows(2).all(|w| w[0] < w[1]));
            }
            Err(_) => {
                let mut s = levels.clone();
                s.sort_by(f64::total_cmp);
                prop_assert!(s.windows(2).any(|w| pillar_market::quotes::close_enough(w[0], w[1])));
            }
        }
    }
}
