//! Benchmarks for the yield curve bootstrap.
//!
//! Run with: cargo bench -p pillar-curves

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use pillar_core::Date;
use pillar_curves::{CurveDependencies, YieldCurveBuilder, YieldCurveMap};
use pillar_market::config::{InterpolationMethod, InterpolationVariable, YieldCurveConfig};
use pillar_market::conventions::Conventions;
use pillar_market::quotes::InMemoryQuoteStore;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

const OIS_TENORS: [(&str, f64); 14] = [
    ("1Y", 0.0375),
    ("18M", 0.0350),
    ("2Y", 0.0330),
    ("3Y", 0.0310),
    ("4Y", 0.0300),
    ("5Y", 0.0290),
    ("6Y", 0.0287),
    ("7Y", 0.0285),
    ("8Y", 0.0283),
    ("10Y", 0.0280),
    ("12Y", 0.0281),
    ("15Y", 0.0283),
    ("20Y", 0.0282),
    ("30Y", 0.0270),
];

fn asof() -> Date {
    Date::from_ymd(2024, 1, 15).unwrap()
}

fn conventions() -> Conventions {
    Conventions::from_json_str(
        r#"{
            "EUR-ON-DEP": { "type": "Deposit", "index": "EUR-ESTER" },
            "EUR-OIS": { "type": "Ois", "index": "EUR-ESTER", "fixed_day_count": "A360" }
        }"#,
    )
    .unwrap()
}

fn quotes() -> InMemoryQuoteStore {
    let mut store = InMemoryQuoteStore::new();
    store.add_quote(asof(), "MM/RATE/EUR/0D/1D", 0.039).unwrap();
    for (tenor, rate) in OIS_TENORS {
        store
            .add_quote(asof(), &format!("IR_SWAP/RATE/EUR/2D/1D/{tenor}"), rate)
            .unwrap();
    }
    store
}

fn config(method: InterpolationMethod, variable: InterpolationVariable) -> YieldCurveConfig {
    let mut config: YieldCurveConfig = serde_json::from_str(
        r#"{
            "curve_id": "EUR-ESTR",
            "currency": "EUR",
            "segments": [
                { "type": "Deposit", "conventions_id": "EUR-ON-DEP", "quotes": ["MM/RATE/EUR/0D/1D"] },
                { "type": "Ois", "conventions_id": "EUR-OIS", "quotes": ["IR_SWAP/RATE/EUR/2D/1D/*"] }
            ]
        }"#,
    )
    .unwrap();
    config.interpolation_method = method;
    config.interpolation_variable = variable;
    config
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_bootstrap(c: &mut Criterion) {
    let conventions = conventions();
    let quotes = quotes();
    let built = YieldCurveMap::new();

    let mut group = c.benchmark_group("ois_bootstrap");
    for (label, method, variable) in [
        ("loglinear_discount", InterpolationMethod::LogLinear, InterpolationVariable::Discount),
        ("linear_zero", InterpolationMethod::Linear, InterpolationVariable::Zero),
        ("cubic_zero", InterpolationMethod::NaturalCubic, InterpolationVariable::Zero),
    ] {
        let config = config(method, variable);
        group.bench_with_input(BenchmarkId::from_parameter(label), &config, |b, config| {
            b.iter(|| {
                YieldCurveBuilder::new(
                    asof(),
                    black_box(config),
                    &conventions,
                    &quotes,
                    CurveDependencies::new(&built),
                )
                .build()
                .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_rebake(c: &mut Criterion) {
    let conventions = conventions();
    let quotes = quotes();
    let built = YieldCurveMap::new();
    let mut config = config(InterpolationMethod::LogLinear, InterpolationVariable::Discount);
    config.preserve_quote_linkage = true;
    let curve = YieldCurveBuilder::new(asof(), &config, &conventions, &quotes, CurveDependencies::new(&built))
        .build()
        .unwrap();
    let piecewise = curve.piecewise().unwrap();

    c.bench_function("rebake", |b| b.iter(|| black_box(piecewise).rebake().unwrap()));
}

criterion_group!(bootstrap, bench_bootstrap, bench_rebake);
criterion_main!(bootstrap);
