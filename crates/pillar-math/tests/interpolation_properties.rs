//! Property tests for the interpolation schemes.

use pillar_math::prelude::*;
use proptest::prelude::*;

/// Strictly increasing abscissae with positive ordinates.
fn nodes() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (3usize..10).prop_flat_map(|n| {
        (
            prop::collection::vec(0.05f64..3.0, n),
            prop::collection::vec(0.001f64..0.08, n),
        )
            .prop_map(|(steps, ys)| {
                let mut xs = Vec::with_capacity(steps.len());
                let mut acc = 0.0;
                for step in steps {
                    acc += step;
                    xs.push(acc);
                }
                (xs, ys)
            })
    })
}

fn all_schemes(xs: &[f64], ys: &[f64]) -> Vec<Box<dyn Interpolator>> {
    let (x, y) = (xs.to_vec(), ys.to_vec());
    vec![
        Box::new(LinearInterpolator::new(x.clone(), y.clone()).unwrap()),
        Box::new(LogInterpolator::log_linear(x.clone(), y.clone()).unwrap()),
        Box::new(LogInterpolator::log_cubic(x.clone(), y.clone()).unwrap()),
        Box::new(QuadraticInterpolator::new(x.clone(), y.clone()).unwrap()),
        Box::new(CubicInterpolator::natural_spline(x.clone(), y.clone()).unwrap()),
        Box::new(CubicInterpolator::not_a_knot(x.clone(), y.clone()).unwrap()),
        Box::new(CubicInterpolator::kruger(x.clone(), y.clone(), true).unwrap()),
        Box::new(CubicInterpolator::hermite(x.clone(), y.clone()).unwrap()),
        Box::new(BackwardFlatInterpolator::new(x, y).unwrap()),
    ]
}

proptest! {
    #[test]
    fn interpolators_reproduce_nodes((xs, ys) in nodes()) {
        for interp in all_schemes(&xs, &ys) {
            for (x, y) in xs.iter().zip(ys.iter()) {
                let value = interp.interpolate(*x).unwrap();
                prop_assert!((value - y).abs() < 1e-10, "{:?} at {}: {} vs {}", interp, x, value, y);
            }
        }
    }

    #[test]
    fn monotonic_kruger_preserves_monotone_data((xs, mut ys) in nodes()) {
        ys.sort_by(f64::total_cmp);
        let interp = CubicInterpolator::kruger(xs.clone(), ys, true).unwrap();
        let (lo, hi) = (xs[0], xs[xs.len() - 1]);
        let mut previous = interp.interpolate(lo).unwrap();
        for k in 1..=200 {
            let x = lo + (hi - lo) * f64::from(k) / 200.0;
            let value = interp.interpolate(x).unwrap();
            prop_assert!(value >= previous - 1e-12);
            previous = value;
        }
    }

    #[test]
    fn positive_monotone_convex_stays_positive((xs, ys) in nodes()) {
        let mut times = vec![0.0];
        times.extend(xs.iter().copied());
        let mc = MonotoneConvex::positive(times.clone(), ys.clone()).unwrap();
        let end = times[times.len() - 1];
        for k in 0..=200 {
            let t = end * f64::from(k) / 200.0;
            prop_assert!(mc.interpolate(t).unwrap() >= -1e-12);
        }
        // node integrals match the discrete forwards
        let mut total = 0.0;
        for i in 1..times.len() {
            total += ys[i - 1] * (times[i] - times[i - 1]);
            prop_assert!((mc.primitive(times[i]).unwrap() - total).abs() < 1e-10);
        }
    }
}
