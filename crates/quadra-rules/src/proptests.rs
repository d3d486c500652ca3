//! Property-based tests for the rule evaluator.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{qk_integrate, rescale_error, RuleOrder};

    fn rule_order() -> impl Strategy<Value = RuleOrder> {
        prop::sample::select(RuleOrder::ALL.to_vec())
    }

    // Coefficients kept small so the exact integral stays O(1)
    fn coefficients() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-2.0f64..2.0, 1..8)
    }

    fn horner(coeffs: &[f64], x: f64) -> f64 {
        coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    fn exact_on_unit(coeffs: &[f64]) -> f64 {
        coeffs
            .iter()
            .enumerate()
            .map(|(k, &c)| c / (k + 1) as f64)
            .sum()
    }

    proptest! {
        // Every rule integrates polynomials of degree ≤ 13 exactly on [0, 1]
        #[test]
        fn polynomial_exactness(order in rule_order(), coeffs in coefficients()) {
            let est = qk_integrate(|x| horner(&coeffs, x), 0.0, 1.0, order).unwrap();
            let exact = exact_on_unit(&coeffs);
            let scale = 1.0 + est.resabs;
            prop_assert!((est.result - exact).abs() <= 1e-13 * scale,
                "{}: {} vs {}", order, est.result, exact);
            prop_assert!(est.abs_error <= 1e-12 * scale);
        }

        // Swapping the limits negates the estimate and keeps the error
        #[test]
        fn reversal_antisymmetry(order in rule_order(), a in -5.0f64..5.0, w in 0.01f64..5.0) {
            let b = a + w;
            let fwd = qk_integrate(|x: f64| (x * 1.3).cos() + x, a, b, order).unwrap();
            let bwd = qk_integrate(|x: f64| (x * 1.3).cos() + x, b, a, order).unwrap();
            prop_assert_eq!(fwd.result, -bwd.result);
            prop_assert_eq!(fwd.abs_error, bwd.abs_error);
        }

        #[test]
        fn magnitudes_are_ordered(order in rule_order(), a in -3.0f64..3.0, w in 0.01f64..3.0) {
            let est = qk_integrate(|x: f64| (3.0 * x).sin() * x.exp(), a, a + w, order).unwrap();
            prop_assert!(est.resabs >= est.result.abs() * (1.0 - 1e-12));
            prop_assert!(est.resasc >= 0.0);
            prop_assert!(est.abs_error >= 0.0);
        }

        #[test]
        fn rescaled_error_never_exceeds_resasc(err in 0.0f64..1.0, resasc in 1e-6f64..1.0) {
            let e = rescale_error(err, 1e-3, resasc);
            prop_assert!(e <= resasc.max(50.0 * f64::EPSILON * 1e-3));
        }
    }
}
