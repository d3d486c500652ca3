//! Property-based tests for the workspace and the drivers.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use quadra_rules::Plain;

    use crate::{integrate, integrate_smooth, IntegrationError, IntegrationOptions, Tolerance, Workspace};

    fn horner(coeffs: &[f64], x: f64) -> f64 {
        coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    fn antiderivative(coeffs: &[f64], x: f64) -> f64 {
        coeffs
            .iter()
            .enumerate()
            .rev()
            .fold(0.0, |acc, (k, &c)| acc * x + c / (k + 1) as f64)
            * x
    }

    proptest! {
        // Bisecting the worst interval any number of times keeps a partition
        #[test]
        fn bisections_tile_the_domain(
            lower in -10.0f64..10.0,
            width in 0.1f64..10.0,
            errors in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 1..40),
        ) {
            let upper = lower + width;
            let mut ws = Workspace::<f64>::new(64);
            ws.initialize(lower, upper, 0.0, 1.0).unwrap();
            for (e1, e2) in errors {
                let (id, parent) = ws.worst().unwrap();
                let parent = *parent;
                let mid = parent.midpoint().unwrap();
                let left = parent.child(parent.lower, mid, 0.0, e1);
                let right = parent.child(mid, parent.upper, 0.0, e2);
                ws.replace(id, left, right).unwrap();
            }
            prop_assert!(ws.tiles(lower, upper));

            let ranked: Vec<f64> = ws.iter_ranked().map(|s| s.abs_error).collect();
            prop_assert!(ranked.windows(2).all(|w| w[0] >= w[1]));
            let direct: f64 = ws.iter().map(|s| s.abs_error).sum();
            prop_assert!((ws.total().abs_error - direct).abs() <= 1e-12 * (1.0 + direct));
        }

        // Negative or NaN tolerances are always rejected
        #[test]
        fn negative_tolerance_rejected(abs in -1.0f64..-1e-300, rel in 0.0f64..1.0) {
            prop_assert!(Tolerance::new(abs, rel).validate::<f64>().is_err());
            prop_assert!(Tolerance::new(rel, abs).validate::<f64>().is_err());
        }

        // Low-degree polynomials converge on the first estimate
        #[test]
        fn polynomials_converge(
            coeffs in prop::collection::vec(-3.0f64..3.0, 1..6),
            lower in -2.0f64..0.0,
            upper in 0.5f64..2.0,
        ) {
            let f = Plain::new(|x: f64| horner(&coeffs, x));
            let exact = antiderivative(&coeffs, upper) - antiderivative(&coeffs, lower);
            let opts = IntegrationOptions::new(1e-10, 1e-10);
            match integrate(&f, lower, upper, &opts) {
                Ok(r) => {
                    prop_assert!((r.value - exact).abs() <= 1e-9 * (1.0 + exact.abs()));
                    prop_assert_eq!(r.intervals, 1);
                }
                // A cancelling integral may sit at noise level
                Err(IntegrationError::RoundoffLimited { best, .. }) => {
                    prop_assert!((best.value - exact).abs() <= 1e-9 * (1.0 + exact.abs()));
                }
                Err(e) => prop_assert!(false, "unexpected {}", e),
            }
        }

        // Swapping the limits negates the result
        #[test]
        fn reversal_negates(lower in -3.0f64..3.0, width in 0.1f64..3.0, k in 0.5f64..4.0) {
            let f = Plain::new(|x: f64| (k * x).cos() + x * x);
            let opts = IntegrationOptions::new(1e-10, 1e-10);
            let upper = lower + width;
            let fwd = integrate_smooth(&f, lower, upper, &opts).unwrap();
            let bwd = integrate_smooth(&f, upper, lower, &opts).unwrap();
            prop_assert_eq!(fwd.value, -bwd.value);
            prop_assert_eq!(fwd.abs_error, bwd.abs_error);
        }
    }
}
