//! Gauss-Kronrod Rule Evaluator
//!
//! A Kronrod rule extends an n-point Gauss rule with n+1 extra abscissae.
//! One pass over the 2n+1 Kronrod abscissae yields both estimates, and
//! their difference, rescaled by [`rescale_error`], is the local error
//! estimate.
//!
//! # Available Rules
//!
//! | [`RuleOrder`] | Gauss points | Kronrod points |
//! |---------------|--------------|----------------|
//! | `Gk15`        | 7            | 15             |
//! | `Gk21`        | 10           | 21             |
//! | `Gk31`        | 15           | 31             |
//! | `Gk41`        | 20           | 41             |
//! | `Gk51`        | 25           | 51             |
//! | `Gk61`        | 30           | 61             |

use std::fmt;

use num_traits::Zero;
use smallvec::SmallVec;

use crate::integrand::{EvalFailure, Integrand, Plain};
use crate::real::{Area, Real};
use crate::tables::*;

/// Selects one of the six Gauss-Kronrod pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RuleOrder {
    /// 7-point Gauss, 15-point Kronrod.
    Gk15,
    /// 10-point Gauss, 21-point Kronrod.
    #[default]
    Gk21,
    /// 15-point Gauss, 31-point Kronrod.
    Gk31,
    /// 20-point Gauss, 41-point Kronrod.
    Gk41,
    /// 25-point Gauss, 51-point Kronrod.
    Gk51,
    /// 30-point Gauss, 61-point Kronrod.
    Gk61,
}

impl RuleOrder {
    /// All orders, lowest first.
    pub const ALL: [RuleOrder; 6] = [
        RuleOrder::Gk15,
        RuleOrder::Gk21,
        RuleOrder::Gk31,
        RuleOrder::Gk41,
        RuleOrder::Gk51,
        RuleOrder::Gk61,
    ];

    /// Number of Kronrod abscissae (and integrand evaluations per interval).
    pub fn kronrod_points(self) -> usize {
        match self {
            RuleOrder::Gk15 => 15,
            RuleOrder::Gk21 => 21,
            RuleOrder::Gk31 => 31,
            RuleOrder::Gk41 => 41,
            RuleOrder::Gk51 => 51,
            RuleOrder::Gk61 => 61,
        }
    }

    /// Number of embedded Gauss abscissae.
    pub fn gauss_points(self) -> usize {
        self.kronrod_points() / 2
    }

    /// Looks up a rule by its Kronrod point count.
    pub fn from_points(points: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.kronrod_points() == points)
    }
}

impl fmt::Display for RuleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}K{}", self.gauss_points(), self.kronrod_points())
    }
}

/// Output of one rule application on `[a, b]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuleEstimate<T, A> {
    /// Kronrod estimate of the integral.
    pub result: A,
    /// Gauss estimate, from the shared abscissae.
    pub gauss: A,
    /// Rescaled error estimate.
    pub abs_error: T,
    /// Estimate of the integral of `|f|`.
    pub resabs: T,
    /// Estimate of the integral of `|f - mean(f)|`.
    pub resasc: T,
    /// Integrand evaluations spent.
    pub evaluations: usize,
}

/// A Gauss-Kronrod pair bound to its constant tables.
#[derive(Clone, Copy, Debug)]
pub struct GaussKronrodRule {
    order: RuleOrder,
    xgk: &'static [f64],
    wgk: &'static [f64],
    wg: &'static [f64],
}

impl GaussKronrodRule {
    /// Creates the rule for `order`.
    pub fn new(order: RuleOrder) -> Self {
        let (xgk, wgk, wg): (&'static [f64], &'static [f64], &'static [f64]) = match order {
            RuleOrder::Gk15 => (&XGK15, &WGK15, &WG15),
            RuleOrder::Gk21 => (&XGK21, &WGK21, &WG21),
            RuleOrder::Gk31 => (&XGK31, &WGK31, &WG31),
            RuleOrder::Gk41 => (&XGK41, &WGK41, &WG41),
            RuleOrder::Gk51 => (&XGK51, &WGK51, &WG51),
            RuleOrder::Gk61 => (&XGK61, &WGK61, &WG61),
        };
        Self { order, xgk, wgk, wg }
    }

    /// The order of this rule.
    pub fn order(&self) -> RuleOrder {
        self.order
    }

    /// Kronrod abscissae of the non-negative half, decreasing, centre last.
    pub fn abscissae(&self) -> &'static [f64] {
        self.xgk
    }

    /// Kronrod weights matching [`abscissae`](Self::abscissae).
    pub fn kronrod_weights(&self) -> &'static [f64] {
        self.wgk
    }

    /// Gauss weights of the odd-indexed abscissae (and the centre, if it is
    /// a Gauss node).
    pub fn gauss_weights(&self) -> &'static [f64] {
        self.wg
    }

    /// Applies the rule to `f` over `[a, b]`.
    ///
    /// The evaluation is a pure function of `(f, a, b)`. It stops at the
    /// first failed evaluation and never retries with other abscissae.
    /// An estimate that overflows to a non-finite value is reported as
    /// [`EvalFailure::NonFinite`] at the centre of the interval.
    pub fn evaluate<T, I>(
        &self,
        f: &I,
        a: T,
        b: T,
    ) -> Result<RuleEstimate<T, I::Output>, EvalFailure<T>>
    where
        T: Real,
        I: Integrand<T>,
    {
        let n = self.xgk.len();
        // Halve before combining so that spans wider than T::huge() stay finite.
        let half = T::lit(0.5);
        let center = half * a + half * b;
        let half_length = half * b - half * a;
        let abs_half_length = half_length.abs();

        let f_center = f.eval(center)?;

        let mut result_gauss = I::Output::zero();
        let mut result_kronrod = f_center * T::lit(self.wgk[n - 1]);
        let mut result_abs = result_kronrod.magnitude();

        // The centre is a Gauss node only for odd Gauss orders.
        if n % 2 == 0 {
            result_gauss = f_center * T::lit(self.wg[n / 2 - 1]);
        }

        let mut fv1: SmallVec<[I::Output; 32]> = SmallVec::from_elem(I::Output::zero(), n);
        let mut fv2: SmallVec<[I::Output; 32]> = SmallVec::from_elem(I::Output::zero(), n);

        // Gauss abscissae (odd positions)
        for j in 0..(n - 1) / 2 {
            let jtw = 2 * j + 1;
            let abscissa = half_length * T::lit(self.xgk[jtw]);
            let fval1 = f.eval(center - abscissa)?;
            let fval2 = f.eval(center + abscissa)?;
            let fsum = fval1 + fval2;
            fv1[jtw] = fval1;
            fv2[jtw] = fval2;
            result_gauss += fsum * T::lit(self.wg[j]);
            result_kronrod += fsum * T::lit(self.wgk[jtw]);
            result_abs += T::lit(self.wgk[jtw]) * (fval1.magnitude() + fval2.magnitude());
        }

        // Kronrod-only abscissae (even positions)
        for j in 0..n / 2 {
            let jtwm1 = 2 * j;
            let abscissa = half_length * T::lit(self.xgk[jtwm1]);
            let fval1 = f.eval(center - abscissa)?;
            let fval2 = f.eval(center + abscissa)?;
            fv1[jtwm1] = fval1;
            fv2[jtwm1] = fval2;
            result_kronrod += (fval1 + fval2) * T::lit(self.wgk[jtwm1]);
            result_abs += T::lit(self.wgk[jtwm1]) * (fval1.magnitude() + fval2.magnitude());
        }

        let mean = result_kronrod * T::lit(0.5);
        let mut result_asc = T::lit(self.wgk[n - 1]) * (f_center - mean).magnitude();
        for j in 0..n - 1 {
            result_asc += T::lit(self.wgk[j])
                * ((fv1[j] - mean).magnitude() + (fv2[j] - mean).magnitude());
        }

        let err = ((result_kronrod - result_gauss) * half_length).magnitude();

        let resabs = result_abs * abs_half_length;
        let resasc = result_asc * abs_half_length;

        let result = result_kronrod * half_length;
        let abs_error = rescale_error(err, resabs, resasc);
        if !result.is_finite_area() || !abs_error.is_finite() {
            return Err(EvalFailure::NonFinite { at: center });
        }

        Ok(RuleEstimate {
            result,
            gauss: result_gauss * half_length,
            abs_error,
            resabs,
            resasc,
            evaluations: 2 * n - 1,
        })
    }
}

/// Turns the raw Kronrod-Gauss difference into a realistic error estimate.
///
/// The raw difference overestimates the error of smooth integrands, so it
/// is steepened against `resasc` as `resasc * min(1, (200 * err / resasc)^1.5)`.
/// The result is then floored at `50 * eps * resabs`, the noise level of
/// the rule sum itself.
pub fn rescale_error<T: Real>(err: T, resabs: T, resasc: T) -> T {
    let mut abserr = err.abs();

    if resasc != T::zero() && abserr != T::zero() {
        let scale = (T::lit(200.0) * abserr / resasc).powf(T::lit(1.5));
        abserr = if scale < T::one() { resasc * scale } else { resasc };
    }

    let noise = T::lit(50.0) * T::eps();
    if resabs > T::tiny() / noise {
        let min_err = noise * resabs;
        if min_err > abserr {
            abserr = min_err;
        }
    }

    abserr
}

/// Applies a single Gauss-Kronrod rule to a closure over `[a, b]`.
///
/// # Example
///
/// ```ignore
/// use quadra_rules::{qk_integrate, RuleOrder};
///
/// let est = qk_integrate(|x: f64| x.sin(), 0.0, std::f64::consts::PI, RuleOrder::Gk21)?;
/// assert!((est.result - 2.0).abs() < 1e-14);
/// ```
pub fn qk_integrate<T, A, F>(
    f: F,
    a: T,
    b: T,
    order: RuleOrder,
) -> Result<RuleEstimate<T, A>, EvalFailure<T>>
where
    T: Real,
    A: Area<T>,
    F: Fn(T) -> A,
{
    GaussKronrodRule::new(order).evaluate(&Plain::new(f), a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use std::f64::consts::PI;

    #[test]
    fn test_tables_are_consistent() {
        for order in RuleOrder::ALL {
            let rule = GaussKronrodRule::new(order);
            assert_eq!(rule.abscissae().len(), rule.kronrod_weights().len());
            assert_eq!(2 * rule.abscissae().len() - 1, order.kronrod_points());
            assert_eq!(rule.gauss_weights().len(), (order.gauss_points() + 1) / 2);
            assert_eq!(*rule.abscissae().last().unwrap(), 0.0);

            let n = rule.abscissae().len();
            let wgk = rule.kronrod_weights();
            let kronrod_sum = 2.0 * wgk[..n - 1].iter().sum::<f64>() + wgk[n - 1];
            assert!((kronrod_sum - 2.0).abs() < 1e-14, "{order}: {kronrod_sum}");

            let wg = rule.gauss_weights();
            let gauss_sum = if n % 2 == 0 {
                2.0 * wg[..wg.len() - 1].iter().sum::<f64>() + wg[wg.len() - 1]
            } else {
                2.0 * wg.iter().sum::<f64>()
            };
            assert!((gauss_sum - 2.0).abs() < 1e-14, "{order}: {gauss_sum}");
        }
    }

    #[test]
    fn test_from_points() {
        assert_eq!(RuleOrder::from_points(31), Some(RuleOrder::Gk31));
        assert_eq!(RuleOrder::from_points(17), None);
        assert_eq!(RuleOrder::Gk61.to_string(), "G30K61");
    }

    #[test]
    fn test_integrate_polynomial() {
        // ∫₀¹ x² dx = 1/3
        let est = qk_integrate(|x: f64| x * x, 0.0, 1.0, RuleOrder::Gk15).unwrap();
        assert!((est.result - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(est.evaluations, 15);
    }

    #[test]
    fn test_integrate_sine_all_orders() {
        // ∫₀^π sin(x) dx = 2
        for order in RuleOrder::ALL {
            let est = qk_integrate(|x: f64| x.sin(), 0.0, PI, order).unwrap();
            assert!((est.result - 2.0).abs() < 1e-14, "{order}: {}", est.result);
            assert!(est.abs_error < 1e-12);
            assert_eq!(est.evaluations, order.kronrod_points());
        }
    }

    #[test]
    fn test_integrate_exponential() {
        // ∫₀¹ e^x dx = e - 1
        let est = qk_integrate(|x: f64| x.exp(), 0.0, 1.0, RuleOrder::Gk21).unwrap();
        assert!((est.result - (std::f64::consts::E - 1.0)).abs() < 1e-14);
    }

    #[test]
    fn test_resabs_and_resasc() {
        // ∫₋₁¹ |x| dx = 1, and f is odd so the mean is zero
        let est = qk_integrate(|x: f64| x, -1.0, 1.0, RuleOrder::Gk15).unwrap();
        assert!(est.result.abs() < 1e-15);
        assert!((est.resabs - 1.0).abs() < 1e-2);
        assert!((est.resasc - est.resabs).abs() < 1e-15);
    }

    #[test]
    fn test_reversed_limits_change_sign() {
        let forward = qk_integrate(|x: f64| x.exp(), 0.0, 2.0, RuleOrder::Gk31).unwrap();
        let backward = qk_integrate(|x: f64| x.exp(), 2.0, 0.0, RuleOrder::Gk31).unwrap();
        assert_eq!(forward.result, -backward.result);
        assert_eq!(forward.abs_error, backward.abs_error);
        assert!(backward.resabs > 0.0);
    }

    #[test]
    fn test_complex_integrand() {
        // ∫₀^π e^{ix} dx = 2i
        let est = qk_integrate(|x: f64| Complex::new(x.cos(), x.sin()), 0.0, PI, RuleOrder::Gk21)
            .unwrap();
        assert!((est.result - Complex::new(0.0, 2.0)).norm() < 1e-14);
    }

    #[test]
    fn test_single_precision() {
        let est = qk_integrate(|x: f32| x.cos(), 0.0f32, 1.0f32, RuleOrder::Gk15).unwrap();
        assert!((est.result - 1.0f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_at_center() {
        let err = qk_integrate(
            |x: f64| if x == 0.5 { f64::NAN } else { 1.0 },
            0.0,
            1.0,
            RuleOrder::Gk21,
        )
        .unwrap_err();
        assert_eq!(err.at(), 0.5);
    }

    #[test]
    fn test_span_wider_than_max_float() {
        // b - a overflows, but the halved span does not
        let est = qk_integrate(|x: f64| 1.0 / (1.0 + x * x), -1e308, 1e308, RuleOrder::Gk21)
            .unwrap();
        assert!(est.result.is_finite());
        assert!(est.abs_error.is_finite() && est.abs_error >= 0.0);
        assert!(est.resabs.is_finite());
    }

    #[test]
    fn test_overflowing_estimate_is_non_finite() {
        // ∫ 1 over [-1e308, 1e308] is 2e308, past f64::MAX
        let err = qk_integrate(|_: f64| 1.0, -1e308, 1e308, RuleOrder::Gk21).unwrap_err();
        assert!(matches!(err, EvalFailure::NonFinite { .. }));
        assert_eq!(err.at(), 0.0);
    }

    #[test]
    fn test_rescale_error_steepening() {
        // Tiny raw difference is steepened below the raw value
        let e = rescale_error(1e-8, 1.0, 1.0);
        assert!(e < 1e-8);
        assert!((e - (200.0f64 * 1e-8).powf(1.5)).abs() < 1e-20);

        // A difference comparable to resasc is capped at resasc
        assert_eq!(rescale_error(0.1, 1.0, 0.5), 0.5);

        // Noise floor
        let floor = 50.0 * f64::EPSILON * 2.0;
        assert_eq!(rescale_error(0.0, 2.0, 1.0), floor);
    }
}
