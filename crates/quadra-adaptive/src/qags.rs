//! Adaptive Integration With Extrapolation
//!
//! The QAGS strategy. Bisection proceeds as in
//! [`integrate_smooth`](crate::integrate_smooth), but the sequence of
//! partial sums is fed to the epsilon algorithm, which accelerates
//! convergence for integrands with endpoint singularities.
//!
//! # Algorithm
//!
//! 1. Apply the rule to every initial subinterval. Stop early if the
//!    first estimate already meets the tolerance.
//! 2. Bisect the worst subinterval. While the bisection level is shallow,
//!    keep going like QAG.
//! 3. Once every remaining large error sits on subintervals of the
//!    deepest level, the "small" intervals are considered resolved: bisect
//!    the large ones until their error falls below the current target,
//!    then append the partial sum to the extrapolation table.
//! 4. Keep the best extrapolated value; stop when its error meets the
//!    tolerance, when the raw sum does, or when a failure is diagnosed.
//!
//! [`integrate_with_breakpoints`] runs the same loop from a caller-supplied
//! decomposition (QAGP), for integrands with interior singularities at
//! known points.

use log::{debug, trace};
use quadra_rules::{Area, GaussKronrodRule, Integrand, Real};

use crate::driver::{
    bisect, check_options, orient, prepare, raw_result, subinterval_too_small, Domain,
};
use crate::error::{ComputeResult, IntegrationError, IntegrationResult, Irregularity, RoundoffStage};
use crate::extrapolation::ExtrapolationTable;
use crate::options::IntegrationOptions;
use crate::workspace::{Subinterval, Workspace};

/// Why the loop stopped before meeting the tolerance.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Stop<T> {
    Limit,
    Roundoff,
    ExtrapolationRoundoff,
    Unresolvable { lower: T, upper: T },
    Divergent,
}

/// Integrates `f` over `[lower, upper]` with adaptive bisection and
/// epsilon-algorithm extrapolation.
///
/// # Example
///
/// ```ignore
/// use quadra_adaptive::{integrate, IntegrationOptions};
/// use quadra_rules::Plain;
///
/// // ∫₀¹ 1/√x dx = 2
/// let f = Plain::new(|x: f64| 1.0 / x.sqrt());
/// let r = integrate(&f, 0.0, 1.0, &IntegrationOptions::new(1e-8, 1e-8))?;
/// assert!((r.value - 2.0).abs() < 1e-8);
/// assert!(r.extrapolated);
/// ```
pub fn integrate<T, I>(
    f: &I,
    lower: T,
    upper: T,
    options: &IntegrationOptions<T>,
) -> IntegrationResult<T, I::Output>
where
    T: Real,
    I: Integrand<T>,
{
    match prepare(lower, upper, options)? {
        None => Ok(ComputeResult::zero()),
        Some(Domain {
            lower,
            upper,
            flipped,
        }) => orient(extrapolating_loop(f, &[lower, upper], options), flipped),
    }
}

/// Integrates `f` over `[points[0], points[n-1]]`, starting from the
/// subintervals delimited by `points`.
///
/// The breakpoints should include the locations of interior
/// singularities; the integrand is never evaluated at a breakpoint.
/// `points` must be finite and ascending. Repeated points are merged.
pub fn integrate_with_breakpoints<T, I>(
    f: &I,
    points: &[T],
    options: &IntegrationOptions<T>,
) -> IntegrationResult<T, I::Output>
where
    T: Real,
    I: Integrand<T>,
{
    check_options(options)?;
    if points.len() < 2 {
        return Err(IntegrationError::InvalidParameter(format!(
            "at least two breakpoints are required, got {}",
            points.len()
        )));
    }
    if let Some(p) = points.iter().find(|p| !p.is_finite()) {
        return Err(IntegrationError::InvalidParameter(format!(
            "breakpoints must be finite, got {p}"
        )));
    }
    if points.windows(2).any(|w| w[0] > w[1]) {
        return Err(IntegrationError::InvalidParameter(
            "breakpoints must be in ascending order".to_string(),
        ));
    }

    let mut distinct = points.to_vec();
    distinct.dedup();
    if distinct.len() < 2 {
        return Ok(ComputeResult::zero());
    }
    extrapolating_loop(f, &distinct, options)
}

fn extrapolating_loop<T, I>(
    f: &I,
    points: &[T],
    options: &IntegrationOptions<T>,
) -> IntegrationResult<T, I::Output>
where
    T: Real,
    I: Integrand<T>,
{
    let tolerance = options.tolerance;
    let thresholds = &options.thresholds;
    let limit = options.max_intervals;
    let rule = GaussKronrodRule::new(options.rule);
    let pieces = points.len() - 1;
    let single = pieces == 1;

    debug!(
        "qags: [{}, {}] in {} pieces with {} (abs {:e}, rel {:e}, limit {})",
        points[0],
        points[pieces],
        pieces,
        options.rule,
        tolerance.abs,
        tolerance.rel,
        limit
    );

    // Initial estimates over the given decomposition
    let mut evaluations = 0;
    let mut initial = Vec::with_capacity(pieces);
    let mut result0 = <I::Output as Area<T>>::from_real(T::zero());
    let mut error0 = T::zero();
    let mut resabs0 = T::zero();
    for w in points.windows(2) {
        let est = rule.evaluate(f, w[0], w[1]).map_err(|e| {
            let partial = ComputeResult {
                value: result0,
                abs_error: error0,
                evaluations,
                intervals: initial.len(),
                extrapolated: false,
            };
            IntegrationError::from_eval(e, partial)
        })?;
        evaluations += est.evaluations;
        result0 += est.result;
        error0 += est.abs_error;
        resabs0 += est.resabs;
        initial.push(est);
    }

    let first = ComputeResult {
        value: result0,
        abs_error: error0,
        evaluations,
        intervals: pieces,
        extrapolated: false,
    };
    let tol = tolerance.target(result0.magnitude());
    if error0 <= T::lit(100.0) * T::eps() * resabs0 && error0 > tol {
        debug!("qags: first estimate is at round-off level");
        return Err(IntegrationError::RoundoffLimited {
            stage: RoundoffStage::FirstEstimate,
            best: first,
        });
    }
    let converged = if single {
        (error0 <= tol && error0 != initial[0].resasc) || error0 == T::zero()
    } else {
        error0 <= tol
    };
    if converged {
        debug!("qags: converged on the first estimate {:?}", result0);
        return Ok(first);
    }
    if limit <= pieces {
        return Err(IntegrationError::SubdivisionLimitExceeded { limit, best: first });
    }

    // Pieces whose error is only bounded by their resasc are charged the
    // whole initial error, so they are bisected first.
    let mut workspace = Workspace::new(limit);
    for (w, est) in points.windows(2).zip(&initial) {
        let opaque = !single && est.abs_error == est.resasc && est.abs_error != T::zero();
        let charged = if opaque { error0 } else { est.abs_error };
        if workspace
            .push(Subinterval::new(w[0], w[1], est.result, charged))
            .is_err()
        {
            return Err(IntegrationError::SubdivisionLimitExceeded { limit, best: first });
        }
    }

    let mut table = ExtrapolationTable::with_cutoff(thresholds.irregularity_cutoff);
    table.append(result0);

    let positive = result0.magnitude() >= (T::one() - T::lit(50.0) * T::eps()) * resabs0;
    let mut res_ext = result0;
    let mut err_ext = T::huge();
    let mut correction = T::zero();
    let mut ertest = tol;
    let mut large_error = workspace.total().abs_error;

    let mut iteration = pieces;
    let mut seeded = !single;
    let mut extrapolating = false;
    let mut disallow_extrapolation = false;
    let mut stalled_extrapolations = 0;
    let mut raw_stalls = 0;
    let mut extrapolated_stalls = 0;
    let mut growth = 0;
    let mut table_roundoff = false;
    let mut stop = None;
    let mut excluded = None;

    loop {
        let (id, parent) = match workspace.selected() {
            Some((id, parent)) => (id, *parent),
            None => {
                stop = excluded.map(|(lower, upper)| Stop::Unresolvable { lower, upper });
                break;
            }
        };
        let Some(mid) = parent.midpoint() else {
            trace!("qags: excluding [{}, {}]", parent.lower, parent.upper);
            workspace.exclude(id);
            excluded = Some((parent.lower, parent.upper));
            continue;
        };
        let level = parent.depth + 1;
        iteration += 1;

        let halves = bisect(f, &rule, &parent, mid)
            .map_err(|e| IntegrationError::from_eval(e, raw_result(&workspace, evaluations)))?;
        evaluations += halves.evaluations;
        let error12 = halves.error();

        if workspace.replace(id, halves.left, halves.right).is_err() {
            return Err(IntegrationError::SubdivisionLimitExceeded {
                limit,
                best: raw_result(&workspace, evaluations),
            });
        }
        debug_assert!(workspace.tiles(points[0], points[pieces]));
        let totals = workspace.total();
        let area = totals.estimate;
        let errsum = totals.abs_error;
        let tol = tolerance.target(area.magnitude());

        if halves.is_informative() {
            if halves.is_stalled(&parent, thresholds.stall_ratio, thresholds.improvement_ratio) {
                if extrapolating {
                    extrapolated_stalls += 1;
                } else {
                    raw_stalls += 1;
                }
            }
            if iteration > thresholds.growth_after && error12 > parent.abs_error {
                growth += 1;
            }
        }
        if raw_stalls + extrapolated_stalls >= thresholds.roundoff_limit
            || growth >= thresholds.growth_limit
        {
            stop = Some(Stop::Roundoff);
        }
        if extrapolated_stalls >= thresholds.extrapolation_roundoff_limit {
            table_roundoff = true;
        }
        if subinterval_too_small(parent.lower, mid, parent.upper) {
            stop = Some(Stop::Unresolvable {
                lower: parent.lower,
                upper: parent.upper,
            });
        }

        trace!(
            "qags: split [{}, {}] at {}: errors {:e} + {:e}, total {:e} (target {:e})",
            parent.lower,
            parent.upper,
            mid,
            halves.left.abs_error,
            halves.right.abs_error,
            errsum,
            tol
        );

        if errsum <= tol {
            let best = raw_result(&workspace, evaluations);
            debug!(
                "qags: converged on the raw sum {:?} ± {:e} over {} intervals, {} evaluations",
                best.value, best.abs_error, best.intervals, best.evaluations
            );
            return Ok(best);
        }
        if stop.is_some() {
            break;
        }
        if iteration >= limit - 1 {
            stop = Some(Stop::Limit);
            break;
        }

        if !seeded {
            seeded = true;
            large_error = errsum;
            ertest = tol;
            table.append(area);
            continue;
        }
        if disallow_extrapolation {
            continue;
        }

        large_error -= parent.abs_error;
        if level < workspace.max_depth() {
            large_error += error12;
        }

        if !extrapolating {
            // Keep bisecting while the worst interval is not at the deepest level
            if workspace.selected_is_large() {
                continue;
            }
            extrapolating = true;
            workspace.set_selection(1);
        }

        if !table_roundoff && large_error > ertest && workspace.increase_selection() {
            continue;
        }

        table.append(area);
        let Some(ext) = table.extrapolate() else {
            continue;
        };
        stalled_extrapolations += 1;
        trace!(
            "qags: extrapolated {:?} ± {:e} from {} sums",
            ext.value,
            ext.abs_error,
            table.len()
        );

        if stalled_extrapolations > thresholds.stalled_extrapolations
            && err_ext < T::lit(1e-3) * errsum
        {
            stop = Some(Stop::ExtrapolationRoundoff);
        }
        if ext.abs_error < err_ext {
            stalled_extrapolations = 0;
            err_ext = ext.abs_error;
            res_ext = ext.value;
            correction = large_error;
            ertest = tolerance.target(res_ext.magnitude());
            if err_ext <= ertest {
                break;
            }
        }

        // A table that collapsed to one element is no use any more
        if table.len() == 1 {
            disallow_extrapolation = true;
        }
        if stop == Some(Stop::ExtrapolationRoundoff) {
            break;
        }

        workspace.reset_selection();
        extrapolating = false;
        large_error = errsum;
    }

    let totals = workspace.total();
    let area = totals.estimate;
    let errsum = totals.abs_error;
    let raw = raw_result(&workspace, evaluations);
    let extrapolated = ComputeResult {
        value: res_ext,
        abs_error: err_ext,
        evaluations,
        intervals: workspace.len(),
        extrapolated: true,
    };

    let (best, stop) = if err_ext == T::huge() {
        (raw, stop)
    } else {
        settle(
            raw,
            extrapolated,
            stop,
            table_roundoff,
            correction,
            positive,
            resabs0,
            area,
            errsum,
            options,
        )
    };

    debug!(
        "qags: finished with {:?} ± {:e} over {} intervals, {} evaluations ({})",
        best.value,
        best.abs_error,
        best.intervals,
        best.evaluations,
        if best.extrapolated {
            "extrapolated"
        } else {
            "raw sum"
        }
    );

    match stop {
        None => Ok(best),
        Some(Stop::Limit) => Err(IntegrationError::SubdivisionLimitExceeded { limit, best }),
        Some(Stop::Roundoff) => Err(IntegrationError::RoundoffLimited {
            stage: RoundoffStage::Subdivision,
            best,
        }),
        Some(Stop::ExtrapolationRoundoff) => Err(IntegrationError::RoundoffLimited {
            stage: RoundoffStage::Extrapolation,
            best,
        }),
        Some(Stop::Unresolvable { lower, upper }) => Err(IntegrationError::BadIntegrandBehavior {
            irregularity: Irregularity::UnresolvableInterval { lower, upper },
            best,
        }),
        Some(Stop::Divergent) => Err(IntegrationError::DivergentIntegral { best }),
    }
}

/// Chooses between the raw sum and the extrapolated value, and runs the
/// final divergence test.
#[allow(clippy::too_many_arguments)]
fn settle<T: Real, A: Area<T>>(
    raw: ComputeResult<T, A>,
    mut extrapolated: ComputeResult<T, A>,
    mut stop: Option<Stop<T>>,
    table_roundoff: bool,
    correction: T,
    positive: bool,
    resabs0: T,
    area: A,
    errsum: T,
    options: &IntegrationOptions<T>,
) -> (ComputeResult<T, A>, Option<Stop<T>>) {
    let thresholds = &options.thresholds;
    let res_ext = extrapolated.value;

    if stop.is_some() || table_roundoff {
        if table_roundoff {
            extrapolated.abs_error += correction;
        }
        if stop.is_none() {
            stop = Some(Stop::ExtrapolationRoundoff);
        }

        let zero = A::zero();
        if res_ext != zero && area != zero {
            if extrapolated.abs_error / res_ext.magnitude() > errsum / area.magnitude() {
                return (raw, stop);
            }
        } else if extrapolated.abs_error > errsum {
            return (raw, stop);
        } else if area == zero {
            return (extrapolated, stop);
        }
    }

    // Integrals of tiny magnitude relative to |f| cannot be judged by ratio
    let max_area = res_ext.magnitude().max(area.magnitude());
    if !positive && max_area < T::lit(0.01) * resabs0 {
        return (extrapolated, stop);
    }

    let ratio = res_ext / area;
    if ratio.real_part() < thresholds.min_divergence_ratio
        || ratio.magnitude() > thresholds.max_divergence_ratio
        || errsum > area.magnitude()
    {
        stop = Some(Stop::Divergent);
    }
    (extrapolated, stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadra_rules::{Fallible, Plain, RuleOrder};
    use std::f64::consts::PI;

    fn opts(abs: f64, rel: f64) -> IntegrationOptions<f64> {
        IntegrationOptions::new(abs, rel)
    }

    #[test]
    fn test_sine() {
        let r = integrate(&Plain::new(|x: f64| x.sin()), 0.0, PI, &opts(1e-10, 1e-10)).unwrap();
        assert!((r.value - 2.0).abs() < 1e-14);
        assert_eq!(r.evaluations, 21);
        assert!(!r.extrapolated);
    }

    #[test]
    fn test_inverse_sqrt_is_extrapolated() {
        let f = Plain::new(|x: f64| 1.0 / x.sqrt());
        let r = integrate(&f, 0.0, 1.0, &opts(1e-8, 1e-8)).unwrap();
        assert!((r.value - 2.0).abs() < 1e-12);
        assert!(r.extrapolated);
        assert!(r.intervals < 10);
        assert!(r.abs_error < 1e-8);
    }

    #[test]
    fn test_log_over_sqrt() {
        // ∫₀¹ ln(x)/√x dx = -4
        let f = Plain::new(|x: f64| x.ln() / x.sqrt());
        let r = integrate(&f, 0.0, 1.0, &opts(0.0, 1e-7)).unwrap();
        assert!((r.value + 4.0).abs() < 1e-10);
        assert!(r.extrapolated);
    }

    #[test]
    fn test_limit_of_one() {
        let f = Plain::new(|x: f64| 1.0 / x.sqrt());
        match integrate(&f, 0.0, 1.0, &opts(1e-8, 1e-8).with_max_intervals(1)) {
            Err(IntegrationError::SubdivisionLimitExceeded { limit: 1, best }) => {
                assert!((best.value - 1.9675).abs() < 1e-3);
                assert_eq!(best.evaluations, 21);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_divergent() {
        let f = Plain::new(|x: f64| x.powf(-1.01));
        let err = integrate(&f, 0.0, 1.0, &opts(1e-10, 1e-10)).unwrap_err();
        assert!(matches!(err, IntegrationError::DivergentIntegral { .. }));
        assert!(err.best().unwrap().extrapolated);
    }

    #[test]
    fn test_nan_at_midpoint() {
        let f = Plain::new(|x: f64| if x == 0.5 { f64::NAN } else { x });
        match integrate(&f, 0.0, 1.0, &opts(1e-10, 1e-10)) {
            Err(IntegrationError::BadIntegrandBehavior {
                irregularity: Irregularity::NonFinite { at },
                best,
            }) => {
                assert_eq!(at, 0.5);
                assert_eq!(best.evaluations, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fallible_integrand_short_circuits() {
        let f = Fallible::new(|x: f64| if x > 0.9 { Err("out of range") } else { Ok(x) });
        let err = integrate(&f, 0.0, 1.0, &opts(1e-10, 1e-10)).unwrap_err();
        match err {
            IntegrationError::IntegrandFailed { at, .. } => assert!(at > 0.9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_breakpoints() {
        // ∫₀³ x³ ln|(x²-1)(x²-2)| dx with singularities at 1 and √2
        let f = Plain::new(|x: f64| x.powi(3) * ((x * x - 1.0) * (x * x - 2.0)).abs().ln());
        let points = [0.0, 1.0, 2f64.sqrt(), 3.0];
        let r = integrate_with_breakpoints(&f, &points, &opts(0.0, 1e-3)).unwrap();
        let exact = 61.0 * 2f64.ln() + 77.0 / 4.0 * 7f64.ln() - 27.0;
        assert!((r.value - exact).abs() < 1e-3 * exact);
        assert!((r.value - 52.740806116727164).abs() < 1e-9);
    }

    #[test]
    fn test_breakpoints_validation() {
        let f = Plain::new(|x: f64| x);
        let o = opts(1e-10, 1e-10);
        assert!(matches!(
            integrate_with_breakpoints(&f, &[1.0], &o),
            Err(IntegrationError::InvalidParameter(_))
        ));
        assert!(matches!(
            integrate_with_breakpoints(&f, &[0.0, 2.0, 1.0], &o),
            Err(IntegrationError::InvalidParameter(_))
        ));
        assert!(matches!(
            integrate_with_breakpoints(&f, &[0.0, f64::NAN], &o),
            Err(IntegrationError::InvalidParameter(_))
        ));
        let r = integrate_with_breakpoints(&f, &[0.0, 0.5, 0.5, 1.0], &o).unwrap();
        assert!((r.value - 0.5).abs() < 1e-15);
        assert_eq!(r.intervals, 2);
        assert_eq!(integrate_with_breakpoints(&f, &[2.0, 2.0], &o).unwrap().evaluations, 0);
    }

    #[test]
    fn test_higher_rules_agree() {
        let f = Plain::new(|x: f64| x.powf(-0.9));
        for rule in RuleOrder::ALL {
            let r = integrate(&f, 0.0, 1.0, &opts(0.0, 1e-10).with_rule(rule)).unwrap();
            assert!((r.value - 10.0).abs() < 1e-8, "{rule}: {}", r.value);
        }
    }
}
