//! Adaptive Integration Without Extrapolation
//!
//! The QAG strategy: bisect the subinterval with the largest error until
//! the summed error meets the tolerance. Cheap and robust for smooth
//! integrands; for endpoint singularities prefer [`integrate`](crate::integrate),
//! which accelerates the same sequence with the epsilon algorithm.

use log::{debug, trace};
use quadra_rules::{Area, GaussKronrodRule, Integrand, Real};

use crate::driver::{bisect, orient, prepare, raw_result, subinterval_too_small, Domain};
use crate::error::{ComputeResult, IntegrationError, IntegrationResult, Irregularity, RoundoffStage};
use crate::options::IntegrationOptions;
use crate::workspace::Workspace;

enum Stop<T> {
    Roundoff,
    Unresolvable { lower: T, upper: T },
}

/// Integrates `f` over `[lower, upper]` by plain adaptive bisection.
///
/// # Example
///
/// ```ignore
/// use quadra_adaptive::{integrate_smooth, IntegrationOptions};
/// use quadra_rules::Plain;
///
/// let f = Plain::new(|x: f64| x.exp());
/// let r = integrate_smooth(&f, 0.0, 1.0, &IntegrationOptions::default())?;
/// assert!((r.value - (1f64.exp() - 1.0)).abs() < 1e-12);
/// ```
pub fn integrate_smooth<T, I>(
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
        Some(domain) => orient(bisection_loop(f, domain, options), domain.flipped),
    }
}

fn bisection_loop<T, I>(
    f: &I,
    domain: Domain<T>,
    options: &IntegrationOptions<T>,
) -> IntegrationResult<T, I::Output>
where
    T: Real,
    I: Integrand<T>,
{
    let Domain { lower, upper, .. } = domain;
    let tolerance = options.tolerance;
    let thresholds = &options.thresholds;
    let limit = options.max_intervals;
    let rule = GaussKronrodRule::new(options.rule);

    debug!(
        "qag: [{}, {}] with {} (abs {:e}, rel {:e}, limit {})",
        lower, upper, options.rule, tolerance.abs, tolerance.rel, limit
    );

    let first = rule
        .evaluate(f, lower, upper)
        .map_err(|e| IntegrationError::from_eval(e, ComputeResult::zero()))?;
    let mut evaluations = first.evaluations;
    let best = ComputeResult {
        value: first.result,
        abs_error: first.abs_error,
        evaluations,
        intervals: 1,
        extrapolated: false,
    };

    let tol = tolerance.target(first.result.magnitude());
    if first.abs_error <= T::lit(50.0) * T::eps() * first.resabs && first.abs_error > tol {
        debug!("qag: first estimate is at round-off level");
        return Err(IntegrationError::RoundoffLimited {
            stage: RoundoffStage::FirstEstimate,
            best,
        });
    }
    if (first.abs_error <= tol && first.abs_error != first.resasc) || first.abs_error == T::zero() {
        debug!("qag: converged on the first estimate {:?}", first.result);
        return Ok(best);
    }
    if limit == 1 {
        return Err(IntegrationError::SubdivisionLimitExceeded { limit, best });
    }

    let mut workspace = Workspace::new(limit);
    if workspace
        .initialize(lower, upper, first.result, first.abs_error)
        .is_err()
    {
        return Err(IntegrationError::SubdivisionLimitExceeded { limit, best });
    }

    let mut iteration = 1;
    let mut stalls = 0;
    let mut growth = 0;
    let mut stop = None;
    let mut excluded = None;

    loop {
        let (id, parent) = match workspace.worst() {
            Some((id, parent)) => (id, *parent),
            None => {
                stop = excluded.map(|(lower, upper)| Stop::Unresolvable { lower, upper });
                break;
            }
        };
        let Some(mid) = parent.midpoint() else {
            trace!("qag: excluding [{}, {}]", parent.lower, parent.upper);
            workspace.exclude(id);
            excluded = Some((parent.lower, parent.upper));
            continue;
        };

        let halves = bisect(f, &rule, &parent, mid)
            .map_err(|e| IntegrationError::from_eval(e, raw_result(&workspace, evaluations)))?;
        evaluations += halves.evaluations;

        if halves.is_informative() {
            if halves.is_stalled(&parent, thresholds.stall_ratio, thresholds.improvement_ratio) {
                stalls += 1;
            }
            if iteration >= thresholds.growth_after && halves.error() > parent.abs_error {
                growth += 1;
            }
        }

        if workspace.replace(id, halves.left, halves.right).is_err() {
            return Err(IntegrationError::SubdivisionLimitExceeded {
                limit,
                best: raw_result(&workspace, evaluations),
            });
        }
        iteration += 1;
        debug_assert!(workspace.tiles(lower, upper));

        let totals = workspace.total();
        let tol = tolerance.target(totals.estimate.magnitude());
        trace!(
            "qag: split [{}, {}] at {}: errors {:e} + {:e}, total {:e} (target {:e})",
            parent.lower,
            parent.upper,
            mid,
            halves.left.abs_error,
            halves.right.abs_error,
            totals.abs_error,
            tol
        );

        if totals.abs_error > tol {
            if stalls >= thresholds.smooth_roundoff_limit || growth >= thresholds.growth_limit {
                stop = Some(Stop::Roundoff);
            }
            if subinterval_too_small(parent.lower, mid, parent.upper) {
                stop = Some(Stop::Unresolvable {
                    lower: parent.lower,
                    upper: parent.upper,
                });
            }
        }

        if iteration >= limit || stop.is_some() || totals.abs_error <= tol {
            break;
        }
    }

    let best = raw_result(&workspace, evaluations);
    let tol = tolerance.target(workspace.total().estimate.magnitude());
    debug!(
        "qag: finished with {:?} ± {:e} over {} intervals, {} evaluations",
        best.value, best.abs_error, best.intervals, best.evaluations
    );

    if best.abs_error <= tol {
        return Ok(best);
    }
    Err(match stop {
        Some(Stop::Roundoff) => IntegrationError::RoundoffLimited {
            stage: RoundoffStage::Subdivision,
            best,
        },
        Some(Stop::Unresolvable { lower, upper }) => IntegrationError::BadIntegrandBehavior {
            irregularity: Irregularity::UnresolvableInterval { lower, upper },
            best,
        },
        None => IntegrationError::SubdivisionLimitExceeded { limit, best },
    })
}
