//! Pieces shared by the adaptive drivers: argument checks, limit
//! orientation and the bisection step.

use quadra_rules::{Area, EvalFailure, GaussKronrodRule, Integrand, Real};

use crate::error::{ComputeResult, IntegrationError, IntegrationResult};
use crate::options::IntegrationOptions;
use crate::workspace::{Subinterval, Workspace};

/// An oriented integration domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Domain<T> {
    pub lower: T,
    pub upper: T,
    /// The caller passed the limits in descending order.
    pub flipped: bool,
}

/// Validates the arguments shared by every driver and orients the limits.
///
/// Returns `None` for an empty domain.
pub(crate) fn prepare<T: Real, A: Area<T>>(
    lower: T,
    upper: T,
    options: &IntegrationOptions<T>,
) -> Result<Option<Domain<T>>, IntegrationError<T, A>> {
    check_options(options)?;
    if !lower.is_finite() || !upper.is_finite() {
        return Err(IntegrationError::InvalidParameter(format!(
            "integration limits must be finite, got [{lower}, {upper}]"
        )));
    }

    if lower == upper {
        return Ok(None);
    }
    Ok(Some(if lower < upper {
        Domain {
            lower,
            upper,
            flipped: false,
        }
    } else {
        Domain {
            lower: upper,
            upper: lower,
            flipped: true,
        }
    }))
}

pub(crate) fn check_options<T: Real, A: Area<T>>(
    options: &IntegrationOptions<T>,
) -> Result<(), IntegrationError<T, A>> {
    options.tolerance.validate()?;
    if options.max_intervals == 0 {
        return Err(IntegrationError::InvalidParameter(
            "max_intervals must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Undoes the orientation of [`prepare`] on a driver's outcome.
pub(crate) fn orient<T: Real, A: Area<T>>(
    outcome: IntegrationResult<T, A>,
    flipped: bool,
) -> IntegrationResult<T, A> {
    if !flipped {
        return outcome;
    }
    outcome.map(ComputeResult::negated).map_err(IntegrationError::negated)
}

/// Two freshly evaluated halves of a subinterval.
pub(crate) struct Bisection<T, A> {
    pub left: Subinterval<T, A>,
    pub right: Subinterval<T, A>,
    left_resasc: T,
    right_resasc: T,
    pub evaluations: usize,
}

impl<T: Real, A: Area<T>> Bisection<T, A> {
    /// Sum of the two estimates.
    pub fn area(&self) -> A {
        self.left.estimate + self.right.estimate
    }

    /// Sum of the two error estimates.
    pub fn error(&self) -> T {
        self.left.abs_error + self.right.abs_error
    }

    /// `false` if either half's error was capped at its `resasc`; such
    /// estimates say nothing about round-off.
    pub fn is_informative(&self) -> bool {
        self.left_resasc != self.left.abs_error && self.right_resasc != self.right.abs_error
    }

    /// Returns `true` if bisecting `parent` barely changed the estimate
    /// while the error failed to shrink.
    pub fn is_stalled(
        &self,
        parent: &Subinterval<T, A>,
        stall_ratio: T,
        improvement_ratio: T,
    ) -> bool {
        let area = self.area();
        (parent.estimate - area).magnitude() <= stall_ratio * area.magnitude()
            && self.error() >= improvement_ratio * parent.abs_error
    }
}

/// Splits `parent` at `mid` and applies `rule` to both halves.
pub(crate) fn bisect<T, I>(
    f: &I,
    rule: &GaussKronrodRule,
    parent: &Subinterval<T, I::Output>,
    mid: T,
) -> Result<Bisection<T, I::Output>, EvalFailure<T>>
where
    T: Real,
    I: Integrand<T>,
{
    let left = rule.evaluate(f, parent.lower, mid)?;
    let right = rule.evaluate(f, mid, parent.upper)?;
    Ok(Bisection {
        left: parent.child(parent.lower, mid, left.result, left.abs_error),
        right: parent.child(mid, parent.upper, right.result, right.abs_error),
        left_resasc: left.resasc,
        right_resasc: right.resasc,
        evaluations: left.evaluations + right.evaluations,
    })
}

/// Returns `true` if `[a1, b2]`, split at `a2`, is within a few ulps of a
/// single point.
pub(crate) fn subinterval_too_small<T: Real>(a1: T, a2: T, b2: T) -> bool {
    let eps = T::lit(100.0) * T::eps();
    let min = T::lit(1000.0) * T::tiny();
    let tmp = (T::one() + eps) * (a2.abs() + min);
    a1.abs() <= tmp && b2.abs() <= tmp
}

/// The raw sum over the workspace as a result.
pub(crate) fn raw_result<T: Real, A: Area<T>>(
    workspace: &Workspace<T, A>,
    evaluations: usize,
) -> ComputeResult<T, A> {
    ComputeResult {
        value: workspace.resum(),
        abs_error: workspace.total().abs_error,
        evaluations,
        intervals: workspace.len(),
        extrapolated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadra_rules::{Plain, RuleOrder};

    #[test]
    fn test_prepare_orients_limits() {
        let opts = IntegrationOptions::<f64>::default();
        let d = prepare::<f64, f64>(2.0, -1.0, &opts).unwrap().unwrap();
        assert_eq!((d.lower, d.upper, d.flipped), (-1.0, 2.0, true));
        assert!(prepare::<f64, f64>(1.0, 1.0, &opts).unwrap().is_none());
        assert!(matches!(
            prepare::<f64, f64>(0.0, f64::INFINITY, &opts),
            Err(IntegrationError::InvalidParameter(_))
        ));
        let opts = opts.with_max_intervals(0);
        assert!(matches!(
            prepare::<f64, f64>(0.0, 1.0, &opts),
            Err(IntegrationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bisect_tiles_parent() {
        let f = Plain::new(|x: f64| x * x);
        let rule = GaussKronrodRule::new(RuleOrder::Gk15);
        let parent = Subinterval::new(0.0, 1.0, 1.0 / 3.0, 1e-3);
        let b = bisect(&f, &rule, &parent, 0.5).unwrap();
        assert_eq!(b.left.upper, b.right.lower);
        assert_eq!(b.left.depth, 1);
        assert!((b.area() - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(b.evaluations, 30);
        assert!(b.is_stalled(&parent, 1e-5, 0.0));
    }

    #[test]
    fn test_subinterval_too_small() {
        let a = 1.0f64;
        let b = a + 64.0 * f64::EPSILON;
        assert!(subinterval_too_small(a, 0.5 * (a + b), b));
        assert!(!subinterval_too_small(0.0, 0.5, 1.0));
    }
}
