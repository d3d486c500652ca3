//! Driver Configuration
//!
//! [`IntegrationOptions`] bundles everything a driver needs besides the
//! integrand and the limits. [`Thresholds`] exposes the empirically tuned
//! round-off constants; the defaults reproduce QUADPACK's behavior.

use quadra_rules::{Real, RuleOrder};

use crate::tolerance::Tolerance;

/// Tuned constants of round-off and divergence detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds<T> {
    /// A bisection counts as stalled when the children's sum differs from
    /// the parent estimate by at most this fraction.
    pub stall_ratio: T,
    /// ... and the children's error is at least this fraction of the
    /// parent's error.
    pub improvement_ratio: T,
    /// Stalled bisections tolerated by the extrapolating drivers.
    pub roundoff_limit: usize,
    /// Stalled bisections tolerated by [`integrate_smooth`](crate::integrate_smooth).
    pub smooth_roundoff_limit: usize,
    /// Stalled bisections tolerated while extrapolating on small intervals.
    pub extrapolation_roundoff_limit: usize,
    /// Bisections that increased the error, tolerated after
    /// [`growth_after`](Self::growth_after) iterations.
    pub growth_limit: usize,
    /// Iterations before error growth starts being counted.
    pub growth_after: usize,
    /// Consecutive extrapolations without improvement before the table is
    /// declared stalled.
    pub stalled_extrapolations: usize,
    /// Lower bound of the accepted ratio between extrapolated and raw sums.
    pub min_divergence_ratio: T,
    /// Upper bound of the same ratio.
    pub max_divergence_ratio: T,
    /// Irregularity cutoff of the epsilon algorithm.
    pub irregularity_cutoff: T,
}

impl<T: Real> Default for Thresholds<T> {
    fn default() -> Self {
        Self {
            stall_ratio: T::lit(1e-5),
            improvement_ratio: T::lit(0.99),
            roundoff_limit: 10,
            smooth_roundoff_limit: 6,
            extrapolation_roundoff_limit: 5,
            growth_limit: 20,
            growth_after: 10,
            stalled_extrapolations: 5,
            min_divergence_ratio: T::lit(0.01),
            max_divergence_ratio: T::lit(100.0),
            irregularity_cutoff: T::lit(1e-4),
        }
    }
}

/// Options of the adaptive drivers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationOptions<T> {
    /// Error targets.
    pub tolerance: Tolerance<T>,
    /// Maximum number of subintervals.
    pub max_intervals: usize,
    /// Gauss-Kronrod pair applied to every subinterval.
    pub rule: RuleOrder,
    /// Round-off detection constants.
    pub thresholds: Thresholds<T>,
}

impl<T: Real> Default for IntegrationOptions<T> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            max_intervals: 1024,
            rule: RuleOrder::Gk21,
            thresholds: Thresholds::default(),
        }
    }
}

impl<T: Real> IntegrationOptions<T> {
    /// Default options with the given tolerances.
    pub fn new(abs_tol: T, rel_tol: T) -> Self {
        Self::default().with_tolerance(Tolerance::new(abs_tol, rel_tol))
    }

    /// Sets both error targets.
    pub fn with_tolerance(mut self, tolerance: Tolerance<T>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the absolute error target.
    pub fn with_abs_tol(mut self, abs: T) -> Self {
        self.tolerance.abs = abs;
        self
    }

    /// Sets the relative error target.
    pub fn with_rel_tol(mut self, rel: T) -> Self {
        self.tolerance.rel = rel;
        self
    }

    /// Sets the subinterval budget.
    pub fn with_max_intervals(mut self, max_intervals: usize) -> Self {
        self.max_intervals = max_intervals;
        self
    }

    /// Sets the rule.
    pub fn with_rule(mut self, rule: RuleOrder) -> Self {
        self.rule = rule;
        self
    }

    /// Replaces the round-off constants.
    pub fn with_thresholds(mut self, thresholds: Thresholds<T>) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = IntegrationOptions::<f64>::default();
        assert_eq!(opts.tolerance, Tolerance::new(1e-10, 1e-10));
        assert_eq!(opts.max_intervals, 1024);
        assert_eq!(opts.rule, RuleOrder::Gk21);
        assert_eq!(opts.thresholds.roundoff_limit, 10);
        assert_eq!(opts.thresholds.smooth_roundoff_limit, 6);
    }

    #[test]
    fn test_builders() {
        let opts = IntegrationOptions::new(1e-6, 0.0)
            .with_rel_tol(1e-4)
            .with_max_intervals(50)
            .with_rule(RuleOrder::Gk61);
        assert_eq!(opts.tolerance.abs, 1e-6);
        assert_eq!(opts.tolerance.rel, 1e-4);
        assert_eq!(opts.max_intervals, 50);
        assert_eq!(opts.rule, RuleOrder::Gk61);
    }
}
