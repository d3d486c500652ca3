//! Results and Error Kinds
//!
//! Every driver returns an [`IntegrationResult`]. Failures detected after
//! the first rule application carry the best estimate computed so far, so
//! a caller can still use (or report) a partially converged value.

use std::fmt;

use quadra_rules::{Area, BoxError, EvalFailure, Real};
use thiserror::Error;

/// The value of an integral together with its error estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComputeResult<T, A = T> {
    /// Approximation to the integral.
    pub value: A,
    /// Estimate of `|value - integral|`.
    pub abs_error: T,
    /// Integrand evaluations spent.
    pub evaluations: usize,
    /// Subintervals in the final decomposition.
    pub intervals: usize,
    /// Whether `value` came from the epsilon algorithm rather than the
    /// raw sum over subintervals.
    pub extrapolated: bool,
}

impl<T: Real, A: Area<T>> ComputeResult<T, A> {
    /// The exact result of an empty interval.
    pub fn zero() -> Self {
        Self {
            value: A::zero(),
            abs_error: T::zero(),
            evaluations: 0,
            intervals: 0,
            extrapolated: false,
        }
    }

    /// Negates the value, for integrals with swapped limits.
    pub fn negated(self) -> Self {
        Self {
            value: -self.value,
            ..self
        }
    }
}

impl<T: Real, A: Area<T> + fmt::Display> fmt::Display for ComputeResult<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {:.2e}", self.value, self.abs_error)?;
        if self.extrapolated {
            write!(f, " (extrapolated)")?;
        }
        Ok(())
    }
}

/// Where round-off was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundoffStage {
    /// The first rule application is already at noise level but misses
    /// the tolerance.
    FirstEstimate,
    /// Bisection stopped improving the error estimate.
    Subdivision,
    /// The extrapolated sequence stopped improving.
    Extrapolation,
}

impl fmt::Display for RoundoffStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundoffStage::FirstEstimate => write!(f, "the first estimate"),
            RoundoffStage::Subdivision => write!(f, "subdivision"),
            RoundoffStage::Extrapolation => write!(f, "the extrapolation table"),
        }
    }
}

/// The kind of misbehavior behind [`IntegrationError::BadIntegrandBehavior`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Irregularity<T> {
    /// The integrand returned NaN or an infinity, or a rule sum overflowed.
    NonFinite {
        /// The abscissa.
        at: T,
    },
    /// A subinterval became too narrow to bisect at the working precision.
    UnresolvableInterval {
        /// Lower bound of the subinterval.
        lower: T,
        /// Upper bound of the subinterval.
        upper: T,
    },
}

impl<T: Real> fmt::Display for Irregularity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Irregularity::NonFinite { at } => write!(f, "non-finite value at x = {at}"),
            Irregularity::UnresolvableInterval { lower, upper } => {
                write!(f, "unresolvable subinterval [{lower}, {upper}]")
            }
        }
    }
}

/// Errors of the adaptive drivers.
///
/// The first three variants are raised before any integrand evaluation;
/// all others carry the best estimate so far.
#[derive(Debug, Error)]
pub enum IntegrationError<T: Real, A: Area<T> = T> {
    /// Negative or NaN tolerances, or both non-positive.
    #[error("invalid tolerance: abs = {abs}, rel = {rel}")]
    InvalidTolerance {
        /// Requested absolute tolerance.
        abs: T,
        /// Requested relative tolerance.
        rel: T,
    },

    /// The relative tolerance is below what the working precision allows.
    #[error("tolerance cannot be achieved: rel = {rel} is below {floor} and abs is zero")]
    ToleranceUnachievable {
        /// Requested relative tolerance.
        rel: T,
        /// Smallest accepted relative tolerance.
        floor: T,
    },

    /// A structural argument is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The interval budget ran out before the tolerance was met.
    #[error("maximum number of subdivisions ({limit}) reached")]
    SubdivisionLimitExceeded {
        /// The configured limit.
        limit: usize,
        /// Best estimate so far.
        best: ComputeResult<T, A>,
    },

    /// Round-off prevents reaching the tolerance.
    #[error("cannot reach tolerance because of roundoff error in {stage}")]
    RoundoffLimited {
        /// Where round-off was detected.
        stage: RoundoffStage,
        /// Best estimate so far.
        best: ComputeResult<T, A>,
    },

    /// The integrand has a feature the rule cannot resolve.
    #[error("bad integrand behavior: {irregularity}")]
    BadIntegrandBehavior {
        /// What went wrong.
        irregularity: Irregularity<T>,
        /// Best estimate so far.
        best: ComputeResult<T, A>,
    },

    /// A fallible integrand returned an error.
    #[error("integrand failed at x = {at}")]
    IntegrandFailed {
        /// The abscissa.
        at: T,
        /// The integrand's error.
        #[source]
        source: BoxError,
        /// Best estimate so far.
        best: ComputeResult<T, A>,
    },

    /// The integral is divergent or converges too slowly.
    #[error("integral is divergent, or slowly convergent")]
    DivergentIntegral {
        /// Best estimate so far.
        best: ComputeResult<T, A>,
    },
}

impl<T: Real, A: Area<T>> IntegrationError<T, A> {
    /// The best estimate computed before the failure, if any evaluation
    /// took place.
    pub fn best(&self) -> Option<&ComputeResult<T, A>> {
        match self {
            IntegrationError::InvalidTolerance { .. }
            | IntegrationError::ToleranceUnachievable { .. }
            | IntegrationError::InvalidParameter(_) => None,
            IntegrationError::SubdivisionLimitExceeded { best, .. }
            | IntegrationError::RoundoffLimited { best, .. }
            | IntegrationError::BadIntegrandBehavior { best, .. }
            | IntegrationError::IntegrandFailed { best, .. }
            | IntegrationError::DivergentIntegral { best } => Some(best),
        }
    }

    /// Returns `true` if raising the interval budget may help.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IntegrationError::SubdivisionLimitExceeded { .. })
    }

    /// Wraps a failed evaluation with the best estimate so far.
    pub(crate) fn from_eval(failure: EvalFailure<T>, best: ComputeResult<T, A>) -> Self {
        match failure {
            EvalFailure::NonFinite { at } => IntegrationError::BadIntegrandBehavior {
                irregularity: Irregularity::NonFinite { at },
                best,
            },
            EvalFailure::Integrand { at, source } => {
                IntegrationError::IntegrandFailed { at, source, best }
            }
        }
    }

    /// Flips the sign of the carried estimate, for swapped limits.
    pub(crate) fn negated(self) -> Self {
        match self {
            IntegrationError::SubdivisionLimitExceeded { limit, best } => {
                IntegrationError::SubdivisionLimitExceeded {
                    limit,
                    best: best.negated(),
                }
            }
            IntegrationError::RoundoffLimited { stage, best } => IntegrationError::RoundoffLimited {
                stage,
                best: best.negated(),
            },
            IntegrationError::BadIntegrandBehavior { irregularity, best } => {
                IntegrationError::BadIntegrandBehavior {
                    irregularity,
                    best: best.negated(),
                }
            }
            IntegrationError::IntegrandFailed { at, source, best } => {
                IntegrationError::IntegrandFailed {
                    at,
                    source,
                    best: best.negated(),
                }
            }
            IntegrationError::DivergentIntegral { best } => IntegrationError::DivergentIntegral {
                best: best.negated(),
            },
            other => other,
        }
    }
}

/// Result of an adaptive integration.
pub type IntegrationResult<T, A = T> = Result<ComputeResult<T, A>, IntegrationError<T, A>>;

/// Errors of [`Workspace`](crate::Workspace) mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    /// A replacement would grow the live set past its capacity.
    #[error("workspace capacity of {limit} subintervals exceeded")]
    CapacityExceeded {
        /// The configured capacity.
        limit: usize,
    },

    /// The handle does not name a live subinterval.
    #[error("no live subinterval with this handle")]
    UnknownInterval,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn sample() -> ComputeResult<f64> {
        ComputeResult {
            value: 1.5,
            abs_error: 1e-3,
            evaluations: 63,
            intervals: 3,
            extrapolated: false,
        }
    }

    #[test]
    fn test_best_is_carried() {
        let err: IntegrationError<f64> = IntegrationError::DivergentIntegral { best: sample() };
        assert_eq!(err.best(), Some(&sample()));

        let err: IntegrationError<f64> = IntegrationError::InvalidTolerance { abs: -1.0, rel: 0.0 };
        assert!(err.best().is_none());
    }

    #[test]
    fn test_negated_keeps_kind() {
        let err: IntegrationError<f64> = IntegrationError::RoundoffLimited {
            stage: RoundoffStage::Subdivision,
            best: sample(),
        };
        match err.negated() {
            IntegrationError::RoundoffLimited { stage, best } => {
                assert_eq!(stage, RoundoffStage::Subdivision);
                assert_eq!(best.value, -1.5);
                assert_eq!(best.abs_error, 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_eval_maps_kinds() {
        let err: IntegrationError<f64> =
            IntegrationError::from_eval(EvalFailure::NonFinite { at: 0.5 }, sample());
        assert!(matches!(
            err,
            IntegrationError::BadIntegrandBehavior {
                irregularity: Irregularity::NonFinite { at },
                ..
            } if at == 0.5
        ));

        let failure = EvalFailure::Integrand {
            at: 2.0,
            source: "domain error".into(),
        };
        let err: IntegrationError<f64> = IntegrationError::from_eval(failure, sample());
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "integrand failed at x = 2");
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "1.5 ± 1.00e-3");
        let err: IntegrationError<f64> = IntegrationError::SubdivisionLimitExceeded {
            limit: 50,
            best: sample(),
        };
        assert_eq!(err.to_string(), "maximum number of subdivisions (50) reached");
        assert!(err.is_recoverable());
    }
}
