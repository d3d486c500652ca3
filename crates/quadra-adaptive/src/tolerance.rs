//! Error Tolerances
//!
//! A [`Tolerance`] is validated once, before the first integrand
//! evaluation. A tolerance that the working precision cannot meet is
//! rejected rather than silently loosened.

use quadra_rules::{Area, Real};

use crate::error::IntegrationError;

/// Absolute and relative error targets.
///
/// The accepted error for an estimate `I` is `max(abs, rel * |I|)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance<T> {
    /// Absolute error target.
    pub abs: T,
    /// Relative error target.
    pub rel: T,
}

impl<T: Real> Tolerance<T> {
    /// Creates a tolerance from both targets.
    pub fn new(abs: T, rel: T) -> Self {
        Self { abs, rel }
    }

    /// A purely absolute tolerance.
    pub fn absolute(abs: T) -> Self {
        Self::new(abs, T::zero())
    }

    /// A purely relative tolerance.
    pub fn relative(rel: T) -> Self {
        Self::new(T::zero(), rel)
    }

    /// Smallest relative tolerance accepted when `abs` is zero:
    /// `max(50 eps, 0.5e-28)`.
    pub fn rel_floor() -> T {
        (T::lit(50.0) * T::eps()).max(T::lit(0.5e-28))
    }

    /// Checks the targets against the working precision.
    pub fn validate<A: Area<T>>(&self) -> Result<(), IntegrationError<T, A>> {
        let Self { abs, rel } = *self;
        if abs.is_nan()
            || rel.is_nan()
            || abs < T::zero()
            || rel < T::zero()
            || (abs <= T::zero() && rel <= T::zero())
        {
            return Err(IntegrationError::InvalidTolerance { abs, rel });
        }

        let floor = Self::rel_floor();
        if abs <= T::zero() && rel < floor {
            return Err(IntegrationError::ToleranceUnachievable { rel, floor });
        }

        Ok(())
    }

    /// The accepted error for an estimate of magnitude `magnitude`.
    #[inline]
    pub fn target(&self, magnitude: T) -> T {
        self.abs.max(self.rel * magnitude.abs())
    }

    /// Returns `true` if `abs_error` is accepted for an estimate of
    /// magnitude `magnitude`.
    #[inline]
    pub fn is_met(&self, abs_error: T, magnitude: T) -> bool {
        abs_error <= self.target(magnitude)
    }
}

impl<T: Real> Default for Tolerance<T> {
    fn default() -> Self {
        Self::new(T::lit(1e-10), T::lit(1e-10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(abs: f64, rel: f64) -> Result<(), IntegrationError<f64>> {
        Tolerance::new(abs, rel).validate()
    }

    #[test]
    fn test_accepts_usual_tolerances() {
        assert!(check(1e-10, 1e-10).is_ok());
        assert!(check(1e-8, 0.0).is_ok());
        assert!(check(0.0, 1e-7).is_ok());
        // A tiny absolute tolerance is legal; it may still end in round-off
        assert!(check(1e-300, 0.0).is_ok());
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(matches!(check(0.0, 0.0), Err(IntegrationError::InvalidTolerance { .. })));
        assert!(matches!(check(-1e-3, 1e-3), Err(IntegrationError::InvalidTolerance { .. })));
        assert!(matches!(check(f64::NAN, 1e-3), Err(IntegrationError::InvalidTolerance { .. })));
    }

    #[test]
    fn test_rejects_unachievable() {
        match check(0.0, 1e-16) {
            Err(IntegrationError::ToleranceUnachievable { rel, floor }) => {
                assert_eq!(rel, 1e-16);
                assert_eq!(floor, 50.0 * f64::EPSILON);
            }
            other => panic!("unexpected {:?}", other),
        }
        // An absolute target lifts the floor
        assert!(check(1e-12, 1e-16).is_ok());
    }

    #[test]
    fn test_target() {
        let tol = Tolerance::new(1e-6, 1e-3);
        assert_eq!(tol.target(0.0), 1e-6);
        assert_eq!(tol.target(-10.0), 1e-2);
        assert!(tol.is_met(5e-3, 10.0));
        assert!(!tol.is_met(5e-2, 10.0));
    }

    #[test]
    fn test_single_precision_floor() {
        let floor = Tolerance::<f32>::rel_floor();
        assert_eq!(floor, 50.0 * f32::EPSILON);
        let tol = Tolerance::<f32>::relative(1e-6);
        assert!(matches!(
            tol.validate::<f32>(),
            Err(IntegrationError::ToleranceUnachievable { .. })
        ));
    }
}
