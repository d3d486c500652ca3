//! Numeric Traits
//!
//! The rule evaluator, the interval workspace and the drivers are generic
//! over two numeric types:
//!
//! - the *domain* type `T: Real` (abscissae, interval bounds, tolerances and
//!   error magnitudes), and
//! - the *area* type `A: Area<T>` returned by the integrand (a real or a
//!   complex value).

use std::fmt::{Debug, Display, LowerExp};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use num_complex::Complex;
use num_traits::{Float, FloatConst, NumAssign, NumCast, One, Zero};

/// A floating-point domain type.
pub trait Real:
    Float + FloatConst + NumAssign + Debug + Display + LowerExp + Send + Sync + 'static
{
    /// Converts an `f64` constant into `Self`.
    ///
    /// Used for rule tables and tuning constants. Every constant fits in
    /// `f32` after rounding, so the conversion never produces `NaN` for the
    /// implementing types.
    #[inline]
    fn lit(x: f64) -> Self {
        <Self as NumCast>::from(x).unwrap_or_else(Self::nan)
    }

    /// Machine epsilon.
    #[inline]
    fn eps() -> Self {
        Self::epsilon()
    }

    /// Smallest positive normal value.
    #[inline]
    fn tiny() -> Self {
        Self::min_positive_value()
    }

    /// Largest finite value.
    #[inline]
    fn huge() -> Self {
        Self::max_value()
    }
}

impl Real for f32 {}
impl Real for f64 {}

/// The value type of an integrand.
///
/// An area supports field arithmetic, scaling by the domain type and a
/// magnitude. Error estimates are always magnitudes in `T`.
pub trait Area<T: Real>:
    Copy
    + Debug
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Mul<T, Output = Self>
    + AddAssign
    + SubAssign
    + Send
    + Sync
    + 'static
{
    /// Absolute value (modulus for complex areas).
    fn magnitude(self) -> T;

    /// Embeds a real value.
    fn from_real(x: T) -> Self;

    /// The real component.
    fn real_part(self) -> T;

    /// Returns `true` if every component is finite.
    fn is_finite_area(self) -> bool;
}

impl<T: Real> Area<T> for T {
    #[inline]
    fn magnitude(self) -> T {
        self.abs()
    }

    #[inline]
    fn from_real(x: T) -> Self {
        x
    }

    #[inline]
    fn real_part(self) -> T {
        self
    }

    #[inline]
    fn is_finite_area(self) -> bool {
        self.is_finite()
    }
}

impl<T: Real> Area<T> for Complex<T> {
    #[inline]
    fn magnitude(self) -> T {
        self.norm()
    }

    #[inline]
    fn from_real(x: T) -> Self {
        Complex::new(x, T::zero())
    }

    #[inline]
    fn real_part(self) -> T {
        self.re
    }

    #[inline]
    fn is_finite_area(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_round_trips_f64() {
        assert_eq!(f64::lit(0.125), 0.125);
        assert_eq!(f32::lit(0.5), 0.5f32);
    }

    #[test]
    fn test_real_magnitude() {
        assert_eq!(<f64 as Area<f64>>::magnitude(-3.0), 3.0);
        assert!(!<f64 as Area<f64>>::is_finite_area(f64::NAN));
    }

    #[test]
    fn test_complex_magnitude() {
        let z = Complex::new(3.0f64, 4.0);
        assert_eq!(z.magnitude(), 5.0);
        assert!(z.is_finite_area());
        assert!(!Complex::new(1.0f64, f64::INFINITY).is_finite_area());
        assert_eq!(<Complex<f64> as Area<f64>>::from_real(2.0), Complex::new(2.0, 0.0));
    }
}
