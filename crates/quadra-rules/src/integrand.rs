//! Integrand Adapters
//!
//! Rules evaluate anything implementing [`Integrand`]. Two adapters cover
//! plain closures (`Fn(T) -> A`) and fallible closures
//! (`Fn(T) -> Result<A, E>`). Both reject non-finite values, so a NaN or an
//! infinity produced by the integrand surfaces as
//! [`EvalFailure::NonFinite`] instead of poisoning the running sums.

use std::cell::Cell;
use std::error::Error;
use std::marker::PhantomData;

use thiserror::Error;

use crate::real::{Area, Real};

/// Boxed error returned by a fallible integrand.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Failure of a single integrand evaluation.
#[derive(Debug, Error)]
pub enum EvalFailure<T: Real> {
    /// The integrand returned NaN or an infinity, or the rule sum
    /// overflowed on the interval centred at `at`.
    #[error("integrand is not finite at x = {at}")]
    NonFinite {
        /// The abscissa.
        at: T,
    },

    /// The integrand itself reported an error.
    #[error("integrand failed at x = {at}: {source}")]
    Integrand {
        /// The abscissa.
        at: T,
        /// The error returned by the integrand.
        #[source]
        source: BoxError,
    },
}

impl<T: Real> EvalFailure<T> {
    /// The abscissa at which evaluation failed.
    pub fn at(&self) -> T {
        match self {
            EvalFailure::NonFinite { at } | EvalFailure::Integrand { at, .. } => *at,
        }
    }
}

/// A function that can be sampled by a quadrature rule.
pub trait Integrand<T: Real> {
    /// The value type.
    type Output: Area<T>;

    /// Evaluates the integrand at `x`.
    fn eval(&self, x: T) -> Result<Self::Output, EvalFailure<T>>;
}

/// Adapter for an infallible closure.
pub struct Plain<F, T> {
    f: F,
    _domain: PhantomData<fn(T)>,
}

impl<F, T> Plain<F, T> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _domain: PhantomData,
        }
    }
}

impl<F, T, A> Integrand<T> for Plain<F, T>
where
    T: Real,
    A: Area<T>,
    F: Fn(T) -> A,
{
    type Output = A;

    #[inline]
    fn eval(&self, x: T) -> Result<A, EvalFailure<T>> {
        let y = (self.f)(x);
        if y.is_finite_area() {
            Ok(y)
        } else {
            Err(EvalFailure::NonFinite { at: x })
        }
    }
}

/// Adapter for a closure returning `Result`.
pub struct Fallible<F, T> {
    f: F,
    _domain: PhantomData<fn(T)>,
}

impl<F, T> Fallible<F, T> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _domain: PhantomData,
        }
    }
}

impl<F, T, A, E> Integrand<T> for Fallible<F, T>
where
    T: Real,
    A: Area<T>,
    E: Into<BoxError>,
    F: Fn(T) -> Result<A, E>,
{
    type Output = A;

    #[inline]
    fn eval(&self, x: T) -> Result<A, EvalFailure<T>> {
        match (self.f)(x) {
            Ok(y) if y.is_finite_area() => Ok(y),
            Ok(_) => Err(EvalFailure::NonFinite { at: x }),
            Err(e) => Err(EvalFailure::Integrand {
                at: x,
                source: e.into(),
            }),
        }
    }
}

/// Counts evaluations of a wrapped integrand.
///
/// The drivers count evaluations themselves; this wrapper exists for
/// callers that want an independent tally (for instance when comparing
/// strategies on the same function).
pub struct Counted<I> {
    inner: I,
    calls: Cell<usize>,
}

impl<I> Counted<I> {
    /// Wraps `inner` with a zeroed counter.
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    /// Number of evaluations so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<T: Real, I: Integrand<T>> Integrand<T> for Counted<I> {
    type Output = I::Output;

    #[inline]
    fn eval(&self, x: T) -> Result<I::Output, EvalFailure<T>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.eval(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rejects_nan() {
        let f = Plain::new(|x: f64| if x > 0.5 { f64::NAN } else { x });
        assert_eq!(f.eval(0.25).ok(), Some(0.25));
        match f.eval(0.75) {
            Err(EvalFailure::NonFinite { at }) => assert_eq!(at, 0.75),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fallible_propagates_error() {
        let f = Fallible::new(|x: f64| {
            if x < 0.0 {
                Err("negative argument")
            } else {
                Ok(x.sqrt())
            }
        });
        assert_eq!(f.eval(4.0).ok(), Some(2.0));

        let err = f.eval(-1.0).unwrap_err();
        assert_eq!(err.at(), -1.0);
        assert!(err.to_string().contains("negative argument"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_counted() {
        let f = Counted::new(Plain::new(|x: f64| x * x));
        for i in 0..5 {
            let _ = f.eval(i as f64);
        }
        assert_eq!(f.calls(), 5);
    }
}
