//! A reusable integrator over closures.
//!
//! [`Integrator`] bundles an [`IntegrationOptions`] and wraps closures in
//! the right [`Integrand`](quadra_rules::Integrand) adapter, so callers
//! rarely need the free functions directly.

use quadra_rules::{Area, BoxError, Fallible, Plain, Real};

use crate::error::IntegrationResult;
use crate::options::IntegrationOptions;
use crate::{qag, qags};

/// Adaptive integrator with fixed options.
///
/// ```ignore
/// use quadra_adaptive::Integrator;
///
/// let integrator = Integrator::<f64>::new().with_options(|o| o.with_rel_tol(1e-12));
/// let r = integrator.integrate(|x| x.ln(), 0.0, 1.0)?;
/// assert!((r.value + 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct Integrator<T: Real> {
    options: IntegrationOptions<T>,
}

impl<T: Real> Integrator<T> {
    /// Creates an integrator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjusts the options through a builder closure.
    pub fn with_options(
        mut self,
        configure: impl FnOnce(IntegrationOptions<T>) -> IntegrationOptions<T>,
    ) -> Self {
        self.options = configure(self.options);
        self
    }

    /// The options in use.
    pub fn options(&self) -> &IntegrationOptions<T> {
        &self.options
    }

    /// Integrates with extrapolation. The right default for most
    /// integrands, including those with endpoint singularities.
    pub fn integrate<A, F>(&self, f: F, lower: T, upper: T) -> IntegrationResult<T, A>
    where
        A: Area<T>,
        F: Fn(T) -> A,
    {
        qags::integrate(&Plain::new(f), lower, upper, &self.options)
    }

    /// Integrates by plain bisection, without extrapolation.
    pub fn integrate_smooth<A, F>(&self, f: F, lower: T, upper: T) -> IntegrationResult<T, A>
    where
        A: Area<T>,
        F: Fn(T) -> A,
    {
        qag::integrate_smooth(&Plain::new(f), lower, upper, &self.options)
    }

    /// Integrates over `[points[0], points[n-1]]` with the given
    /// breakpoints.
    pub fn integrate_with_breakpoints<A, F>(&self, f: F, points: &[T]) -> IntegrationResult<T, A>
    where
        A: Area<T>,
        F: Fn(T) -> A,
    {
        qags::integrate_with_breakpoints(&Plain::new(f), points, &self.options)
    }

    /// Integrates a fallible closure with extrapolation. The first error
    /// returned by `f` aborts the integration.
    pub fn try_integrate<A, E, F>(&self, f: F, lower: T, upper: T) -> IntegrationResult<T, A>
    where
        A: Area<T>,
        E: Into<BoxError>,
        F: Fn(T) -> Result<A, E>,
    {
        qags::integrate(&Fallible::new(f), lower, upper, &self.options)
    }
}

impl<T: Real> Default for Integrator<T> {
    fn default() -> Self {
        Self {
            options: IntegrationOptions::default(),
        }
    }
}

impl<T: Real> From<IntegrationOptions<T>> for Integrator<T> {
    fn from(options: IntegrationOptions<T>) -> Self {
        Self { options }
    }
}
