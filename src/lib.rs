//! # Quadra
//!
//! Adaptive numerical integration over finite intervals, with rigorous
//! error estimates.
//!
//! ## Features
//!
//! - **Gauss-Kronrod Rules**: the six QUADPACK pairs, from 15 to 61 points
//! - **Adaptive Bisection**: worst-interval-first subdivision with
//!   round-off and divergence detection
//! - **Extrapolation**: Wynn's epsilon algorithm for endpoint singularities
//! - **Breakpoints**: pre-decomposed domains for interior singularities
//! - **Generic Values**: real and complex integrands, `f32` and `f64`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quadra::prelude::*;
//!
//! let tol = Tolerance::new(1e-10, 1e-10);
//! let r = quadra::integrate(|x: f64| x.ln(), 0.0, 1.0, tol, 1000, RuleOrder::Gk21)?;
//! println!("{r}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use quadra_adaptive as adaptive;
pub use quadra_rules as rules;

use quadra_adaptive::{IntegrationOptions, IntegrationResult, Tolerance};
use quadra_rules::{Area, Plain, Real, RuleOrder};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use quadra_adaptive::{
        ComputeResult, IntegrationError, IntegrationOptions, IntegrationResult, Integrator,
        RoundoffStage, Thresholds, Tolerance,
    };
    pub use quadra_rules::{Area, Fallible, Integrand, Plain, Real, RuleOrder};
}

/// Integrates `f` over `[lower, upper]` with the extrapolating driver.
///
/// Shorthand for [`quadra_adaptive::integrate`] with options assembled
/// from the arguments. Use [`Integrator`](quadra_adaptive::Integrator)
/// to reuse options across calls or to tune [`Thresholds`](quadra_adaptive::Thresholds).
pub fn integrate<T, A, F>(
    f: F,
    lower: T,
    upper: T,
    tolerance: Tolerance<T>,
    max_intervals: usize,
    rule: RuleOrder,
) -> IntegrationResult<T, A>
where
    T: Real,
    A: Area<T>,
    F: Fn(T) -> A,
{
    let options = IntegrationOptions::default()
        .with_tolerance(tolerance)
        .with_max_intervals(max_intervals)
        .with_rule(rule);
    quadra_adaptive::integrate(&Plain::new(f), lower, upper, &options)
}
