//! # quadra-adaptive
//!
//! Adaptive one-dimensional integration over finite intervals.
//!
//! This crate provides:
//! - Plain adaptive bisection for smooth integrands ([`integrate_smooth`], QAG)
//! - Bisection accelerated by Wynn's epsilon algorithm, for endpoint
//!   singularities ([`integrate`], QAGS)
//! - The same with user-supplied breakpoints, for interior singularities
//!   ([`integrate_with_breakpoints`], QAGP)
//! - The building blocks: an ordered subinterval [`Workspace`] and an
//!   [`ExtrapolationTable`]
//!
//! ## Design Principles
//!
//! - **Best estimate on failure**: every error raised after the first rule
//!   application carries the best result computed so far
//! - **Generic values**: integrands may return reals or complex numbers;
//!   errors are always real magnitudes
//! - **Configurable heuristics**: the round-off and divergence constants
//!   live in [`Thresholds`] rather than in the drivers
//!
//! ## Example
//!
//! ```ignore
//! use quadra_adaptive::{integrate, IntegrationOptions};
//! use quadra_rules::Plain;
//!
//! let f = Plain::new(|x: f64| x.ln() / x.sqrt());
//! let r = integrate(&f, 0.0, 1.0, &IntegrationOptions::new(0.0, 1e-10))?;
//! assert!((r.value + 4.0).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod driver;
pub mod error;
pub mod extrapolation;
pub mod integrator;
pub mod options;
pub mod qag;
pub mod qags;
pub mod tolerance;
pub mod workspace;

#[cfg(test)]
mod proptests;

pub use error::{
    ComputeResult, IntegrationError, IntegrationResult, Irregularity, RoundoffStage,
    WorkspaceError,
};
pub use extrapolation::{Extrapolated, ExtrapolationTable, TABLE_CAPACITY};
pub use integrator::Integrator;
pub use options::{IntegrationOptions, Thresholds};
pub use qag::integrate_smooth;
pub use qags::{integrate, integrate_with_breakpoints};
pub use tolerance::Tolerance;
pub use workspace::{IntervalId, Subinterval, Totals, Workspace};
