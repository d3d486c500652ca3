//! # quadra-rules
//!
//! Gauss-Kronrod quadrature rules for the adaptive drivers in
//! `quadra-adaptive`.
//!
//! This crate provides:
//! - The six QUADPACK Gauss-Kronrod pairs, from G7K15 to G30K61 ([`RuleOrder`])
//! - A single-interval rule evaluator that yields the Kronrod estimate, the
//!   rescaled error and the `resabs`/`resasc` magnitudes ([`GaussKronrodRule`])
//! - The numeric traits shared by the whole stack ([`Real`], [`Area`])
//! - Integrand adapters for plain and fallible closures ([`Integrand`])
//!
//! ## Example
//!
//! ```ignore
//! use quadra_rules::{qk_integrate, RuleOrder};
//!
//! // ∫₀¹ x² dx = 1/3 with a single G7K15 application
//! let est = qk_integrate(|x: f64| x * x, 0.0, 1.0, RuleOrder::Gk15)?;
//! assert!((est.result - 1.0 / 3.0).abs() < 1e-15);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod integrand;
pub mod real;
pub mod rule;
mod tables;

#[cfg(test)]
mod proptests;

pub use integrand::{BoxError, Counted, EvalFailure, Fallible, Integrand, Plain};
pub use real::{Area, Real};
pub use rule::{qk_integrate, rescale_error, GaussKronrodRule, RuleEstimate, RuleOrder};
