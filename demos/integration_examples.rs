//! Numerical Integration Examples
//!
//! Smooth and oscillatory integrands with known closed forms, integrated
//! with every Gauss-Kronrod pair and both adaptive strategies.
//!
//! Run with: cargo run --example integration_examples

use std::f64::consts::PI;

use num_complex::Complex;
use quadra::prelude::*;
use quadra::rules;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║             Quadra - Numerical Integration Examples              ║");
    println!("╚══════════════════════════════════════════════════════════════════╝\n");

    rule_order_examples();
    smooth_integrand_examples();
    physics_examples();
    complex_examples();

    println!("\n✓ All examples completed successfully!");
}

fn section(title: &str) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    {title}");
    println!("═══════════════════════════════════════════════════════════════════\n");
}

fn report(label: &str, result: &ComputeResult<f64>, exact: f64) {
    println!("  {label}");
    println!("    value      = {:.15}", result.value);
    println!("    exact      = {exact:.15}");
    println!("    |error|    = {:.2e} (estimated {:.2e})", (result.value - exact).abs(), result.abs_error);
    println!("    intervals  = {}, evaluations = {}", result.intervals, result.evaluations);
}

fn rule_order_examples() {
    section("GAUSS-KRONROD RULE ORDERS");

    // Example 1: a single rule application per order
    println!("Example 1: ∫₀² cos(3x) e^(-x) dx with one rule application");
    let exact = (1.0 + (-2f64).exp() * (3.0 * (6f64).sin() - (6f64).cos())) / 10.0;
    for order in RuleOrder::ALL {
        match rules::qk_integrate(|x: f64| (3.0 * x).cos() * (-x).exp(), 0.0, 2.0, order) {
            Ok(est) => println!(
                "  {order:>7}: {:.15} (gauss {:.15}, error {:.2e}, {} evaluations)",
                est.result, est.gauss, est.abs_error, est.evaluations
            ),
            Err(e) => println!("  {order:>7}: {e}"),
        }
    }
    println!("  exact  : {exact:.15}\n");
}

fn smooth_integrand_examples() {
    section("SMOOTH INTEGRANDS");

    let integrator = Integrator::<f64>::new().with_options(|o| o.with_rel_tol(1e-12));

    // Example 2: ∫₀^π sin x dx converges on the first estimate
    println!("Example 2: ∫₀^π sin(x) dx");
    match integrator.integrate_smooth(f64::sin, 0.0, PI) {
        Ok(r) => report("integrate_smooth", &r, 2.0),
        Err(e) => println!("  failed: {e}"),
    }

    // Example 3: a narrow peak needs many bisections
    println!("\nExample 3: ∫₋₁₀₀₀¹⁰⁰⁰ 1/(1+x²) dx");
    let exact = 2.0 * 1000f64.atan();
    for (name, outcome) in [
        ("integrate_smooth", integrator.integrate_smooth(|x: f64| 1.0 / (1.0 + x * x), -1000.0, 1000.0)),
        ("integrate", integrator.integrate(|x: f64| 1.0 / (1.0 + x * x), -1000.0, 1000.0)),
    ] {
        match outcome {
            Ok(r) => report(name, &r, exact),
            Err(e) => println!("  {name} failed: {e}"),
        }
    }

    // Example 4: reversed limits flip the sign
    println!("\nExample 4: ∫₃⁰ eˣ dx = 1 - e³");
    match integrator.integrate(f64::exp, 3.0, 0.0) {
        Ok(r) => report("integrate", &r, 1.0 - 3f64.exp()),
        Err(e) => println!("  failed: {e}"),
    }
}

fn physics_examples() {
    section("PHYSICS");

    let integrator = Integrator::<f64>::new().with_options(|o| o.with_tolerance(Tolerance::relative(1e-10)));

    // Example 5: Gaussian normalisation
    println!("Example 5: ∫₋₁₀¹⁰ e^(-x²) dx ≈ √π");
    match integrator.integrate(|x: f64| (-x * x).exp(), -10.0, 10.0) {
        Ok(r) => report("gaussian", &r, PI.sqrt()),
        Err(e) => println!("  failed: {e}"),
    }

    // Example 6: Planck spectrum, ∫₀^∞ x³/(eˣ-1) dx = π⁴/15, truncated at 60
    println!("\nExample 6: ∫₀⁶⁰ x³/(eˣ-1) dx ≈ π⁴/15");
    match integrator.integrate(|x: f64| x.powi(3) / x.exp_m1(), 0.0, 60.0) {
        Ok(r) => report("planck", &r, PI.powi(4) / 15.0),
        Err(e) => println!("  failed: {e}"),
    }

    // Example 7: period of a pendulum released at 90°, 4 K(1/√2)
    println!("\nExample 7: ∫₀^(π/2) dθ/√(1 - sin²θ/2)");
    let exact = 1.854_074_677_301_372;
    match integrator.integrate(|t: f64| 1.0 / (1.0 - 0.5 * t.sin().powi(2)).sqrt(), 0.0, PI / 2.0) {
        Ok(r) => report("elliptic K(1/√2)", &r, exact),
        Err(e) => println!("  failed: {e}"),
    }
}

fn complex_examples() {
    section("COMPLEX INTEGRANDS");

    // Example 8: a Fourier coefficient
    println!("Example 8: ∫₀^π e^(ix) dx = 2i");
    let tol = Tolerance::new(1e-12, 1e-12);
    match quadra::integrate(|x: f64| Complex::new(0.0, x).exp(), 0.0, PI, tol, 100, RuleOrder::Gk21) {
        Ok(r) => println!("  value = {} (error {:.2e})", r.value, r.abs_error),
        Err(e) => println!("  failed: {e}"),
    }
}
