//! Singular and Badly Behaved Integrands
//!
//! Endpoint singularities resolved by extrapolation, interior
//! singularities resolved with breakpoints, and the diagnostics returned
//! for integrals that cannot be computed.
//!
//! Run with: cargo run --example singular_integrals

use std::time::Instant;

use quadra::prelude::*;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║          Quadra: Singular and Badly Behaved Integrands           ║");
    println!("╚══════════════════════════════════════════════════════════════════╝\n");

    let mut passed = 0;
    let mut failed = 0;

    let integrator = Integrator::<f64>::new().with_options(|o| o.with_abs_tol(1e-10).with_rel_tol(1e-10));

    println!("── Endpoint singularities ──────────────────────────────────────────\n");
    let endpoint: [(&str, fn(f64) -> f64, f64); 4] = [
        ("1/√x", |x| 1.0 / x.sqrt(), 2.0),
        ("ln(x)/√x", |x| x.ln() / x.sqrt(), -4.0),
        ("x^(-0.9)", |x| x.powf(-0.9), 10.0),
        ("ln(x)", f64::ln, -1.0),
    ];
    for (name, f, exact) in endpoint {
        let start = Instant::now();
        let fast = integrator.integrate(f, 0.0, 1.0);
        let slow = integrator.integrate_smooth(f, 0.0, 1.0);
        let elapsed = start.elapsed();

        print!("  ∫₀¹ {name:<10} ");
        match (fast, slow) {
            (Ok(r), slow) => {
                let ok = (r.value - exact).abs() <= 1e-9 * exact.abs().max(1.0);
                if ok {
                    passed += 1;
                } else {
                    failed += 1;
                }
                println!("{} {r}  [{} evals]", if ok { "✓" } else { "✗" }, r.evaluations);
                match slow {
                    Ok(s) => println!("      without extrapolation: {s}  [{} evals]", s.evaluations),
                    Err(e) => println!("      without extrapolation: {e}"),
                }
            }
            (Err(e), _) => {
                failed += 1;
                println!("✗ {e}");
            }
        }
        println!("      ({elapsed:?})");
    }

    println!("\n── Interior singularities ──────────────────────────────────────────\n");
    // ∫₀³ x³ ln|(x²-1)(x²-2)| dx, singular at 1 and √2
    let exact = 61.0 * 2f64.ln() + 77.0 / 4.0 * 7f64.ln() - 27.0;
    let points = [0.0, 1.0, 2f64.sqrt(), 3.0];
    let loose = Integrator::<f64>::new().with_options(|o| o.with_tolerance(Tolerance::relative(1e-3)));
    match loose.integrate_with_breakpoints(|x: f64| x.powi(3) * ((x * x - 1.0) * (x * x - 2.0)).abs().ln(), &points) {
        Ok(r) => {
            let ok = (r.value - exact).abs() <= 1e-3 * exact;
            if ok {
                passed += 1;
            } else {
                failed += 1;
            }
            println!("  ∫₀³ x³ ln|(x²-1)(x²-2)| {} {r}", if ok { "✓" } else { "✗" });
            println!("      exact {exact:.12}, {} intervals", r.intervals);
        }
        Err(e) => {
            failed += 1;
            println!("  ✗ {e}");
        }
    }

    println!("\n── Diagnosed failures ──────────────────────────────────────────────\n");
    let hopeless: [(&str, fn(f64) -> f64); 3] = [
        ("1/x", |x| 1.0 / x),
        ("x^(-1.01)", |x| x.powf(-1.01)),
        ("1/x²", |x| 1.0 / (x * x)),
    ];
    for (name, f) in hopeless {
        match integrator.integrate(f, 0.0, 1.0) {
            Ok(r) => {
                failed += 1;
                println!("  ∫₀¹ {name:<10} ✗ unexpectedly converged to {r}");
            }
            Err(e) => {
                passed += 1;
                let best = e.best().map(|b| b.to_string()).unwrap_or_default();
                println!("  ∫₀¹ {name:<10} ✓ {e}");
                println!("      best estimate {best}");
            }
        }
    }

    println!("\n═══════════════════════════════════════════════════════════════════");
    println!("  {passed} passed, {failed} failed");
}
