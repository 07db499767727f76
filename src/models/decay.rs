//! Afterglow decay laws.
//!
//! - `simple_power_law(x) = norm · x^(-α)`
//! - `broken_power_law(x) = norm · x^(-α1) · (1 + (x/t_b)^(1/δ))^(-δ(α2-α1))`
//! - `multi_sbpl(x)`: the broken law chained over any number of breaks,
//!   `norm · x^(-α0) · Π_i (1 + (x/t_i)^(1/δ_i))^(-δ_i(α_{i+1}-α_i))`
//!
//! `δ` sets the sharpness of each transition; smaller is sharper.
//!
//! Breaks are applied in the order given. They are not sorted or checked for
//! monotonicity; that is the caller's job.

use crate::error::{GrbError, Result};

/// Default smoothing of the single-break law.
pub const DEFAULT_SMOOTHING: f64 = 0.5;

pub fn simple_power_law(x: f64, norm: f64, alpha: f64) -> f64 {
    norm * x.powf(-alpha)
}

pub fn broken_power_law(x: f64, norm: f64, t_break: f64, alpha1: f64, alpha2: f64, delta: f64) -> f64 {
    norm * x.powf(-alpha1) * (1.0 + (x / t_break).powf(1.0 / delta)).powf(-delta * (alpha2 - alpha1))
}

/// Check `len(alphas) == len(breakpoints) + 1` and `len(deltas) == len(breakpoints)`.
pub fn check_sbpl_lengths(breakpoints: &[f64], alphas: &[f64], deltas: &[f64]) -> Result<()> {
    if alphas.len() != breakpoints.len() + 1 {
        return Err(GrbError::ParameterLength {
            list: "alphas",
            expected: breakpoints.len() + 1,
            actual: alphas.len(),
        });
    }
    if deltas.len() != breakpoints.len() {
        return Err(GrbError::ParameterLength {
            list: "deltas",
            expected: breakpoints.len(),
            actual: deltas.len(),
        });
    }
    Ok(())
}

/// Multi-segment smoothly broken power law at a single `x`.
pub fn multi_sbpl(x: f64, norm: f64, breakpoints: &[f64], alphas: &[f64], deltas: &[f64]) -> Result<f64> {
    check_sbpl_lengths(breakpoints, alphas, deltas)?;
    Ok(multi_sbpl_unchecked(x, norm, breakpoints, alphas, deltas))
}

/// Multi-segment law over a whole time grid. Lengths are checked once.
pub fn multi_sbpl_curve(
    x: &[f64],
    norm: f64,
    breakpoints: &[f64],
    alphas: &[f64],
    deltas: &[f64],
) -> Result<Vec<f64>> {
    check_sbpl_lengths(breakpoints, alphas, deltas)?;
    Ok(x
        .iter()
        .map(|&xi| multi_sbpl_unchecked(xi, norm, breakpoints, alphas, deltas))
        .collect())
}

fn multi_sbpl_unchecked(x: f64, norm: f64, breakpoints: &[f64], alphas: &[f64], deltas: &[f64]) -> f64 {
    let mut result = norm * x.powf(-alphas[0]);
    for (i, (&t_b, &delta)) in breakpoints.iter().zip(deltas).enumerate() {
        result *= (1.0 + (x / t_b).powf(1.0 / delta)).powf(-delta * (alphas[i + 1] - alphas[i]));
    }
    result
}
