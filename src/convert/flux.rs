//! AB magnitude → flux density.
//!
//! `F_ν = 3631 Jy · 10^(-m'/2.5)` with `m' = m - A_λ` the extinction-corrected
//! magnitude. Outputs are in mJy.
//!
//! Error propagation is first order in the magnitude only (the extinction term
//! carries no uncertainty): `σ_F = F · (ln 10 / 2.5) · σ_m`.

use rayon::prelude::*;

use crate::convert::extinction::ExtinctionLaw;
use crate::error::{GrbError, Result};

/// Flux density of an AB magnitude of zero.
pub const AB_ZERO_POINT_JY: f64 = 3631.0;

pub const MJY_PER_JY: f64 = 1000.0;

/// `d F / d m = -F · ln(10) / 2.5`, as a positive factor.
const LN10_OVER_2P5: f64 = std::f64::consts::LN_10 / 2.5;

/// Plain AB magnitude → Jy, no extinction.
pub fn ab_magnitude_to_jy(mag_ab: f64) -> f64 {
    AB_ZERO_POINT_JY * 10f64.powf(-mag_ab / 2.5)
}

/// Convert one AB magnitude and its 1σ error to an extinction-corrected flux
/// density and error, both in mJy.
pub fn magnitude_to_flux_density(
    mag_ab: f64,
    mag_err: f64,
    lambda_eff_angstrom: f64,
    a_v: f64,
    law: &dyn ExtinctionLaw,
) -> Result<(f64, f64)> {
    let a_lambda = law.a_lambda(lambda_eff_angstrom, a_v)?;
    let flux_jy = ab_magnitude_to_jy(mag_ab - a_lambda);
    let err_jy = flux_jy * LN10_OVER_2P5 * mag_err;
    Ok((flux_jy * MJY_PER_JY, err_jy * MJY_PER_JY))
}

/// Element-wise [`magnitude_to_flux_density`] over parallel columns.
///
/// Rows are independent; the output keeps input order.
pub fn magnitudes_to_flux_densities(
    mag_ab: &[f64],
    mag_err: &[f64],
    lambda_eff_angstrom: &[f64],
    a_v: f64,
    law: &dyn ExtinctionLaw,
) -> Result<Vec<(f64, f64)>> {
    let n = mag_ab.len();
    for (list, len) in [("mag_err", mag_err.len()), ("lambda_eff_angstrom", lambda_eff_angstrom.len())] {
        if len != n {
            return Err(GrbError::ParameterLength {
                list,
                expected: n,
                actual: len,
            });
        }
    }

    (0..n)
        .into_par_iter()
        .map(|i| magnitude_to_flux_density(mag_ab[i], mag_err[i], lambda_eff_angstrom[i], a_v, law))
        .collect()
}
