//! Interstellar extinction evaluators.
//!
//! The pipeline never derives a dust law itself. It asks an `ExtinctionLaw` for
//! `A_λ` given the effective wavelength (Å) and the total V-band extinction `A_V`.
//!
//! Provided evaluators:
//! - `NoExtinction`: always zero
//! - `TabulatedExtinction`: linear interpolation of a user-supplied `A_λ/A_V` curve
//! - any `Fn(f64, f64) -> f64` closure

use std::path::Path;

use serde::Deserialize;

use crate::error::{GrbError, Result};

/// Wavelength-dependent extinction, in magnitudes.
pub trait ExtinctionLaw: Sync {
    fn a_lambda(&self, wavelength_angstrom: f64, a_v: f64) -> Result<f64>;
}

impl<F> ExtinctionLaw for F
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    fn a_lambda(&self, wavelength_angstrom: f64, a_v: f64) -> Result<f64> {
        Ok(self(wavelength_angstrom, a_v))
    }
}

/// Evaluator for sight lines with negligible dust.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtinction;

impl ExtinctionLaw for NoExtinction {
    fn a_lambda(&self, _wavelength_angstrom: f64, _a_v: f64) -> Result<f64> {
        Ok(0.0)
    }
}

/// `A_λ/A_V` sampled on a wavelength grid, interpolated linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedExtinction {
    wavelengths: Vec<f64>,
    ratios: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CurveRow {
    wavelength_angstrom: f64,
    a_lambda_over_a_v: f64,
}

impl TabulatedExtinction {
    /// Build from `(wavelength Å, A_λ/A_V)` knots; knots are sorted by wavelength.
    pub fn new(mut knots: Vec<(f64, f64)>) -> Result<Self> {
        if knots.len() < 2 {
            return Err(GrbError::InvalidConfig(
                "extinction curve needs at least two knots".to_string(),
            ));
        }
        if knots.iter().any(|(w, r)| !(w.is_finite() && *w > 0.0 && r.is_finite())) {
            return Err(GrbError::InvalidConfig(
                "extinction curve knots must be finite with positive wavelengths".to_string(),
            ));
        }
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));
        if knots.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(GrbError::InvalidConfig(
                "extinction curve has duplicate wavelengths".to_string(),
            ));
        }
        let (wavelengths, ratios) = knots.into_iter().unzip();
        Ok(Self { wavelengths, ratios })
    }

    /// Load from a CSV with columns `wavelength_angstrom,a_lambda_over_a_v`.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| GrbError::csv(path, e))?;
        let mut knots = Vec::new();
        for row in reader.deserialize::<CurveRow>() {
            let row = row.map_err(|e| GrbError::csv(path, e))?;
            knots.push((row.wavelength_angstrom, row.a_lambda_over_a_v));
        }
        Self::new(knots)
    }

    fn ratio_at(&self, wavelength: f64) -> Option<f64> {
        let first = *self.wavelengths.first()?;
        let last = *self.wavelengths.last()?;
        if !(wavelength >= first && wavelength <= last) {
            return None;
        }
        let hi = self.wavelengths.partition_point(|&w| w < wavelength).max(1);
        let lo = hi - 1;
        let (x0, x1) = (self.wavelengths[lo], self.wavelengths[hi]);
        let (y0, y1) = (self.ratios[lo], self.ratios[hi]);
        let u = (wavelength - x0) / (x1 - x0);
        Some(y0 + u * (y1 - y0))
    }
}

impl ExtinctionLaw for TabulatedExtinction {
    fn a_lambda(&self, wavelength_angstrom: f64, a_v: f64) -> Result<f64> {
        let ratio = self.ratio_at(wavelength_angstrom).ok_or_else(|| {
            GrbError::Extinction(format!(
                "wavelength {wavelength_angstrom} Å outside tabulated range {}..{} Å",
                self.wavelengths[0],
                self.wavelengths[self.wavelengths.len() - 1]
            ))
        })?;
        Ok(a_v * ratio)
    }
}
