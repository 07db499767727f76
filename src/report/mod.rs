//! Reporting utilities: model residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::LightCurve;
use crate::error::{GrbError, Result};
use crate::models::{DecayModel, ModelParams};

/// One light-curve point compared against a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResidual {
    pub time: f64,
    pub value: f64,
    pub model: f64,
    /// `(value - model) / error`.
    pub pull: f64,
}

/// Evaluate `model` on the light curve and compute per-point pulls.
pub fn compute_residuals(data: &LightCurve, model: &dyn DecayModel, params: &ModelParams) -> Result<Vec<PointResidual>> {
    let fitted = model.evaluate(&data.time, params)?;
    if fitted.iter().any(|v| !v.is_finite()) {
        return Err(GrbError::InvalidConfig(format!(
            "{} produced a non-finite value for these parameters",
            model.name()
        )));
    }
    Ok(data
        .time
        .iter()
        .zip(&data.value)
        .zip(&data.error)
        .zip(fitted)
        .map(|(((&time, &value), &error), model)| PointResidual {
            time,
            value,
            model,
            pull: (value - model) / error,
        })
        .collect())
}
