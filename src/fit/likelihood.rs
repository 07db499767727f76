//! Gaussian log-likelihood of a decay model given a light curve.
//!
//! With model values `m_i`, data `y_i ± σ_i` and intrinsic log-scatter `log_f`:
//!
//! ```text
//! σ_eff,i² = σ_i² + m_i² · exp(2 · log_f)
//! ln L     = -½ Σ [ (y_i - m_i)² / σ_eff,i² + ln(2π σ_eff,i²) ]
//! ```
//!
//! Parameters arrive as an explicit two-part structure ([`FitParameters`]):
//! the named model parameters plus the optional scatter term, which is never
//! passed to the model.

use std::f64::consts::PI;

use crate::domain::LightCurve;
use crate::error::{GrbError, Result};
use crate::fit::prior::{LOG_F_NAME, Prior, Priors};
use crate::models::{DecayModel, ModelParams};

/// `log_f` used when the scatter term is not supplied.
///
/// `exp(-20)` makes the extra variance negligible for any realistic model amplitude.
pub const DEFAULT_LOG_F: f64 = -10.0;

/// One point in parameter space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitParameters {
    pub model: ModelParams,
    pub log_f: Option<f64>,
}

impl FitParameters {
    pub fn new(model: ModelParams) -> Self {
        Self { model, log_f: None }
    }

    pub fn with_log_f(mut self, log_f: f64) -> Self {
        self.log_f = Some(log_f);
        self
    }

    /// Split a flat name → value map, pulling `log_f` out of the model parameters.
    pub fn from_flat(mut all: ModelParams) -> Self {
        let log_f = all.remove(LOG_F_NAME);
        Self { model: all, log_f }
    }
}

/// A log-likelihood the sampler can evaluate.
pub trait LogLikelihood: Send + Sync {
    /// `ln L` at `params`. Model failures (missing parameters, ...) are errors.
    fn log_likelihood(&self, params: &FitParameters) -> Result<f64>;
}

/// Gaussian likelihood with an optional fractional intrinsic scatter.
pub struct GaussianLikelihood<'a> {
    x: &'a [f64],
    y: &'a [f64],
    yerr: &'a [f64],
    model: &'a dyn DecayModel,
}

impl<'a> GaussianLikelihood<'a> {
    pub fn new(data: &'a LightCurve, model: &'a dyn DecayModel) -> Self {
        Self {
            x: &data.time,
            y: &data.value,
            yerr: &data.error,
            model,
        }
    }

    pub fn model(&self) -> &dyn DecayModel {
        self.model
    }
}

impl LogLikelihood for GaussianLikelihood<'_> {
    fn log_likelihood(&self, params: &FitParameters) -> Result<f64> {
        let model = self.model.evaluate(self.x, &params.model)?;
        if model.len() != self.y.len() {
            return Err(GrbError::ParameterLength {
                list: "model output",
                expected: self.y.len(),
                actual: model.len(),
            });
        }

        let scatter = (2.0 * params.log_f.unwrap_or(DEFAULT_LOG_F)).exp();
        let sum: f64 = model
            .iter()
            .zip(self.y)
            .zip(self.yerr)
            .map(|((&m, &y), &err)| {
                let sigma2 = err * err + m * m * scatter;
                let res = y - m;
                res * res / sigma2 + (2.0 * PI * sigma2).ln()
            })
            .sum();
        Ok(-0.5 * sum)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Model,
    LogF,
}

/// Maps the sampler's flat vector of free parameters onto [`FitParameters`].
///
/// Free parameters are the non-fixed priors in prior order (model parameters
/// first, `log_f` last). Fixed priors are filled in on every unpack.
#[derive(Debug, Clone)]
pub struct ParameterLayout {
    entries: Vec<(String, Prior, Slot)>,
}

impl ParameterLayout {
    pub fn new(priors: &Priors, model_params: &[String]) -> Result<Self> {
        priors.validate_for(model_params)?;
        let mut entries: Vec<(String, Prior, Slot)> = model_params
            .iter()
            .filter_map(|name| priors.get(name).map(|spec| (name.clone(), spec.prior, Slot::Model)))
            .collect();
        if let Some(spec) = priors.log_f() {
            entries.push((LOG_F_NAME.to_string(), spec.prior, Slot::LogF));
        }
        Ok(Self { entries })
    }

    fn free(&self) -> impl Iterator<Item = &(String, Prior, Slot)> {
        self.entries.iter().filter(|(_, prior, _)| !prior.is_fixed())
    }

    /// Names of the sampled dimensions.
    pub fn free_names(&self) -> Vec<String> {
        self.free().map(|(name, _, _)| name.clone()).collect()
    }

    pub fn dim(&self) -> usize {
        self.free().count()
    }

    pub fn unpack(&self, theta: &[f64]) -> Result<FitParameters> {
        self.check_dim(theta.len())?;
        let mut free_values = theta.iter();
        let mut params = FitParameters::default();
        for (name, prior, slot) in &self.entries {
            let value = match prior {
                Prior::Fixed { value } => *value,
                _ => free_values.next().copied().unwrap_or(f64::NAN),
            };
            match slot {
                Slot::Model => params.model.insert(name.clone(), value),
                Slot::LogF => params.log_f = Some(value),
            }
        }
        Ok(params)
    }

    /// Sum of the free priors' log densities at `theta`.
    pub fn log_prior(&self, theta: &[f64]) -> Result<f64> {
        self.check_dim(theta.len())?;
        Ok(self.free().zip(theta).map(|((_, prior, _), &x)| prior.log_prob(x)).sum())
    }

    /// Unit hypercube → parameter space, one coordinate per free parameter.
    pub fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>> {
        self.check_dim(u.len())?;
        Ok(self.free().zip(u).map(|((_, prior, _), &ui)| prior.rescale(ui)).collect())
    }

    fn check_dim(&self, actual: usize) -> Result<()> {
        let expected = self.dim();
        if actual == expected {
            Ok(())
        } else {
            Err(GrbError::ParameterLength {
                list: "theta",
                expected,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::prior::PriorSpec;
    use crate::models::{ModelKind, SimplePowerLaw};
    use approx::assert_relative_eq;

    fn curve() -> LightCurve {
        LightCurve::new(vec![1.0, 10.0, 100.0], vec![2.0, 0.2, 0.02], vec![0.1, 0.01, 0.001]).unwrap()
    }

    fn simple(norm: f64, alpha: f64) -> FitParameters {
        FitParameters::new([("norm", norm), ("alpha", alpha)].into_iter().collect())
    }

    #[test]
    fn perfect_model_gives_normalisation_term_only() {
        let data = curve();
        let lik = GaussianLikelihood::new(&data, &SimplePowerLaw);
        let value = lik.log_likelihood(&simple(2.0, 1.0).with_log_f(f64::NEG_INFINITY)).unwrap();
        let expected: f64 = -0.5 * data.error.iter().map(|e| (2.0 * PI * e * e).ln()).sum::<f64>();
        assert_relative_eq!(value, expected, max_relative = 1e-12);
    }

    #[test]
    fn default_scatter_is_negligible() {
        let data = curve();
        let lik = GaussianLikelihood::new(&data, &SimplePowerLaw);
        let with_default = lik.log_likelihood(&simple(2.0, 1.0)).unwrap();
        let without = lik.log_likelihood(&simple(2.0, 1.0).with_log_f(f64::NEG_INFINITY)).unwrap();
        assert_relative_eq!(with_default, without, max_relative = 1e-6);
    }

    #[test]
    fn scatter_inflates_variance_with_model_amplitude() {
        let data = LightCurve::new(vec![1.0], vec![3.0], vec![1.0]).unwrap();
        let lik = GaussianLikelihood::new(&data, &SimplePowerLaw);
        // m = 2, log_f = ln(0.5): σ² = 1 + 4 · 0.25 = 2
        let value = lik.log_likelihood(&simple(2.0, 0.0).with_log_f(0.5f64.ln())).unwrap();
        assert_relative_eq!(value, -0.5 * (1.0 / 2.0 + (4.0 * PI).ln()), max_relative = 1e-12);
    }

    #[test]
    fn flat_map_splits_out_log_f() {
        let flat: ModelParams = [("norm", 1.0), ("alpha", 1.2), ("log_f", -3.0)].into_iter().collect();
        let params = FitParameters::from_flat(flat);
        assert_eq!(params.log_f, Some(-3.0));
        assert!(!params.model.contains("log_f"));
        assert_eq!(params.model.len(), 2);
    }

    #[test]
    fn missing_model_parameter_propagates() {
        let data = curve();
        let lik = GaussianLikelihood::new(&data, &SimplePowerLaw);
        let params = FitParameters::new([("norm", 1.0)].into_iter().collect());
        assert!(matches!(
            lik.log_likelihood(&params),
            Err(GrbError::MissingParameter { .. })
        ));
    }

    #[test]
    fn layout_skips_fixed_priors_and_orders_log_f_last() {
        let model = ModelKind::Broken.build();
        let priors = Priors::new()
            .with("norm", PriorSpec::new(Prior::LogUniform { min: 1e-3, max: 1e3 }, "N"))
            .with("t_break", PriorSpec::new(Prior::LogUniform { min: 1e2, max: 1e6 }, "t_b"))
            .with("alpha1", PriorSpec::new(Prior::Uniform { min: 0.0, max: 3.0 }, "a1"))
            .with("alpha2", PriorSpec::new(Prior::Uniform { min: 0.0, max: 3.0 }, "a2"))
            .with("delta", PriorSpec::new(Prior::Fixed { value: 0.5 }, "d"))
            .with_log_f(PriorSpec::new(Prior::Uniform { min: -5.0, max: 0.0 }, "log f"));
        let layout = ParameterLayout::new(&priors, &model.param_names()).unwrap();
        assert_eq!(layout.free_names(), vec!["norm", "t_break", "alpha1", "alpha2", "log_f"]);

        let params = layout.unpack(&[1.0, 1e4, 0.8, 1.6, -2.0]).unwrap();
        assert_eq!(params.model.get("delta").unwrap(), 0.5);
        assert_eq!(params.model.get("t_break").unwrap(), 1e4);
        assert_eq!(params.log_f, Some(-2.0));

        let u = layout.prior_transform(&[0.5; 5]).unwrap();
        assert_relative_eq!(u[0], 1.0, max_relative = 1e-12);
        assert!(layout.log_prior(&u).unwrap().is_finite());
        assert!(matches!(
            layout.unpack(&[1.0]),
            Err(GrbError::ParameterLength { list: "theta", expected: 5, actual: 1 })
        ));
    }
}
