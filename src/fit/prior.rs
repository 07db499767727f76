//! Parameter priors handed to the sampler.
//!
//! Each prior offers the three views samplers need:
//!
//! - `log_prob(x)`: log density (MCMC-style samplers)
//! - `sample(rng)`: a random draw (initial walkers / live points)
//! - `rescale(u)`: the unit-cube transform `u ∈ [0, 1] → x` (nested samplers)

use std::f64::consts::{PI, SQRT_2};

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf_inv;

use crate::error::{GrbError, Result};

/// Log-scatter parameter name used in prior files and sampler output.
pub const LOG_F_NAME: &str = "log_f";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prior {
    Uniform { min: f64, max: f64 },
    /// Uniform in `ln x`.
    LogUniform { min: f64, max: f64 },
    Normal { mu: f64, sigma: f64 },
    /// Pinned value; contributes no free dimension.
    Fixed { value: f64 },
}

impl Prior {
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Prior::Uniform { min, max } => min.is_finite() && max.is_finite() && min < max,
            Prior::LogUniform { min, max } => min.is_finite() && max.is_finite() && 0.0 < min && min < max,
            Prior::Normal { mu, sigma } => mu.is_finite() && sigma.is_finite() && sigma > 0.0,
            Prior::Fixed { value } => value.is_finite(),
        };
        if ok {
            Ok(())
        } else {
            Err(GrbError::InvalidConfig(format!("invalid prior {self:?}")))
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Prior::Fixed { .. })
    }

    pub fn log_prob(&self, x: f64) -> f64 {
        match *self {
            Prior::Uniform { min, max } => {
                if (min..=max).contains(&x) {
                    -(max - min).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::LogUniform { min, max } => {
                if (min..=max).contains(&x) {
                    -x.ln() - (max / min).ln().ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::Normal { mu, sigma } => {
                let z = (x - mu) / sigma;
                -0.5 * z * z - (sigma * (2.0 * PI).sqrt()).ln()
            }
            Prior::Fixed { value } => {
                if x == value {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Prior::Normal { mu, sigma } => {
                let z: f64 = rng.sample(StandardNormal);
                mu + sigma * z
            }
            Prior::Fixed { value } => value,
            _ => self.rescale(rng.gen_range(0.0..1.0)),
        }
    }

    /// Map `u ∈ [0, 1]` through the inverse CDF.
    pub fn rescale(&self, u: f64) -> f64 {
        match *self {
            Prior::Uniform { min, max } => min + u * (max - min),
            Prior::LogUniform { min, max } => (min.ln() + u * (max.ln() - min.ln())).exp(),
            Prior::Normal { mu, sigma } => mu + sigma * SQRT_2 * erf_inv(2.0 * u - 1.0),
            Prior::Fixed { value } => value,
        }
    }
}

/// A prior plus the axis label used on the corner plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorSpec {
    pub prior: Prior,
    pub latex_label: String,
}

impl PriorSpec {
    pub fn new(prior: Prior, latex_label: impl Into<String>) -> Self {
        Self {
            prior,
            latex_label: latex_label.into(),
        }
    }
}

/// Priors for a fit: one per model parameter, plus an optional `log_f` prior.
///
/// Without a `log_f` prior the intrinsic scatter is not sampled and the
/// likelihood falls back to its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Priors {
    model: Vec<(String, PriorSpec)>,
    log_f: Option<PriorSpec>,
}

impl Priors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the prior for a model parameter. Insertion order is kept.
    pub fn with(mut self, name: impl Into<String>, spec: PriorSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn with_log_f(mut self, spec: PriorSpec) -> Self {
        self.log_f = Some(spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: PriorSpec) {
        let name = name.into();
        if name == LOG_F_NAME {
            self.log_f = Some(spec);
            return;
        }
        match self.model.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.model.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PriorSpec> {
        if name == LOG_F_NAME {
            return self.log_f.as_ref();
        }
        self.model.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn model_priors(&self) -> impl Iterator<Item = (&str, &PriorSpec)> {
        self.model.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn log_f(&self) -> Option<&PriorSpec> {
        self.log_f.as_ref()
    }

    /// All parameter names, model parameters first, `log_f` last when present.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.model.iter().map(|(n, _)| n.clone()).collect();
        if self.log_f.is_some() {
            names.push(LOG_F_NAME.to_string());
        }
        names
    }

    /// Check every prior and that every model parameter has one.
    pub fn validate_for(&self, param_names: &[String]) -> Result<()> {
        for name in param_names {
            if self.get(name).is_none() {
                return Err(GrbError::MissingParameter { name: name.clone() });
            }
        }
        for (name, spec) in self.model_priors() {
            if !param_names.iter().any(|p| p == name) {
                return Err(GrbError::InvalidConfig(format!(
                    "prior given for unknown parameter `{name}`"
                )));
            }
            spec.prior.validate()?;
        }
        if let Some(spec) = &self.log_f {
            spec.prior.validate()?;
        }
        Ok(())
    }
}
