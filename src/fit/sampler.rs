//! Interface to an external posterior sampler.
//!
//! The crate does not implement a sampling algorithm. A [`Sampler`] receives a
//! [`SamplingProblem`] (likelihood, priors, label, output directory and opaque
//! sampler options) plus a seeded RNG, and returns a [`SamplerResult`] that can
//! render a corner plot.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;

use crate::error::{BoxedError, Result};
use crate::fit::likelihood::{FitParameters, LogLikelihood, ParameterLayout};
use crate::fit::prior::Priors;

/// Sampler-specific settings, passed through untouched (`nlive`, `walkers`, ...).
pub type SamplerOptions = serde_json::Map<String, serde_json::Value>;

/// Everything a sampler needs to explore one posterior.
pub struct SamplingProblem<'a> {
    pub likelihood: &'a dyn LogLikelihood,
    pub priors: &'a Priors,
    pub layout: ParameterLayout,
    pub label: &'a str,
    pub outdir: &'a Path,
    pub options: &'a SamplerOptions,
}

impl SamplingProblem<'_> {
    /// Number of sampled dimensions.
    pub fn dim(&self) -> usize {
        self.layout.dim()
    }

    /// Names of the sampled dimensions, in `theta` order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.layout.free_names()
    }

    pub fn unpack(&self, theta: &[f64]) -> Result<FitParameters> {
        self.layout.unpack(theta)
    }

    pub fn log_likelihood(&self, theta: &[f64]) -> Result<f64> {
        self.likelihood.log_likelihood(&self.layout.unpack(theta)?)
    }

    /// `ln prior + ln L`; the likelihood is skipped outside the prior support.
    pub fn log_posterior(&self, theta: &[f64]) -> Result<f64> {
        let lp = self.layout.log_prior(theta)?;
        if lp == f64::NEG_INFINITY {
            return Ok(lp);
        }
        Ok(lp + self.log_likelihood(theta)?)
    }

    /// Unit hypercube → parameter space.
    pub fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>> {
        self.layout.prior_transform(u)
    }
}

/// Corner-plot request sent to the sampler's result object.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerPlotOptions {
    pub filename: PathBuf,
    /// Axis labels, in `SamplerResult::parameter_labels` order.
    pub labels: Vec<String>,
    pub quantiles: Vec<f64>,
    pub show_titles: bool,
}

/// Posterior returned by a sampler.
pub trait SamplerResult {
    fn outdir(&self) -> &Path;

    /// Names of the sampled parameters, in column order.
    fn parameter_labels(&self) -> Vec<String>;

    fn plot_corner(&self, options: &CornerPlotOptions) -> std::result::Result<(), BoxedError>;
}

/// An external posterior sampler.
pub trait Sampler {
    type Output: SamplerResult;

    fn name(&self) -> &str;

    /// Explore the posterior. May block for a long time; errors are reported as-is.
    fn run(&self, problem: &SamplingProblem<'_>, rng: &mut StdRng) -> std::result::Result<Self::Output, BoxedError>;
}
