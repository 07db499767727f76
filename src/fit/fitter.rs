//! Fit orchestration around an external sampler.
//!
//! `Fitter::run_fit`:
//!
//! 1. lays the priors out against the model's parameters
//! 2. seeds the sampler RNG from the caller's seed
//! 3. creates the output directory
//! 4. runs the sampler with the likelihood, priors, label and options
//! 5. asks the result for `<outdir>/<label>_corner.pdf`
//!
//! Sampler errors are returned unchanged.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::{LightCurve, ProcessedTable};
use crate::error::{GrbError, Result};
use crate::fit::likelihood::{GaussianLikelihood, ParameterLayout};
use crate::fit::prior::Priors;
use crate::fit::sampler::{CornerPlotOptions, Sampler, SamplerOptions, SamplerResult, SamplingProblem};
use crate::io::ensure_output_dir;
use crate::models::DecayModel;

/// Seed used when the caller does not pass one.
pub const DEFAULT_SEED: u64 = 1234;

/// Quantiles marked on the corner plot (median and 1σ interval).
pub const CORNER_QUANTILES: [f64; 3] = [0.16, 0.5, 0.84];

/// Fits one decay model to one light curve.
pub struct Fitter {
    data: LightCurve,
    model: Box<dyn DecayModel>,
}

impl Fitter {
    pub fn new(data: LightCurve, model: Box<dyn DecayModel>) -> Self {
        Self { data, model }
    }

    pub fn from_table(table: &ProcessedTable, model: Box<dyn DecayModel>) -> Self {
        Self::new(table.to_light_curve(), model)
    }

    pub fn data(&self) -> &LightCurve {
        &self.data
    }

    pub fn model(&self) -> &dyn DecayModel {
        self.model.as_ref()
    }

    pub fn likelihood(&self) -> GaussianLikelihood<'_> {
        GaussianLikelihood::new(&self.data, self.model.as_ref())
    }

    /// Run `sampler` on this light curve and write the corner plot.
    pub fn run_fit<S: Sampler>(
        &self,
        priors: &Priors,
        label: &str,
        outdir: &Path,
        sampler: &S,
        options: &SamplerOptions,
        seed: Option<u64>,
    ) -> Result<S::Output> {
        if self.data.is_empty() {
            return Err(GrbError::InvalidConfig("cannot fit an empty light curve".to_string()));
        }
        let layout = ParameterLayout::new(priors, &self.model.param_names())?;
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or(DEFAULT_SEED));
        ensure_output_dir(outdir)?;

        let likelihood = self.likelihood();
        let problem = SamplingProblem {
            likelihood: &likelihood,
            priors,
            layout,
            label,
            outdir,
            options,
        };

        log::info!(
            "running {} on '{label}' ({} model, {} free parameters, {} points)",
            sampler.name(),
            self.model.name(),
            problem.dim(),
            self.data.len()
        );
        let result = sampler.run(&problem, &mut rng).map_err(GrbError::Sampler)?;
        log::info!("sampling finished; results in {}", result.outdir().display());

        let labels = result
            .parameter_labels()
            .iter()
            .map(|name| {
                priors
                    .get(name)
                    .map(|spec| spec.latex_label.clone())
                    .ok_or_else(|| GrbError::MissingParameter { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;
        let corner = CornerPlotOptions {
            filename: outdir.join(format!("{label}_corner.pdf")),
            labels,
            quantiles: CORNER_QUANTILES.to_vec(),
            show_titles: true,
        };
        result.plot_corner(&corner).map_err(GrbError::Sampler)?;

        Ok(result)
    }
}
