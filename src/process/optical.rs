//! Optical photometry processor.
//!
//! For each observation:
//!
//! - `t_minus_t0 = (time - T0) + exposure_s / 2` (exposure midpoint)
//! - extinction-corrected AB magnitude → flux density in mJy
//!
//! Rows are then sorted by `t_minus_t0` and written to
//! `<output_dir>/<input stem>_processed.csv`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::Processor;
use crate::convert::{ExtinctionLaw, NoExtinction, magnitudes_to_flux_densities};
use crate::domain::{OPTICAL_KEY, OpticalPoint, OpticalTable, ProcessedData, ProcessedTable};
use crate::error::Result;
use crate::io::{ensure_output_dir, load_optical_observations, write_processed_table};
use crate::time::seconds_between;

/// Settings for [`OpticalProcessor`].
pub struct OpticalOptions {
    /// Total V-band extinction along the line of sight (mag).
    pub a_v: f64,
    pub extinction: Box<dyn ExtinctionLaw + Send>,
}

impl OpticalOptions {
    pub fn new(a_v: f64, extinction: impl ExtinctionLaw + Send + 'static) -> Self {
        Self {
            a_v,
            extinction: Box::new(extinction),
        }
    }
}

impl Default for OpticalOptions {
    fn default() -> Self {
        Self::new(0.0, NoExtinction)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpticalProcessor;

impl OpticalProcessor {
    /// Output path for a given input file.
    pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
        output_dir.join(processed_file_name(input))
    }
}

fn processed_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "optical".to_string());
    format!("{stem}_processed.csv")
}

impl Processor for OpticalProcessor {
    type Options = OpticalOptions;

    fn process(
        &self,
        input: &Path,
        t0: DateTime<Utc>,
        output_dir: &Path,
        options: &OpticalOptions,
    ) -> Result<ProcessedData> {
        log::info!("processing optical data: {}", input.display());
        let parsed = load_optical_observations(input)?;

        let mags: Vec<f64> = parsed.observations.iter().map(|o| o.mag_ab).collect();
        let errs: Vec<f64> = parsed.observations.iter().map(|o| o.mag_err).collect();
        let lambdas: Vec<f64> = parsed.observations.iter().map(|o| o.lambda_eff_angstrom).collect();
        let fluxes = magnitudes_to_flux_densities(&mags, &errs, &lambdas, options.a_v, options.extinction.as_ref())?;

        let mut rows: Vec<OpticalPoint> = parsed
            .observations
            .into_iter()
            .zip(fluxes)
            .map(|(obs, (flux, flux_err))| OpticalPoint {
                t_minus_t0: seconds_between(t0, obs.time) + obs.exposure_s / 2.0,
                flux_density_mjy: flux,
                flux_density_err_mjy: flux_err,
                obs,
            })
            .collect();
        rows.sort_by(|a, b| a.t_minus_t0.total_cmp(&b.t_minus_t0));

        let table = ProcessedTable::Optical(OpticalTable {
            input_columns: parsed.input_columns,
            rows,
        });

        ensure_output_dir(output_dir)?;
        write_processed_table(output_dir, &processed_file_name(input), &table)?;
        log::info!("optical processing finished: {} rows", table.len());

        Ok(ProcessedData::from([(OPTICAL_KEY.to_string(), table)]))
    }
}
