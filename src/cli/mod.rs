//! Command-line parsing for the GRB afterglow pipeline.
//!
//! Argument parsing and command dispatch stay separate from the processing and
//! modeling code; `app` turns these structs into processor options.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

use crate::models::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "grb", version, about = "GRB afterglow light-curve processing and modeling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert optical AB magnitudes to extinction-corrected flux densities.
    Optical(OpticalArgs),
    /// Calibrate an X-ray light curve to band flux and, optionally, flux density.
    Xray(XrayArgs),
    /// Convert a time between UTC, MJD and TJD.
    Time(TimeArgs),
    /// Evaluate the Gaussian log-likelihood of a light curve for one parameter point.
    Loglike(LoglikeArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct OpticalArgs {
    /// Photometry CSV.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Trigger time (ISO-8601, UTC).
    #[arg(long)]
    pub t0: String,

    /// Burst name, used in log messages.
    #[arg(long, default_value = "GRB")]
    pub grb: String,

    /// Directory for the processed table.
    #[arg(short, long, default_value = "processed")]
    pub output_dir: PathBuf,

    /// Total V-band Galactic extinction (mag).
    #[arg(long, default_value_t = 0.0)]
    pub a_v: f64,

    /// CSV with `wavelength_angstrom,a_lambda_over_a_v`. Required when `--a-v` is non-zero.
    #[arg(long, value_name = "CSV")]
    pub extinction_table: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct XrayArgs {
    /// X-ray light curve (delimited text, or FITS with the `fits` feature).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Trigger time (ISO-8601, UTC).
    #[arg(long)]
    pub t0: String,

    /// Burst name, used in log messages.
    #[arg(long, default_value = "GRB")]
    pub grb: String,

    /// Directory for the processed tables.
    #[arg(short, long, default_value = "processed")]
    pub output_dir: PathBuf,

    /// Count rate → erg cm⁻² s⁻¹ factor.
    #[arg(long)]
    pub flux_conversion_factor: Option<f64>,

    /// `RATE`/`ERROR` already hold fluxes (erg cm⁻² s⁻¹).
    #[arg(long)]
    pub flux_input: bool,

    /// JSON object with spectral parameters (`photon_index`, `beta_X`, `E1`, ...).
    #[arg(long, value_name = "JSON")]
    pub spectral_config: Option<PathBuf>,

    /// Photon index Γ.
    #[arg(long)]
    pub photon_index: Option<f64>,

    /// Uncertainty on Γ.
    #[arg(long)]
    pub sigma_photon_index: Option<f64>,

    /// Energy spectral index β (deprecated; prefer `--photon-index`).
    #[arg(long)]
    pub beta_x: Option<f64>,

    /// Uncertainty on β.
    #[arg(long)]
    pub sigma_beta_x: Option<f64>,

    /// Lower band edge (keV).
    #[arg(long)]
    pub e1: Option<f64>,

    /// Upper band edge (keV).
    #[arg(long)]
    pub e2: Option<f64>,

    /// Energy at which the flux density is quoted (keV).
    #[arg(long)]
    pub e_obs: Option<f64>,
}

#[derive(Debug, Parser, Clone)]
#[command(group(ArgGroup::new("input").required(true).args(["utc", "mjd", "tjd"])))]
pub struct TimeArgs {
    /// ISO-8601 UTC time.
    #[arg(long)]
    pub utc: Option<String>,

    /// Modified Julian Date.
    #[arg(long)]
    pub mjd: Option<f64>,

    /// Truncated Julian Date (MJD − 40000).
    #[arg(long)]
    pub tjd: Option<f64>,
}

/// Decay model selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelChoice {
    Simple,
    Broken,
    Multi,
}

#[derive(Debug, Parser, Clone)]
pub struct LoglikeArgs {
    /// Processed light-curve CSV.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Decay model.
    #[arg(long, value_enum, default_value_t = ModelChoice::Simple)]
    pub model: ModelChoice,

    /// Number of breaks for `--model multi`.
    #[arg(long, default_value_t = 1)]
    pub breaks: usize,

    /// Parameter values as a JSON object, e.g. `{"norm": 1e3, "alpha": 1.2, "log_f": -3}`.
    #[arg(long, value_name = "JSON")]
    pub params: String,
}

impl LoglikeArgs {
    pub fn model_kind(&self) -> ModelKind {
        match self.model {
            ModelChoice::Simple => ModelKind::Simple,
            ModelChoice::Broken => ModelKind::Broken,
            ModelChoice::Multi => ModelKind::Multi(self.breaks),
        }
    }
}
