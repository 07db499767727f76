//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments
//! - builds processor options from them
//! - runs the optical/X-ray processors through a `GrbEvent`
//! - converts times and evaluates likelihoods
//! - prints reports

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::cli::{Command, LoglikeArgs, OpticalArgs, TimeArgs, XrayArgs};
use crate::convert::{NoExtinction, TabulatedExtinction};
use crate::domain::DensityConversionParams;
use crate::error::{GrbError, Result};
use crate::event::{GrbEvent, OPTICAL_BAND, XRAY_BAND};
use crate::fit::{FitParameters, GaussianLikelihood, LogLikelihood};
use crate::io::load_light_curve;
use crate::models::{ModelKind, ModelParams};
use crate::process::{OpticalOptions, XrayOptions};
use crate::report::{compute_residuals, format_loglike_summary, format_processed_summary, format_time_conversions};
use crate::time::{mjd_to_utc, parse_utc, tjd_to_utc};

/// Entry point for the `grb` binary.
pub fn run() -> Result<()> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Optical(args) => handle_optical(args),
        Command::Xray(args) => handle_xray(args),
        Command::Time(args) => handle_time(args),
        Command::Loglike(args) => handle_loglike(args),
    }
}

fn handle_optical(args: OpticalArgs) -> Result<()> {
    let options = optical_options_from_args(&args)?;
    let mut event = GrbEvent::new(&args.grb, &args.t0)?;
    event.process_optical_data(&args.input, &args.output_dir, &options)?;
    print_band(&event, OPTICAL_BAND);
    Ok(())
}

fn handle_xray(args: XrayArgs) -> Result<()> {
    let options = xray_options_from_args(&args)?;
    let mut event = GrbEvent::new(&args.grb, &args.t0)?;
    event.process_xray_data(&args.input, &args.output_dir, &options)?;
    print_band(&event, XRAY_BAND);
    Ok(())
}

fn print_band(event: &GrbEvent, band: &str) {
    if let Some(data) = event.lightcurves.get(band) {
        print!("{}", format_processed_summary(data));
    }
}

fn handle_time(args: TimeArgs) -> Result<()> {
    let t = time_from_args(&args)?;
    print!("{}", format_time_conversions(t));
    Ok(())
}

fn handle_loglike(args: LoglikeArgs) -> Result<()> {
    let kind = model_kind_from_args(&args)?;
    let data = load_light_curve(&args.input)?;
    let flat: ModelParams = serde_json::from_str(&args.params)?;
    let params = FitParameters::from_flat(flat);

    let model = kind.build();
    let value = GaussianLikelihood::new(&data, model.as_ref()).log_likelihood(&params)?;
    let residuals = compute_residuals(&data, model.as_ref(), &params.model)?;
    println!("{}", format_loglike_summary(model.name(), value, &residuals));
    Ok(())
}

/// A non-zero `A_V` needs an explicit extinction curve.
pub fn optical_options_from_args(args: &OpticalArgs) -> Result<OpticalOptions> {
    match &args.extinction_table {
        Some(path) => Ok(OpticalOptions::new(args.a_v, TabulatedExtinction::from_csv(path)?)),
        None if args.a_v != 0.0 => Err(GrbError::InvalidConfig(format!(
            "--a-v {} requires --extinction-table",
            args.a_v
        ))),
        None => Ok(OpticalOptions::new(0.0, NoExtinction)),
    }
}

/// Spectral parameters from `--spectral-config`, overridden by individual flags.
pub fn xray_options_from_args(args: &XrayArgs) -> Result<XrayOptions> {
    let from_file = match &args.spectral_config {
        Some(path) => read_spectral_config(path)?,
        None => DensityConversionParams::default(),
    };
    let from_flags = DensityConversionParams {
        photon_index: args.photon_index,
        sigma_photon_index: args.sigma_photon_index,
        beta_x: args.beta_x,
        sigma_beta_x: args.sigma_beta_x,
        e1: args.e1,
        e2: args.e2,
        e_obs: args.e_obs,
    };
    let params = from_file.merged_with(&from_flags);

    Ok(XrayOptions {
        flux_conversion_factor: args.flux_conversion_factor,
        is_count_rate: !args.flux_input,
        density_params: (!params.is_empty()).then_some(params),
    })
}

pub fn read_spectral_config(path: &Path) -> Result<DensityConversionParams> {
    let text = std::fs::read_to_string(path).map_err(|e| GrbError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

pub fn time_from_args(args: &TimeArgs) -> Result<DateTime<Utc>> {
    match (&args.utc, args.mjd, args.tjd) {
        (Some(utc), _, _) => parse_utc(utc),
        (None, Some(mjd), _) => mjd_to_utc(mjd),
        (None, None, Some(tjd)) => tjd_to_utc(tjd),
        (None, None, None) => Err(GrbError::InvalidConfig(
            "one of --utc, --mjd or --tjd is required".to_string(),
        )),
    }
}

fn model_kind_from_args(args: &LoglikeArgs) -> Result<ModelKind> {
    match args.model_kind() {
        ModelKind::Multi(0) => Err(GrbError::InvalidConfig("--breaks must be at least 1".to_string())),
        kind => Ok(kind),
    }
}
