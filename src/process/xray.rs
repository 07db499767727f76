//! X-ray light-curve processor.
//!
//! 1. Read the table and its `MJD-OBS` reference epoch.
//! 2. `time_from_t0_s = (MJD-OBS - MJD(T0)) · 86400 + TIME`.
//! 3. Flux: count rates are scaled by the conversion factor (`XRT_flux`);
//!    flux input passes through untouched (`XRT_flux_user`).
//! 4. Flux density (only with spectral parameters): power-law conversion to
//!    mJy at `E_obs`, stored under `xray_flux_density`.
//!
//! All configuration is validated before anything is written.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::Processor;
use crate::convert::SpectralConfig;
use crate::domain::{
    DensityConversionParams, FluxOrigin, ProcessedData, ProcessedTable, RawXrayTable, XRAY_FLUX_DENSITY_KEY,
    XrayDensityPoint, XrayFluxPoint,
};
use crate::error::{GrbError, Result};
use crate::io::{ensure_output_dir, read_xray_table, write_processed_table};
use crate::time::{SECONDS_PER_DAY, utc_to_mjd};

/// Settings for [`XrayProcessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct XrayOptions {
    /// Count rate → erg cm⁻² s⁻¹ factor. Required when `is_count_rate`.
    pub flux_conversion_factor: Option<f64>,
    /// Whether `RATE`/`ERROR` hold count rates (`true`) or fluxes.
    pub is_count_rate: bool,
    /// Spectral parameters; the flux-density table is produced only when set.
    pub density_params: Option<DensityConversionParams>,
}

impl Default for XrayOptions {
    fn default() -> Self {
        Self {
            flux_conversion_factor: None,
            is_count_rate: true,
            density_params: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XrayProcessor;

impl XrayProcessor {
    /// Seconds to add to `TIME` so that it is measured from T0.
    pub fn epoch_offset_s(reference_epoch_mjd: f64, t0: DateTime<Utc>) -> f64 {
        (reference_epoch_mjd - utc_to_mjd(t0)) * SECONDS_PER_DAY
    }

    /// Calibrate an in-memory table without touching the filesystem.
    pub fn calibrate(
        table: &RawXrayTable,
        t0: DateTime<Utc>,
        options: &XrayOptions,
    ) -> Result<(FluxOrigin, Vec<XrayFluxPoint>, Option<Vec<XrayDensityPoint>>)> {
        table.check_lengths()?;
        let (origin, factor) = if options.is_count_rate {
            let factor = options
                .flux_conversion_factor
                .ok_or(GrbError::MissingConversionFactor)?;
            if !factor.is_finite() {
                return Err(GrbError::InvalidConfig(format!(
                    "flux conversion factor must be finite (got {factor})"
                )));
            }
            (FluxOrigin::Calibrated, Some(factor))
        } else {
            (FluxOrigin::UserSupplied, None)
        };

        let spectral = match &options.density_params {
            Some(params) if !params.is_empty() => Some(SpectralConfig::resolve(params)?),
            _ => None,
        };

        let offset = Self::epoch_offset_s(table.reference_epoch, t0);
        let flux: Vec<XrayFluxPoint> = (0..table.len())
            .map(|i| {
                let (f, f_err) = match factor {
                    Some(k) => (table.rate[i] * k, table.rate_err[i] * k),
                    None => (table.rate[i], table.rate_err[i]),
                };
                XrayFluxPoint {
                    time_from_t0_s: offset + table.time[i],
                    time_err_s: table.time_err[i],
                    flux_erg_cm2_s: f,
                    flux_err_erg_cm2_s: f_err,
                }
            })
            .collect();

        let density = spectral.map(|cfg| {
            flux.iter()
                .map(|p| {
                    let (fd, fd_err) = cfg.flux_density_mjy(p.flux_erg_cm2_s, p.flux_err_erg_cm2_s);
                    XrayDensityPoint {
                        time_from_t0_s: p.time_from_t0_s,
                        time_err_s: p.time_err_s,
                        flux_density_mjy: fd,
                        flux_density_err_mjy: fd_err,
                    }
                })
                .collect()
        });

        Ok((origin, flux, density))
    }
}

impl Processor for XrayProcessor {
    type Options = XrayOptions;

    fn process(
        &self,
        input: &Path,
        t0: DateTime<Utc>,
        output_dir: &Path,
        options: &XrayOptions,
    ) -> Result<ProcessedData> {
        log::info!("processing X-ray data: {}", input.display());
        let table = read_xray_table(input)?;
        let (origin, flux, density) = Self::calibrate(&table, t0, options)?;

        ensure_output_dir(output_dir)?;
        let mut out = ProcessedData::new();

        let flux_table = ProcessedTable::XrayFlux(flux);
        write_processed_table(output_dir, &format!("{}.csv", origin.key()), &flux_table)?;
        out.insert(origin.key().to_string(), flux_table);

        if let Some(rows) = density {
            let density_table = ProcessedTable::XrayFluxDensity(rows);
            write_processed_table(output_dir, &format!("{}.csv", origin.density_file_stem()), &density_table)?;
            out.insert(XRAY_FLUX_DENSITY_KEY.to_string(), density_table);
        }

        log::info!("X-ray processing finished: {} rows", table.len());
        Ok(out)
    }
}
