//! Shared domain types.
//!
//! Calibrated rows derive `Serialize` with the exact output column names so the
//! CSV writers in `io::export` can stream them without a second mapping layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GrbError, Result};

/// Output key of the optical processor.
pub const OPTICAL_KEY: &str = "optical_data";

/// Output key of the X-ray flux-density table.
pub const XRAY_FLUX_DENSITY_KEY: &str = "xray_flux_density";

/// One optical photometry measurement as read from the input table.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalObservation {
    /// Timestamp exactly as written in the input file (echoed to the output).
    pub time_raw: String,
    pub time: DateTime<Utc>,
    pub exposure_s: f64,
    pub mag_ab: f64,
    pub mag_err: f64,
    pub telescope: String,
    pub filter: String,
    pub lambda_eff_angstrom: f64,
    /// Every input field verbatim, in `OpticalTable::input_columns` order.
    pub raw: Vec<String>,
}

/// A calibrated optical row.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalPoint {
    pub obs: OpticalObservation,
    /// Seconds since T0 at the exposure midpoint.
    pub t_minus_t0: f64,
    pub flux_density_mjy: f64,
    pub flux_density_err_mjy: f64,
}

/// Calibrated optical table, sorted by `t_minus_t0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpticalTable {
    /// Input header names as written in the file (BOM and padding stripped), in file order.
    pub input_columns: Vec<String>,
    pub rows: Vec<OpticalPoint>,
}

/// Raw X-ray light curve as read from a binary (or text) table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawXrayTable {
    /// Seconds since the file's reference epoch.
    pub time: Vec<f64>,
    /// Half-width of each time bin (s).
    pub time_err: Vec<f64>,
    pub rate: Vec<f64>,
    pub rate_err: Vec<f64>,
    /// File-level reference epoch (MJD).
    pub reference_epoch: f64,
}

impl RawXrayTable {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Every column must have as many rows as `TIME`.
    pub fn check_lengths(&self) -> Result<()> {
        let columns: [(&'static str, &Vec<f64>); 3] = [
            ("TIME_ERR", &self.time_err),
            ("RATE", &self.rate),
            ("ERROR", &self.rate_err),
        ];
        for (list, column) in columns {
            if column.len() != self.time.len() {
                return Err(GrbError::ParameterLength {
                    list,
                    expected: self.time.len(),
                    actual: column.len(),
                });
            }
        }
        Ok(())
    }
}

/// A calibrated X-ray band-flux row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XrayFluxPoint {
    pub time_from_t0_s: f64,
    pub time_err_s: f64,
    pub flux_erg_cm2_s: f64,
    pub flux_err_erg_cm2_s: f64,
}

/// A calibrated X-ray flux-density row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XrayDensityPoint {
    pub time_from_t0_s: f64,
    pub time_err_s: f64,
    #[serde(rename = "flux_density_mJy")]
    pub flux_density_mjy: f64,
    #[serde(rename = "flux_density_err_mJy")]
    pub flux_density_err_mjy: f64,
}

/// Whether the X-ray flux table was converted from count rates or supplied as flux.
///
/// The two origins are never conflated: each has its own output key and file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluxOrigin {
    /// Count rate multiplied by a conversion factor.
    Calibrated,
    /// Input already in flux units, passed through.
    UserSupplied,
}

impl FluxOrigin {
    pub fn key(self) -> &'static str {
        match self {
            FluxOrigin::Calibrated => "XRT_flux",
            FluxOrigin::UserSupplied => "XRT_flux_user",
        }
    }

    /// File stem of the matching flux-density table.
    pub fn density_file_stem(self) -> String {
        self.key().replace("flux", "flux_density")
    }
}

/// One table produced by a processor.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedTable {
    Optical(OpticalTable),
    XrayFlux(Vec<XrayFluxPoint>),
    XrayFluxDensity(Vec<XrayDensityPoint>),
}

impl ProcessedTable {
    pub fn len(&self) -> usize {
        match self {
            ProcessedTable::Optical(t) => t.rows.len(),
            ProcessedTable::XrayFlux(rows) => rows.len(),
            ProcessedTable::XrayFluxDensity(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the table as `(time since T0, value, 1σ error)` for fitting.
    pub fn to_light_curve(&self) -> LightCurve {
        let rows: Vec<(f64, f64, f64)> = match self {
            ProcessedTable::Optical(t) => t
                .rows
                .iter()
                .map(|r| (r.t_minus_t0, r.flux_density_mjy, r.flux_density_err_mjy))
                .collect(),
            ProcessedTable::XrayFlux(rows) => rows
                .iter()
                .map(|r| (r.time_from_t0_s, r.flux_erg_cm2_s, r.flux_err_erg_cm2_s))
                .collect(),
            ProcessedTable::XrayFluxDensity(rows) => rows
                .iter()
                .map(|r| (r.time_from_t0_s, r.flux_density_mjy, r.flux_density_err_mjy))
                .collect(),
        };
        LightCurve {
            time: rows.iter().map(|r| r.0).collect(),
            value: rows.iter().map(|r| r.1).collect(),
            error: rows.iter().map(|r| r.2).collect(),
        }
    }
}

/// Processor output: output key → table.
pub type ProcessedData = BTreeMap<String, ProcessedTable>;

/// Column-oriented light curve: the independent, dependent and uncertainty arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightCurve {
    pub time: Vec<f64>,
    pub value: Vec<f64>,
    pub error: Vec<f64>,
}

impl LightCurve {
    pub fn new(time: Vec<f64>, value: Vec<f64>, error: Vec<f64>) -> Result<Self> {
        if value.len() != time.len() {
            return Err(GrbError::ParameterLength {
                list: "value",
                expected: time.len(),
                actual: value.len(),
            });
        }
        if error.len() != time.len() {
            return Err(GrbError::ParameterLength {
                list: "error",
                expected: time.len(),
                actual: error.len(),
            });
        }
        Ok(Self { time, value, error })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Spectral parameters for the X-ray flux-density stage, as supplied by the user.
///
/// Key names match the established configuration-file keys
/// (`photon_index`, `beta_X`, `E1`, ...). Resolve with
/// [`crate::convert::SpectralConfig::resolve`] before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DensityConversionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photon_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma_photon_index: Option<f64>,
    #[serde(rename = "beta_X", default, skip_serializing_if = "Option::is_none")]
    pub beta_x: Option<f64>,
    #[serde(rename = "sigma_beta_X", default, skip_serializing_if = "Option::is_none")]
    pub sigma_beta_x: Option<f64>,
    #[serde(rename = "E1", default, skip_serializing_if = "Option::is_none")]
    pub e1: Option<f64>,
    #[serde(rename = "E2", default, skip_serializing_if = "Option::is_none")]
    pub e2: Option<f64>,
    #[serde(rename = "E_obs", default, skip_serializing_if = "Option::is_none")]
    pub e_obs: Option<f64>,
}

impl DensityConversionParams {
    /// True when no key is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay every key set in `other` onto `self`.
    pub fn merged_with(mut self, other: &DensityConversionParams) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(photon_index, sigma_photon_index, beta_x, sigma_beta_x, e1, e2, e_obs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flux_origins_map_to_distinct_keys() {
        assert_eq!(FluxOrigin::Calibrated.key(), "XRT_flux");
        assert_eq!(FluxOrigin::UserSupplied.key(), "XRT_flux_user");
        assert_eq!(FluxOrigin::Calibrated.density_file_stem(), "XRT_flux_density");
        assert_eq!(FluxOrigin::UserSupplied.density_file_stem(), "XRT_flux_density_user");
    }

    #[test]
    fn light_curve_rejects_mismatched_columns() {
        let err = LightCurve::new(vec![1.0, 2.0], vec![1.0], vec![0.1, 0.1]).unwrap_err();
        assert!(matches!(err, GrbError::ParameterLength { list: "value", .. }));
    }

    #[test]
    fn density_table_views_as_light_curve() {
        let table = ProcessedTable::XrayFluxDensity(vec![XrayDensityPoint {
            time_from_t0_s: 100.0,
            time_err_s: 10.0,
            flux_density_mjy: 0.5,
            flux_density_err_mjy: 0.05,
        }]);
        let lc = table.to_light_curve();
        assert_eq!(lc.time, vec![100.0]);
        assert_eq!(lc.value, vec![0.5]);
        assert_eq!(lc.error, vec![0.05]);
    }

    #[test]
    fn spectral_params_use_original_key_names() {
        let json = r#"{"beta_X": 1.1, "sigma_beta_X": 0.2, "E_obs": 2.0}"#;
        let params: DensityConversionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.beta_x, Some(1.1));
        assert_eq!(params.sigma_beta_x, Some(0.2));
        assert_eq!(params.e_obs, Some(2.0));
        assert_eq!(params.photon_index, None);
    }

    #[test]
    fn merge_prefers_overlay_values() {
        let base = DensityConversionParams {
            photon_index: Some(2.0),
            e1: Some(0.5),
            ..Default::default()
        };
        let overlay = DensityConversionParams {
            photon_index: Some(1.8),
            ..Default::default()
        };
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.photon_index, Some(1.8));
        assert_eq!(merged.e1, Some(0.5));
    }
}
