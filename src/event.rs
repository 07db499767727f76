//! A single burst and the light curves processed for it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{ProcessedData, ProcessedTable};
use crate::error::Result;
use crate::process::{OpticalOptions, OpticalProcessor, Processor, XrayOptions, XrayProcessor};
use crate::time::parse_utc;

/// Band under which optical tables are stored.
pub const OPTICAL_BAND: &str = "optical";
/// Band under which X-ray tables are stored.
pub const XRAY_BAND: &str = "xray";

#[derive(Debug, Clone, PartialEq)]
pub struct GrbEvent {
    pub name: String,
    /// Trigger time.
    pub t0: DateTime<Utc>,
    pub redshift: Option<f64>,
    /// Luminosity distance (cm).
    pub distance_cm: Option<f64>,
    /// band → output key → table.
    pub lightcurves: BTreeMap<String, ProcessedData>,
}

impl GrbEvent {
    /// Create an event from its name and an ISO-8601 trigger time.
    pub fn new(name: impl Into<String>, t0: &str) -> Result<Self> {
        Ok(Self::with_t0(name, parse_utc(t0)?))
    }

    pub fn with_t0(name: impl Into<String>, t0: DateTime<Utc>) -> Self {
        let event = Self {
            name: name.into(),
            t0,
            redshift: None,
            distance_cm: None,
            lightcurves: BTreeMap::new(),
        };
        log::info!("created {event}");
        event
    }

    pub fn with_redshift(mut self, z: f64) -> Self {
        self.redshift = Some(z);
        self
    }

    pub fn with_distance_cm(mut self, d: f64) -> Self {
        self.distance_cm = Some(d);
        self
    }

    /// Process an optical table and store the result under the `optical` band.
    pub fn process_optical_data(
        &mut self,
        input: &Path,
        output_dir: &Path,
        options: &OpticalOptions,
    ) -> Result<Vec<String>> {
        let data = OpticalProcessor.process(input, self.t0, output_dir, options)?;
        Ok(self.store(OPTICAL_BAND, data))
    }

    /// Process an X-ray light curve and store the result under the `xray` band.
    pub fn process_xray_data(&mut self, input: &Path, output_dir: &Path, options: &XrayOptions) -> Result<Vec<String>> {
        let data = XrayProcessor.process(input, self.t0, output_dir, options)?;
        Ok(self.store(XRAY_BAND, data))
    }

    pub fn lightcurve(&self, band: &str, key: &str) -> Option<&ProcessedTable> {
        self.lightcurves.get(band)?.get(key)
    }

    fn store(&mut self, band: &str, data: ProcessedData) -> Vec<String> {
        let keys: Vec<String> = data.keys().cloned().collect();
        self.lightcurves.entry(band.to_string()).or_default().extend(data);
        log::info!("[{}] loaded {band} light curves: {keys:?}", self.name);
        keys
    }
}

impl fmt::Display for GrbEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GrbEvent(name='{}', t0='{}'",
            self.name,
            self.t0.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        if let Some(z) = self.redshift {
            write!(f, ", z={z}")?;
        }
        write!(f, ")")
    }
}
