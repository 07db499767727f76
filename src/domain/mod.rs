//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw observation rows (`OpticalObservation`, `RawXrayTable`)
//! - calibrated light-curve rows and tables (`OpticalPoint`, `XrayFluxPoint`, ...)
//! - the generic `LightCurve` view consumed by the fitter
//! - the X-ray spectral configuration map (`DensityConversionParams`)

pub mod types;

pub use types::*;
