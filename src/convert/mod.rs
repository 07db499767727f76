//! Physical conversions: magnitudes and band fluxes to calibrated flux densities.
//!
//! - extinction evaluator interface + evaluators (`extinction`)
//! - AB magnitude → flux density in mJy (`flux`)
//! - X-ray band flux → monochromatic flux density (`spectral`)

pub mod extinction;
pub mod flux;
pub mod spectral;

pub use extinction::*;
pub use flux::*;
pub use spectral::*;
