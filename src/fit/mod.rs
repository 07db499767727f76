//! Bayesian fitting of decay models.
//!
//! Responsibilities:
//!
//! - priors and their sampler-facing transforms (`prior`)
//! - the Gaussian likelihood and parameter layout (`likelihood`)
//! - the external sampler interface (`sampler`)
//! - fit orchestration: seeding, output directory, corner plot (`fitter`)

pub mod fitter;
pub mod likelihood;
pub mod prior;
pub mod sampler;

pub use fitter::*;
pub use likelihood::*;
pub use prior::*;
pub use sampler::*;
