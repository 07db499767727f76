//! Processors: raw observation files → calibrated, T0-anchored light curves.
//!
//! Each processor reads one input file, writes its tables under the output
//! directory (created if needed; files are overwritten whole) and returns the
//! same tables keyed by output name.

pub mod optical;
pub mod xray;

pub use optical::*;
pub use xray::*;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::ProcessedData;
use crate::error::Result;

/// Common processor interface.
pub trait Processor {
    /// Processor-specific settings.
    type Options;

    fn process(
        &self,
        input: &Path,
        t0: DateTime<Utc>,
        output_dir: &Path,
        options: &Self::Options,
    ) -> Result<ProcessedData>;
}
