//! Input/output helpers.
//!
//! - optical CSV ingest + validation (`ingest`)
//! - X-ray light-curve readers (`xray`)
//! - processed-table CSV writers (`export`)

pub mod export;
pub mod ingest;
pub mod xray;

pub use export::*;
pub use ingest::*;
pub use xray::*;
