//! Time-system conversions.
//!
//! Civil timestamps are carried as `chrono::DateTime<Utc>`; continuous day counts
//! (MJD, TJD) as `f64` days.

pub mod mjd;

pub use mjd::*;
