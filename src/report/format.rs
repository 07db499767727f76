//! Terminal output formatting.
//!
//! Formatting lives here so the processing and fitting code stays free of
//! presentation details.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::ProcessedData;
use crate::report::PointResidual;
use crate::time::{utc_to_mjd, utc_to_tjd};

/// One line per produced table: key, row count and time span.
pub fn format_processed_summary(data: &ProcessedData) -> String {
    let mut out = String::new();
    for (key, table) in data {
        let lc = table.to_light_curve();
        let span = lc
            .time
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            });
        match span {
            Some((lo, hi)) => out.push_str(&format!("{key}: {} rows | t-T0 = [{lo:.1}, {hi:.1}] s\n", table.len())),
            None => out.push_str(&format!("{key}: 0 rows\n")),
        }
    }
    out
}

/// The same instant as UTC, MJD and TJD.
pub fn format_time_conversions(t: DateTime<Utc>) -> String {
    format!(
        "UTC: {}\nMJD: {:.9}\nTJD: {:.9}\n",
        t.to_rfc3339_opts(SecondsFormat::Millis, true),
        utc_to_mjd(t),
        utc_to_tjd(t)
    )
}

/// Log-likelihood plus a per-point residual table.
pub fn format_loglike_summary(model_name: &str, log_likelihood: f64, residuals: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Model: {model_name}\n"));
    out.push_str(&format!("ln L = {log_likelihood:.6}\n"));
    let chi2: f64 = residuals.iter().map(|r| r.pull * r.pull).sum();
    out.push_str(&format!("chi2 = {chi2:.4} (n = {})\n", residuals.len()));

    out.push_str(&format!("\n{:>14} {:>14} {:>14} {:>9}\n", "t-T0 [s]", "value", "model", "pull"));
    for r in residuals {
        out.push_str(&format!(
            "{:>14.4e} {:>14.6e} {:>14.6e} {:>9.3}\n",
            r.time, r.value, r.model, r.pull
        ));
    }
    out
}
