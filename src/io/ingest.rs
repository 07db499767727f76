//! CSV ingest and validation.
//!
//! Turns a photometry table into typed `OpticalObservation`s, and reads
//! processed light curves back for likelihood evaluation.
//!
//! - **Strict schema**: every required column must be present; otherwise the
//!   error lists the full required set.
//! - **Strict rows**: a row that violates an invariant aborts the load with the
//!   offending line number. Nothing is silently dropped.
//! - Columns beyond the required set are kept verbatim so they can be echoed to
//!   the processed output.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{LightCurve, OpticalObservation};
use crate::error::{GrbError, Result};
use crate::time::parse_utc;

/// Required optical input columns, in output order.
pub const OPTICAL_REQUIRED_COLUMNS: [&str; 7] = [
    "time",
    "exposure_s",
    "mag_ab",
    "mag_err",
    "telescope",
    "filter",
    "lambda_eff_angstrom",
];

/// Parsed optical input table.
#[derive(Debug, Clone, Default)]
pub struct OpticalInput {
    /// Header names as written, in file order.
    pub input_columns: Vec<String>,
    pub observations: Vec<OpticalObservation>,
}

/// Load an optical photometry CSV.
pub fn load_optical_observations(path: &Path) -> Result<OpticalInput> {
    let file = File::open(path).map_err(|e| GrbError::io(path, e))?;
    let source_name = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| GrbError::csv(path, e))?.clone();
    let header_map = build_header_map(&headers);
    ensure_columns_exist(&source_name, &header_map, &OPTICAL_REQUIRED_COLUMNS)?;

    let mut observations = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| GrbError::csv(path, e))?;
        let obs = parse_row(&record, &header_map).map_err(|message| GrbError::InvalidRow {
            source_name: source_name.clone(),
            line,
            message,
        })?;
        observations.push(obs);
    }

    if observations.is_empty() {
        log::warn!("{source_name}: no observation rows");
    }

    Ok(OpticalInput {
        input_columns: headers.iter().map(|name| clean_header_name(name).to_string()).collect(),
        observations,
    })
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> std::result::Result<OpticalObservation, String> {
    let time_raw = get_required(record, header_map, "time")?.to_string();
    let time = parse_utc(&time_raw).map_err(|e| e.to_string())?;

    let exposure_s = parse_f64(record, header_map, "exposure_s")?;
    if exposure_s < 0.0 {
        return Err(format!("`exposure_s` must be >= 0 (got {exposure_s})"));
    }
    let mag_ab = parse_f64(record, header_map, "mag_ab")?;
    let mag_err = parse_f64(record, header_map, "mag_err")?;
    if mag_err < 0.0 {
        return Err(format!("`mag_err` must be >= 0 (got {mag_err})"));
    }
    let lambda_eff_angstrom = parse_f64(record, header_map, "lambda_eff_angstrom")?;
    if lambda_eff_angstrom <= 0.0 {
        return Err(format!(
            "`lambda_eff_angstrom` must be > 0 (got {lambda_eff_angstrom})"
        ));
    }

    Ok(OpticalObservation {
        time_raw,
        time,
        exposure_s,
        mag_ab,
        mag_err,
        telescope: get_required(record, header_map, "telescope")?.to_string(),
        filter: get_required(record, header_map, "filter")?.to_string(),
        lambda_eff_angstrom,
        raw: record.iter().map(str::to_string).collect(),
    })
}

/// Column layouts accepted by [`load_light_curve`]: (time, value, error).
pub const LIGHT_CURVE_LAYOUTS: [[&str; 3]; 3] = [
    ["time_from_t0_s", "flux_density_mjy", "flux_density_err_mjy"],
    ["time_from_t0_s", "flux_erg_cm2_s", "flux_err_erg_cm2_s"],
    ["t_minus_t0", "flux_density_mjy", "flux_density_err_mjy"],
];

/// Load a processed light curve written by one of the processors.
///
/// The first layout in [`LIGHT_CURVE_LAYOUTS`] whose columns are all present
/// wins. Rows with a non-positive error are rejected.
pub fn load_light_curve(path: &Path) -> Result<LightCurve> {
    let file = File::open(path).map_err(|e| GrbError::io(path, e))?;
    let source_name = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader.headers().map_err(|e| GrbError::csv(path, e))?.clone();
    let header_map = build_header_map(&headers);

    let Some(layout) = LIGHT_CURVE_LAYOUTS
        .iter()
        .find(|cols| cols.iter().all(|c| header_map.contains_key(*c)))
    else {
        let alternatives = |i: usize| {
            let mut names: Vec<&str> = Vec::new();
            for layout in &LIGHT_CURVE_LAYOUTS {
                if !names.contains(&layout[i]) {
                    names.push(layout[i]);
                }
            }
            names.join(" or ")
        };
        return Err(GrbError::MissingColumns {
            source_name,
            required: (0..3).map(alternatives).collect(),
        });
    };

    let (mut time, mut value, mut error) = (Vec::new(), Vec::new(), Vec::new());
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| GrbError::csv(path, e))?;
        let row = parse_light_curve_row(&record, &header_map, layout).map_err(|message| GrbError::InvalidRow {
            source_name: source_name.clone(),
            line,
            message,
        })?;
        time.push(row.0);
        value.push(row.1);
        error.push(row.2);
    }

    log::debug!("{source_name}: {} points using columns {layout:?}", time.len());
    LightCurve::new(time, value, error)
}

fn parse_light_curve_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    layout: &[&str; 3],
) -> std::result::Result<(f64, f64, f64), String> {
    let t = parse_f64(record, header_map, layout[0])?;
    let v = parse_f64(record, header_map, layout[1])?;
    let e = parse_f64(record, header_map, layout[2])?;
    if e <= 0.0 {
        return Err(format!("`{}` must be > 0 (got {e})", layout[2]));
    }
    Ok((t, v, e))
}

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn clean_header_name(name: &str) -> &str {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}')
}

pub(crate) fn normalize_header_name(name: &str) -> String {
    clean_header_name(name).to_ascii_lowercase()
}

/// Fail with `MissingColumns` unless every name in `required` is present.
pub(crate) fn ensure_columns_exist(
    source_name: &str,
    header_map: &HashMap<String, usize>,
    required: &[&str],
) -> Result<()> {
    let all_present = required
        .iter()
        .all(|name| header_map.contains_key(&name.to_ascii_lowercase()));
    if all_present {
        return Ok(());
    }
    Err(GrbError::MissingColumns {
        source_name: source_name.to_string(),
        required: required.iter().map(|s| s.to_string()).collect(),
    })
}

pub(crate) fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    key: &str,
) -> std::result::Result<&'a str, String> {
    let idx = header_map
        .get(&key.to_ascii_lowercase())
        .ok_or_else(|| format!("missing `{key}` column"))?;
    let val = record
        .get(*idx)
        .ok_or_else(|| format!("missing `{key}` value"))?
        .trim();
    if val.is_empty() {
        return Err(format!("missing `{key}` value"));
    }
    Ok(val)
}

pub(crate) fn parse_f64(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    key: &str,
) -> std::result::Result<f64, String> {
    let raw = get_required(record, header_map, key)?;
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("`{key}` is not a number: '{raw}'"))?;
    if !v.is_finite() {
        return Err(format!("`{key}` must be finite (got {raw})"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "time,exposure_s,mag_ab,mag_err,telescope,filter,lambda_eff_angstrom";

    #[test]
    fn loads_rows_and_keeps_input_columns() {
        let file = write_csv(&format!(
            "{HEADER},observer\n2025-04-19T05:01:00,60,20.5,0.1,NOT,r,6500,alice\n"
        ));
        let input = load_optical_observations(file.path()).unwrap();
        assert_eq!(input.input_columns.len(), 8);
        assert_eq!(input.input_columns[7], "observer");
        assert_eq!(input.observations.len(), 1);
        let obs = &input.observations[0];
        assert_eq!(obs.time_raw, "2025-04-19T05:01:00");
        assert_eq!(obs.exposure_s, 60.0);
        assert_eq!(obs.telescope, "NOT");
        assert_eq!(obs.raw.last().map(String::as_str), Some("alice"));
    }

    #[test]
    fn header_matching_ignores_bom_and_case() {
        let file = write_csv(
            "\u{feff}Time, Exposure_s ,mag_ab,mag_err,telescope,filter,lambda_eff_angstrom\n\
             2025-04-19T05:01:00,60,20.5,0.1,NOT,r,6500\n",
        );
        let input = load_optical_observations(file.path()).unwrap();
        assert_eq!(input.observations.len(), 1);
        assert_eq!(input.input_columns[..2], ["Time".to_string(), "Exposure_s".to_string()]);
    }

    #[test]
    fn missing_column_lists_full_required_set() {
        let file = write_csv("time,exposure_s,mag_ab\n2025-04-19T05:01:00,60,20.5\n");
        let err = load_optical_observations(file.path()).unwrap_err();
        match err {
            GrbError::MissingColumns { required, .. } => {
                assert_eq!(required.len(), OPTICAL_REQUIRED_COLUMNS.len());
                assert!(required.contains(&"lambda_eff_angstrom".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_positive_wavelength_is_rejected_with_line() {
        let file = write_csv(&format!(
            "{HEADER}\n2025-04-19T05:01:00,60,20.5,0.1,NOT,r,6500\n2025-04-19T05:02:00,60,20.6,0.1,NOT,r,0\n"
        ));
        let err = load_optical_observations(file.path()).unwrap_err();
        assert!(matches!(err, GrbError::InvalidRow { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn negative_magnitude_error_is_rejected() {
        let file = write_csv(&format!("{HEADER}\n2025-04-19T05:01:00,60,20.5,-0.1,NOT,r,6500\n"));
        let err = load_optical_observations(file.path()).unwrap_err();
        assert!(err.to_string().contains("mag_err"), "{err}");
    }

    #[test]
    fn bad_timestamp_is_a_row_error() {
        let file = write_csv(&format!("{HEADER}\nyesterday,60,20.5,0.1,NOT,r,6500\n"));
        let err = load_optical_observations(file.path()).unwrap_err();
        assert!(matches!(err, GrbError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_optical_observations(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, GrbError::FileNotFound { .. }));
    }

    #[test]
    fn light_curve_layout_is_detected() {
        let file = write_csv("time_from_t0_s,time_err_s,flux_density_mJy,flux_density_err_mJy\n100,5,0.2,0.02\n200,5,0.1,0.01\n");
        let lc = load_light_curve(file.path()).unwrap();
        assert_eq!(lc.time, vec![100.0, 200.0]);
        assert_eq!(lc.value, vec![0.2, 0.1]);
        assert_eq!(lc.error, vec![0.02, 0.01]);

        let file = write_csv("time_from_t0_s,time_err_s,flux_erg_cm2_s,flux_err_erg_cm2_s\n100,5,5e-11,5e-12\n");
        assert_eq!(load_light_curve(file.path()).unwrap().value, vec![5e-11]);
    }

    #[test]
    fn light_curve_without_known_layout_lists_alternatives() {
        let file = write_csv("a,b,c\n1,2,3\n");
        let err = load_light_curve(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("time_from_t0_s or t_minus_t0"), "{msg}");
        assert!(msg.contains("flux_density_mjy or flux_erg_cm2_s"), "{msg}");
    }

    #[test]
    fn light_curve_rejects_zero_errors() {
        let file = write_csv("t_minus_t0,flux_density_mjy,flux_density_err_mjy\n1,2,0\n");
        let err = load_light_curve(file.path()).unwrap_err();
        assert!(matches!(err, GrbError::InvalidRow { line: 2, .. }));
    }
}
