//! Export processed tables to CSV.
//!
//! Files are written whole (create + truncate); numbers use Rust's shortest
//! round-trip formatting, so re-reading a file reproduces the in-memory values.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{OpticalTable, ProcessedTable};
use crate::error::{GrbError, Result};
use crate::io::ingest::normalize_header_name;

/// Computed optical columns, appended after the input columns.
pub const OPTICAL_COMPUTED_COLUMNS: [&str; 3] = ["t_minus_t0", "flux_density_mjy", "flux_density_err_mjy"];

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| GrbError::Io {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Write a calibrated optical table: every input column in file order and
/// spelling, then the computed columns.
///
/// An input column that already carries a computed name is overwritten in place.
pub fn write_optical_csv(path: &Path, table: &OpticalTable) -> Result<()> {
    let mut writer = csv_writer(path)?;
    let csv_err = |e| GrbError::csv(path, e);

    let in_place: Vec<Option<usize>> = OPTICAL_COMPUTED_COLUMNS
        .iter()
        .map(|name| {
            table
                .input_columns
                .iter()
                .position(|col| normalize_header_name(col) == *name)
        })
        .collect();

    let mut header = table.input_columns.clone();
    for (name, slot) in OPTICAL_COMPUTED_COLUMNS.iter().zip(&in_place) {
        if slot.is_none() {
            header.push(name.to_string());
        }
    }
    writer.write_record(&header).map_err(csv_err)?;

    for row in &table.rows {
        let mut record = row.obs.raw.clone();
        let computed = [row.t_minus_t0, row.flux_density_mjy, row.flux_density_err_mjy];
        for (value, slot) in computed.iter().zip(&in_place) {
            match slot {
                Some(idx) => record[*idx] = value.to_string(),
                None => record.push(value.to_string()),
            }
        }
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| GrbError::io(path, e))
}

/// Write serializable rows with a header derived from their field names.
pub fn write_rows_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for row in rows {
        writer.serialize(row).map_err(|e| GrbError::csv(path, e))?;
    }
    writer.flush().map_err(|e| GrbError::io(path, e))
}

/// Write any processed table to `<dir>/<file_name>` and return the path.
pub fn write_processed_table(dir: &Path, file_name: &str, table: &ProcessedTable) -> Result<PathBuf> {
    let path = dir.join(file_name);
    match table {
        ProcessedTable::Optical(t) => write_optical_csv(&path, t)?,
        ProcessedTable::XrayFlux(rows) => write_rows_csv(&path, rows)?,
        ProcessedTable::XrayFluxDensity(rows) => write_rows_csv(&path, rows)?,
    }
    log::info!("wrote {}", path.display());
    Ok(path)
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>> {
    let file = File::create(path).map_err(|e| GrbError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(file))
}
