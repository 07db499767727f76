//! X-ray light-curve readers.
//!
//! Two on-disk layouts carry the same table (`TIME`, `TIME_ERR`, `RATE`,
//! `ERROR`) plus a file-level reference epoch in the `MJD-OBS` keyword:
//!
//! - FITS binary tables (HDU 1), behind the `fits` cargo feature
//! - delimited text, with header cards as leading comment lines:
//!
//! ```text
//! # TELESCOP = 'SWIFT'
//! # MJD-OBS  = 60000.0
//! TIME,TIME_ERR,RATE,ERROR
//! 100,10,0.5,0.05
//! ```
//!
//! Readers check, in order: the file exists, the reference epoch is present,
//! the required columns are present, then parse values.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::RawXrayTable;
use crate::error::{GrbError, Result};
use crate::io::ingest::{build_header_map, ensure_columns_exist, parse_f64};

/// Header keyword holding the reference epoch (MJD).
pub const REFERENCE_EPOCH_KEY: &str = "MJD-OBS";

/// Required X-ray table columns.
pub const XRAY_COLUMNS: [&str; 4] = ["TIME", "TIME_ERR", "RATE", "ERROR"];

/// Reads an X-ray light curve from disk.
pub trait XrayReader {
    fn read(&self, path: &Path) -> Result<RawXrayTable>;
}

/// Delimited-text reader with `# KEY = value` header cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextXrayReader;

impl XrayReader for TextXrayReader {
    fn read(&self, path: &Path) -> Result<RawXrayTable> {
        let text = std::fs::read_to_string(path).map_err(|e| GrbError::io(path, e))?;
        let source_name = path.display().to_string();

        let (cards, body_offset, card_lines) = split_header_cards(&text);
        let reference_epoch = reference_epoch_from_cards(&cards, path)?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text[body_offset..].as_bytes());
        let headers = reader.headers().map_err(|e| GrbError::csv(path, e))?.clone();
        let header_map = build_header_map(&headers);
        ensure_columns_exist(&source_name, &header_map, &XRAY_COLUMNS)?;

        let mut table = RawXrayTable {
            time: Vec::new(),
            time_err: Vec::new(),
            rate: Vec::new(),
            rate_err: Vec::new(),
            reference_epoch,
        };
        for (idx, result) in reader.records().enumerate() {
            let line = card_lines + idx + 2;
            let record = result.map_err(|e| GrbError::csv(path, e))?;
            let invalid = |message| GrbError::InvalidRow {
                source_name: source_name.clone(),
                line,
                message,
            };
            table.time.push(parse_f64(&record, &header_map, "TIME").map_err(invalid)?);
            table.time_err.push(parse_f64(&record, &header_map, "TIME_ERR").map_err(invalid)?);
            table.rate.push(parse_f64(&record, &header_map, "RATE").map_err(invalid)?);
            table.rate_err.push(parse_f64(&record, &header_map, "ERROR").map_err(invalid)?);
        }
        Ok(table)
    }
}

/// Split leading `#` card lines from the table body.
///
/// Returns the parsed cards (upper-cased keys), the byte offset of the body and
/// the number of lines consumed.
fn split_header_cards(text: &str) -> (HashMap<String, String>, usize, usize) {
    let mut cards = HashMap::new();
    let mut offset = 0;
    let mut lines = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
        if let Some((key, value)) = trimmed.trim_start_matches('#').split_once('=') {
            cards.insert(key.trim().to_ascii_uppercase(), card_value(value));
        }
        offset += line.len();
        lines += 1;
    }
    (cards, offset, lines)
}

/// Card value without its inline `/ comment` and surrounding quotes.
fn card_value(raw: &str) -> String {
    let value = raw.split_once(" /").map_or(raw, |(v, _)| v).trim();
    value.trim_matches('\'').trim().to_string()
}

fn reference_epoch_from_cards(cards: &HashMap<String, String>, path: &Path) -> Result<f64> {
    let missing = || GrbError::MissingReferenceEpoch {
        key: REFERENCE_EPOCH_KEY,
        path: path.to_path_buf(),
    };
    let raw = cards.get(REFERENCE_EPOCH_KEY).ok_or_else(missing)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(GrbError::InvalidConfig(format!(
            "'{REFERENCE_EPOCH_KEY}' in '{}' is not a number: '{raw}'",
            path.display()
        ))),
    }
}

/// FITS binary-table reader (HDU 1).
#[cfg(feature = "fits")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsXrayReader;

/// cfitsio status for a keyword that is not in the header.
#[cfg(feature = "fits")]
const KEY_NO_EXIST: i32 = 202;

#[cfg(feature = "fits")]
impl XrayReader for FitsXrayReader {
    fn read(&self, path: &Path) -> Result<RawXrayTable> {
        use fitsio::FitsFile;
        use fitsio::errors::Error as FitsIoError;
        use fitsio::hdu::HduInfo;

        if !path.exists() {
            return Err(GrbError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let fits_err = |source| GrbError::Fits {
            path: path.to_path_buf(),
            source,
        };

        let mut fptr = FitsFile::open(path).map_err(fits_err)?;
        let hdu = fptr.hdu(1).map_err(fits_err)?;

        let reference_epoch = match hdu.read_key::<f64>(&mut fptr, REFERENCE_EPOCH_KEY) {
            Ok(value) => value,
            Err(FitsIoError::Fits(e)) if e.status == KEY_NO_EXIST => {
                return Err(GrbError::MissingReferenceEpoch {
                    key: REFERENCE_EPOCH_KEY,
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(fits_err(e)),
        };

        let present: Vec<String> = match &hdu.info {
            HduInfo::TableInfo {
                column_descriptions, ..
            } => column_descriptions
                .iter()
                .map(|c| c.name.trim().to_ascii_uppercase())
                .collect(),
            _ => Vec::new(),
        };
        if !XRAY_COLUMNS.iter().all(|name| present.iter().any(|p| p == name)) {
            return Err(GrbError::MissingColumns {
                source_name: path.display().to_string(),
                required: XRAY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            });
        }

        let mut read = |name: &str| -> Result<Vec<f64>> { hdu.read_col(&mut fptr, name).map_err(fits_err) };
        Ok(RawXrayTable {
            time: read("TIME")?,
            time_err: read("TIME_ERR")?,
            rate: read("RATE")?,
            rate_err: read("ERROR")?,
            reference_epoch,
        })
    }
}

/// Whether `path` names a FITS file (`.fits`, `.fit`, `.fits.gz`, `.lc`).
pub fn is_fits_path(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    [".fits", ".fit", ".fits.gz", ".lc"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// Pick a reader from the file extension.
pub fn reader_for(path: &Path) -> Result<Box<dyn XrayReader>> {
    if is_fits_path(path) {
        #[cfg(feature = "fits")]
        return Ok(Box::new(FitsXrayReader));
        #[cfg(not(feature = "fits"))]
        return Err(GrbError::InvalidConfig(format!(
            "'{}' looks like a FITS file; rebuild with `--features fits` or convert it to text",
            path.display()
        )));
    }
    Ok(Box::new(TextXrayReader))
}

/// Read an X-ray light curve with the reader matching its extension.
pub fn read_xray_table(path: &Path) -> Result<RawXrayTable> {
    reader_for(path)?.read(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_text(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_cards_and_columns() {
        let file = write_text(
            "# TELESCOP = 'SWIFT' / mission\n\
             # MJD-OBS  = 60000.5 / reference epoch\n\
             TIME,TIME_ERR,RATE,ERROR\n\
             100,10,0.5,0.05\n\
             200,10,0.3,0.03\n",
        );
        let table = TextXrayReader.read(file.path()).unwrap();
        assert_eq!(table.reference_epoch, 60000.5);
        assert_eq!(table.time, vec![100.0, 200.0]);
        assert_eq!(table.rate_err, vec![0.05, 0.03]);
    }

    #[test]
    fn missing_epoch_is_reported_before_columns() {
        // Both the card and a column are missing; the epoch error wins.
        let file = write_text("# TELESCOP = 'SWIFT'\nTIME,RATE\n100,0.5\n");
        let err = TextXrayReader.read(file.path()).unwrap_err();
        assert!(
            matches!(err, GrbError::MissingReferenceEpoch { key: "MJD-OBS", .. }),
            "{err:?}"
        );
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let file = write_text("# MJD-OBS = 60000\nTIME,TIME_ERR,RATE\n100,10,0.5\n");
        let err = TextXrayReader.read(file.path()).unwrap_err();
        assert!(matches!(err, GrbError::MissingColumns { .. }));
    }

    #[test]
    fn row_errors_count_card_lines() {
        let file = write_text("# MJD-OBS = 60000\nTIME,TIME_ERR,RATE,ERROR\n100,10,x,0.05\n");
        let err = TextXrayReader.read(file.path()).unwrap_err();
        assert!(matches!(err, GrbError::InvalidRow { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_xray_table(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, GrbError::FileNotFound { .. }));
    }

    #[test]
    fn fits_extensions_are_recognised() {
        assert!(is_fits_path(Path::new("curve.FITS")));
        assert!(is_fits_path(Path::new("curve.fits.gz")));
        assert!(is_fits_path(Path::new("xrt.lc")));
        assert!(!is_fits_path(Path::new("curve.csv")));
    }

    #[cfg(feature = "fits")]
    mod fits {
        use std::path::Path;

        use crate::error::GrbError;
        use crate::io::xray::*;
        use fitsio::FitsFile;
        use fitsio::tables::{ColumnDataType, ColumnDescription};

        fn write_fits(path: &Path, columns: &[&str], epoch: Option<f64>) {
            let mut fptr = FitsFile::create(path).open().unwrap();
            let descriptions: Vec<_> = columns
                .iter()
                .map(|name| {
                    ColumnDescription::new(*name)
                        .with_type(ColumnDataType::Double)
                        .create()
                        .unwrap()
                })
                .collect();
            let hdu = fptr.create_table("RATE".to_string(), &descriptions).unwrap();
            for (i, name) in columns.iter().enumerate() {
                let values = [100.0 + i as f64, 200.0 + i as f64];
                hdu.write_col(&mut fptr, *name, &values).unwrap();
            }
            if let Some(mjd) = epoch {
                hdu.write_key(&mut fptr, REFERENCE_EPOCH_KEY, mjd).unwrap();
            }
        }

        #[test]
        fn reads_hdu1_columns_and_epoch() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("xrt.fits");
            write_fits(&path, &XRAY_COLUMNS, Some(60_000.5));

            let table = read_xray_table(&path).unwrap();
            assert_eq!(table.reference_epoch, 60_000.5);
            assert_eq!(table.time, vec![100.0, 200.0]);
            assert_eq!(table.time_err, vec![101.0, 201.0]);
            assert_eq!(table.rate, vec![102.0, 202.0]);
            assert_eq!(table.rate_err, vec![103.0, 203.0]);
        }

        #[test]
        fn missing_epoch_keyword() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("xrt.fits");
            write_fits(&path, &XRAY_COLUMNS, None);

            let err = FitsXrayReader.read(&path).unwrap_err();
            assert!(
                matches!(err, GrbError::MissingReferenceEpoch { key: "MJD-OBS", .. }),
                "{err:?}"
            );
        }

        #[test]
        fn missing_column() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("xrt.fits");
            write_fits(&path, &["TIME", "RATE", "ERROR"], Some(60_000.0));

            let err = FitsXrayReader.read(&path).unwrap_err();
            assert!(matches!(err, GrbError::MissingColumns { .. }), "{err:?}");
        }

        #[test]
        fn non_fits_content_is_a_fits_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("xrt.fits");
            std::fs::write(&path, "not a fits file").unwrap();

            let err = FitsXrayReader.read(&path).unwrap_err();
            assert!(matches!(err, GrbError::Fits { .. }), "{err:?}");
        }
    }
}
