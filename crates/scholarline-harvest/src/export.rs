//! Export of collected records to Parquet or JSON Lines

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, RecordBatch, StringArray, UInt32Array};
use arrow::error::ArrowError;
use scholarline_core::{ParquetSink, discard_tmp, tmp_path_for};

use crate::record::Record;
use crate::schema;

/// Output file format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Parquet,
    JsonLines,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to Parquet
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                Self::JsonLines
            }
            _ => Self::Parquet,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::JsonLines => "jsonl",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(Self::Parquet),
            "jsonl" | "ndjson" | "json-lines" => Ok(Self::JsonLines),
            other => Err(format!("unknown export format: {other} (expected parquet or jsonl)")),
        }
    }
}

/// Export failure
#[derive(Debug)]
pub enum ExportError {
    /// No records were collected; nothing is written
    Empty,
    Io(std::io::Error),
    Arrow(ArrowError),
    Json(serde_json::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "nothing to export: no records collected"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Arrow(e) => write!(f, "Arrow error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Io(e) => Some(e),
            Self::Arrow(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ArrowError> for ExportError {
    fn from(e: ArrowError) -> Self {
        Self::Arrow(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Convert records into one Arrow batch matching [`schema::records`]
pub fn records_to_batch(records: &[Record]) -> Result<RecordBatch, ArrowError> {
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.query_key.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.title.as_str()))),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.authors.as_str()),
        )),
        Arc::new(UInt32Array::from_iter_values(
            records.iter().map(|r| r.citation_count),
        )),
        Arc::new(records.iter().map(|r| r.year).collect::<Int32Array>()),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.link.as_str()))),
    ];
    RecordBatch::try_new(schema::RECORDS.clone(), arrays)
}

/// Write `records` to `path`, returning the number of rows written.
///
/// The file is written under a temporary name and renamed into place, so an
/// interrupted export never leaves a partial file at `path`. An empty input
/// fails with [`ExportError::Empty`] without touching the filesystem.
pub fn export_records(
    records: &[Record],
    path: &Path,
    format: ExportFormat,
    zstd_level: i32,
) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let rows = match format {
        ExportFormat::Parquet => write_parquet(records, path, zstd_level)?,
        ExportFormat::JsonLines => write_json_lines(records, path)?,
    };

    log::info!("Exported {rows} records to {}", path.display());
    Ok(rows)
}

fn write_parquet(records: &[Record], path: &Path, zstd_level: i32) -> Result<usize, ExportError> {
    let batch = records_to_batch(records)?;
    let mut sink = ParquetSink::create(path, schema::records(), zstd_level)?;
    if let Err(e) = sink.write_batch(&batch) {
        sink.abort();
        return Err(e.into());
    }
    Ok(sink.finalize()?)
}

fn write_json_lines(records: &[Record], path: &Path) -> Result<usize, ExportError> {
    let tmp_path = tmp_path_for(path);
    let result = write_json_lines_to(records, &tmp_path)
        .and_then(|()| fs::rename(&tmp_path, path).map_err(ExportError::from));
    if let Err(e) = result {
        discard_tmp(&tmp_path);
        return Err(e);
    }
    Ok(records.len())
}

fn write_json_lines_to(records: &[Record], tmp_path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(tmp_path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
