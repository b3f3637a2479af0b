//! Parquet file sink with atomic tmp→rename finalization

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Temporary sibling path used while a file is being written
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Buffered parquet writer; the destination only appears once finalized
pub struct ParquetSink {
    writer: ArrowWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl ParquetSink {
    /// Create a sink writing to `<path>.tmp`
    pub fn create(path: &Path, schema: &Schema, zstd_level: i32) -> Result<Self, std::io::Error> {
        let final_path = path.to_path_buf();
        let tmp_path = tmp_path_for(path);

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let level = ZstdLevel::try_new(zstd_level)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let file = File::create(&tmp_path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .build();

        let writer = match ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props)) {
            Ok(writer) => writer,
            Err(e) => {
                discard_tmp(&tmp_path);
                return Err(std::io::Error::other(e));
            }
        };

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Write a record batch
    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), std::io::Error> {
        self.row_count += batch.num_rows();
        self.writer.write(batch).map_err(std::io::Error::other)
    }

    /// Finalize: flush footer and atomically rename tmp → final.
    ///
    /// On failure the tmp file is removed and the destination is untouched.
    pub fn finalize(self) -> Result<usize, std::io::Error> {
        let row_count = self.row_count;
        let result = self
            .writer
            .close()
            .map_err(std::io::Error::other)
            .and_then(|_| fs::rename(&self.tmp_path, &self.final_path));
        if let Err(e) = result {
            discard_tmp(&self.tmp_path);
            return Err(e);
        }
        Ok(row_count)
    }

    /// Give up on this file and remove the tmp file
    pub fn abort(self) {
        drop(self.writer);
        discard_tmp(&self.tmp_path);
    }
}

/// Best-effort removal of a tmp file left by a failed write
pub fn discard_tmp(tmp_path: &Path) {
    match fs::remove_file(tmp_path) {
        Ok(()) => log::debug!("Removed tmp file: {}", tmp_path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove tmp file {}: {e}", tmp_path.display()),
    }
}

/// Check if a completed parquet file exists and has a valid footer
pub fn is_valid_parquet(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    parquet::file::reader::SerializedFileReader::new(file).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field};
    use tempfile::TempDir;

    fn id_schema() -> Schema {
        Schema::new(vec![Field::new("id", DataType::Int64, false)])
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path_for(Path::new("/data/out.parquet")),
            PathBuf::from("/data/out.parquet.tmp")
        );
    }

    #[test]
    fn is_valid_parquet_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!is_valid_parquet(&dir.path().join("nope.parquet")));
    }

    #[test]
    fn is_valid_parquet_not_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.parquet");
        std::fs::write(&path, b"this is not parquet").unwrap();
        assert!(!is_valid_parquet(&path));
    }

    #[test]
    fn write_and_finalize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.parquet");
        let schema = id_schema();
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![Arc::new(Int64Array::from(vec![1, 2, 3]))],
        )
        .unwrap();

        let mut sink = ParquetSink::create(&path, &schema, 3).unwrap();
        sink.write_batch(&batch).unwrap();
        // Nothing at the destination until finalize
        assert!(!path.exists());
        assert_eq!(sink.finalize().unwrap(), 3);

        assert!(is_valid_parquet(&path));
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn failed_rename_removes_tmp() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the destination makes the rename fail
        let path = dir.path().join("taken.parquet");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let schema = id_schema();
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![Arc::new(Int64Array::from(vec![1]))],
        )
        .unwrap();
        let mut sink = ParquetSink::create(&path, &schema, 3).unwrap();
        sink.write_batch(&batch).unwrap();

        assert!(sink.finalize().is_err());
        assert!(!tmp_path_for(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn abort_removes_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.parquet");
        let sink = ParquetSink::create(&path, &id_schema(), 3).unwrap();
        assert!(tmp_path_for(&path).exists());

        sink.abort();
        assert!(!tmp_path_for(&path).exists());
        assert!(!path.exists());
    }

    #[test]
    fn invalid_zstd_level_rejected() {
        let dir = TempDir::new().unwrap();
        let err = ParquetSink::create(&dir.path().join("x.parquet"), &id_schema(), 99).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn unwritable_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("x.parquet");
        assert!(ParquetSink::create(&path, &id_schema(), 3).is_err());
    }
}
