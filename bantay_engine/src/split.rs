//! Splitting large contract exports into batches for index imports.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::csv::{parse_rows, write_row};

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("'{0}' has no header row")]
    NoHeader(PathBuf),
    #[error("{action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> SplitError {
    let path = path.to_path_buf();
    move |source| SplitError::Io { action, path, source }
}

/// File name of the `number`th batch (1-based).
pub fn batch_file_name(number: usize) -> String {
    format!("batch_{number:04}.csv")
}

/// Write the records of `input` into `out_dir` in files of at most `batch_size` records,
/// each repeating the header row. Returns the written paths in order.
///
/// # Errors
/// Fails on a zero batch size, an input without a header row, or any I/O error.
pub fn split_csv(input: &Path, out_dir: &Path, batch_size: usize) -> Result<Vec<PathBuf>, SplitError> {
    if batch_size == 0 {
        return Err(SplitError::ZeroBatchSize);
    }
    let text = fs::read_to_string(input).map_err(io_error("reading", input))?;
    let mut rows = parse_rows(&text).into_iter();
    let header = rows.next().ok_or_else(|| SplitError::NoHeader(input.to_path_buf()))?;
    fs::create_dir_all(out_dir).map_err(io_error("creating", out_dir))?;

    let records: Vec<_> = rows.collect();
    let mut written = Vec::new();
    for (i, batch) in records.chunks(batch_size).enumerate() {
        let path = out_dir.join(batch_file_name(i + 1));
        write_batch(&path, &header, batch)?;
        info!("created {} ({} records)", path.display(), batch.len());
        written.push(path);
    }

    info!("split '{}' into {} files in '{}'", input.display(), written.len(), out_dir.display());
    Ok(written)
}

fn write_batch(path: &Path, header: &[String], batch: &[Vec<String>]) -> Result<(), SplitError> {
    let file = File::create(path).map_err(io_error("creating", path))?;
    let mut out = BufWriter::new(file);
    write_row(&mut out, header).map_err(io_error("writing", path))?;
    for record in batch {
        write_row(&mut out, record).map_err(io_error("writing", path))?;
    }
    out.flush().map_err(io_error("writing", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn batches_repeat_the_header() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("contracts.csv");
        fs::write(&input, "id,name\n1,\"A, Inc.\"\n2,B\n3,C\n").unwrap();
        let out_dir = dir.path().join("batches");

        let written = split_csv(&input, &out_dir, 2).unwrap();
        assert_eq!(written, vec![out_dir.join("batch_0001.csv"), out_dir.join("batch_0002.csv")]);
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            "id,name\n1,\"A, Inc.\"\n2,B\n"
        );
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "id,name\n3,C\n");
    }

    #[test]
    fn empty_single_column_records_are_kept() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("names.csv");
        fs::write(&input, "name\n\"\"\nAcme\n").unwrap();

        let written = split_csv(&input, &dir.path().join("out"), 10).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "name\n\"\"\nAcme\n");
    }

    #[test]
    fn header_only_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("contracts.csv");
        fs::write(&input, "id,name\n").unwrap();

        assert!(split_csv(&input, dir.path(), 10).unwrap().is_empty());
    }

    #[test]
    fn rejects_zero_batch_and_empty_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.csv");
        fs::write(&input, "").unwrap();

        assert!(matches!(split_csv(&input, dir.path(), 0), Err(SplitError::ZeroBatchSize)));
        assert!(matches!(split_csv(&input, dir.path(), 5), Err(SplitError::NoHeader(_))));
        assert!(matches!(
            split_csv(&dir.path().join("missing.csv"), dir.path(), 5),
            Err(SplitError::Io { action: "reading", .. })
        ));
    }
}
