use std::io::BufRead;
use std::path::Path;

use thiserror::Error;

use crate::calendar::{DateRange, RangeError};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input file {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("Input file {0} is empty")]
    Empty(String),
    #[error("Invalid date range in {path}: {source}")]
    InvalidRange { path: String, source: RangeError },
}

/// Reads the `start,end` range from the first line of `path`.
pub fn read_date_range(path: &Path) -> Result<DateRange, InputError> {
    let shown = path.display().to_string();
    let read_error = |source| InputError::ReadError {
        path: shown.clone(),
        source,
    };

    let file = std::fs::File::open(path).map_err(read_error)?;
    let mut first_line = String::new();
    std::io::BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(read_error)?;

    if first_line.trim().is_empty() {
        return Err(InputError::Empty(shown));
    }

    let range = first_line
        .parse::<DateRange>()
        .map_err(|source| InputError::InvalidRange {
            path: shown.clone(),
            source,
        })?;

    tracing::info!("Read date range {} to {} from {}", range.start, range.end, shown);
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn input_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.txt");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_only_the_first_line() {
        let dir = TempDir::new().unwrap();
        let path = input_file(&dir, "2024-01-01,2024-01-02\n2030-01-01,2030-01-02\n");

        let range = read_date_range(&path).unwrap();

        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = input_file(&dir, "");

        assert!(matches!(read_date_range(&path), Err(InputError::Empty(_))));
    }

    #[test]
    fn malformed_line_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = input_file(&dir, "yesterday,today\n");

        assert!(matches!(
            read_date_range(&path),
            Err(InputError::InvalidRange { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();

        let result = read_date_range(&dir.path().join("absent.txt"));

        assert!(matches!(result, Err(InputError::ReadError { .. })));
    }
}
