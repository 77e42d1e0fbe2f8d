//! Plain-text trajectory file formats.

/// TUM RGB-D trajectory files.
pub mod tum;

/// KITTI odometry pose files.
pub mod kitti;

use std::io::BufRead;
use std::path::Path;

use crate::TrajectoryError;

/// An error type for the file interface.
#[derive(Debug, thiserror::Error)]
pub enum FileInterfaceError {
    /// Failed to open, read or write the file.
    #[error("Failed to manipulate the file. {0}")]
    Io(#[from] std::io::Error),

    /// A line does not follow the expected format.
    #[error("Failed to parse line {line}: {msg}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        msg: String,
    },

    /// The file contains no data rows.
    #[error("No data rows found in {0}")]
    NoData(std::path::PathBuf),

    /// The parsed values do not form a valid path or trajectory.
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

/// Reads the numeric rows of a text file with `N` values per row.
///
/// Values are separated by whitespace or commas. Empty lines and lines starting
/// with `#` are skipped, as is a leading UTF-8 byte order mark.
pub(crate) fn read_rows<const N: usize>(
    file_path: &Path,
) -> Result<Vec<[f64; N]>, FileInterfaceError> {
    let file = std::fs::File::open(file_path)?;
    let reader = std::io::BufReader::new(file);

    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        rows.push(parse_row(line, i + 1)?);
    }

    if rows.is_empty() {
        return Err(FileInterfaceError::NoData(file_path.to_path_buf()));
    }
    log::debug!("loaded {} rows from {}", rows.len(), file_path.display());

    Ok(rows)
}

fn parse_row<const N: usize>(line: &str, line_number: usize) -> Result<[f64; N], FileInterfaceError> {
    let parse_error = |msg: String| FileInterfaceError::Parse {
        line: line_number,
        msg,
    };

    let mut row = [0.0; N];
    let mut count = 0;
    for token in line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        if count == N {
            return Err(parse_error(format!("expected {N} values, got more")));
        }
        row[count] = token
            .parse()
            .map_err(|e| parse_error(format!("invalid number {token:?}: {e}")))?;
        count += 1;
    }
    if count != N {
        return Err(parse_error(format!("expected {N} values, got {count}")));
    }

    Ok(row)
}

/// Writes one space-separated line per row.
pub(crate) fn write_rows<'a>(
    file_path: &Path,
    rows: impl Iterator<Item = &'a [f64]>,
) -> Result<(), FileInterfaceError> {
    use std::io::Write;

    let file = std::fs::File::create(file_path)?;
    let mut writer = std::io::BufWriter::new(file);
    for row in rows {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;

    Ok(())
}
