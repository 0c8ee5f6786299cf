//! Grid to xlsx workbook exporter.
//!
//! # Responsibility
//! - Build a one-sheet workbook mirroring the grid row-major.
//! - Encode it to bytes (or base64 text) and write it atomically.
//!
//! # Invariants
//! - Every grid cell is written: values as string cells, empty values as
//!   text-formatted blank cells, so the used range is exactly the grid shape.
//! - No header row is injected; grid row 0 is sheet row 1.
//! - Export never retries and never leaves a partial destination file.

use super::write_file_atomic;
use crate::config::EXPORT_SHEET_NAME;
use crate::model::grid::Grid;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type ExportResult<T> = Result<T, ExportError>;

/// Export failure. Terminal for the attempt that produced it.
#[derive(Debug)]
pub enum ExportError {
    /// Workbook could not be built or encoded.
    Encode(XlsxError),
    /// Grid is larger than the sheet coordinate space.
    CellOutOfRange { row: usize, col: usize },
    /// Destination path is unusable (empty or an existing directory).
    InvalidDestination(PathBuf),
    /// Writing the encoded bytes failed.
    Io { path: PathBuf, source: std::io::Error },
    /// Another export is still running.
    Busy,
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "workbook encoding failed: {err}"),
            Self::CellOutOfRange { row, col } => {
                write!(f, "cell ({row}, {col}) does not fit in a worksheet")
            }
            Self::InvalidDestination(path) => {
                write!(f, "invalid export destination `{}`", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
            Self::Busy => write!(f, "an export is already in progress"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::CellOutOfRange { .. } | Self::InvalidDestination(_) | Self::Busy => None,
        }
    }
}

impl From<XlsxError> for ExportError {
    fn from(value: XlsxError) -> Self {
        Self::Encode(value)
    }
}

/// Successful export summary handed back to the caller for user feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub bytes: usize,
    pub rows: usize,
    pub columns: usize,
}

/// One-shot grid exporter.
#[derive(Debug, Clone)]
pub struct SheetExporter {
    sheet_name: String,
}

impl Default for SheetExporter {
    fn default() -> Self {
        Self::new(EXPORT_SHEET_NAME)
    }
}

impl SheetExporter {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Encodes `grid` as xlsx bytes.
    pub fn encode(&self, grid: &Grid) -> ExportResult<Vec<u8>> {
        // Excel drops unformatted blanks from the used range.
        let text_format = Format::new().set_num_format("@");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(self.sheet_name.as_str())?;

        for (row_index, row) in grid.rows().enumerate() {
            for (col_index, value) in row.iter().enumerate() {
                let (sheet_row, sheet_col) = match (
                    u32::try_from(row_index),
                    u16::try_from(col_index),
                ) {
                    (Ok(sheet_row), Ok(sheet_col)) => (sheet_row, sheet_col),
                    _ => {
                        return Err(ExportError::CellOutOfRange {
                            row: row_index,
                            col: col_index,
                        })
                    }
                };
                if value.is_empty() {
                    worksheet.write_blank(sheet_row, sheet_col, &text_format)?;
                } else {
                    worksheet.write_string(sheet_row, sheet_col, value.as_str())?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// Encodes `grid` as base64 text, for hosts whose file writer takes encoded text.
    pub fn encode_base64(&self, grid: &Grid) -> ExportResult<String> {
        Ok(STANDARD.encode(self.encode(grid)?))
    }

    /// Encodes `grid` and atomically writes it to `destination`, replacing any file there.
    pub fn export(&self, grid: &Grid, destination: impl AsRef<Path>) -> ExportResult<ExportReceipt> {
        let started_at = Instant::now();
        let destination = destination.as_ref();

        let result = validate_destination(destination)
            .and_then(|()| self.encode(grid))
            .and_then(|bytes| {
                write_file_atomic(destination, &bytes)
                    .map(|()| bytes.len())
                    .map_err(|source| ExportError::Io {
                        path: destination.to_path_buf(),
                        source,
                    })
            });

        match result {
            Ok(bytes) => {
                info!(
                    "event=grid_export module=export status=ok bytes={} duration_ms={}",
                    bytes,
                    started_at.elapsed().as_millis()
                );
                let dimensions = grid.dimensions();
                Ok(ExportReceipt {
                    path: destination.to_path_buf(),
                    bytes,
                    rows: dimensions.rows,
                    columns: dimensions.columns,
                })
            }
            Err(err) => {
                error!(
                    "event=grid_export module=export status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn validate_destination(destination: &Path) -> ExportResult<()> {
    if destination.as_os_str().is_empty() || destination.is_dir() {
        return Err(ExportError::InvalidDestination(destination.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ExportError, SheetExporter};
    use crate::model::grid::{Grid, GridDimensions};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn sample_grid() -> Grid {
        Grid::empty(GridDimensions::DEFAULT)
            .with_cell(0, 0, "Name")
            .unwrap()
            .with_cell(1, 1, "42")
            .unwrap()
    }

    #[test]
    fn encode_produces_zip_container() {
        let bytes = SheetExporter::default().encode(&sample_grid()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn encode_base64_decodes_to_xlsx_payload() {
        let exporter = SheetExporter::default();
        let encoded = exporter.encode_base64(&sample_grid()).unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert!(decoded.starts_with(b"PK"));
    }

    #[test]
    fn export_into_directory_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = SheetExporter::default()
            .export(&sample_grid(), dir.path())
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidDestination(_)));
    }

    #[test]
    fn export_under_a_file_fails_without_creating_anything() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let destination = blocker.join("out.xlsx");

        let err = SheetExporter::default()
            .export(&sample_grid(), &destination)
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!destination.exists());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"file");
    }

    #[test]
    fn export_reports_path_and_shape() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("test.xlsx");
        let receipt = SheetExporter::default()
            .export(&sample_grid(), &destination)
            .unwrap();
        assert_eq!(receipt.path, destination);
        assert_eq!((receipt.rows, receipt.columns), (10, 5));
        assert_eq!(
            receipt.bytes as u64,
            std::fs::metadata(&destination).unwrap().len()
        );
    }
}
