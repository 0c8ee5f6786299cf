//! Fixed-size text grid model.
//!
//! # Responsibility
//! - Hold the rectangular matrix of cell strings edited by the host UI.
//! - Produce new grid states with one cell replaced.
//! - Encode/decode the persisted nested-array JSON snapshot.
//!
//! # Invariants
//! - Every row has exactly `dimensions.columns` entries.
//! - The matrix never changes shape after construction.
//! - `with_cell` reallocates only the edited row; other rows are shared with
//!   the previous state.

use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Result type for grid model operations.
pub type GridResult<T> = Result<T, GridError>;

/// Grid shape. A configuration constant for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: usize,
    pub columns: usize,
}

impl GridDimensions {
    /// 10 rows by 5 columns (`A..E`).
    pub const DEFAULT: Self = Self {
        rows: 10,
        columns: 5,
    };

    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Returns whether `(row, col)` addresses a cell of this shape.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.columns
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for GridDimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

/// Grid model error.
#[derive(Debug)]
pub enum GridError {
    /// Cell address outside the configured shape. A caller contract violation.
    OutOfBounds {
        row: usize,
        col: usize,
        dimensions: GridDimensions,
    },
    /// Decoded matrix does not match the configured shape.
    ShapeMismatch {
        expected: GridDimensions,
        details: String,
    },
    /// Snapshot text is not a nested array of strings.
    Decode(serde_json::Error),
    /// Snapshot could not be encoded.
    Encode(serde_json::Error),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds {
                row,
                col,
                dimensions,
            } => write!(
                f,
                "cell ({row}, {col}) is outside the {dimensions} grid"
            ),
            Self::ShapeMismatch { expected, details } => {
                write!(f, "grid snapshot does not match {expected} shape: {details}")
            }
            Self::Decode(err) => write!(f, "invalid grid snapshot: {err}"),
            Self::Encode(err) => write!(f, "grid snapshot encoding failed: {err}"),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::OutOfBounds { .. } | Self::ShapeMismatch { .. } => None,
        }
    }
}

/// Immutable-snapshot grid of plain text cells.
///
/// Cloning is cheap: rows are reference-counted and shared until edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    dimensions: GridDimensions,
    rows: Vec<Arc<[String]>>,
}

impl Grid {
    /// Creates an all-empty grid of the given shape.
    pub fn empty(dimensions: GridDimensions) -> Self {
        let rows = (0..dimensions.rows)
            .map(|_| Arc::from(vec![String::new(); dimensions.columns]))
            .collect();
        Self { dimensions, rows }
    }

    /// Builds a grid from owned rows, rejecting any shape other than `dimensions`.
    pub fn from_rows(dimensions: GridDimensions, rows: Vec<Vec<String>>) -> GridResult<Self> {
        if rows.len() != dimensions.rows {
            return Err(GridError::ShapeMismatch {
                expected: dimensions,
                details: format!("found {} rows", rows.len()),
            });
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != dimensions.columns)
        {
            return Err(GridError::ShapeMismatch {
                expected: dimensions,
                details: format!("row {index} has {} columns", row.len()),
            });
        }

        Ok(Self {
            dimensions,
            rows: rows.into_iter().map(Arc::from).collect(),
        })
    }

    /// Decodes a persisted nested-array snapshot.
    pub fn from_json(json: &str, dimensions: GridDimensions) -> GridResult<Self> {
        let rows: Vec<Vec<String>> = serde_json::from_str(json).map_err(GridError::Decode)?;
        Self::from_rows(dimensions, rows)
    }

    /// Encodes the grid as a nested JSON array of strings, row-major.
    pub fn to_json(&self) -> GridResult<String> {
        serde_json::to_string(self).map_err(GridError::Encode)
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Returns one cell value.
    pub fn cell(&self, row: usize, col: usize) -> GridResult<&str> {
        self.check_bounds(row, col)?;
        Ok(self.rows[row][col].as_str())
    }

    /// Returns a new grid with exactly one cell replaced.
    ///
    /// Unedited rows are shared with `self`.
    pub fn with_cell(&self, row: usize, col: usize, value: impl Into<String>) -> GridResult<Self> {
        self.check_bounds(row, col)?;

        let mut edited = self.rows[row].to_vec();
        edited[col] = value.into();

        let mut rows = self.rows.clone();
        rows[row] = Arc::from(edited);
        Ok(Self {
            dimensions: self.dimensions,
            rows,
        })
    }

    /// Iterates rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[String]> + '_ {
        self.rows.iter().map(|row| row.as_ref())
    }

    /// Copies the grid into owned rows, e.g. for FFI or export.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.rows().map(<[String]>::to_vec).collect()
    }

    /// Returns whether every cell is the empty string.
    pub fn is_blank(&self) -> bool {
        self.rows().all(|row| row.iter().all(String::is_empty))
    }

    /// Returns whether `row` is the same allocation in both grids.
    pub fn shares_row_with(&self, other: &Grid, row: usize) -> bool {
        match (self.rows.get(row), other.rows.get(row)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }

    fn check_bounds(&self, row: usize, col: usize) -> GridResult<()> {
        if self.dimensions.contains(row, col) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                row,
                col,
                dimensions: self.dimensions,
            })
        }
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

/// Column header letter for a zero-based column index (`0 -> "A"`).
///
/// Only single letters are produced; grids wider than 26 columns are not
/// supported by this header scheme.
pub fn column_header(index: usize) -> String {
    debug_assert!(index < 26, "column header index {index} exceeds Z");
    char::from(b'A' + (index % 26) as u8).to_string()
}

/// One-based row label shown in the left gutter (`0 -> "1"`).
pub fn row_label(index: usize) -> String {
    (index + 1).to_string()
}
