//! Focused-cell tracking for highlight rendering.
//!
//! Selection is transient UI state: it is never persisted and never affects
//! grid content.

use serde::{Deserialize, Serialize};

/// Which single cell currently has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Selection {
    /// No focused cell (the host's `row = -1, col = -1` sentinel).
    #[default]
    None,
    Cell { row: usize, col: usize },
}

impl Selection {
    pub fn cell(row: usize, col: usize) -> Self {
        Self::Cell { row, col }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_cell_selected(&self, row: usize, col: usize) -> bool {
        *self == Self::Cell { row, col }
    }

    /// Row label of the focused cell is highlighted.
    pub fn is_row_highlighted(&self, row: usize) -> bool {
        matches!(self, Self::Cell { row: selected, .. } if *selected == row)
    }

    /// Column header of the focused cell is highlighted.
    pub fn is_column_highlighted(&self, col: usize) -> bool {
        matches!(self, Self::Cell { col: selected, .. } if *selected == col)
    }

    /// Clears the selection only when it still points at `(row, col)`.
    ///
    /// A late blur from a previously focused cell must not clear focus that
    /// already moved elsewhere.
    pub fn blur(&mut self, row: usize, col: usize) {
        if self.is_cell_selected(row, col) {
            *self = Self::None;
        }
    }

    /// Returns `(row, col)` as signed indices, `(-1, -1)` when nothing is focused.
    pub fn to_signed(&self) -> (i64, i64) {
        match *self {
            Self::None => (-1, -1),
            Self::Cell { row, col } => (row as i64, col as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Selection;

    #[test]
    fn default_is_none_sentinel() {
        let selection = Selection::default();
        assert!(selection.is_none());
        assert_eq!(selection.to_signed(), (-1, -1));
        assert!(!selection.is_row_highlighted(0));
        assert!(!selection.is_column_highlighted(0));
    }

    #[test]
    fn focused_cell_highlights_its_row_and_column() {
        let selection = Selection::cell(2, 3);
        assert!(selection.is_cell_selected(2, 3));
        assert!(!selection.is_cell_selected(3, 2));
        assert!(selection.is_row_highlighted(2));
        assert!(selection.is_column_highlighted(3));
        assert!(!selection.is_column_highlighted(2));
    }

    #[test]
    fn blur_ignores_stale_cell() {
        let mut selection = Selection::cell(1, 1);
        selection.blur(0, 0);
        assert_eq!(selection, Selection::cell(1, 1));
        selection.blur(1, 1);
        assert!(selection.is_none());
    }
}
