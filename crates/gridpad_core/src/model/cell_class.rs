//! Display-only classification of cell text.
//!
//! # Responsibility
//! - Decide whether a cell string reads as a number, using the same coercion
//!   rules as a JavaScript `Number(text)` call.
//! - Map that class to the alignment hint the host renders with.
//!
//! # Invariants
//! - Pure functions; stored cell values are never modified.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMERIC_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)|0[xX][0-9a-fA-F]+|0[oO][0-7]+|0[bB][01]+)$",
    )
    .expect("valid numeric literal regex")
});

/// Whether a cell reads as a number or as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellClass {
    Numeric,
    Text,
}

/// Horizontal text alignment hint for rendering a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Classifies `value`; blank text coerces to zero and so counts as numeric.
pub fn classify_cell(value: &str) -> CellClass {
    let trimmed = value.trim_matches(|ch: char| ch.is_whitespace() || ch == '\u{feff}');
    if trimmed.is_empty() || NUMERIC_LITERAL_RE.is_match(trimmed) {
        CellClass::Numeric
    } else {
        CellClass::Text
    }
}

/// Alignment the editor uses: text cells align right, numeric cells left.
pub fn alignment_hint(value: &str) -> Alignment {
    match classify_cell(value) {
        CellClass::Text => Alignment::Right,
        CellClass::Numeric => Alignment::Left,
    }
}
