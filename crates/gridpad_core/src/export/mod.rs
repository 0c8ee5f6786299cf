//! Spreadsheet export.
//!
//! # Responsibility
//! - Encode a grid snapshot as a single-sheet xlsx workbook.
//! - Write the workbook to a destination without leaving partial files.
//! - Provide the user-facing export dialog text.
//!
//! # Invariants
//! - Cell text is exported verbatim; no type inference, formulas or styling.
//! - A failed export leaves the destination untouched.

mod atomic_write;
pub mod sheet_exporter;

pub use atomic_write::write_file_atomic;

/// Title of the confirmation dialog shown before exporting.
pub const CONFIRM_EXPORT_TITLE: &str = "Confirm Export";
/// Body of the confirmation dialog shown before exporting.
pub const CONFIRM_EXPORT_MESSAGE: &str = "Are you sure you want to export to Excel?";
/// Title of the alert shown when an export fails.
pub const EXPORT_FAILED_TITLE: &str = "Export Failed";
/// Body of the alert shown when an export fails.
pub const EXPORT_FAILED_MESSAGE: &str = "There was an error exporting the file.";

/// Alert text shown after a successful export.
pub fn export_success_message(path: &std::path::Path) -> String {
    format!("Excel file saved to {}", path.display())
}
