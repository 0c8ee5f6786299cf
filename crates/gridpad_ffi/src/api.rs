//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the grid editor session to Dart via FRB as flat sync calls.
//! - Translate core errors into response envelopes the UI can show as is.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Only one session exists per process; `grid_open` is idempotent for the
//!   same paths.
//! - Cell text is never logged.

use gridpad_core::{
    alignment_hint, column_header, core_version as core_version_inner, export_success_message,
    init_logging as init_logging_inner, ping as ping_inner, row_label, CoreConfig, GridSession,
    CONFIRM_EXPORT_MESSAGE, CONFIRM_EXPORT_TITLE, EXPORT_FAILED_MESSAGE, EXPORT_FAILED_TITLE,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static SESSION: OnceLock<OpenSession> = OnceLock::new();
static OPEN_LOCK: Mutex<()> = Mutex::new(());

struct OpenSession {
    db_path: PathBuf,
    export_dir: PathBuf,
    session: GridSession,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Full grid state for rendering one frame of the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    /// Cell text, row-major.
    pub rows: Vec<Vec<String>>,
    /// `A`, `B`, ... one per column.
    pub column_headers: Vec<String>,
    /// `1`, `2`, ... one per row.
    pub row_labels: Vec<String>,
    /// Focused row, `-1` when nothing is focused.
    pub selected_row: i64,
    /// Focused column, `-1` when nothing is focused.
    pub selected_col: i64,
    /// Error text when the view could not be produced; empty otherwise.
    pub message: String,
}

impl GridView {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            column_headers: Vec::new(),
            row_labels: Vec::new(),
            selected_row: -1,
            selected_col: -1,
            message: message.into(),
        }
    }
}

/// Result envelope for cell edit/focus/blur calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridActionResponse {
    pub ok: bool,
    pub message: String,
}

impl GridActionResponse {
    fn from_result<E: std::fmt::Display>(action: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                message: String::new(),
            },
            Err(err) => Self {
                ok: false,
                message: format!("{action} failed: {err}"),
            },
        }
    }
}

/// Result envelope for export calls, shaped for a title/message alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    /// Written file path on file export success.
    pub path: Option<String>,
    /// Base64 workbook on payload export success.
    pub payload: Option<String>,
    /// Alert title; empty on success.
    pub title: String,
    /// Alert body.
    pub message: String,
    /// Diagnostic detail for failures; not meant for end users.
    pub detail: String,
}

impl ExportResponse {
    fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            path: None,
            payload: None,
            title: EXPORT_FAILED_TITLE.to_string(),
            message: EXPORT_FAILED_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }
}

/// Confirmation dialog text shown before exporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPrompt {
    pub title: String,
    pub message: String,
}

/// Opens the editor session, loading the last saved grid.
///
/// Input semantics:
/// - `db_path`: file for the local key-value store (app data dir).
/// - `export_dir`: platform downloads directory for exported workbooks.
///
/// # FFI contract
/// - Idempotent for the same paths; different paths after open are rejected.
/// - Never fails because saved data is missing or corrupt.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_open(db_path: String, export_dir: String) -> String {
    let db_path = PathBuf::from(db_path.trim());
    let export_dir = PathBuf::from(export_dir.trim());
    if db_path.as_os_str().is_empty() || export_dir.as_os_str().is_empty() {
        return "grid_open failed: db_path and export_dir are required".to_string();
    }

    let _open = match OPEN_LOCK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(open) = SESSION.get() {
        if open.db_path == db_path && open.export_dir == export_dir {
            return String::new();
        }
        return format!(
            "grid_open failed: session already open at `{}`",
            open.db_path.display()
        );
    }

    let config = CoreConfig::new(db_path.clone(), export_dir.clone());
    match GridSession::open(config) {
        Ok(session) => {
            let _ = SESSION.set(OpenSession {
                db_path,
                export_dir,
                session,
            });
            String::new()
        }
        Err(err) => format!("grid_open failed: {err}"),
    }
}

/// Returns the current grid, headers and focus for rendering.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_snapshot() -> GridView {
    let session = match current_session() {
        Ok(session) => session,
        Err(message) => return GridView::failure(message),
    };

    match (session.snapshot(), session.selection()) {
        (Ok(grid), Ok(selection)) => {
            let dimensions = grid.dimensions();
            let (selected_row, selected_col) = selection.to_signed();
            GridView {
                rows: grid.to_rows(),
                column_headers: (0..dimensions.columns).map(column_header).collect(),
                row_labels: (0..dimensions.rows).map(row_label).collect(),
                selected_row,
                selected_col,
                message: String::new(),
            }
        }
        (Err(err), _) | (_, Err(err)) => GridView::failure(format!("grid_snapshot failed: {err}")),
    }
}

/// Commits new text for one cell; the grid is saved in the background.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_set_cell(row: i32, col: i32, value: String) -> GridActionResponse {
    GridActionResponse::from_result(
        "grid_set_cell",
        with_cell(row, col, |session, row, col| {
            session.edit_cell(row, col, value).map(|_| ())
        }),
    )
}

/// Records that a cell gained input focus.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_focus_cell(row: i32, col: i32) -> GridActionResponse {
    GridActionResponse::from_result(
        "grid_focus_cell",
        with_cell(row, col, |session, row, col| session.focus_cell(row, col)),
    )
}

/// Records that a cell lost input focus. Cell content is left unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_blur_cell(row: i32, col: i32) -> GridActionResponse {
    GridActionResponse::from_result(
        "grid_blur_cell",
        with_cell(row, col, |session, row, col| session.blur_cell(row, col)),
    )
}

/// Returns `left` or `right` for rendering `value`.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_cell_alignment(value: String) -> String {
    alignment_hint(&value).as_str().to_string()
}

/// Text for the confirmation dialog the UI shows before exporting.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_export_prompt() -> ExportPrompt {
    ExportPrompt {
        title: CONFIRM_EXPORT_TITLE.to_string(),
        message: CONFIRM_EXPORT_MESSAGE.to_string(),
    }
}

/// Writes the grid as an xlsx file into the export directory.
///
/// # FFI contract
/// - Call only after the user confirmed the export.
/// - `file_name` defaults to `Untitled1.xlsx`; existing files are replaced.
/// - Concurrent calls are rejected, never run in parallel.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_export(file_name: Option<String>) -> ExportResponse {
    let session = match current_session() {
        Ok(session) => session,
        Err(message) => return ExportResponse::failure(message),
    };

    match session.export(file_name.as_deref()) {
        Ok(receipt) => ExportResponse {
            ok: true,
            path: Some(receipt.path.display().to_string()),
            payload: None,
            title: String::new(),
            message: export_success_message(&receipt.path),
            detail: String::new(),
        },
        Err(err) => {
            warn!("event=ffi_export module=ffi status=error error={err}");
            ExportResponse::failure(format!("grid_export failed: {err}"))
        }
    }
}

/// Returns the grid as a base64 xlsx payload for a host-side file writer.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_export_base64() -> ExportResponse {
    let session = match current_session() {
        Ok(session) => session,
        Err(message) => return ExportResponse::failure(message),
    };

    match session.export_base64() {
        Ok(payload) => ExportResponse {
            ok: true,
            path: None,
            payload: Some(payload),
            title: String::new(),
            message: String::new(),
            detail: String::new(),
        },
        Err(err) => ExportResponse::failure(format!("grid_export_base64 failed: {err}")),
    }
}

/// Blocks until every edit so far is saved. Returns error message or empty string.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_flush() -> String {
    match current_session().and_then(|session| {
        session
            .flush()
            .map(|_| ())
            .map_err(|err| format!("grid_flush failed: {err}"))
    }) {
        Ok(()) => String::new(),
        Err(message) => message,
    }
}

fn current_session() -> Result<&'static GridSession, String> {
    SESSION
        .get()
        .map(|open| &open.session)
        .ok_or_else(|| "grid session is not open; call grid_open first".to_string())
}

fn with_cell(
    row: i32,
    col: i32,
    f: impl FnOnce(&GridSession, usize, usize) -> gridpad_core::SessionResult<()>,
) -> Result<(), String> {
    let session = current_session()?;
    let (Ok(row_index), Ok(col_index)) = (usize::try_from(row), usize::try_from(col)) else {
        return Err(format!(
            "cell ({row}, {col}) is outside the {} grid",
            session.dimensions()
        ));
    };
    f(session, row_index, col_index).map_err(|err| err.to_string())
}
