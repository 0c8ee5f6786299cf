//! Core logic for GridPad, a single-screen grid editor.
//! This crate owns grid state, its local persistence and xlsx export; the
//! host UI talks to it through `gridpad_ffi`.

pub mod app;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use app::session::{GridSession, SessionError, SessionResult};
pub use config::{CoreConfig, DEFAULT_EXPORT_FILE_NAME, DEFAULT_STORAGE_KEY, EXPORT_SHEET_NAME};
pub use export::sheet_exporter::{ExportError, ExportReceipt, ExportResult, SheetExporter};
pub use export::{
    export_success_message, CONFIRM_EXPORT_MESSAGE, CONFIRM_EXPORT_TITLE, EXPORT_FAILED_MESSAGE,
    EXPORT_FAILED_TITLE,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cell_class::{alignment_hint, classify_cell, Alignment, CellClass};
pub use model::grid::{column_header, row_label, Grid, GridDimensions, GridError, GridResult};
pub use model::selection::Selection;
pub use service::persist_queue::{PersistError, PersistQueue, PersistResult, PersistStatus};
pub use store::grid_store::GridStore;
pub use store::kv_store::{KeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
