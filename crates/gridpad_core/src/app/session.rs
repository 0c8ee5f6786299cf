//! Editor session state.
//!
//! # Responsibility
//! - Own the live grid and selection for one editor screen.
//! - Route every edit through the persistence queue (write-through).
//! - Gate exports so only one runs at a time.
//!
//! # Invariants
//! - Edits are applied and submitted for persistence under the same lock, so
//!   persistence order equals edit order.
//! - Selection never reaches storage.
//! - Startup never fails because stored data is missing or corrupt.

use crate::config::CoreConfig;
use crate::export::sheet_exporter::{ExportError, ExportReceipt, SheetExporter};
use crate::model::grid::{Grid, GridDimensions, GridError};
use crate::model::selection::Selection;
use crate::service::persist_queue::{PersistError, PersistQueue, PersistStatus};
use crate::store::grid_store::GridStore;
use crate::store::kv_store::{SqliteKeyValueStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};

pub type SessionResult<T> = Result<T, SessionError>;

/// Session-level error surfaced to FFI/CLI callers.
#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Persist(PersistError),
    Grid(GridError),
    Export(ExportError),
    /// A thread panicked while holding session state.
    StatePoisoned,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::Grid(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::StatePoisoned => write!(f, "session state is unavailable after a panic"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Grid(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::StatePoisoned => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PersistError> for SessionError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

impl From<GridError> for SessionError {
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

impl From<ExportError> for SessionError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

struct SessionState {
    grid: Grid,
    selection: Selection,
}

/// Application state for one grid editor.
pub struct GridSession {
    state: Mutex<SessionState>,
    persist: PersistQueue,
    exporter: SheetExporter,
    export_guard: Mutex<()>,
    export_dir: PathBuf,
    export_file_name: String,
    dimensions: GridDimensions,
}

impl GridSession {
    /// Opens storage, loads the last snapshot and starts the persist worker.
    ///
    /// An unopenable database file degrades to an in-memory store so the
    /// editor still starts; edits are then not durable.
    pub fn open(config: CoreConfig) -> SessionResult<Self> {
        let store = match &config.db_path {
            Some(path) => SqliteKeyValueStore::open(path).or_else(|err| {
                error!(
                    "event=session_open module=app status=degraded reason=db_unavailable error={}",
                    err
                );
                SqliteKeyValueStore::open_in_memory()
            })?,
            None => SqliteKeyValueStore::open_in_memory()?,
        };

        let grid_store = GridStore::new(store, config.storage_key.as_str(), config.dimensions);
        let grid = grid_store.load();
        let persist = PersistQueue::spawn(grid_store)?;

        info!(
            "event=session_open module=app status=ok dimensions={} durable={}",
            config.dimensions,
            config.db_path.is_some()
        );
        Ok(Self {
            state: Mutex::new(SessionState {
                grid,
                selection: Selection::None,
            }),
            persist,
            exporter: SheetExporter::default(),
            export_guard: Mutex::new(()),
            export_dir: config.export_dir,
            export_file_name: config.export_file_name,
            dimensions: config.dimensions,
        })
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Cheap copy of the current grid.
    pub fn snapshot(&self) -> SessionResult<Grid> {
        Ok(self.lock_state()?.grid.clone())
    }

    pub fn cell(&self, row: usize, col: usize) -> SessionResult<String> {
        Ok(self.lock_state()?.grid.cell(row, col)?.to_string())
    }

    pub fn selection(&self) -> SessionResult<Selection> {
        Ok(self.lock_state()?.selection)
    }

    /// Replaces one cell and queues the new grid for persistence.
    ///
    /// Persistence failures are logged, never returned; the edit stands.
    pub fn edit_cell(
        &self,
        row: usize,
        col: usize,
        value: impl Into<String>,
    ) -> SessionResult<Grid> {
        let mut state = self.lock_state()?;
        let edited = state.grid.with_cell(row, col, value)?;
        state.grid = edited.clone();

        if let Err(err) = self.persist.submit(edited.clone()) {
            warn!(
                "event=grid_edit module=app status=unsaved row={} col={} error={}",
                row, col, err
            );
        }
        Ok(edited)
    }

    /// Marks `(row, col)` as the focused cell.
    pub fn focus_cell(&self, row: usize, col: usize) -> SessionResult<()> {
        self.check_bounds(row, col)?;
        self.lock_state()?.selection = Selection::cell(row, col);
        Ok(())
    }

    /// Handles focus leaving `(row, col)`.
    ///
    /// The cell's value is already committed by `edit_cell`, so content is
    /// left as is. Selection is cleared only if it still points here.
    pub fn blur_cell(&self, row: usize, col: usize) -> SessionResult<()> {
        self.check_bounds(row, col)?;
        self.lock_state()?.selection.blur(row, col);
        Ok(())
    }

    /// Waits until every edit so far is persisted.
    pub fn flush(&self) -> SessionResult<PersistStatus> {
        Ok(self.persist.flush()?)
    }

    /// Exports the current grid to `export_dir/file_name`.
    ///
    /// `file_name` defaults to the configured name and must be a bare file
    /// name. Rejected with `ExportError::Busy` while another export runs.
    pub fn export(&self, file_name: Option<&str>) -> SessionResult<ExportReceipt> {
        let _guard = match self.export_guard.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(ExportError::Busy.into()),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.export_file_name.as_str());
        let destination = self.resolve_export_path(file_name)?;

        if let Err(err) = self.persist.flush() {
            warn!(
                "event=grid_export module=app status=unsaved_before_export error={}",
                err
            );
        }

        let grid = self.snapshot()?;
        Ok(self.exporter.export(&grid, destination)?)
    }

    /// Encodes the current grid as base64 xlsx for host-side file writers.
    pub fn export_base64(&self) -> SessionResult<String> {
        let grid = self.snapshot()?;
        Ok(self.exporter.encode_base64(&grid)?)
    }

    fn resolve_export_path(&self, file_name: &str) -> SessionResult<PathBuf> {
        let candidate = Path::new(file_name);
        if !matches!(candidate.file_name(), Some(name) if name == candidate.as_os_str()) {
            return Err(ExportError::InvalidDestination(candidate.to_path_buf()).into());
        }
        Ok(self.export_dir.join(candidate))
    }

    fn check_bounds(&self, row: usize, col: usize) -> SessionResult<()> {
        if self.dimensions.contains(row, col) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                row,
                col,
                dimensions: self.dimensions,
            }
            .into())
        }
    }

    fn lock_state(&self) -> SessionResult<MutexGuard<'_, SessionState>> {
        self.state.lock().map_err(|_| SessionError::StatePoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::{GridSession, SessionError};
    use crate::config::CoreConfig;
    use crate::export::sheet_exporter::ExportError;
    use crate::model::selection::Selection;

    fn open_in(dir: &std::path::Path) -> GridSession {
        GridSession::open(CoreConfig::in_memory(dir)).unwrap()
    }

    #[test]
    fn focus_then_blur_without_edit_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_in(dir.path());
        session.edit_cell(2, 3, "keep").unwrap();
        let before = session.snapshot().unwrap();

        session.focus_cell(2, 3).unwrap();
        assert_eq!(session.selection().unwrap(), Selection::cell(2, 3));
        session.blur_cell(2, 3).unwrap();

        assert_eq!(session.snapshot().unwrap(), before);
        assert!(session.selection().unwrap().is_none());
    }

    #[test]
    fn focus_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_in(dir.path());
        let err = session.focus_cell(10, 0).unwrap_err();
        assert!(matches!(err, SessionError::Grid(_)));
        assert!(session.selection().unwrap().is_none());
    }

    #[test]
    fn export_while_another_runs_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_in(dir.path());
        let _running = session.export_guard.lock().unwrap();

        let err = session.export(None).unwrap_err();
        assert!(matches!(err, SessionError::Export(ExportError::Busy)));
        assert!(!dir.path().join("Untitled1.xlsx").exists());
    }

    #[test]
    fn export_rejects_nested_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_in(dir.path());
        for name in ["../escape.xlsx", "sub/out.xlsx", ".."] {
            let err = session.export(Some(name)).unwrap_err();
            assert!(
                matches!(err, SessionError::Export(ExportError::InvalidDestination(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn export_uses_default_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_in(dir.path());
        let receipt = session.export(Some("  ")).unwrap();
        assert_eq!(receipt.path, dir.path().join("Untitled1.xlsx"));
        assert!(receipt.path.exists());
    }
}
