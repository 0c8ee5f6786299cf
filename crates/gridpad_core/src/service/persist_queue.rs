//! Single-writer persistence queue.
//!
//! # Responsibility
//! - Move grid persistence off the caller's thread.
//! - Serialize all writes through one worker that owns the store.
//! - Coalesce bursts so only the newest queued snapshot is written.
//!
//! # Invariants
//! - Snapshots carry a sequence number assigned at submit time.
//! - The worker never writes a snapshot older than one it already wrote, so
//!   persisted state is always the latest mutation or a strictly earlier one.
//! - `flush` returns only after every snapshot submitted before it has been
//!   written or superseded.

use crate::model::grid::Grid;
use crate::store::grid_store::GridStore;
use crate::store::kv_store::KeyValueStore;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError};
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "gridpad-persist";

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence queue error.
#[derive(Debug)]
pub enum PersistError {
    /// Worker thread could not be started.
    Spawn(std::io::Error),
    /// Worker is gone; nothing can be persisted anymore.
    WriterStopped,
    /// The newest written snapshot failed to persist.
    WriteFailed { seq: u64, message: String },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start persist worker: {err}"),
            Self::WriterStopped => write!(f, "persist worker has stopped"),
            Self::WriteFailed { seq, message } => {
                write!(f, "persisting grid snapshot #{seq} failed: {message}")
            }
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::WriterStopped | Self::WriteFailed { .. } => None,
        }
    }
}

/// Outcome of the worker's most recent write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Sequence number of the newest snapshot written (0 before any write).
    pub written_seq: u64,
    /// Snapshots dropped because a newer one was queued behind them.
    pub superseded: u64,
    /// Error message of the newest write, if it failed.
    pub last_error: Option<String>,
}

enum Command {
    Persist { seq: u64, grid: Grid },
    Flush(SyncSender<PersistStatus>),
}

/// Handle to the persistence worker. Dropping it drains the queue and joins.
pub struct PersistQueue {
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    next_seq: AtomicU64,
}

impl PersistQueue {
    /// Starts the worker thread, moving `store` into it.
    pub fn spawn<S>(store: GridStore<S>) -> PersistResult<Self>
    where
        S: KeyValueStore + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(store, receiver))
            .map_err(PersistError::Spawn)?;

        info!("event=persist_queue_start module=service status=ok");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            next_seq: AtomicU64::new(0),
        })
    }

    /// Queues `grid` for persistence and returns its sequence number.
    ///
    /// Callers that need ordering across threads must submit while holding
    /// the lock that guards their grid state.
    pub fn submit(&self, grid: Grid) -> PersistResult<u64> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(Command::Persist { seq, grid })?;
        Ok(seq)
    }

    /// Blocks until all earlier submissions are written or superseded.
    pub fn flush(&self) -> PersistResult<PersistStatus> {
        let (reply, status) = mpsc::sync_channel(1);
        self.send(Command::Flush(reply))?;
        let status = status.recv().map_err(|_| PersistError::WriterStopped)?;
        match &status.last_error {
            Some(message) => Err(PersistError::WriteFailed {
                seq: status.written_seq,
                message: message.clone(),
            }),
            None => Ok(status),
        }
    }

    /// Sequence number of the newest submission (0 before any).
    pub fn latest_seq(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }

    fn send(&self, command: Command) -> PersistResult<()> {
        self.sender
            .as_ref()
            .ok_or(PersistError::WriterStopped)?
            .send(command)
            .map_err(|_| PersistError::WriterStopped)
    }
}

impl Drop for PersistQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=persist_queue_stop module=service status=error reason=worker_panicked");
            }
        }
    }
}

fn run_worker<S: KeyValueStore>(store: GridStore<S>, receiver: Receiver<Command>) {
    let mut status = PersistStatus::default();

    while let Ok(first) = receiver.recv() {
        let mut pending: Option<(u64, Grid)> = None;
        let mut waiters = Vec::new();
        let mut batch = vec![first];

        loop {
            match receiver.try_recv() {
                Ok(command) => batch.push(command),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        for command in batch {
            match command {
                Command::Persist { seq, grid } => {
                    let newer = pending.as_ref().map_or(true, |(queued, _)| seq > *queued);
                    if newer {
                        if pending.replace((seq, grid)).is_some() {
                            status.superseded += 1;
                        }
                    } else {
                        status.superseded += 1;
                    }
                }
                Command::Flush(reply) => waiters.push(reply),
            }
        }

        if let Some((seq, grid)) = pending {
            if seq > status.written_seq {
                status.last_error = store.persist(&grid).err().map(|err| err.to_string());
                status.written_seq = seq;
                debug!(
                    "event=persist_queue_write module=service status={} seq={} superseded={}",
                    if status.last_error.is_none() { "ok" } else { "error" },
                    seq,
                    status.superseded
                );
            } else {
                status.superseded += 1;
            }
        }

        for waiter in waiters {
            let _ = waiter.send(status.clone());
        }
    }

    info!(
        "event=persist_queue_stop module=service status=ok written_seq={} superseded={}",
        status.written_seq, status.superseded
    );
}

#[cfg(test)]
mod tests {
    use super::{PersistError, PersistQueue};
    use crate::model::grid::{Grid, GridDimensions};
    use crate::store::grid_store::GridStore;
    use crate::store::kv_store::{KeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};

    struct RejectingStore;

    impl KeyValueStore for RejectingStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn flush_without_submissions_reports_nothing_written() {
        let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
        let queue = PersistQueue::spawn(store).unwrap();
        let status = queue.flush().unwrap();
        assert_eq!(status.written_seq, 0);
        assert_eq!(queue.latest_seq(), 0);
    }

    #[test]
    fn flush_waits_for_latest_submission() {
        let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
        let queue = PersistQueue::spawn(store).unwrap();

        let mut grid = Grid::empty(GridDimensions::DEFAULT);
        for index in 0..50 {
            grid = grid.with_cell(0, 0, index.to_string()).unwrap();
            queue.submit(grid.clone()).unwrap();
        }

        let status = queue.flush().unwrap();
        assert_eq!(status.written_seq, 50);
        assert_eq!(queue.latest_seq(), 50);
    }

    #[test]
    fn flush_surfaces_write_failure() {
        let queue = PersistQueue::spawn(GridStore::with_defaults(RejectingStore)).unwrap();
        queue
            .submit(Grid::empty(GridDimensions::DEFAULT))
            .unwrap();
        let err = queue.flush().unwrap_err();
        assert!(matches!(err, PersistError::WriteFailed { seq: 1, .. }));
    }
}
