//! Storage contracts and the grid persistence component.
//!
//! # Responsibility
//! - Define the key-value store contract the grid is mirrored into.
//! - Keep SQLite details behind that contract.
//! - Own load/persist policy for the grid snapshot.
//!
//! # Invariants
//! - Grid loads fail soft: callers always receive a usable grid.
//! - Persist always writes the full snapshot, never a delta.

pub mod grid_store;
pub mod kv_store;
