//! Application layer.
//!
//! # Responsibility
//! - Hold per-screen editor state explicitly instead of in globals.
//! - Wire grid model, persistence queue and exporter into use-case calls.

pub mod session;
