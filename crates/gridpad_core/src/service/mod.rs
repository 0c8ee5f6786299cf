//! Background services supporting the editor session.
//!
//! # Responsibility
//! - Serialize persistence work off the caller's thread.

pub mod persist_queue;
